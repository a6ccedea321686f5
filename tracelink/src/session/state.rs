//! Shared session state
//!
//! One instance per active session, reference-counted and reachable from any
//! thread through the session registry. A single internal lock guards both
//! growing buffers (the engine-side event list and the backend-facing CPU
//! trace); appending is the only lock-held operation, context construction
//! on the hot path is lock-free.

use std::mem;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{CpuActivity, CpuTraceBuffer};
use crate::domain::now_us;
use crate::events::CapturedEvent;
use crate::hooks::CallbackHandle;
use crate::session::SessionConfig;

/// State of one enable-to-disable tracing interval.
#[derive(Debug)]
pub struct SessionState {
    config: SessionConfig,
    buffers: Mutex<RecordingBuffers>,
    callback_handle: Mutex<Option<CallbackHandle>>,
    /// Scopes that have entered under this session and not yet exited.
    /// Signed: a scope can exit under a different session than it entered
    /// (sessions swapped mid-scope), which may drive a counter briefly
    /// negative without harm; teardown quiescing treats `<= 0` as drained.
    in_flight: AtomicI64,
}

#[derive(Debug)]
struct RecordingBuffers {
    events: Vec<CapturedEvent>,
    cpu_trace: CpuTraceBuffer,
}

impl SessionState {
    /// Create state for a session starting at `start_us`.
    #[must_use]
    pub fn new(config: SessionConfig, span_name: &str, start_us: u64) -> Self {
        Self {
            config,
            buffers: Mutex::new(RecordingBuffers {
                events: Vec::new(),
                cpu_trace: CpuTraceBuffer::open(span_name, start_us),
            }),
            callback_handle: Mutex::new(None),
            in_flight: AtomicI64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn buffers(&self) -> MutexGuard<'_, RecordingBuffers> {
        match self.buffers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append one completed scope: the engine-side event and its
    /// backend-facing mirror, under a single lock acquisition.
    pub fn record(&self, event: CapturedEvent, activity: CpuActivity) {
        let mut buffers = self.buffers();
        buffers.events.push(event);
        buffers.cpu_trace.activities.push(activity);
    }

    /// Append a synthetic zero-duration marker event stamped now.
    pub fn mark(&self, name: &str) {
        let marker = CapturedEvent::marker(name, now_us());
        self.buffers().events.push(marker);
    }

    /// Note a recording scope entering.
    pub fn scope_entered(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Note a recording scope exiting after its event was appended.
    pub fn scope_exited(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    /// Scopes currently between enter and exit.
    #[must_use]
    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn set_callback_handle(&self, handle: CallbackHandle) {
        let mut guard = match self.callback_handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(handle);
    }

    pub fn take_callback_handle(&self) -> Option<CallbackHandle> {
        let mut guard = match self.callback_handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take()
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.buffers().events.len()
    }

    /// Close the trace span and drain both buffers.
    ///
    /// Events appended after this (stragglers racing teardown) land in the
    /// emptied buffers and are dropped with the state.
    #[must_use]
    pub fn finish(&self, end_us: u64) -> (Vec<CapturedEvent>, CpuTraceBuffer) {
        let mut buffers = self.buffers();
        buffers.cpu_trace.span.end_us = end_us;
        let events = mem::take(&mut buffers.events);
        let cpu_trace = mem::take(&mut buffers.cpu_trace);
        (events, cpu_trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelink_common::{DEVICE_HOST_CPU, MARK_SESSION_START};

    use crate::domain::CorrelationId;

    fn test_activity(correlation: u64) -> CpuActivity {
        CpuActivity {
            name: "scope".to_owned(),
            device_index: DEVICE_HOST_CPU,
            start_us: 10,
            end_us: 20,
            correlation_id: CorrelationId(correlation),
            os_thread_id: 1,
            input_shapes: None,
        }
    }

    #[test]
    fn test_record_appends_both_buffers() {
        let state = SessionState::new(SessionConfig::default(), "test", 5);
        let event = CapturedEvent::marker("scope", 10);
        state.record(event, test_activity(1));
        state.mark(MARK_SESSION_START);

        let (events, cpu_trace) = state.finish(99);
        assert_eq!(events.len(), 2);
        assert_eq!(cpu_trace.activities.len(), 1);
        assert_eq!(cpu_trace.span.start_us, 5);
        assert_eq!(cpu_trace.span.end_us, 99);
    }

    #[test]
    fn test_in_flight_counter() {
        let state = SessionState::new(SessionConfig::default(), "test", 0);
        assert_eq!(state.in_flight(), 0);
        state.scope_entered();
        state.scope_entered();
        assert_eq!(state.in_flight(), 2);
        state.scope_exited();
        assert_eq!(state.in_flight(), 1);
    }

    #[test]
    fn test_finish_drains() {
        let state = SessionState::new(SessionConfig::default(), "test", 0);
        state.mark(MARK_SESSION_START);
        let (events, _) = state.finish(1);
        assert_eq!(events.len(), 1);
        let (again, cpu_trace) = state.finish(2);
        assert!(again.is_empty());
        assert!(cpu_trace.activities.is_empty());
    }
}
