//! Result assembly
//!
//! At disable time the buffered CPU events and the device backend's trace
//! are merged into one immutable [`SessionResult`]: events enriched by
//! correlation id, grouped per starting thread with per-thread append order
//! preserved, with the raw device trace carried through for downstream
//! export.

use std::collections::HashMap;

use crate::backend::DeviceTrace;
use crate::domain::ThreadId;
use crate::events::{CapturedEvent, DeviceLink};

/// Immutable outcome of one tracing session.
#[derive(Debug)]
pub struct SessionResult {
    events_by_thread: Vec<Vec<CapturedEvent>>,
    device_trace: DeviceTrace,
    warnings: Vec<String>,
}

impl SessionResult {
    /// Captured events grouped by starting thread, in first-appearance
    /// order of the threads; within a group, append order is preserved.
    #[must_use]
    pub fn events_by_thread(&self) -> &[Vec<CapturedEvent>] {
        &self.events_by_thread
    }

    /// The device backend's own trace, for richer downstream export.
    #[must_use]
    pub fn device_trace(&self) -> &DeviceTrace {
        &self.device_trace
    }

    /// Annotations attached during teardown (e.g. dropped in-flight scopes).
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Total captured events across all threads, markers included.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events_by_thread.iter().map(Vec::len).sum()
    }

    /// Events produced by instrumented scopes (synthetic markers excluded).
    #[must_use]
    pub fn scope_event_count(&self) -> usize {
        self.events_by_thread.iter().flatten().filter(|e| !e.is_marker()).count()
    }

    /// All events in one start-time-ordered view.
    #[must_use]
    pub fn flattened(&self) -> Vec<&CapturedEvent> {
        let mut all: Vec<&CapturedEvent> = self.events_by_thread.iter().flatten().collect();
        all.sort_by_key(|e| e.start_us);
        all
    }
}

/// Merge buffered events with the retrieved device trace.
pub(crate) fn assemble(
    events: Vec<CapturedEvent>,
    device_trace: DeviceTrace,
    warnings: Vec<String>,
) -> SessionResult {
    let by_correlation: HashMap<u64, usize> = device_trace
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.correlation_id != 0)
        .map(|(idx, r)| (r.correlation_id, idx))
        .collect();

    let mut bucket_of: HashMap<ThreadId, usize> = HashMap::new();
    let mut events_by_thread: Vec<Vec<CapturedEvent>> = Vec::new();

    for mut event in events {
        if event.correlation_id.0 != 0 {
            if let Some(&idx) = by_correlation.get(&event.correlation_id.0) {
                event.device = Some(DeviceLink::from_record(&device_trace.records[idx]));
            }
        }
        let bucket = *bucket_of.entry(event.start_thread).or_insert_with(|| {
            events_by_thread.push(Vec::new());
            events_by_thread.len() - 1
        });
        events_by_thread[bucket].push(event);
    }

    SessionResult { events_by_thread, device_trace, warnings }
}
