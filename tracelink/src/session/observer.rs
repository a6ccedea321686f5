//! Per-invocation observation and the scope callback pair
//!
//! `on_enter` runs on every instrumented call site, including when nothing
//! is being recorded, so its inert branch is one registry read and a tag.
//! The recording branch issues the correlation id, pushes it to the device
//! backend, and snapshots whatever the session configuration asks for.
//! `on_exit` turns the observation into a [`CapturedEvent`] plus its
//! backend-facing [`CpuActivity`] mirror and appends both under the session
//! lock.

use std::sync::Arc;

use log::debug;
use tracelink_common::{ScopeKind, DEVICE_HOST_CPU, SEQUENCE_NONE};

use crate::backend::{CpuActivity, DeviceBackend};
use crate::callstack::CaptureChain;
use crate::domain::{current_thread_id, next_correlation_id, now_us, os_thread_id};
use crate::domain::{CorrelationId, ThreadId};
use crate::events::CapturedEvent;
use crate::hooks::{CallbackHandle, OnScopeEnter, OnScopeExit, ScopeCallbacks, ScopeHookRegistry, ScopeRecord};
use crate::registry::{self, SessionKind};
use crate::session::SessionMode;
use crate::shapes::format_shapes;

/// Observer context handed to the instrumentation mechanism at scope-enter
/// and returned at scope-exit.
///
/// Tagged rather than downcast: an `Inert` context is what every call site
/// gets while no session is recording, and exits holding one are no-ops.
#[derive(Debug)]
pub enum ObserverContext {
    /// Nothing is being recorded for this invocation.
    Inert,
    /// This invocation is being recorded.
    Recording(ScopeObservation),
}

/// Everything captured at scope-enter that scope-exit needs to produce one
/// event. Exclusively owned by the instrumentation mechanism for the scope's
/// duration; consumed at exit.
#[derive(Debug)]
pub struct ScopeObservation {
    pub start_us: u64,
    pub correlation_id: CorrelationId,
    pub start_thread: ThreadId,
    /// Set at scope-exit, immediately before the observation is consumed.
    pub end_thread: Option<ThreadId>,
    pub forward_thread: ThreadId,
    pub sequence: i64,
    pub scope: ScopeKind,
    pub shapes: Option<Vec<Vec<i64>>>,
    pub call_stack: Option<String>,
}

impl ScopeObservation {
    /// Consume the observation into its durable event.
    fn finish(mut self, name: &str, end_us: u64) -> CapturedEvent {
        let end_thread = current_thread_id();
        self.end_thread = Some(end_thread);
        CapturedEvent {
            name: name.to_owned(),
            device_index: DEVICE_HOST_CPU,
            start_us: self.start_us,
            duration_us: end_us.saturating_sub(self.start_us),
            correlation_id: self.correlation_id,
            start_thread: self.start_thread,
            end_thread,
            forward_thread: self.forward_thread,
            sequence: self.sequence,
            scope: self.scope,
            shapes: self.shapes,
            call_stack: self.call_stack,
            device: None,
        }
    }
}

/// Register the session's callback pair with the host's hook registry.
///
/// The callbacks deliberately re-read the session registry on every
/// invocation instead of capturing the session: a scope that outlives
/// `disable` must observe "no session" at exit, not a torn-down state.
pub(crate) fn install_callbacks(
    hooks: &dyn ScopeHookRegistry,
    backend: Arc<dyn DeviceBackend>,
    stacks: Arc<CaptureChain>,
    needs_inputs: bool,
) -> CallbackHandle {
    let enter_backend = Arc::clone(&backend);

    let on_enter: OnScopeEnter = Box::new(move |scope: &ScopeRecord<'_>| -> ObserverContext {
        let Some(state) = registry::current(SessionKind::Tracing) else {
            return ObserverContext::Inert;
        };
        let config = *state.config();
        if config.mode != SessionMode::FullTrace {
            return ObserverContext::Inert;
        }

        let correlation_id = next_correlation_id();
        enter_backend.push_correlation_id(correlation_id);
        state.scope_entered();

        let shapes = if config.report_input_shapes {
            scope.input_shapes.map(<[Vec<i64>]>::to_vec)
        } else {
            None
        };

        // A backward scope's informative stack belongs to the forward
        // invocation; never capture one here.
        let call_stack = if config.with_call_stack && scope.kind != ScopeKind::BackwardFunction {
            stacks.capture()
        } else {
            None
        };

        ObserverContext::Recording(ScopeObservation {
            start_us: now_us(),
            correlation_id,
            start_thread: current_thread_id(),
            end_thread: None,
            forward_thread: scope.forward_thread,
            sequence: if config.with_sequence_numbers { scope.sequence } else { SEQUENCE_NONE },
            scope: scope.kind,
            shapes,
            call_stack,
        })
    });

    let on_exit: OnScopeExit = Box::new(move |scope: &ScopeRecord<'_>, context: ObserverContext| {
        let ObserverContext::Recording(observation) = context else {
            return;
        };
        let Some(state) = registry::current(SessionKind::Tracing) else {
            debug!("scope '{}' outlived its tracing session; event dropped", scope.name);
            return;
        };
        if state.config().mode != SessionMode::FullTrace {
            return;
        }

        let end_us = now_us();
        let input_shapes =
            observation.shapes.as_deref().filter(|s| !s.is_empty()).map(format_shapes);
        let activity = CpuActivity {
            name: scope.name.to_owned(),
            device_index: DEVICE_HOST_CPU,
            start_us: observation.start_us,
            end_us,
            correlation_id: observation.correlation_id,
            os_thread_id: os_thread_id(),
            input_shapes,
        };
        let event = observation.finish(scope.name, end_us);

        state.record(event, activity);
        state.scope_exited();
        backend.pop_correlation_id();
    });

    hooks.register(ScopeCallbacks { on_enter, on_exit, needs_inputs, needs_correlation_ids: true })
}
