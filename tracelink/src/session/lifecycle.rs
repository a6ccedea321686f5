//! Session lifecycle controller
//!
//! Drives the device backend through its ordered API and owns the
//! enable/disable transitions: Idle → Prepared → Active → Draining → Idle.
//! `enable`/`disable` are meant to be called from one control thread while
//! traced threads run scopes concurrently; concurrent lifecycle calls racing
//! each other must be serialized by the caller.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tracelink_common::{ActivityKind, MARK_SESSION_START, MARK_SESSION_STOP};

use crate::backend::{backend_activities, DeviceBackend};
use crate::callstack::CaptureChain;
use crate::domain::{now_us, SessionError};
use crate::hooks::ScopeHookRegistry;
use crate::registry::{self, SessionKind};
use crate::result::{assemble, SessionResult};
use crate::session::observer::install_callbacks;
use crate::session::{SessionConfig, SessionState};

/// Name stamped on the CPU trace span handed to the device backend.
pub const SESSION_SPAN_NAME: &str = "tracelink session";

/// How often teardown quiescing re-checks the in-flight counter.
const DRAIN_POLL: Duration = Duration::from_micros(100);

/// Entry point the host runtime drives sessions through.
///
/// Holds the injected collaborators: the host's scope-hook registry, the
/// device tracing backend, and the call-stack capture chain.
pub struct SessionController {
    hooks: Arc<dyn ScopeHookRegistry>,
    backend: Arc<dyn DeviceBackend>,
    stacks: Arc<CaptureChain>,
}

impl SessionController {
    /// Controller without call-stack capture sources.
    #[must_use]
    pub fn new(hooks: Arc<dyn ScopeHookRegistry>, backend: Arc<dyn DeviceBackend>) -> Self {
        Self::with_stack_sources(hooks, backend, CaptureChain::empty())
    }

    /// Controller with an explicit call-stack fallback chain.
    #[must_use]
    pub fn with_stack_sources(
        hooks: Arc<dyn ScopeHookRegistry>,
        backend: Arc<dyn DeviceBackend>,
        stacks: CaptureChain,
    ) -> Self {
        Self { hooks, backend, stacks: Arc::new(stacks) }
    }

    /// Pre-warm the device backend for the given activities.
    ///
    /// Valid only for the full-trace mode; changes no local state, so it may
    /// be called any number of times before `enable_session`.
    ///
    /// # Errors
    /// `UnsupportedMode` when `config.mode` is not full-trace; backend
    /// failures surface transparently.
    pub fn prepare_session(
        &self,
        config: SessionConfig,
        activities: &[ActivityKind],
    ) -> Result<(), SessionError> {
        if !config.mode.is_supported() {
            return Err(SessionError::UnsupportedMode(config.mode));
        }
        let mapped = backend_activities(activities);
        self.backend.init_if_registered();
        self.backend.prepare_trace(&mapped)?;
        debug!("device backend prepared for {} activity classes", mapped.len());
        Ok(())
    }

    /// Start a tracing session.
    ///
    /// Registers the session state in the process registry, installs the
    /// scope callbacks when CPU activities are requested, starts the
    /// external trace when device activities are requested and none is
    /// running, and emits the start marker.
    ///
    /// # Errors
    /// `UnsupportedMode`, `NoActivitiesRequested`, or `AlreadyActive` as in
    /// the session contract; backend failures after registration unwind the
    /// partially-enabled session before surfacing.
    pub fn enable_session(
        &self,
        config: SessionConfig,
        activities: &[ActivityKind],
    ) -> Result<(), SessionError> {
        if !config.mode.is_supported() {
            return Err(SessionError::UnsupportedMode(config.mode));
        }
        if activities.is_empty() {
            return Err(SessionError::NoActivitiesRequested);
        }

        let state = Arc::new(SessionState::new(config, SESSION_SPAN_NAME, now_us()));
        if !registry::push(SessionKind::Tracing, Arc::clone(&state)) {
            return Err(SessionError::AlreadyActive);
        }

        if activities.contains(&ActivityKind::Cpu) {
            let handle = install_callbacks(
                self.hooks.as_ref(),
                Arc::clone(&self.backend),
                Arc::clone(&self.stacks),
                config.report_input_shapes,
            );
            state.set_callback_handle(handle);
        }

        if activities.contains(&ActivityKind::Device) && !self.backend.trace_active() {
            if let Err(backend_err) = self.backend.start_trace() {
                self.unwind_enable(&state);
                return Err(backend_err.into());
            }
        }

        state.mark(MARK_SESSION_START);
        debug!("tracing session enabled ({} activity kinds)", activities.len());
        Ok(())
    }

    /// Stop the active session and return the merged trace result.
    ///
    /// Quiesces in-flight scopes within the configured grace, deregisters
    /// the session so no later scope-enter observes it, removes the
    /// callbacks, finalizes and transfers the CPU trace buffer, stops the
    /// external trace, and assembles the result.
    ///
    /// # Errors
    /// `NotActive` when no session is registered; `BackendTraceMissing` when
    /// the backend yields no trace; backend failures surface transparently.
    pub fn disable_session(&self) -> Result<SessionResult, SessionError> {
        let state = registry::current(SessionKind::Tracing).ok_or(SessionError::NotActive)?;

        // Bounded quiesce while the session is still discoverable, so scope
        // exits landing within the grace record normally.
        let grace = state.config().drain_grace_us;
        if grace > 0 && state.in_flight() > 0 {
            let deadline = Instant::now() + Duration::from_micros(grace);
            while state.in_flight() > 0 && Instant::now() < deadline {
                thread::sleep(DRAIN_POLL);
            }
        }
        drop(state);

        let state = registry::pop(SessionKind::Tracing).ok_or(SessionError::NotActive)?;
        if let Some(handle) = state.take_callback_handle() {
            self.hooks.remove(handle);
        }

        state.mark(MARK_SESSION_STOP);

        let stragglers = state.in_flight().max(0);
        let mut warnings = Vec::new();
        if stragglers > 0 {
            warn!("{stragglers} scope(s) still in flight at session teardown; their events are dropped");
            warnings.push(format!("{stragglers} in-flight scope(s) dropped at session teardown"));
        }

        let (events, cpu_trace) = state.finish(now_us());
        let recorded = events.len();

        self.backend.transfer_cpu_trace(cpu_trace)?;
        let trace = self.backend.stop_trace()?.ok_or(SessionError::BackendTraceMissing)?;

        debug!("tracing session disabled: {recorded} events, {} device records", trace.len());
        Ok(assemble(events, trace, warnings))
    }

    /// Roll back a partially-enabled session so no state dangles.
    fn unwind_enable(&self, state: &SessionState) {
        if let Some(handle) = state.take_callback_handle() {
            self.hooks.remove(handle);
        }
        registry::pop(SessionKind::Tracing);
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController").field("stacks", &self.stacks).finish_non_exhaustive()
    }
}
