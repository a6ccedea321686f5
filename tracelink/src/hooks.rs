//! Instrumentation-point seam
//!
//! The engine does not own the mechanism that brackets execution scopes with
//! enter/exit hooks; the host runtime does. This module defines the shape of
//! that seam: what the mechanism passes into the callbacks
//! ([`ScopeRecord`]), the callback pair the engine registers
//! ([`ScopeCallbacks`]), and the registry interface it registers them with
//! ([`ScopeHookRegistry`]).
//!
//! The observer context travels through the mechanism as the concrete
//! [`ObserverContext`] tagged variant, so there is no runtime type check on
//! the hot path and no mismatched-context failure mode: an exit handed an
//! inert context is simply a no-op.

use tracelink_common::ScopeKind;

use crate::domain::ThreadId;
use crate::session::ObserverContext;

/// What the instrumentation mechanism knows about one scope invocation.
///
/// Borrowed, not owned: constructing this must stay cheap enough for a hook
/// that runs on every traced call site.
#[derive(Debug, Clone, Copy)]
pub struct ScopeRecord<'a> {
    /// Scope name (function name, node name, or user label).
    pub name: &'a str,
    /// Kind of scope being bracketed.
    pub kind: ScopeKind,
    /// Relative sequence number assigned by the host, or
    /// [`tracelink_common::SEQUENCE_NONE`].
    pub sequence: i64,
    /// Thread that issued the forward operation this scope relates to.
    pub forward_thread: ThreadId,
    /// Input argument shapes, populated only when the registered callbacks
    /// asked for inputs.
    pub input_shapes: Option<&'a [Vec<i64>]>,
}

/// Callback invoked at scope-enter; returns the observer context the
/// mechanism holds for the duration of the scope.
pub type OnScopeEnter = Box<dyn Fn(&ScopeRecord<'_>) -> ObserverContext + Send + Sync>;

/// Callback invoked at scope-exit, consuming the context produced at enter.
pub type OnScopeExit = Box<dyn Fn(&ScopeRecord<'_>, ObserverContext) + Send + Sync>;

/// The (on-enter, on-exit) pair plus the capture flags the mechanism honors.
pub struct ScopeCallbacks {
    pub on_enter: OnScopeEnter,
    pub on_exit: OnScopeExit,
    /// Ask the mechanism to collect input shapes into [`ScopeRecord`].
    pub needs_inputs: bool,
    /// Ask the mechanism to maintain invocation identity across enter/exit.
    pub needs_correlation_ids: bool,
}

impl std::fmt::Debug for ScopeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeCallbacks")
            .field("needs_inputs", &self.needs_inputs)
            .field("needs_correlation_ids", &self.needs_correlation_ids)
            .finish_non_exhaustive()
    }
}

/// Opaque handle identifying one registered callback pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(pub u64);

/// Registry of scope hooks, owned by the host runtime.
///
/// The engine registers exactly one pair per session and removes it at
/// disable; everything else about dispatch order and storage is the host's
/// business.
pub trait ScopeHookRegistry: Send + Sync {
    /// Install a callback pair, returning the handle to remove it with.
    fn register(&self, callbacks: ScopeCallbacks) -> CallbackHandle;

    /// Remove a previously installed pair. Unknown handles are ignored.
    fn remove(&self, handle: CallbackHandle);
}
