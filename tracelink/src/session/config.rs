//! Per-session configuration
//!
//! Set once at session start and read-only afterwards; the scope callbacks
//! read it through the shared session state on every instrumented call.

use serde::{Deserialize, Serialize};

/// Grace period `disable` waits for in-flight scopes to drain, microseconds.
pub const DEFAULT_DRAIN_GRACE_US: u64 = 5_000;

/// What a session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// Nothing is recorded.
    Off,
    /// Basic host-side timing only, no device backend involvement.
    Timing,
    /// Full trace: instrumented scopes plus the merged device trace. The
    /// only mode this engine supports.
    FullTrace,
}

impl SessionMode {
    /// Whether the engine can run a session in this mode.
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(self, Self::FullTrace)
    }
}

/// Immutable session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: SessionMode,
    /// Capture input argument shapes on every scope.
    pub report_input_shapes: bool,
    /// Capture a call-stack rendering at scope-enter (skipped for backward
    /// scopes).
    pub with_call_stack: bool,
    /// Record the host-assigned relative sequence numbers.
    pub with_sequence_numbers: bool,
    /// How long `disable` may wait for in-flight scopes before dropping
    /// their events; 0 disables the wait.
    pub drain_grace_us: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::FullTrace,
            report_input_shapes: false,
            with_call_stack: false,
            with_sequence_numbers: false,
            drain_grace_us: DEFAULT_DRAIN_GRACE_US,
        }
    }
}
