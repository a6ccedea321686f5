//! Durable trace event model
//!
//! A [`CapturedEvent`] is the record a completed instrumented scope leaves
//! behind: built from the scope's observer context plus an end timestamp,
//! appended to the active session's event list, and immutable afterwards
//! except for device-trace enrichment at result assembly.

use serde::{Deserialize, Serialize};
use tracelink_common::{
    DeviceActivityRecord, ScopeKind, DEVICE_HOST_CPU, MARK_SESSION_START, MARK_SESSION_STOP,
    SEQUENCE_NONE,
};

use crate::domain::{current_thread_id, CorrelationId, ThreadId};

/// One recorded event: a completed instrumented scope, or a synthetic
/// session marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Scope name as reported by the instrumentation mechanism.
    pub name: String,
    /// Device the event was observed on; [`DEVICE_HOST_CPU`] for all
    /// CPU-side scopes.
    pub device_index: u32,
    /// Start time, microseconds since the UNIX epoch.
    pub start_us: u64,
    /// Duration in microseconds; 0 for markers.
    pub duration_us: u64,
    /// Correlation id issued at scope-enter; `CorrelationId(0)` for markers.
    pub correlation_id: CorrelationId,
    /// Thread the scope was entered on.
    pub start_thread: ThreadId,
    /// Thread the scope exited on (can differ from `start_thread` when the
    /// host migrates work between threads mid-scope).
    pub end_thread: ThreadId,
    /// Thread that issued the forward operation this scope relates to; for
    /// ordinary scopes this is the starting thread itself.
    pub forward_thread: ThreadId,
    /// Relative sequence number, or [`SEQUENCE_NONE`] when not tracked.
    pub sequence: i64,
    /// Kind of scope that produced the event.
    pub scope: ScopeKind,
    /// Input argument shapes, captured when the session configuration asks
    /// for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Vec<i64>>>,
    /// Rendered call-stack at scope-enter, captured when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<String>,
    /// Device-side activity matched by correlation id during result
    /// assembly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceLink>,
}

/// Scalar view of the device activity matched to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLink {
    pub name: String,
    pub device_index: u32,
    pub start_us: u64,
    pub duration_us: u64,
}

impl DeviceLink {
    /// Copy the linkable fields out of a backend record.
    #[must_use]
    pub fn from_record(record: &DeviceActivityRecord) -> Self {
        Self {
            name: record.name().to_owned(),
            device_index: record.device_index,
            start_us: record.start_us,
            duration_us: record.duration_us,
        }
    }
}

impl CapturedEvent {
    /// Build a synthetic zero-duration marker event on the calling thread.
    #[must_use]
    pub fn marker(name: &str, at_us: u64) -> Self {
        let thread = current_thread_id();
        Self {
            name: name.to_owned(),
            device_index: DEVICE_HOST_CPU,
            start_us: at_us,
            duration_us: 0,
            correlation_id: CorrelationId(0),
            start_thread: thread,
            end_thread: thread,
            forward_thread: thread,
            sequence: SEQUENCE_NONE,
            scope: ScopeKind::UserScope,
            shapes: None,
            call_stack: None,
            device: None,
        }
    }

    /// Whether this is one of the synthetic session markers.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        self.name == MARK_SESSION_START || self.name == MARK_SESSION_STOP
    }
}
