//! Structured error types for tracelink
//!
//! Using thiserror for automatic Display implementation and error chaining.

use crate::session::SessionMode;
use thiserror::Error;

/// Failures surfaced by the session lifecycle calls.
///
/// All variants are recoverable and leave no partial session state behind;
/// lifecycle misuse (double enable, disable without enable) is surfaced as a
/// hard error rather than a silent no-op so callers can detect programming
/// mistakes in session management.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session mode {0:?} is not supported by the device tracing engine")]
    UnsupportedMode(SessionMode),

    #[error("a tracing session is already active")]
    AlreadyActive,

    #[error("no tracing session is active")]
    NotActive,

    #[error("no activities requested for the tracing session")]
    NoActivitiesRequested,

    #[error("device backend returned no trace at session stop")]
    BackendTraceMissing,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
