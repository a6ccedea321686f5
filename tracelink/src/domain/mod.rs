//! Domain model for tracelink
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Process-wide identity sources (correlation ids, logical thread ids)
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{current_thread_id, next_correlation_id, now_us, os_thread_id};
pub use types::{CorrelationId, ThreadId};

pub use errors::SessionError;
