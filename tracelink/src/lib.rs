//! # Tracelink - Execution-Tracing Session Engine
//!
//! Tracelink instruments function-level execution scopes inside a host
//! runtime, assigns each invocation a correlation identity, captures
//! per-invocation metadata (timing, thread identity, call-stack, argument
//! shapes), and merges the captured events with the trace reported by an
//! external device backend into a single time-ordered result at session end.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Host Runtime                             │
//! │            (scope hook registry, traced threads)                │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ on_enter / on_exit per scope
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Tracelink (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Observer   │──▶│   Session    │──▶│   Result     │         │
//! │  │ (callbacks)  │   │    State     │   │  Assembler   │         │
//! │  └──────┬───────┘   └──────────────┘   └──────▲───────┘         │
//! │         │ push/pop correlation ids            │ merged trace    │
//! │         ▼                                     │                 │
//! │  ┌─────────────────────────────────────────────────────┐        │
//! │  │           Device Tracing Backend (injected)         │        │
//! │  │   prepare → start → transfer cpu trace → stop       │        │
//! │  └─────────────────────────────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`session`]: session core: configuration, shared state, the scope
//!   callback pair, and the lifecycle controller
//! - [`registry`]: process-visible registry mapping a session kind to the
//!   active session's shared handle (explicit push/pop discipline)
//! - [`hooks`]: the instrumentation-point seam the host runtime implements
//! - [`backend`]: the device tracing backend seam and the CPU trace buffer
//!   transferred to it at disable
//! - [`callstack`]: ordered fallback chain of call-stack capture strategies
//! - [`events`]: the durable [`CapturedEvent`] model
//! - [`result`]: per-thread grouping and device-trace enrichment
//! - [`shapes`]: argument-shape text rendering
//! - [`domain`]: newtypes, identity sources, errors
//!
//! ## Typical Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use tracelink::{SessionConfig, SessionController};
//! # use tracelink_common::ActivityKind;
//! # fn wire() -> (Arc<dyn tracelink::ScopeHookRegistry>, Arc<dyn tracelink::DeviceBackend>) { unimplemented!() }
//! # fn main() -> Result<(), tracelink::SessionError> {
//! let (hooks, backend) = wire(); // host runtime + device backend
//! let controller = SessionController::new(hooks, backend);
//!
//! let config = SessionConfig::default();
//! let activities = [ActivityKind::Cpu, ActivityKind::Device];
//! controller.prepare_session(config, &activities)?;
//! controller.enable_session(config, &activities)?;
//! // ... traced threads run instrumented scopes ...
//! let result = controller.disable_session()?;
//! for thread_events in result.events_by_thread() {
//!     // one bucket per starting thread, append order preserved
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! - **Scope**: one bounded execution interval the host brackets with
//!   enter/exit hooks (typically a function invocation)
//! - **Correlation id**: links a CPU-observed scope to activities the device
//!   backend reports independently for the same logical operation
//! - **Session**: one enable-to-disable interval during which scopes are
//!   recorded; exactly one can be active per session kind
//! - **Marker event**: synthetic zero-duration event emitted at session
//!   start/stop for alignment

pub mod backend;
pub mod callstack;
pub mod domain;
pub mod events;
pub mod hooks;
pub mod registry;
pub mod result;
pub mod session;
pub mod shapes;

// Re-export the engine surface
pub use backend::{
    backend_activities, tracing_backend_available, CpuActivity, CpuTraceBuffer, DeviceBackend,
    DeviceTrace, TraceSpan,
};
pub use callstack::{CaptureChain, StackCapture};
pub use domain::{
    current_thread_id, next_correlation_id, now_us, os_thread_id, CorrelationId, SessionError,
    ThreadId,
};
pub use events::{CapturedEvent, DeviceLink};
pub use hooks::{CallbackHandle, ScopeCallbacks, ScopeHookRegistry, ScopeRecord};
pub use registry::SessionKind;
pub use result::SessionResult;
pub use session::{
    ObserverContext, ScopeObservation, SessionConfig, SessionController, SessionMode,
};
pub use shapes::format_shapes;
