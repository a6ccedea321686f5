//! Session core
//!
//! Everything that exists between `enable` and `disable`:
//! - `config`: the immutable per-session configuration
//! - `state`: the shared, internally-locked session state
//! - `observer`: the per-invocation context and the scope callback pair
//! - `lifecycle`: the controller driving prepare/enable/disable

pub mod config;
pub mod lifecycle;
pub mod observer;
pub mod state;

pub use config::{SessionConfig, SessionMode, DEFAULT_DRAIN_GRACE_US};
pub use lifecycle::{SessionController, SESSION_SPAN_NAME};
pub use observer::{ObserverContext, ScopeObservation};
pub use state::SessionState;
