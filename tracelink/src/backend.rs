//! Device tracing backend seam
//!
//! The external backend records hardware/accelerator-side activity while a
//! session runs and hands it back as an ordered trace at stop. The engine
//! drives it through a small ordered API and otherwise treats it as opaque.
//!
//! Also here: the CPU trace buffer transferred to the backend at disable
//! (every completed scope mirrors a [`CpuActivity`] into it), and the
//! mapping from requested [`ActivityKind`]s to the backend's own activity
//! vocabulary.

use anyhow::Result;
use tracelink_common::{ActivityKind, BackendActivity, DeviceActivityRecord};

use crate::domain::CorrelationId;

/// External device tracing backend.
///
/// Implementations are injected into the
/// [`SessionController`](crate::SessionController); correlation push/pop and
/// `trace_active` sit on hot or near-hot paths and are therefore infallible,
/// while the lifecycle calls may fail and surface through
/// [`SessionError::Backend`](crate::SessionError::Backend).
pub trait DeviceBackend: Send + Sync {
    /// Pre-warm collection for the given activity classes.
    fn prepare_trace(&self, activities: &[BackendActivity]) -> Result<()>;

    /// Late-initialize the backend if one is registered; a no-op otherwise.
    fn init_if_registered(&self);

    /// Associate subsequent device activity on this thread with `id`.
    fn push_correlation_id(&self, id: CorrelationId);

    /// End the association opened by the matching push.
    fn pop_correlation_id(&self);

    /// Whether an external trace collection is currently running.
    fn trace_active(&self) -> bool;

    /// Start external trace collection.
    fn start_trace(&self) -> Result<()>;

    /// Hand over the CPU-side trace buffer for merging.
    fn transfer_cpu_trace(&self, buffer: CpuTraceBuffer) -> Result<()>;

    /// Stop collection and retrieve the combined trace; `Ok(None)` means the
    /// backend produced nothing.
    fn stop_trace(&self) -> Result<Option<DeviceTrace>>;
}

/// The backend's combined trace: an ordered, opaque collection of
/// device-side activity records.
#[derive(Debug, Default)]
pub struct DeviceTrace {
    pub records: Vec<DeviceActivityRecord>,
}

impl DeviceTrace {
    /// Number of device-side activities in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Session-wide bounds of the CPU trace buffer.
#[derive(Debug, Clone, Default)]
pub struct TraceSpan {
    pub name: String,
    pub start_us: u64,
    pub end_us: u64,
}

/// One CPU-side activity as the backend consumes it.
///
/// Leaner than [`CapturedEvent`](crate::CapturedEvent): the backend needs
/// timing, correlation and the OS-level thread id, not the full engine-side
/// record.
#[derive(Debug, Clone)]
pub struct CpuActivity {
    pub name: String,
    pub device_index: u32,
    pub start_us: u64,
    pub end_us: u64,
    pub correlation_id: CorrelationId,
    /// Kernel thread id (not the engine's logical id).
    pub os_thread_id: u64,
    /// Rendered input shapes, present when shape capture was configured and
    /// the scope had inputs.
    pub input_shapes: Option<String>,
}

/// Growing buffer of CPU activities handed to the backend at disable.
#[derive(Debug, Default)]
pub struct CpuTraceBuffer {
    pub span: TraceSpan,
    pub activities: Vec<CpuActivity>,
}

impl CpuTraceBuffer {
    /// Open a buffer whose span starts now-ish (caller supplies the stamp so
    /// it matches the session start).
    #[must_use]
    pub fn open(name: &str, start_us: u64) -> Self {
        Self {
            span: TraceSpan { name: name.to_owned(), start_us, end_us: 0 },
            activities: Vec::new(),
        }
    }
}

/// Map requested session activities onto the backend's vocabulary.
///
/// CPU scopes need the correlation channel and the device runtime stream;
/// device activity additionally pulls in the memory and kernel classes.
#[must_use]
pub fn backend_activities(activities: &[ActivityKind]) -> Vec<BackendActivity> {
    let mut mapped = Vec::new();
    if activities.contains(&ActivityKind::Cpu) {
        mapped.push(BackendActivity::ExternalCorrelation);
        mapped.push(BackendActivity::DeviceRuntime);
    }
    if activities.contains(&ActivityKind::Device) {
        mapped.push(BackendActivity::MemoryTransfer);
        mapped.push(BackendActivity::MemoryFill);
        mapped.push(BackendActivity::ConcurrentKernel);
        if !mapped.contains(&BackendActivity::DeviceRuntime) {
            mapped.push(BackendActivity::DeviceRuntime);
        }
    }
    mapped
}

/// Whether this build carries the device tracing backend integration.
///
/// Pure capability query: constant for a given build, no side effects.
#[must_use]
pub fn tracing_backend_available() -> bool {
    cfg!(feature = "device-backend")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_activities_map_to_correlation_and_runtime() {
        let mapped = backend_activities(&[ActivityKind::Cpu]);
        assert_eq!(
            mapped,
            vec![BackendActivity::ExternalCorrelation, BackendActivity::DeviceRuntime]
        );
    }

    #[test]
    fn test_device_activities_add_memory_and_kernel_classes() {
        let mapped = backend_activities(&[ActivityKind::Cpu, ActivityKind::Device]);
        assert!(mapped.contains(&BackendActivity::MemoryTransfer));
        assert!(mapped.contains(&BackendActivity::MemoryFill));
        assert!(mapped.contains(&BackendActivity::ConcurrentKernel));
        // DeviceRuntime requested by both sides, mapped once
        assert_eq!(
            mapped.iter().filter(|a| **a == BackendActivity::DeviceRuntime).count(),
            1
        );
    }

    #[test]
    fn test_empty_request_maps_to_nothing() {
        assert!(backend_activities(&[]).is_empty());
    }

    #[test]
    fn test_availability_is_constant() {
        assert_eq!(tracing_backend_available(), tracing_backend_available());
    }
}
