//! In-process doubles for the engine's external collaborators, shared by the
//! integration tests: a scope-hook registry that can drive registered
//! callbacks around simulated scopes, and a device backend that records every
//! call made to it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracelink::registry::{self, SessionKind};
use tracelink::{
    CallbackHandle, CorrelationId, CpuTraceBuffer, DeviceBackend, DeviceTrace, ObserverContext,
    ScopeCallbacks, ScopeHookRegistry, ScopeRecord,
};
use tracelink_common::{BackendActivity, DeviceActivityRecord, ScopeKind, SEQUENCE_NONE};

/// Serializes tests that exercise the process-wide session registry, and
/// clears any session a previously failed test left behind.
pub fn lock_session() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    let guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = registry::pop(SessionKind::Tracing);
    guard
}

/// A plain `Function` scope record on the calling thread.
#[must_use]
pub fn function_scope(name: &str) -> ScopeRecord<'_> {
    ScopeRecord {
        name,
        kind: ScopeKind::Function,
        sequence: SEQUENCE_NONE,
        forward_thread: tracelink::current_thread_id(),
        input_shapes: None,
    }
}

// ============================================================================
// Hook registry double
// ============================================================================

/// Host-side hook registry double; drives registered callback pairs around
/// simulated scopes the way a real instrumentation mechanism would.
#[derive(Default)]
pub struct TestHookRegistry {
    callbacks: RwLock<HashMap<u64, Arc<ScopeCallbacks>>>,
    next_handle: AtomicU64,
}

impl TestHookRegistry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of currently registered callback pairs.
    pub fn installed(&self) -> usize {
        self.callbacks.read().expect("callbacks lock").len()
    }

    /// Flags of the single registered pair, `(needs_inputs,
    /// needs_correlation_ids)`.
    pub fn flags(&self) -> Option<(bool, bool)> {
        let callbacks = self.callbacks.read().expect("callbacks lock");
        callbacks.values().next().map(|cb| (cb.needs_inputs, cb.needs_correlation_ids))
    }

    /// Run the enter half of a scope, handing back the open contexts the way
    /// the mechanism holds them for the scope's duration.
    pub fn enter_scope(&self, record: &ScopeRecord<'_>) -> OpenScope {
        let pairs: Vec<Arc<ScopeCallbacks>> =
            self.callbacks.read().expect("callbacks lock").values().cloned().collect();
        let contexts =
            pairs.into_iter().map(|cb| ((cb.on_enter)(record), cb)).collect();
        OpenScope { contexts }
    }

    /// Bracket a whole scope: enter immediately followed by exit.
    pub fn run_scope(&self, record: &ScopeRecord<'_>) {
        self.enter_scope(record).exit(record);
    }
}

impl ScopeHookRegistry for TestHookRegistry {
    fn register(&self, callbacks: ScopeCallbacks) -> CallbackHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.callbacks.write().expect("callbacks lock").insert(id, Arc::new(callbacks));
        CallbackHandle(id)
    }

    fn remove(&self, handle: CallbackHandle) {
        self.callbacks.write().expect("callbacks lock").remove(&handle.0);
    }
}

/// A scope that has entered but not yet exited.
pub struct OpenScope {
    contexts: Vec<(ObserverContext, Arc<ScopeCallbacks>)>,
}

impl OpenScope {
    pub fn exit(self, record: &ScopeRecord<'_>) {
        for (context, cb) in self.contexts {
            (cb.on_exit)(record, context);
        }
    }
}

// ============================================================================
// Device backend double
// ============================================================================

/// Device backend double that records every call and can be primed to fail
/// or to mirror pushed correlation ids as device-side records.
#[derive(Default)]
pub struct RecordingBackend {
    pushes: Mutex<Vec<u64>>,
    pops: AtomicUsize,
    active: AtomicBool,
    prepared: Mutex<Vec<BackendActivity>>,
    transferred: Mutex<Option<CpuTraceBuffer>>,
    records: Mutex<Vec<DeviceActivityRecord>>,
    missing_trace: AtomicBool,
    fail_start: AtomicBool,
    mirror_correlations: AtomicBool,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `stop_trace` yield no trace.
    pub fn prime_missing_trace(&self) {
        self.missing_trace.store(true, Ordering::SeqCst);
    }

    /// Make `start_trace` fail.
    pub fn prime_start_failure(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Report one device record per pushed correlation id, so every scope
    /// event has a device-side counterpart to be enriched from.
    pub fn mirror_correlations(&self) {
        self.mirror_correlations.store(true, Ordering::SeqCst);
    }

    pub fn pushed(&self) -> Vec<u64> {
        self.pushes.lock().expect("pushes lock").clone()
    }

    pub fn pop_count(&self) -> usize {
        self.pops.load(Ordering::SeqCst)
    }

    pub fn prepared(&self) -> Vec<BackendActivity> {
        self.prepared.lock().expect("prepared lock").clone()
    }

    pub fn transferred(&self) -> Option<CpuTraceBuffer> {
        self.transferred.lock().expect("transferred lock").take()
    }
}

impl DeviceBackend for RecordingBackend {
    fn prepare_trace(&self, activities: &[BackendActivity]) -> anyhow::Result<()> {
        self.prepared.lock().expect("prepared lock").extend_from_slice(activities);
        Ok(())
    }

    fn init_if_registered(&self) {}

    fn push_correlation_id(&self, id: CorrelationId) {
        self.pushes.lock().expect("pushes lock").push(id.0);
        if self.mirror_correlations.load(Ordering::SeqCst) {
            let record = DeviceActivityRecord::new(
                "device_activity",
                id.0,
                tracelink::now_us(),
                1,
                1,
                BackendActivity::DeviceRuntime,
            );
            self.records.lock().expect("records lock").push(record);
        }
    }

    fn pop_correlation_id(&self) {
        self.pops.fetch_add(1, Ordering::SeqCst);
    }

    fn trace_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn start_trace(&self) -> anyhow::Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            anyhow::bail!("device trace collection failed to start");
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn transfer_cpu_trace(&self, buffer: CpuTraceBuffer) -> anyhow::Result<()> {
        *self.transferred.lock().expect("transferred lock") = Some(buffer);
        Ok(())
    }

    fn stop_trace(&self) -> anyhow::Result<Option<DeviceTrace>> {
        self.active.store(false, Ordering::SeqCst);
        if self.missing_trace.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let records = std::mem::take(&mut *self.records.lock().expect("records lock"));
        Ok(Some(DeviceTrace { records }))
    }
}
