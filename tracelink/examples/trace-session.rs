//! Demo host: wires an in-process scope-hook registry and a toy device
//! backend into the engine, runs a session over a few worker threads, and
//! dumps the merged result as JSONL.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example trace-session
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracelink::{
    CallbackHandle, CorrelationId, CpuTraceBuffer, DeviceBackend, DeviceTrace, ScopeCallbacks,
    ScopeHookRegistry, ScopeRecord, SessionConfig, SessionController,
};
use tracelink_common::{ActivityKind, BackendActivity, DeviceActivityRecord, ScopeKind};

/// Minimal host-side hook registry: stores the registered pair and brackets
/// scopes with it.
#[derive(Default)]
struct DemoHooks {
    callbacks: RwLock<HashMap<u64, Arc<ScopeCallbacks>>>,
    next_handle: AtomicU64,
}

impl DemoHooks {
    fn run_scope(&self, record: &ScopeRecord<'_>, body: impl FnOnce()) {
        let pairs: Vec<Arc<ScopeCallbacks>> =
            self.callbacks.read().expect("callbacks lock").values().cloned().collect();
        let contexts: Vec<_> = pairs.iter().map(|cb| (cb.on_enter)(record)).collect();
        body();
        for (cb, context) in pairs.iter().zip(contexts) {
            (cb.on_exit)(record, context);
        }
    }
}

impl ScopeHookRegistry for DemoHooks {
    fn register(&self, callbacks: ScopeCallbacks) -> CallbackHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.callbacks.write().expect("callbacks lock").insert(id, Arc::new(callbacks));
        CallbackHandle(id)
    }

    fn remove(&self, handle: CallbackHandle) {
        self.callbacks.write().expect("callbacks lock").remove(&handle.0);
    }
}

/// Toy device backend: mirrors every pushed correlation id as one
/// device-side kernel record so the merged result has something to enrich
/// from.
#[derive(Default)]
struct DemoBackend {
    active: AtomicBool,
    records: Mutex<Vec<DeviceActivityRecord>>,
}

impl DeviceBackend for DemoBackend {
    fn prepare_trace(&self, activities: &[BackendActivity]) -> Result<()> {
        log::info!("backend prepared for {activities:?}");
        Ok(())
    }

    fn init_if_registered(&self) {}

    fn push_correlation_id(&self, id: CorrelationId) {
        let record = DeviceActivityRecord::new(
            "demo_kernel",
            id.0,
            tracelink::now_us(),
            150,
            1,
            BackendActivity::ConcurrentKernel,
        );
        self.records.lock().expect("records lock").push(record);
    }

    fn pop_correlation_id(&self) {}

    fn trace_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn start_trace(&self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn transfer_cpu_trace(&self, buffer: CpuTraceBuffer) -> Result<()> {
        log::info!(
            "backend received cpu trace '{}' with {} activities",
            buffer.span.name,
            buffer.activities.len()
        );
        Ok(())
    }

    fn stop_trace(&self) -> Result<Option<DeviceTrace>> {
        self.active.store(false, Ordering::SeqCst);
        let records = std::mem::take(&mut *self.records.lock().expect("records lock"));
        Ok(Some(DeviceTrace { records }))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let hooks = Arc::new(DemoHooks::default());
    let backend = Arc::new(DemoBackend::default());
    let engine = SessionController::new(
        Arc::clone(&hooks) as Arc<dyn ScopeHookRegistry>,
        Arc::clone(&backend) as Arc<dyn DeviceBackend>,
    );

    let config = SessionConfig { report_input_shapes: true, ..SessionConfig::default() };
    let activities = [ActivityKind::Cpu, ActivityKind::Device];
    engine.prepare_session(config, &activities)?;
    engine.enable_session(config, &activities)?;

    let workers: Vec<_> = (0..3)
        .map(|worker| {
            let hooks = Arc::clone(&hooks);
            thread::spawn(move || {
                let shapes = vec![vec![64_i64, 128], vec![128]];
                for step in 0..4 {
                    let name = format!("worker{worker}::step{step}");
                    let record = ScopeRecord {
                        name: &name,
                        kind: ScopeKind::Function,
                        sequence: step,
                        forward_thread: tracelink::current_thread_id(),
                        input_shapes: Some(&shapes),
                    };
                    hooks.run_scope(&record, || thread::sleep(Duration::from_millis(2)));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let result = engine.disable_session()?;

    println!(
        "captured {} events across {} threads ({} device records)",
        result.event_count(),
        result.events_by_thread().len(),
        result.device_trace().len()
    );
    for event in result.flattened() {
        println!("{}", serde_json::to_string(event)?);
    }
    for warning in result.warnings() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
