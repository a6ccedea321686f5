//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a correlation id
//! where a thread id is expected, and host the process-wide identity sources
//! every session draws from.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Correlation id
///
/// Links a CPU-observed scope to activities independently reported by the
/// device tracing backend for the same logical operation. Unique and strictly
/// increasing across the process; never reused, never 0 for a real scope
/// (0 marks synthetic events that have no device-side counterpart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corr#{}", self.0)
    }
}

/// Logical thread id
///
/// Lazily assigned to each OS thread the first time it is observed, from a
/// process-wide counter. Distinct from the kernel TID (see [`os_thread_id`]):
/// logical ids are dense, stable for the thread's lifetime, and comparable
/// across everything this engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}

static NEXT_CORRELATION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static LOGICAL_THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Issue the next correlation id.
///
/// Lock-free; ids start at 1 and strictly increase for the lifetime of the
/// process. Gaps are acceptable, duplicates are not.
#[must_use]
pub fn next_correlation_id() -> CorrelationId {
    CorrelationId(NEXT_CORRELATION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Logical id of the calling thread, assigning one on first use.
#[must_use]
pub fn current_thread_id() -> ThreadId {
    LOGICAL_THREAD_ID.with(|slot| {
        let mut id = slot.get();
        if id == 0 {
            id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
            slot.set(id);
        }
        ThreadId(id)
    })
}

/// Kernel-level id of the calling thread.
///
/// Recorded on backend-facing activities next to the logical id so device
/// traces can be lined up against OS-level tooling.
#[cfg(target_os = "linux")]
#[must_use]
#[allow(unsafe_code, clippy::cast_sign_loss)]
pub fn os_thread_id() -> u64 {
    // SAFETY: gettid has no preconditions and cannot fail.
    (unsafe { libc::gettid() }) as u64
}

/// Kernel-level id of the calling thread.
///
/// Falls back to the logical id on platforms without a cheap TID syscall.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn os_thread_id() -> u64 {
    current_thread_id().0
}

/// Current wall-clock time in microseconds since the UNIX epoch.
///
/// Device backends report in the same unit, which keeps merged results on one
/// clock without translation.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_us() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_micros() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_display() {
        assert_eq!(CorrelationId(7).to_string(), "corr#7");
    }

    #[test]
    fn test_thread_id_display() {
        assert_eq!(ThreadId(3).to_string(), "thread#3");
    }

    #[test]
    fn test_correlation_ids_strictly_increase() {
        let a = next_correlation_id();
        let b = next_correlation_id();
        let c = next_correlation_id();
        assert!(a < b && b < c);
        assert!(a.0 >= 1);
    }

    #[test]
    fn test_thread_id_stable_within_thread() {
        assert_eq!(current_thread_id(), current_thread_id());
    }

    #[test]
    fn test_thread_ids_distinct_across_threads() {
        let here = current_thread_id();
        let there = std::thread::spawn(current_thread_id).join().expect("thread panicked");
        assert_ne!(here, there);
    }

    #[test]
    fn test_now_us_is_nonzero_and_monotonic_enough() {
        let a = now_us();
        let b = now_us();
        assert!(a > 0);
        assert!(b >= a);
    }
}
