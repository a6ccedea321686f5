//! Process-visible session registry
//!
//! One shared-ownership slot per [`SessionKind`], readable from any thread.
//! Enable pushes the session state in, disable pops it out, and the scope
//! callbacks look it up on every instrumented call, so the read path is a
//! single `RwLock` read plus an `Arc` clone.
//!
//! Push/pop discipline is explicit: a slot holds at most one session, and a
//! push against an occupied slot is refused rather than stacked.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::session::SessionState;

/// Key identifying which kind of session a registry slot holds.
///
/// Currently only tracing sessions exist; the key keeps the discipline
/// explicit and leaves room for sibling session kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Tracing = 0,
}

const SESSION_KINDS: usize = 1;

static SLOTS: [RwLock<Option<Arc<SessionState>>>; SESSION_KINDS] = [RwLock::new(None)];

fn slot(kind: SessionKind) -> &'static RwLock<Option<Arc<SessionState>>> {
    &SLOTS[kind as usize]
}

fn read_slot(kind: SessionKind) -> RwLockReadGuard<'static, Option<Arc<SessionState>>> {
    match slot(kind).read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_slot(kind: SessionKind) -> RwLockWriteGuard<'static, Option<Arc<SessionState>>> {
    match slot(kind).write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Install `state` as the active session for `kind`.
///
/// Returns `false` (leaving the slot untouched) when a session is already
/// registered; the check-and-set is atomic under the slot's write lock.
#[must_use]
pub fn push(kind: SessionKind, state: Arc<SessionState>) -> bool {
    let mut guard = write_slot(kind);
    if guard.is_some() {
        return false;
    }
    *guard = Some(state);
    true
}

/// Remove and return the active session for `kind`.
///
/// After this returns, no scope-enter can observe the session any more.
pub fn pop(kind: SessionKind) -> Option<Arc<SessionState>> {
    write_slot(kind).take()
}

/// Shared handle to the active session for `kind`, if any.
#[must_use]
pub fn current(kind: SessionKind) -> Option<Arc<SessionState>> {
    read_slot(kind).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;

    // Single test so nothing else races the process-wide Tracing slot.
    #[test]
    fn test_push_current_pop_discipline() {
        let state = Arc::new(SessionState::new(SessionConfig::default(), "test", 1));

        assert!(current(SessionKind::Tracing).is_none());
        assert!(push(SessionKind::Tracing, Arc::clone(&state)));

        let seen = current(SessionKind::Tracing).expect("registered");
        assert!(Arc::ptr_eq(&seen, &state));

        // Occupied slot refuses a second push
        let other = Arc::new(SessionState::new(SessionConfig::default(), "other", 2));
        assert!(!push(SessionKind::Tracing, other));

        let popped = pop(SessionKind::Tracing).expect("still registered");
        assert!(Arc::ptr_eq(&popped, &state));
        assert!(current(SessionKind::Tracing).is_none());
        assert!(pop(SessionKind::Tracing).is_none());
    }
}
