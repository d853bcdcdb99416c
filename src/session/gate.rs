//! Notification gate
//!
//! Serializes observer dispatch against `close()`. The worker holds the gate
//! while it checks the state and runs a callback; `close()` waits for it, so
//! once `close()` returns no connected, data or error callback can start.
//! A `close()` made from inside a callback on the dispatching thread passes
//! straight through.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Default)]
pub(super) struct NotifyGate {
    lock: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

/// Clears the recorded holder even if the callback panics.
struct HolderReset<'a>(&'a NotifyGate);

impl Drop for HolderReset<'_> {
    fn drop(&mut self) {
        self.0.set_holder(None);
    }
}

impl NotifyGate {
    /// Runs `f` with the gate held by the current thread.
    pub(super) fn dispatch<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = lock(&self.lock);
        self.set_holder(Some(thread::current().id()));
        let _reset = HolderReset(self);
        f()
    }

    /// Waits until no dispatch is in progress. Returns `None` when called from
    /// within a dispatch on this thread.
    pub(super) fn enter(&self) -> Option<MutexGuard<'_, ()>> {
        if *lock(&self.holder) == Some(thread::current().id()) {
            return None;
        }
        Some(lock(&self.lock))
    }

    fn set_holder(&self, holder: Option<ThreadId>) {
        *lock(&self.holder) = holder;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn enter_waits_for_running_dispatch() {
        let gate = Arc::new(NotifyGate::default());
        let finished = Arc::new(AtomicBool::new(false));
        let (inside_tx, inside_rx) = mpsc::channel();

        let worker = {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                gate.dispatch(|| {
                    inside_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(100));
                    finished.store(true, Ordering::SeqCst);
                });
            })
        };

        inside_rx.recv().unwrap();
        let guard = gate.enter();
        assert!(guard.is_some());
        assert!(finished.load(Ordering::SeqCst));
        drop(guard);
        worker.join().unwrap();
    }

    #[test]
    fn enter_inside_dispatch_does_not_block() {
        let gate = NotifyGate::default();
        let reentered = gate.dispatch(|| gate.enter().is_none());
        assert!(reentered);
        assert!(gate.enter().is_some());
    }
}
