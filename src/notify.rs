//! Parsed-notification queue
//!
//! Callbacks subscribed before resolution are held pending; at resolution
//! each runs on its own detached thread so subscriber logic cannot prolong
//! the registry's critical section. Join handles are retained so a test
//! harness can await completion instead of racing background threads.

use std::thread::JoinHandle;

pub(crate) type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
pub(crate) struct NotifyQueue {
    pending: Vec<Callback>,
    handles: Vec<JoinHandle<()>>,
}

impl NotifyQueue {
    /// Hold a callback until resolution
    pub(crate) fn enqueue(&mut self, callback: Callback) {
        self.pending.push(callback);
    }

    /// Run a callback now on a detached thread (late subscription)
    pub(crate) fn dispatch_now(&mut self, callback: Callback) {
        self.handles.push(std::thread::spawn(callback));
    }

    /// Dispatch every pending callback, unordered, without waiting
    pub(crate) fn dispatch_pending(&mut self) {
        for callback in self.pending.drain(..) {
            self.handles.push(std::thread::spawn(callback));
        }
    }

    /// Take the outstanding join handles.
    ///
    /// Joining must happen outside the registry lock: callbacks may call
    /// back into the registry.
    pub(crate) fn take_handles(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.handles)
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_pending_then_dispatch() {
        let mut queue = NotifyQueue::default();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        queue.enqueue(Box::new(move || flag.store(true, Ordering::SeqCst)));
        assert_eq!(queue.pending_len(), 1);
        assert!(!fired.load(Ordering::SeqCst));

        queue.dispatch_pending();
        for handle in queue.take_handles() {
            let _ = handle.join();
        }
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dispatch_now_runs_immediately() {
        let mut queue = NotifyQueue::default();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        queue.dispatch_now(Box::new(move || flag.store(true, Ordering::SeqCst)));
        for handle in queue.take_handles() {
            let _ = handle.join();
        }
        assert!(fired.load(Ordering::SeqCst));
    }
}
