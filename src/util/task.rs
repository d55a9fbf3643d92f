//! Cancellable background work.
//!
//! DESIGN
//! ======
//! Every delayed or repeated action runs inside a [`TaskHandle`] owned by the
//! component that spawned it. Cancelling raises a shared [`CancelFlag`] and
//! aborts the tokio task, so the body stops at its next await point and can
//! also check the flag between synchronous steps. Dropping the handle cancels.

#[cfg(test)]
#[path = "task_test.rs"]
mod task_test;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

/// Shared cancellation marker checked by running task bodies.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owned handle to a spawned task; cancels on drop.
#[derive(Debug)]
pub struct TaskHandle {
    flag: CancelFlag,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `body` on the current tokio runtime, passing it the flag that
    /// [`TaskHandle::cancel`] will raise.
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancelFlag) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let flag = CancelFlag::new();
        let handle = tokio::spawn(body(flag.clone()));
        Self { flag, handle }
    }

    pub fn cancel(&self) {
        self.flag.cancel();
        self.handle.abort();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
