//! Debounced trigger: run an action once input has been quiet for a while.
//!
//! Each `schedule` call supersedes the previous one, so a burst of N input
//! changes inside the quiet period produces exactly one run, carrying
//! whatever the last call captured. The scheduled action runs inside the
//! same task as the timer, so cancelling also stops an action that already
//! started.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::future::Future;
use std::time::Duration;

use super::task::{CancelFlag, TaskHandle};

#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<TaskHandle>,
}

impl Debouncer {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Cancel whatever is scheduled or running, then schedule `action`.
    pub fn schedule<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(CancelFlag) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        self.pending = Some(TaskHandle::spawn(move |flag| async move {
            tokio::time::sleep(quiet).await;
            if flag.is_cancelled() {
                return;
            }
            action(flag).await;
        }));
    }

    /// Run `action` right away, still superseding anything scheduled.
    pub fn run_now<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(CancelFlag) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(TaskHandle::spawn(action));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    /// True while an action is waiting out the quiet period or still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }
}
