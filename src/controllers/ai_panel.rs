//! AI recommendation panel controller.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owns the panel shown next to a task: input changes go through a
//! [`Debouncer`], the debounced action drives the recommendation job with
//! [`drive_job`], and every transition lands in [`AiPanelView`].
//!
//! CANCELLATION
//! ============
//! Each input change, permission revocation, or teardown bumps a generation
//! counter and cancels the running task. Transitions tagged with an older
//! generation are dropped, so a response that was already in flight can
//! never overwrite the state of newer inputs.

#[cfg(test)]
#[path = "ai_panel_test.rs"]
mod ai_panel_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::AiPanelSettings;
use crate::net::api::DeskApi;
use crate::state::job::AsyncJobState;
use crate::util::debounce::Debouncer;
use crate::util::poller::{PollSettings, drive_job};
use crate::util::task::CancelFlag;

/// Everything the recommendation depends on. A change to any field starts a
/// new debounce cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiPanelInputs {
    pub desk_id: String,
    pub task_id: String,
    pub description: String,
    pub stack: Vec<String>,
    /// Last-modified time of the task, forwarded as `contextTime`.
    pub context_time_ms: Option<i64>,
}

/// Read-only state rendered by the panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AiPanelView {
    pub job: AsyncJobState,
    pub is_polling: bool,
    pub can_request: bool,
    pub inputs: Option<AiPanelInputs>,
}

struct Shared {
    view: AiPanelView,
    generation: u64,
    subscribers: Vec<mpsc::UnboundedSender<AsyncJobState>>,
}

impl Shared {
    /// Replace the job state and notify subscribers.
    fn set_job(&mut self, job: AsyncJobState) {
        match job {
            AsyncJobState::Pending => self.view.is_polling = true,
            AsyncJobState::Idle | AsyncJobState::Succeeded(_) | AsyncJobState::Failed(_) => {
                self.view.is_polling = false;
            }
            AsyncJobState::Requesting => {}
        }
        self.subscribers.retain(|tx| tx.send(job.clone()).is_ok());
        self.view.job = job;
    }

    /// Invalidate in-flight work and return the new generation.
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        if self.view.job != AsyncJobState::Idle {
            self.set_job(AsyncJobState::Idle);
        }
        self.view.is_polling = false;
        self.generation
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(shared: &Mutex<Shared>, generation: u64, job: AsyncJobState) {
    let mut guard = lock(shared);
    if guard.generation != generation {
        debug!(generation, current = guard.generation, state = job.label(), "dropping stale job transition");
        return;
    }
    guard.set_job(job);
}

pub struct AiPanelController {
    api: Arc<dyn DeskApi>,
    settings: AiPanelSettings,
    shared: Arc<Mutex<Shared>>,
    debouncer: Debouncer,
}

impl AiPanelController {
    #[must_use]
    pub fn new(api: Arc<dyn DeskApi>, settings: AiPanelSettings) -> Self {
        Self {
            api,
            settings,
            shared: Arc::new(Mutex::new(Shared { view: AiPanelView::default(), generation: 0, subscribers: Vec::new() })),
            debouncer: Debouncer::new(settings.debounce),
        }
    }

    /// Feed the latest task inputs and permission flag.
    ///
    /// Identical inputs and permission are ignored. Otherwise any scheduled
    /// or running request is cancelled, the job resets to `Idle`, and, when
    /// permitted, a new request is scheduled after the debounce period.
    pub fn set_inputs(&mut self, inputs: AiPanelInputs, can_request: bool) {
        let generation = {
            let mut guard = lock(&self.shared);
            if guard.view.can_request == can_request && guard.view.inputs.as_ref() == Some(&inputs) {
                return;
            }
            guard.view.inputs = Some(inputs.clone());
            guard.view.can_request = can_request;
            guard.next_generation()
        };
        self.debouncer.cancel();

        if !can_request {
            debug!(task_id = %inputs.task_id, "AI recommendation not permitted; panel reset");
            return;
        }
        self.start(generation, inputs, false);
    }

    /// Re-run the request for the current inputs immediately.
    ///
    /// Only allowed once the previous job has failed. Returns whether a new
    /// request was started.
    pub fn retry(&mut self) -> bool {
        let (generation, inputs) = {
            let mut guard = lock(&self.shared);
            let Some(inputs) = guard.view.inputs.clone() else {
                return false;
            };
            if !guard.view.can_request || !matches!(guard.view.job, AsyncJobState::Failed(_)) {
                return false;
            }
            (guard.next_generation(), inputs)
        };
        self.start(generation, inputs, true);
        true
    }

    /// Cancel all pending work and discard the job state and inputs.
    pub fn teardown(&mut self) {
        self.debouncer.cancel();
        let mut guard = lock(&self.shared);
        guard.next_generation();
        guard.view = AiPanelView::default();
        guard.subscribers.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> AiPanelView {
        lock(&self.shared).view.clone()
    }

    /// Receive every job transition from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AsyncJobState> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.shared).subscribers.push(tx);
        rx
    }

    /// True while a request is scheduled, in flight, or between polls.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.debouncer.is_active()
    }

    fn start(&mut self, generation: u64, inputs: AiPanelInputs, immediate: bool) {
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.shared);
        let poll = PollSettings::from(&self.settings);

        let action = move |flag: CancelFlag| async move {
            info!(desk_id = %inputs.desk_id, task_id = %inputs.task_id, generation, "requesting AI recommendation");
            let fetch = || {
                let api = Arc::clone(&api);
                let inputs = inputs.clone();
                async move {
                    api.request_ai_recommendation(&inputs.desk_id, &inputs.task_id, inputs.context_time_ms)
                        .await
                }
            };
            let outcome = drive_job(poll, &flag, fetch, |job| publish(&shared, generation, job)).await;
            if let Some(job) = outcome {
                debug!(generation, state = job.label(), "AI recommendation finished");
            }
        };

        if immediate {
            self.debouncer.run_now(action);
        } else {
            self.debouncer.schedule(action);
        }
    }
}

impl Drop for AiPanelController {
    fn drop(&mut self) {
        self.teardown();
    }
}
