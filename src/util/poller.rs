//! Poll an asynchronous backend job until it reaches a terminal state.
//!
//! DESIGN
//! ======
//! The poller is one sequential loop: emit `Requesting`, await one status
//! response, emit the resulting state, then either stop or sleep for the poll
//! interval. The next request is only issued after the previous response was
//! processed, so an instance never has a timer and a request racing each other.
//!
//! CANCELLATION
//! ============
//! The loop runs inside a [`TaskHandle`](super::task::TaskHandle). The flag is
//! checked before each request and before each emit, so once the owner
//! cancels, no further request goes out and no stale state reaches the view.

#[cfg(test)]
#[path = "poller_test.rs"]
mod poller_test;

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::task::CancelFlag;
use crate::config::AiPanelSettings;
use crate::error::ClientError;
use crate::net::types::{JobStatus, JobStatusResponse};
use crate::state::job::{AsyncJobState, Recommendation};

pub const JOB_FAILED_MESSAGE: &str = "Failed to get AI recommendation.";
pub const POLL_TIMEOUT_MESSAGE: &str = "Timed out waiting for AI recommendation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Give up once this much time has been spent polling. `None` polls forever.
    pub deadline: Option<Duration>,
}

impl From<&AiPanelSettings> for PollSettings {
    fn from(settings: &AiPanelSettings) -> Self {
        Self { interval: settings.poll_interval, deadline: settings.poll_deadline }
    }
}

/// Map one status response to the next job state.
fn next_state(response: Result<JobStatusResponse, ClientError>) -> AsyncJobState {
    match response {
        Ok(JobStatusResponse { status: JobStatus::Waiting, .. }) => AsyncJobState::Pending,
        Ok(JobStatusResponse { status: JobStatus::Success, result }) => {
            AsyncJobState::Succeeded(Recommendation { text: result.unwrap_or_default() })
        }
        Ok(JobStatusResponse { status: JobStatus::Error, result }) => AsyncJobState::Failed(
            result
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| JOB_FAILED_MESSAGE.to_owned()),
        ),
        Err(err) => {
            warn!(error = %err, code = err.error_code(), retryable = err.retryable(), "job status request failed");
            AsyncJobState::Failed(err.user_message())
        }
    }
}

/// Drive a job to completion.
///
/// `fetch` issues one status request; `emit` receives every transition.
/// Returns the terminal state, or `None` if cancelled first.
pub async fn drive_job<F, Fut, E>(
    settings: PollSettings,
    cancel: &CancelFlag,
    mut fetch: F,
    mut emit: E,
) -> Option<AsyncJobState>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobStatusResponse, ClientError>>,
    E: FnMut(AsyncJobState),
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return None;
        }
        emit(AsyncJobState::Requesting);
        attempt += 1;
        debug!(attempt, "polling job status");

        let response = fetch().await;
        if cancel.is_cancelled() {
            return None;
        }

        let state = next_state(response);
        if state.is_terminal() {
            debug!(attempt, state = state.label(), "job reached terminal state");
            emit(state.clone());
            return Some(state);
        }
        emit(state);

        // never sleep past the deadline
        let wait = match settings.deadline {
            Some(deadline) => settings.interval.min(deadline.saturating_sub(started.elapsed())),
            None => settings.interval,
        };
        tokio::time::sleep(wait).await;
        if cancel.is_cancelled() {
            return None;
        }

        if settings.deadline.is_some_and(|deadline| started.elapsed() >= deadline) {
            warn!(attempt, elapsed_ms = started.elapsed().as_millis(), "job polling deadline exceeded");
            let timed_out = AsyncJobState::Failed(POLL_TIMEOUT_MESSAGE.to_owned());
            emit(timed_out.clone());
            return Some(timed_out);
        }
    }
}
