//! Lifecycle of one asynchronous backend job as seen by a view.
//!
//! DESIGN
//! ======
//! The state is replaced wholesale on every transition so observers always
//! receive a complete, self-describing value instead of field-level deltas.

#[cfg(test)]
#[path = "job_test.rs"]
mod job_test;

/// Final payload of a successful AI recommendation job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub text: String,
}

/// `idle → requesting → {pending → requesting … | succeeded | failed}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AsyncJobState {
    #[default]
    Idle,
    /// A status request is in flight.
    Requesting,
    /// The server reported the job is still computing.
    Pending,
    Succeeded(Recommendation),
    Failed(String),
}

impl AsyncJobState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&Recommendation> {
        match self {
            Self::Succeeded(rec) => Some(rec),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Pending => "pending",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}
