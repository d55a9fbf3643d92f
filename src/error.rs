//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every remote call returns `ClientError`. View controllers convert it into a
//! display string via [`ClientError::user_message`] and store it on the view;
//! nothing above the controller boundary ever sees a raw error.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

pub const NETWORK_FAILURE_MESSAGE: &str = "Network error. Please check your connection and try again.";
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "The requested item no longer exists.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors produced by the REST boundary and local validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// 403 from the backend.
    #[error("forbidden")]
    Forbidden(Option<String>),

    /// 404 from the backend.
    #[error("not found")]
    NotFound(Option<String>),

    /// Any other non-success status.
    #[error("server responded with status {status}")]
    Server { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// Rejected locally before any request was issued.
    #[error("{0}")]
    NotPermitted(String),
}

impl ClientError {
    /// Text shown inline next to the affected control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout => NETWORK_FAILURE_MESSAGE.to_owned(),
            Self::Forbidden(Some(msg)) if !msg.trim().is_empty() => msg.clone(),
            Self::Forbidden(_) => PERMISSION_DENIED_MESSAGE.to_owned(),
            Self::NotFound(Some(msg)) if !msg.trim().is_empty() => msg.clone(),
            Self::NotFound(_) => NOT_FOUND_MESSAGE.to_owned(),
            Self::NotPermitted(msg) => msg.clone(),
            Self::Server { .. } | Self::Decode(_) | Self::Config(_) | Self::HttpClientBuild(_) => {
                GENERIC_FAILURE_MESSAGE.to_owned()
            }
        }
    }

    /// Stable code used in structured logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout => "E_TIMEOUT",
            Self::Forbidden(_) => "E_FORBIDDEN",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Server { .. } => "E_SERVER",
            Self::Decode(_) => "E_DECODE",
            Self::Config(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::NotPermitted(_) => "E_NOT_PERMITTED",
        }
    }

    /// Whether a manual retry has a reasonable chance of succeeding.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Server { status: 429 | 500..=599, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
