//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AI_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_AI_POLL_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_AI_POLL_DEADLINE_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Timing knobs for the AI recommendation panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiPanelSettings {
    /// Quiet period before a changed input triggers a request.
    pub debounce: Duration,
    /// Delay between two status polls while the job is waiting.
    pub poll_interval: Duration,
    /// Total polling budget; `None` polls until a terminal response.
    pub poll_deadline: Option<Duration>,
}

impl Default for AiPanelSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_AI_DEBOUNCE_MS),
            poll_interval: Duration::from_millis(DEFAULT_AI_POLL_INTERVAL_MS),
            poll_deadline: Some(Duration::from_secs(DEFAULT_AI_POLL_DEADLINE_SECS)),
        }
    }
}

/// Behavior of the participants screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticipantsSettings {
    /// Re-fetch the list after every successful write.
    pub reconcile_after_mutation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub timeouts: HttpTimeouts,
    pub ai_panel: AiPanelSettings,
    pub participants: ParticipantsSettings,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `DESK_API_BASE_URL`: default `http://127.0.0.1:8080/api`
    /// - `DESK_API_TOKEN`: bearer token sent with every request
    /// - `DESK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DESK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AI_DEBOUNCE_MS`: default 1000
    /// - `AI_POLL_INTERVAL_MS`: default 1500
    /// - `AI_POLL_DEADLINE_SECS`: default 300, `0` disables the deadline
    /// - `RECONCILE_AFTER_MUTATION`: `true`/`1` to re-fetch after writes
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_base_url = parse_base_url(
            std::env::var("DESK_API_BASE_URL")
                .ok()
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let api_token = std::env::var("DESK_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let timeouts = HttpTimeouts {
            request_secs: env_parse("DESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("DESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let deadline_secs = env_parse("AI_POLL_DEADLINE_SECS", DEFAULT_AI_POLL_DEADLINE_SECS);
        let ai_panel = AiPanelSettings {
            debounce: Duration::from_millis(env_parse("AI_DEBOUNCE_MS", DEFAULT_AI_DEBOUNCE_MS)),
            poll_interval: Duration::from_millis(env_parse("AI_POLL_INTERVAL_MS", DEFAULT_AI_POLL_INTERVAL_MS)),
            poll_deadline: (deadline_secs > 0).then(|| Duration::from_secs(deadline_secs)),
        };
        let participants = ParticipantsSettings {
            reconcile_after_mutation: parse_flag(std::env::var("RECONCILE_AFTER_MUTATION").ok().as_deref()),
        };

        Ok(Self { api_base_url, api_token, timeouts, ai_panel, participants })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "DESK_API_BASE_URL must start with http:// or https:// (got '{raw}')"
        )));
    }
    Ok(trimmed.to_owned())
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("1" | "true" | "TRUE" | "yes"))
}
