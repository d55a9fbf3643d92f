//! REST service boundary for desks, participants, and AI recommendations.
//!
//! DESIGN
//! ======
//! Controllers depend on the [`DeskApi`] trait only, so tests swap in an
//! in-memory fake and the real client stays a thin reqwest wrapper.
//!
//! ERROR HANDLING
//! ==============
//! Status codes are folded into [`ClientError`] here (403 and 404 get their
//! own variants) so callers never inspect raw HTTP responses.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::types::{JobStatusResponse, Participant, Role, RoleUpdate, User};
use crate::config::ClientConfig;
use crate::error::ClientError;

const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// SERVICE BOUNDARY
// =============================================================================

/// Remote operations consumed by the view controllers.
#[async_trait::async_trait]
pub trait DeskApi: Send + Sync {
    /// Request (or re-poll) the AI recommendation for a task.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport or non-success status.
    async fn request_ai_recommendation(
        &self,
        desk_id: &str,
        task_id: &str,
        context_time_ms: Option<i64>,
    ) -> Result<JobStatusResponse, ClientError>;

    /// Fetch the ordered participant list of a desk.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport or non-success status.
    async fn fetch_participants(&self, desk_id: &str) -> Result<Vec<Participant>, ClientError>;

    /// Change the role of one participant.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport or non-success status.
    async fn update_participant_role(&self, desk_id: &str, user_id: &str, role: Role) -> Result<(), ClientError>;

    /// Detach a participant from a desk.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport or non-success status.
    async fn remove_participant(&self, desk_id: &str, user_id: &str) -> Result<(), ClientError>;

    /// Fetch the currently authenticated user.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport or non-success status.
    async fn fetch_current_user(&self) -> Result<User, ClientError>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

fn ai_recommendation_endpoint(base: &str, desk_id: &str, task_id: &str, context_time_ms: Option<i64>) -> String {
    let url = format!("{base}/desks/{desk_id}/tasks/{task_id}/ai-recommendation");
    match context_time_ms {
        Some(ts) => format!("{url}?contextTime={ts}"),
        None => url,
    }
}

fn participants_endpoint(base: &str, desk_id: &str) -> String {
    format!("{base}/desks/{desk_id}/participants")
}

fn participant_endpoint(base: &str, desk_id: &str, user_id: &str) -> String {
    format!("{base}/desks/{desk_id}/participants/{user_id}")
}

fn current_user_endpoint(base: &str) -> String {
    format!("{base}/auth/me")
}

/// Pull a human-readable message out of an error body, if the backend sent one.
fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_owned)
}

fn status_error(status: u16, body: String) -> ClientError {
    match status {
        403 => ClientError::Forbidden(body_message(&body)),
        404 => ClientError::NotFound(body_message(&body)),
        _ => ClientError::Server { status, body },
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// [`DeskApi`] over HTTP + JSON.
pub struct HttpDeskApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDeskApi {
    /// Build the HTTP client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if reqwest cannot build a client.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone(), token: config.api_token.clone() })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%method, %url, %request_id, "desk api request");
        let builder = self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status = status.as_u16(), error = %err, "failed to read error response body");
                String::new()
            }
        };
        Err(status_error(status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DeskApi for HttpDeskApi {
    async fn request_ai_recommendation(
        &self,
        desk_id: &str,
        task_id: &str,
        context_time_ms: Option<i64>,
    ) -> Result<JobStatusResponse, ClientError> {
        let url = ai_recommendation_endpoint(&self.base_url, desk_id, task_id, context_time_ms);
        self.send_json(self.request(reqwest::Method::GET, &url)).await
    }

    async fn fetch_participants(&self, desk_id: &str) -> Result<Vec<Participant>, ClientError> {
        let url = participants_endpoint(&self.base_url, desk_id);
        self.send_json(self.request(reqwest::Method::GET, &url)).await
    }

    async fn update_participant_role(&self, desk_id: &str, user_id: &str, role: Role) -> Result<(), ClientError> {
        let url = participant_endpoint(&self.base_url, desk_id, user_id);
        let builder = self.request(reqwest::Method::PATCH, &url).json(&RoleUpdate { role });
        self.send(builder).await.map(|_| ())
    }

    async fn remove_participant(&self, desk_id: &str, user_id: &str) -> Result<(), ClientError> {
        let url = participant_endpoint(&self.base_url, desk_id, user_id);
        self.send(self.request(reqwest::Method::DELETE, &url))
            .await
            .map(|_| ())
    }

    async fn fetch_current_user(&self) -> Result<User, ClientError> {
        let url = current_user_endpoint(&self.base_url);
        self.send_json(self.request(reqwest::Method::GET, &url)).await
    }
}
