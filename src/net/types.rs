//! Wire schema shared with the desk backend.
//!
//! DESIGN
//! ======
//! These mirror the backend JSON exactly; controllers translate them into
//! view state (`state::job`, `state::participants`) rather than rendering
//! them directly.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by `/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Role of a participant on a desk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Creator,
    Contributor,
    Member,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "CREATOR",
            Self::Contributor => "CONTRIBUTOR",
            Self::Member => "MEMBER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATOR" => Ok(Self::Creator),
            "CONTRIBUTOR" => Ok(Self::Contributor),
            "MEMBER" => Ok(Self::Member),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user attached to a desk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

/// Body of a role change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Status reported by an asynchronous backend job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Waiting,
    Error,
}

/// One response from the AI recommendation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<String>,
}

impl JobStatusResponse {
    #[must_use]
    pub fn waiting() -> Self {
        Self { status: JobStatus::Waiting, result: None }
    }

    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self { status: JobStatus::Success, result: Some(text.into()) }
    }

    #[must_use]
    pub fn error(text: Option<&str>) -> Self {
        Self { status: JobStatus::Error, result: text.map(str::to_owned) }
    }
}
