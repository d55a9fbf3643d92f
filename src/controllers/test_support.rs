//! In-memory `DeskApi` used by controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ClientError;
use crate::net::api::DeskApi;
use crate::net::types::{JobStatusResponse, Participant, Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WriteCall {
    Role { desk_id: String, user_id: String, role: Role },
    Remove { desk_id: String, user_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AiCall {
    pub desk_id: String,
    pub task_id: String,
    pub context_time_ms: Option<i64>,
}

#[derive(Default)]
pub(crate) struct FakeDeskApi {
    /// Scripted AI responses; once drained every poll answers `waiting`.
    pub ai_responses: Mutex<VecDeque<Result<JobStatusResponse, ClientError>>>,
    pub ai_calls: Mutex<Vec<AiCall>>,
    pub ai_delay: Duration,
    pub participants: Mutex<HashMap<String, Result<Vec<Participant>, ClientError>>>,
    pub fetch_delays: HashMap<String, Duration>,
    pub fetch_calls: Mutex<Vec<String>>,
    /// Scripted write results; once drained every write succeeds.
    pub write_results: Mutex<VecDeque<Result<(), ClientError>>>,
    pub write_calls: Mutex<Vec<WriteCall>>,
    pub write_delay: Duration,
    pub current_user: Option<User>,
}

impl FakeDeskApi {
    pub fn with_ai_responses(responses: Vec<Result<JobStatusResponse, ClientError>>) -> Self {
        Self { ai_responses: Mutex::new(responses.into()), ..Self::default() }
    }

    pub fn set_participants(&self, desk_id: &str, items: Vec<Participant>) {
        self.participants
            .lock()
            .unwrap()
            .insert(desk_id.to_owned(), Ok(items));
    }

    pub fn push_write_result(&self, result: Result<(), ClientError>) {
        self.write_results.lock().unwrap().push_back(result);
    }

    pub fn ai_call_count(&self) -> usize {
        self.ai_calls.lock().unwrap().len()
    }

    pub fn write_call_count(&self) -> usize {
        self.write_calls.lock().unwrap().len()
    }

    fn next_write(&self, call: WriteCall) -> Result<(), ClientError> {
        self.write_calls.lock().unwrap().push(call);
        self.write_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait::async_trait]
impl DeskApi for FakeDeskApi {
    async fn request_ai_recommendation(
        &self,
        desk_id: &str,
        task_id: &str,
        context_time_ms: Option<i64>,
    ) -> Result<JobStatusResponse, ClientError> {
        self.ai_calls.lock().unwrap().push(AiCall {
            desk_id: desk_id.to_owned(),
            task_id: task_id.to_owned(),
            context_time_ms,
        });
        let response = self
            .ai_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(JobStatusResponse::waiting()));
        if !self.ai_delay.is_zero() {
            tokio::time::sleep(self.ai_delay).await;
        }
        response
    }

    async fn fetch_participants(&self, desk_id: &str) -> Result<Vec<Participant>, ClientError> {
        self.fetch_calls.lock().unwrap().push(desk_id.to_owned());
        if let Some(delay) = self.fetch_delays.get(desk_id) {
            tokio::time::sleep(*delay).await;
        }
        self.participants
            .lock()
            .unwrap()
            .get(desk_id)
            .cloned()
            .unwrap_or(Err(ClientError::NotFound(None)))
    }

    async fn update_participant_role(&self, desk_id: &str, user_id: &str, role: Role) -> Result<(), ClientError> {
        let result = self.next_write(WriteCall::Role {
            desk_id: desk_id.to_owned(),
            user_id: user_id.to_owned(),
            role,
        });
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        result
    }

    async fn remove_participant(&self, desk_id: &str, user_id: &str) -> Result<(), ClientError> {
        let result = self.next_write(WriteCall::Remove { desk_id: desk_id.to_owned(), user_id: user_id.to_owned() });
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        result
    }

    async fn fetch_current_user(&self) -> Result<User, ClientError> {
        self.current_user
            .clone()
            .ok_or(ClientError::Forbidden(None))
    }
}

pub(crate) fn participant(id: &str, role: Role) -> Participant {
    Participant { id: id.to_owned(), name: format!("user {id}"), email: None, role }
}

pub(crate) fn user(id: &str) -> User {
    User { id: id.to_owned(), name: format!("user {id}"), email: None }
}
