//! Desk participants controller: list, role changes, removal.
//!
//! SYSTEM CONTEXT
//! ==============
//! Backs the desk settings screen. The participant list is a local cache of
//! the server copy; role changes and removals are applied optimistically and
//! rolled back in place when the backend rejects them.
//!
//! DESIGN
//! ======
//! `load` switches the scope (desk) and bumps a generation counter. Fetches
//! and rollbacks started under an older generation are ignored, so a slow
//! response for the previous desk cannot leak into the current one.
//! `action_in_progress` is an advisory flag: while one write is in flight,
//! further mutations return [`MutationOutcome::Busy`].

#[cfg(test)]
#[path = "participants_test.rs"]
mod participants_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::ParticipantsSettings;
use crate::error::ClientError;
use crate::net::api::DeskApi;
use crate::net::types::Role;
use crate::state::participants::ParticipantList;
use crate::state::session::SessionContext;
use crate::util::optimistic::optimistic;

pub const SIGN_IN_REQUIRED_MESSAGE: &str = "Sign in to manage participants.";
pub const CREATOR_ONLY_MESSAGE: &str = "Only the desk creator can manage participants.";
pub const CREATOR_LOCKED_MESSAGE: &str = "The desk creator cannot be changed or removed.";
pub const NO_DESK_MESSAGE: &str = "No desk is selected.";

/// Read-only state rendered by the participants screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantsView {
    pub desk_id: Option<String>,
    pub participants: ParticipantList,
    pub loading: bool,
    pub action_in_progress: bool,
    pub error: Option<String>,
}

/// Result of a role change or removal request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Applied locally and confirmed by the backend.
    Applied,
    /// Nothing to change; no request was sent.
    Unchanged,
    /// Another mutation is still in flight.
    Busy,
    /// Refused locally; see `error` on the view.
    Rejected,
    /// The backend rejected the write and the local change was reverted.
    RolledBack,
}

#[derive(Default)]
struct Shared {
    view: ParticipantsView,
    generation: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ParticipantsController {
    api: Arc<dyn DeskApi>,
    session: SessionContext,
    settings: ParticipantsSettings,
    shared: Arc<Mutex<Shared>>,
}

impl ParticipantsController {
    #[must_use]
    pub fn new(api: Arc<dyn DeskApi>, session: SessionContext, settings: ParticipantsSettings) -> Self {
        Self { api, session, settings, shared: Arc::new(Mutex::new(Shared::default())) }
    }

    #[must_use]
    pub fn snapshot(&self) -> ParticipantsView {
        lock(&self.shared).view.clone()
    }

    /// Switch to `desk_id` and fetch its participants.
    pub async fn load(&self, desk_id: &str) {
        let generation = {
            let mut guard = lock(&self.shared);
            guard.generation += 1;
            guard.view = ParticipantsView { desk_id: Some(desk_id.to_owned()), loading: true, ..ParticipantsView::default() };
            guard.generation
        };
        info!(desk_id, generation, "loading desk participants");
        self.fetch_into(desk_id, generation).await;
    }

    /// Re-fetch the current desk without changing scope.
    pub async fn refresh(&self) {
        let (desk_id, generation) = {
            let mut guard = lock(&self.shared);
            let Some(desk_id) = guard.view.desk_id.clone() else {
                return;
            };
            guard.view.loading = true;
            (desk_id, guard.generation)
        };
        self.fetch_into(&desk_id, generation).await;
    }

    /// Drop the current scope; anything still in flight is ignored.
    pub fn teardown(&self) {
        let mut guard = lock(&self.shared);
        guard.generation += 1;
        guard.view = ParticipantsView::default();
    }

    /// Optimistically change a participant's role.
    pub async fn change_role(&self, user_id: &str, role: Role) -> MutationOutcome {
        let (desk_id, generation) = match self.begin(user_id) {
            Ok(scope) => scope,
            Err(outcome) => return outcome,
        };

        let result = optimistic(
            &self.shared,
            |s: &mut Shared| {
                let pending = s.view.participants.set_role(user_id, role)?;
                s.view.action_in_progress = true;
                s.view.error = None;
                Some(pending)
            },
            |s: &mut Shared, pending| {
                if s.generation == generation && s.view.participants.restore_role(pending) {
                    debug!(user_id, previous = %pending.previous_value, "role change rolled back");
                }
            },
            |_| self.api.update_participant_role(&desk_id, user_id, role),
        )
        .await;

        self.finish(generation, "role change", result.map(|applied| applied.is_some()))
            .await
    }

    /// Optimistically remove a participant, restoring its position on failure.
    pub async fn remove(&self, user_id: &str) -> MutationOutcome {
        let (desk_id, generation) = match self.begin(user_id) {
            Ok(scope) => scope,
            Err(outcome) => return outcome,
        };

        let result = optimistic(
            &self.shared,
            |s: &mut Shared| {
                let removed = s.view.participants.remove(user_id)?;
                s.view.action_in_progress = true;
                s.view.error = None;
                Some(removed)
            },
            |s: &mut Shared, removed| {
                if s.generation == generation
                    && s.view
                        .participants
                        .insert_at(removed.index, removed.participant.clone())
                {
                    debug!(user_id, index = removed.index, "participant removal rolled back");
                }
            },
            |_| self.api.remove_participant(&desk_id, user_id),
        )
        .await;

        self.finish(generation, "participant removal", result.map(|applied| applied.is_some()))
            .await
    }

    /// Validate a mutation against the current scope and session.
    fn begin(&self, target_id: &str) -> Result<(String, u64), MutationOutcome> {
        let mut guard = lock(&self.shared);
        if guard.view.action_in_progress {
            return Err(MutationOutcome::Busy);
        }
        let Some(desk_id) = guard.view.desk_id.clone() else {
            guard.view.error = Some(NO_DESK_MESSAGE.to_owned());
            return Err(MutationOutcome::Rejected);
        };
        if let Err(err) = check_permission(&self.session, &guard.view.participants, target_id) {
            warn!(desk_id, target_id, code = err.error_code(), "participant mutation refused");
            guard.view.error = Some(err.user_message());
            return Err(MutationOutcome::Rejected);
        }
        Ok((desk_id, guard.generation))
    }

    /// Settle flags after a write and translate the result.
    async fn finish(&self, generation: u64, action: &str, result: Result<bool, ClientError>) -> MutationOutcome {
        let outcome = {
            let mut guard = lock(&self.shared);
            let current = guard.generation == generation;
            if current {
                guard.view.action_in_progress = false;
            }
            match result {
                Ok(false) => MutationOutcome::Unchanged,
                Ok(true) => MutationOutcome::Applied,
                Err(err) => {
                    warn!(action, error = %err, code = err.error_code(), retryable = err.retryable(), "participant write failed");
                    if current {
                        guard.view.error = Some(err.user_message());
                    }
                    MutationOutcome::RolledBack
                }
            }
        };

        if outcome == MutationOutcome::Applied && self.settings.reconcile_after_mutation {
            self.refresh().await;
        }
        outcome
    }

    async fn fetch_into(&self, desk_id: &str, generation: u64) {
        let result = self.api.fetch_participants(desk_id).await;

        let mut guard = lock(&self.shared);
        if guard.generation != generation {
            debug!(desk_id, generation, current = guard.generation, "dropping stale participant list");
            return;
        }
        guard.view.loading = false;
        match result {
            Ok(items) => {
                debug!(desk_id, count = items.len(), "participants loaded");
                guard.view.participants = ParticipantList::from_items(items);
                guard.view.error = None;
            }
            Err(err) => {
                warn!(desk_id, error = %err, code = err.error_code(), retryable = err.retryable(), "participant fetch failed");
                guard.view.error = Some(err.user_message());
            }
        }
    }
}

/// Local permission rules; the backend remains the authority.
fn check_permission(session: &SessionContext, participants: &ParticipantList, target_id: &str) -> Result<(), ClientError> {
    let Some(user_id) = session.current_user_id() else {
        return Err(ClientError::NotPermitted(SIGN_IN_REQUIRED_MESSAGE.to_owned()));
    };
    if participants
        .get(&user_id)
        .is_some_and(|me| me.role != Role::Creator)
    {
        return Err(ClientError::NotPermitted(CREATOR_ONLY_MESSAGE.to_owned()));
    }
    match participants.get(target_id) {
        None => Err(ClientError::NotFound(None)),
        Some(target) if target.role == Role::Creator => {
            Err(ClientError::NotPermitted(CREATOR_LOCKED_MESSAGE.to_owned()))
        }
        Some(_) => Ok(()),
    }
}
