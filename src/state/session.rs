//! Auth-session context for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Created once at startup and handed to every controller that needs the
//! current identity. `login` and `logout` are the only writers.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::net::types::User;

/// Shared, cloneable handle to the signed-in user.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    user: Arc<RwLock<Option<User>>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, user: User) {
        info!(user_id = %user.id, "session started");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn logout(&self) {
        let previous = self.user.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(user) = previous {
            info!(user_id = %user.id, "session cleared");
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|u| u.id.clone())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
