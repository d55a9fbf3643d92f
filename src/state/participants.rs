//! Participant list state for the desk settings screen.
//!
//! SYSTEM CONTEXT
//! ==============
//! Local cache of the server-side participant list. Order is insertion order
//! as delivered by the backend and must survive a failed delete, so removal
//! hands back the original index for a positional re-insert.

#[cfg(test)]
#[path = "participants_test.rs"]
mod participants_test;

use crate::net::types::{Participant, Role};

/// Record of an in-flight write, held only until the write resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMutation<V> {
    pub item_id: String,
    pub previous_value: V,
    pub new_value: V,
}

/// A participant taken out of the list, with the slot it occupied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedParticipant {
    pub index: usize,
    pub participant: Participant,
}

/// Ordered participant collection with at most one entry per `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantList {
    items: Vec<Participant>,
}

impl ParticipantList {
    /// Build from a server response, keeping the first entry for a repeated id.
    #[must_use]
    pub fn from_items(items: Vec<Participant>) -> Self {
        let mut list = Self::default();
        list.replace_all(items);
        list
    }

    /// Swap in a fresh server list with the same dedupe rule as [`Self::from_items`].
    pub fn replace_all(&mut self, items: Vec<Participant>) {
        self.items.clear();
        for item in items {
            if !self.contains(&item.id) {
                self.items.push(item);
            }
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Participant] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.items.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|p| p.id == id)
    }

    /// Set a participant's role in place.
    ///
    /// Returns `None` when the participant is missing or already has `role`.
    pub fn set_role(&mut self, id: &str, role: Role) -> Option<PendingMutation<Role>> {
        let item = self.items.iter_mut().find(|p| p.id == id)?;
        if item.role == role {
            return None;
        }
        let previous_value = std::mem::replace(&mut item.role, role);
        Some(PendingMutation { item_id: id.to_owned(), previous_value, new_value: role })
    }

    /// Undo a role change, provided the participant still holds the new value.
    pub fn restore_role(&mut self, pending: &PendingMutation<Role>) -> bool {
        match self.items.iter_mut().find(|p| p.id == pending.item_id) {
            Some(item) if item.role == pending.new_value => {
                item.role = pending.previous_value;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<RemovedParticipant> {
        let index = self.position(id)?;
        let participant = self.items.remove(index);
        Some(RemovedParticipant { index, participant })
    }

    /// Put a removed participant back at its original slot.
    ///
    /// The index is clamped to the current length. Returns `false` without
    /// inserting if a participant with the same id is already present.
    pub fn insert_at(&mut self, index: usize, participant: Participant) -> bool {
        if self.contains(&participant.id) {
            return false;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, participant);
        true
    }
}
