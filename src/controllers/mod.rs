//! Per-screen view controllers.
//!
//! ARCHITECTURE
//! ============
//! Each controller owns its state behind a mutex, talks to the backend only
//! through [`crate::net::api::DeskApi`], and exposes read-only snapshots.

pub mod ai_panel;
pub mod participants;

#[cfg(test)]
pub(crate) mod test_support;
