//! View-state models shared by the controllers.

pub mod job;
pub mod participants;
pub mod session;
