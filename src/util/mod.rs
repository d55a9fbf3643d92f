//! Async view-state primitives shared by the controllers.
//!
//! ARCHITECTURE
//! ============
//! `task` is the cancellable-task base, `debounce` and `poller` build the
//! AI recommendation flow on top of it, and `optimistic` is the apply /
//! commit / revert helper behind every collaborative edit.

pub mod debounce;
pub mod optimistic;
pub mod poller;
pub mod task;
