//! Networking modules for the desk REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the service boundary and its reqwest implementation, and
//! `types` defines the shared wire schema.

pub mod api;
pub mod types;
