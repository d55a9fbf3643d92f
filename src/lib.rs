//! Desk client core: backend access and async view-state controllers.

pub mod config;
pub mod controllers;
pub mod error;
pub mod net;
pub mod state;
pub mod util;
