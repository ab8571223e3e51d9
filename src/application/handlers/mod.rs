//! Application handlers.
//!
//! Handlers orchestrate domain decisions and coordinate between ports.

pub mod attendance;
