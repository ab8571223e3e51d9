//! Domain layer containing the attendance-gate business types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, validation errors)
//! - `attendance` - Device records, fee status, and dispatch outcomes

pub mod attendance;
pub mod foundation;
