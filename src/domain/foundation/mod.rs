//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and error types that form the vocabulary
//! of the attendance gate.

mod errors;
mod timestamp;

pub use errors::ValidationError;
pub use timestamp::Timestamp;
