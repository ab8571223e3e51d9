//! HTTP adapters - REST API implementations.

pub mod attendance;

// Re-export key types for convenience
pub use attendance::attendance_router;
pub use attendance::AttendanceAppState;
