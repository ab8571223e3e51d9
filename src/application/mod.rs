//! Application layer - Orchestration between ports.
//!
//! - `handlers` - Request-scoped operations (fee resolution and dispatch)
//! - `reconciliation` - The long-running device polling loop

pub mod handlers;
pub mod reconciliation;

pub use handlers::attendance::{DispatchReport, Dispatcher, DispatcherConfig};
pub use reconciliation::{BatchSummary, LoopSnapshot, ReconcileConfig, ReconciliationLoop};
