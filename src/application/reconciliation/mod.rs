//! Reconciliation - The device polling loop.

mod loop_status;
mod reconciliation_loop;

pub use loop_status::{BatchSummary, LoopSnapshot};
pub use reconciliation_loop::{ReconcileConfig, ReconciliationLoop};
