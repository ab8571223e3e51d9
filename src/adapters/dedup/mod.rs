//! Dedup ledger adapters.

mod bounded_ledger;

pub use bounded_ledger::{BoundedDedupLedger, LedgerLimits};
