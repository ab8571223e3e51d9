//! Attendance Gate - Fee-checked cafeteria access
//!
//! This crate bridges a biometric attendance terminal to a school
//! fee-status API and a receipt printer. A background loop polls the
//! terminal, deduplicates its records, checks each subject's fees and
//! prints an approval or denial receipt. Fee lookups fail closed.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
