//! Receipt sink adapters.
//!
//! - `TextReceiptSink` appends plain-text receipts to a file or device node
//! - `LogReceiptSink` writes receipts to the log, for printer-less setups

mod log_sink;
mod receipt_text;
mod text_sink;

pub use log_sink::LogReceiptSink;
pub use receipt_text::{ReceiptLayout, DENIAL_HEADER};
pub use text_sink::{TextReceiptSink, TextSinkConfig};
