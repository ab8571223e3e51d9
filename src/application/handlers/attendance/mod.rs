//! Attendance handlers.

mod dispatcher;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherConfig};
