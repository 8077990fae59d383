//! Status reporting.
//!
//! The orchestrator writes human-readable progress lines to an injected
//! `StatusReporter` instead of a process-wide logger, so the host decides
//! where lines go (log file, WebSocket, test buffer).

mod tracing_reporter;
mod traits;
mod types;

pub use tracing_reporter::TracingReporter;
pub use traits::StatusReporter;
pub use types::{StatusLevel, StatusLine};
