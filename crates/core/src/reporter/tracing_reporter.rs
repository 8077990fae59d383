//! Reporter that forwards status lines to `tracing`.

use tracing::{debug, error, info, warn};

use super::traits::StatusReporter;
use super::types::StatusLevel;

/// Writes every status line to the process log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl StatusReporter for TracingReporter {
    fn report(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Debug => debug!(target: "picgrab::status", "{}", message),
            StatusLevel::Info => info!(target: "picgrab::status", "{}", message),
            StatusLevel::Success => {
                info!(target: "picgrab::status", success = true, "{}", message)
            }
            StatusLevel::Warning => warn!(target: "picgrab::status", "{}", message),
            StatusLevel::Error => error!(target: "picgrab::status", "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_every_level_without_subscriber() {
        let reporter = TracingReporter::new();
        reporter.report(StatusLevel::Debug, "debug line");
        reporter.info("info line");
        reporter.success("success line");
        reporter.warning("warning line");
        reporter.error("error line");
    }
}
