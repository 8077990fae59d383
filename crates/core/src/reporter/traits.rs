//! Trait definitions for the reporter module.

use super::types::StatusLevel;

/// A sink for human-readable progress lines.
pub trait StatusReporter: Send + Sync {
    /// Reports one line at the given level.
    fn report(&self, level: StatusLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(StatusLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(StatusLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.report(StatusLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(StatusLevel::Error, message);
    }
}
