//! Status reporter that keeps every line for assertions.

use std::sync::{Arc, Mutex};

use crate::reporter::{StatusLevel, StatusLine, StatusReporter};

/// Records reported lines in memory.
///
/// `report` is synchronous, so this uses a std mutex rather than the
/// async locks of the other mocks.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    lines: Arc<Mutex<Vec<StatusLine>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines so far.
    pub fn lines(&self) -> Vec<StatusLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.message).collect()
    }

    /// Lines reported at `level`.
    pub fn lines_at(&self, level: StatusLevel) -> Vec<StatusLine> {
        self.lines()
            .into_iter()
            .filter(|l| l.level == level)
            .collect()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.message.contains(needle))
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, level: StatusLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(StatusLine::new(level, message));
        }
    }
}
