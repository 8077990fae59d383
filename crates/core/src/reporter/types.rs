//! Types for the reporter module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a status line.
///
/// `Success` sits between `Info` and `Warning` and marks a finished download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusLine {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(StatusLevel::Debug < StatusLevel::Info);
        assert!(StatusLevel::Info < StatusLevel::Success);
        assert!(StatusLevel::Success < StatusLevel::Warning);
        assert!(StatusLevel::Warning < StatusLevel::Error);
    }

    #[test]
    fn test_status_line_serialization() {
        let line = StatusLine::new(StatusLevel::Success, "done");
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "done");
        assert!(json["timestamp"].is_string());
    }
}
