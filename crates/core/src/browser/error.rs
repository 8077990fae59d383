//! Error types for the browser module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The step of a browser-driven fetch an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserStage {
    Launch,
    OpenPage,
    SetHeaders,
    Navigate,
    Fetch,
    Close,
}

impl fmt::Display for BrowserStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Launch => "launch",
            Self::OpenPage => "open page",
            Self::SetHeaders => "set headers",
            Self::Navigate => "navigation",
            Self::Fetch => "in-page fetch",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Errors raised while driving the headless browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started.
    #[error("Failed to launch browser at {path}: {reason}")]
    Launch { path: PathBuf, reason: String },

    /// Navigation or the in-page fetch exceeded the configured bound.
    #[error("{stage} timed out after {timeout:?}")]
    Timeout {
        stage: BrowserStage,
        timeout: Duration,
    },

    /// Navigation to the image URL failed.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The in-page fetch script failed or returned an error.
    #[error("In-page fetch of {url} failed: {reason}")]
    Evaluation { url: String, reason: String },

    /// Any other DevTools protocol failure.
    #[error("Browser protocol error during {stage}: {reason}")]
    Protocol { stage: BrowserStage, reason: String },
}

impl BrowserError {
    /// Creates a protocol error for the given stage.
    pub fn protocol(stage: BrowserStage, reason: impl fmt::Display) -> Self {
        Self::Protocol {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a bounded-wait expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the browser itself is likely unusable after this error.
    pub fn poisons_browser(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Launch { .. })
    }
}
