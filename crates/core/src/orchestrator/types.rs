//! Types for the download orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::downloader::DownloadError;
use crate::fetcher::{FetchError, PageRequest};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The run parameters are unusable.
    #[error("invalid run request: {0}")]
    InvalidRequest(String),

    /// A listing page could not be fetched or parsed.
    #[error("page fetch failed")]
    Fetch(#[from] FetchError),

    /// The browser could not be launched or a file could not be written.
    #[error("image download failed")]
    Download(#[from] DownloadError),
}

/// Parameters of one download run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Paginated JSON endpoint (POST).
    pub api_url: String,
    /// First page to request (1-based).
    pub start_page: u32,
    /// Items requested per page.
    pub page_size: u32,
    /// Directory images are saved into.
    pub download_dir: PathBuf,
    /// Chrome/Chromium executable.
    pub browser_path: PathBuf,
}

impl RunRequest {
    /// Checks the parameters before any network or browser activity.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let invalid = |msg: &str| Err(OrchestratorError::InvalidRequest(msg.to_string()));

        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return invalid("api_url cannot be empty");
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return invalid("api_url must be an http(s) URL");
        }
        if self.start_page == 0 {
            return invalid("start_page must be at least 1");
        }
        if self.page_size == 0 {
            return invalid("page_size must be at least 1");
        }
        if self.download_dir.as_os_str().is_empty() {
            return invalid("download_dir cannot be empty");
        }
        if self.browser_path.as_os_str().is_empty() {
            return invalid("browser_path cannot be empty");
        }
        Ok(())
    }

    /// The listing request for `page_number`.
    pub fn page_request(&self, page_number: u32) -> PageRequest {
        PageRequest::new(self.api_url.trim(), page_number, self.page_size)
    }
}

/// How a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// An empty page was reached.
    Completed,
    /// A stop was requested.
    Cancelled,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    /// Listing pages requested successfully, including the final empty one.
    pub pages_fetched: u32,
    /// Last page number requested.
    pub last_page: Option<u32>,
    /// Items attempted (the running image count).
    pub attempted: u64,
    /// Images written by this run.
    pub downloaded: u64,
    /// Images already present on disk.
    pub skipped: u64,
    /// Images that could not be fetched.
    pub failed: u64,
    pub bytes_written: u64,
    /// Last `total` the API reported. Informational only.
    pub reported_total: Option<u64>,
}

impl RunSummary {
    pub(crate) fn start(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            outcome: RunOutcome::Completed,
            pages_fetched: 0,
            last_page: None,
            attempted: 0,
            downloaded: 0,
            skipped: 0,
            failed: 0,
            bytes_written: 0,
            reported_total: None,
        }
    }

    pub(crate) fn finish(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        self.finished_at = Utc::now();
        self
    }

    /// Run duration in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Cooperative stop flag shared between a run and whoever controls it.
///
/// Checked before each page fetch and before each item; a download in
/// flight runs to completion or timeout.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RunRequest {
        RunRequest {
            api_url: "https://api.example.com/pictures".to_string(),
            start_page: 1,
            page_size: 20,
            download_dir: PathBuf::from("/out"),
            browser_path: PathBuf::from("/usr/bin/chromium"),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_invalid_requests() {
        let cases: Vec<(fn(&mut RunRequest), &str)> = vec![
            (|r: &mut RunRequest| r.api_url = " ".to_string(), "api_url"),
            (|r: &mut RunRequest| r.api_url = "file:///etc/passwd".to_string(), "api_url"),
            (|r: &mut RunRequest| r.start_page = 0, "start_page"),
            (|r: &mut RunRequest| r.page_size = 0, "page_size"),
            (|r: &mut RunRequest| r.download_dir = PathBuf::new(), "download_dir"),
            (|r: &mut RunRequest| r.browser_path = PathBuf::new(), "browser_path"),
        ];

        for (mutate, field) in cases {
            let mut req = request();
            mutate(&mut req);
            let err = req.validate().unwrap_err();
            assert!(
                err.to_string().contains(field),
                "expected error about {}, got {}",
                field,
                err
            );
        }
    }

    #[test]
    fn test_page_request() {
        let page = request().page_request(7);
        assert_eq!(page.page_number, 7);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.api_url, "https://api.example.com/pictures");
    }

    #[test]
    fn test_stop_signal_is_shared() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        assert!(!signal.is_stop_requested());
        handle.request_stop();
        assert!(signal.is_stop_requested());
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary::start(Uuid::new_v4()).finish(RunOutcome::Cancelled);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["pages_fetched"], 0);
        assert!(json["last_page"].is_null());
    }
}
