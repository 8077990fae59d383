//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the core traits, so runs
//! can be exercised end to end without a network or a real browser.
//!
//! # Example
//!
//! ```rust,ignore
//! use picgrab_core::testing::{MockPageFetcher, MockImageDownloader, RecordingReporter};
//!
//! let fetcher = MockPageFetcher::new();
//! fetcher.set_page(1, fixtures::page_of(&["https://cdn.example.com/a.png"], 1)).await;
//!
//! let orchestrator = DownloadOrchestrator::new(
//!     Arc::new(fetcher.clone()),
//!     Arc::new(MockImageDownloader::new()),
//!     Arc::new(RecordingReporter::new()),
//! );
//! ```

mod mock_browser;
mod mock_downloader;
mod mock_fetcher;
mod recording_reporter;

pub use mock_browser::MockBrowserLauncher;
pub use mock_downloader::{MockImageDownloader, RecordedDownload};
pub use mock_fetcher::MockPageFetcher;
pub use recording_reporter::RecordingReporter;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::fetcher::{ImageItem, PageResponse};
    use crate::orchestrator::RunRequest;

    /// A page listing `urls`, reporting `total` items overall.
    pub fn page_of(urls: &[&str], total: u64) -> PageResponse {
        PageResponse::new(urls.iter().map(|url| ImageItem::new(*url)).collect(), total)
    }

    /// A valid run request saving into `download_dir`.
    pub fn run_request(download_dir: impl AsRef<Path>) -> RunRequest {
        RunRequest {
            api_url: "https://api.example.com/pictures".to_string(),
            start_page: 1,
            page_size: 20,
            download_dir: download_dir.as_ref().to_path_buf(),
            browser_path: PathBuf::from("/usr/bin/chromium"),
        }
    }

    /// JSON body of a listing page, as the API sends it.
    pub fn page_body(urls: &[&str], total: u64) -> String {
        let items: Vec<serde_json::Value> = urls
            .iter()
            .map(|url| serde_json::json!({ "pictureUrl": url }))
            .collect();
        serde_json::json!({
            "code": 200,
            "data": { "pageData": items, "total": total }
        })
        .to_string()
    }
}
