//! Types for the downloader module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one `download_image` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Image URL.
    pub url: String,
    /// Destination file.
    pub output_path: PathBuf,
    /// Whether the file is present after the call.
    pub success: bool,
    /// Whether the file already existed and nothing was fetched.
    pub skipped: bool,
    /// Wall time spent in the call.
    pub elapsed_seconds: f64,
    /// Size of the file on disk (successful calls only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    /// Why the download failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    /// A freshly written file.
    pub fn downloaded(
        url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        size_bytes: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            success: true,
            skipped: false,
            elapsed_seconds: elapsed.as_secs_f64(),
            file_size_bytes: Some(size_bytes),
            error: None,
        }
    }

    /// The destination already existed.
    pub fn skipped(
        url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        size_bytes: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            skipped: true,
            ..Self::downloaded(url, output_path, size_bytes, elapsed)
        }
    }

    /// The image could not be fetched.
    pub fn failed(
        url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            success: false,
            skipped: false,
            elapsed_seconds: elapsed.as_secs_f64(),
            file_size_bytes: None,
            error: Some(error.into()),
        }
    }

    /// File size in MiB, if known.
    pub fn file_size_mb(&self) -> Option<f64> {
        self.file_size_bytes
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloaded_result() {
        let result = DownloadResult::downloaded(
            "https://cdn.example.com/a.png",
            "/out/a.png",
            3 * 1024 * 1024,
            Duration::from_millis(1500),
        );
        assert!(result.success);
        assert!(!result.skipped);
        assert_eq!(result.elapsed_seconds, 1.5);
        assert_eq!(result.file_size_mb(), Some(3.0));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_skipped_result_is_success() {
        let result = DownloadResult::skipped(
            "https://cdn.example.com/a.png",
            "/out/a.png",
            10,
            Duration::ZERO,
        );
        assert!(result.success);
        assert!(result.skipped);
        assert_eq!(result.file_size_bytes, Some(10));
    }

    #[test]
    fn test_failed_result_has_no_size() {
        let result = DownloadResult::failed(
            "https://cdn.example.com/a.png",
            "/out/a.png",
            "navigation timed out after 30s",
            Duration::from_secs(30),
        );
        assert!(!result.success);
        assert!(result.file_size_mb().is_none());
        assert_eq!(result.error.as_deref(), Some("navigation timed out after 30s"));

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("file_size_bytes").is_none());
    }
}
