//! Mock image downloader for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{DownloadError, DownloadResult, ImageDownloader};
use crate::orchestrator::StopSignal;

/// A recorded download call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    pub browser_path: PathBuf,
    pub url: String,
    pub destination: PathBuf,
}

/// Mock implementation of the ImageDownloader trait.
///
/// Does not touch the filesystem. Every call succeeds with a 1 KiB result
/// unless the URL was marked with `fail_url` or `skip_url`.
#[derive(Debug, Clone, Default)]
pub struct MockImageDownloader {
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    existing: Arc<RwLock<HashSet<String>>>,
    next_error: Arc<RwLock<Option<DownloadError>>>,
    stop_after: Arc<RwLock<Option<(usize, StopSignal)>>>,
    delay: Arc<RwLock<Duration>>,
    shutdowns: Arc<RwLock<usize>>,
}

impl MockImageDownloader {
    /// Create a new mock downloader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads of `url` come back as failed.
    pub async fn fail_url(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    /// Downloads of `url` come back as skipped.
    pub async fn skip_url(&self, url: &str) {
        self.existing.write().await.insert(url.to_string());
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_error(&self, error: DownloadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Request a stop on `signal` once `count` downloads have been made.
    pub async fn stop_after(&self, count: usize, signal: StopSignal) {
        *self.stop_after.write().await = Some((count, signal));
    }

    /// Set the simulated duration of each download.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded downloads.
    pub async fn recorded_downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Get the number of `shutdown` calls.
    pub async fn shutdown_count(&self) -> usize {
        *self.shutdowns.read().await
    }
}

#[async_trait]
impl ImageDownloader for MockImageDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download_image(
        &self,
        browser_path: &Path,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResult, DownloadError> {
        let count = {
            let mut downloads = self.downloads.write().await;
            downloads.push(RecordedDownload {
                browser_path: browser_path.to_path_buf(),
                url: url.to_string(),
                destination: destination.to_path_buf(),
            });
            downloads.len()
        };

        if let Some((after, signal)) = self.stop_after.read().await.as_ref() {
            if count >= *after {
                signal.request_stop();
            }
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(url) {
            return Ok(DownloadResult::failed(
                url,
                destination,
                "in-page fetch failed",
                delay,
            ));
        }
        if self.existing.read().await.contains(url) {
            return Ok(DownloadResult::skipped(url, destination, 1024, delay));
        }
        Ok(DownloadResult::downloaded(url, destination, 1024, delay))
    }

    async fn shutdown(&self) {
        *self.shutdowns.write().await += 1;
    }
}
