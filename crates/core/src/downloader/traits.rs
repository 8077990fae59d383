//! Trait definitions for the downloader module.

use async_trait::async_trait;
use std::path::Path;

use super::error::DownloadError;
use super::types::DownloadResult;

/// Saves one image URL to a local file.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `destination` using the browser at `browser_path`.
    ///
    /// An existing `destination` short-circuits to a successful, skipped
    /// result without touching the browser.
    async fn download_image(
        &self,
        browser_path: &Path,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResult, DownloadError>;

    /// Releases anything held across downloads. Called once per run.
    async fn shutdown(&self) {}
}
