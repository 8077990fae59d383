//! Browser-backed image downloader.

use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{
    BrowserError, BrowserInstance, BrowserLauncher, BrowserPage, BrowserStage, ChromiumLauncher,
};
use crate::metrics;

use super::config::{BrowserStrategy, DownloaderConfig};
use super::error::DownloadError;
use super::traits::ImageDownloader;
use super::types::DownloadResult;

struct PooledBrowser {
    executable: PathBuf,
    instance: Box<dyn BrowserInstance>,
}

/// Downloads images by fetching them from inside a browser page that
/// carries the expected `Referer`.
pub struct BrowserImageDownloader {
    launcher: Arc<dyn BrowserLauncher>,
    config: DownloaderConfig,
    pool: Mutex<Option<PooledBrowser>>,
}

impl BrowserImageDownloader {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: DownloaderConfig) -> Self {
        Self {
            launcher,
            config,
            pool: Mutex::new(None),
        }
    }

    /// A downloader driving Chromium with the headless flag and extra
    /// arguments from `config`.
    pub fn chromium(config: DownloaderConfig) -> Self {
        let launcher = ChromiumLauncher::new(config.headless, config.chrome_args.clone());
        Self::new(Arc::new(launcher), config)
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    async fn launch(&self, executable: &Path) -> Result<Box<dyn BrowserInstance>, DownloadError> {
        metrics::BROWSER_LAUNCHES
            .with_label_values(&[self.config.strategy.as_str()])
            .inc();
        self.launcher
            .launch(executable)
            .await
            .map_err(DownloadError::Launch)
    }

    /// Launch, fetch, and always close the browser.
    async fn fetch_with_fresh_browser(
        &self,
        executable: &Path,
        url: &str,
    ) -> Result<Result<Vec<u8>, BrowserError>, DownloadError> {
        let mut instance = self.launch(executable).await?;
        let fetched = self.fetch_in_new_page(instance.as_ref(), url).await;
        if let Err(e) = instance.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        Ok(fetched)
    }

    /// Fetch through the pooled browser, launching or replacing it as needed.
    async fn fetch_with_pooled_browser(
        &self,
        executable: &Path,
        url: &str,
    ) -> Result<Result<Vec<u8>, BrowserError>, DownloadError> {
        let mut pool = self.pool.lock().await;

        let pooled = match pool.take() {
            Some(pooled) if pooled.executable == executable => pooled,
            stale => {
                if let Some(mut stale) = stale {
                    debug!(executable = %stale.executable.display(), "Replacing pooled browser");
                    if let Err(e) = stale.instance.close().await {
                        warn!(error = %e, "Failed to close pooled browser");
                    }
                }
                PooledBrowser {
                    executable: executable.to_path_buf(),
                    instance: self.launch(executable).await?,
                }
            }
        };

        let fetched = self.fetch_in_new_page(pooled.instance.as_ref(), url).await;

        match &fetched {
            Err(e) if e.poisons_browser() => {
                warn!(error = %e, "Discarding pooled browser");
                let mut pooled = pooled;
                if let Err(e) = pooled.instance.close().await {
                    warn!(error = %e, "Failed to close pooled browser");
                }
            }
            _ => *pool = Some(pooled),
        }

        Ok(fetched)
    }

    /// Open a page, fetch, and always close the page.
    async fn fetch_in_new_page(
        &self,
        instance: &dyn BrowserInstance,
        url: &str,
    ) -> Result<Vec<u8>, BrowserError> {
        let mut page = instance.new_page().await?;
        let fetched = self.drive_page(page.as_ref(), url).await;
        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close page");
        }
        fetched
    }

    async fn drive_page(
        &self,
        page: &dyn BrowserPage,
        url: &str,
    ) -> Result<Vec<u8>, BrowserError> {
        page.set_extra_headers(&[("Referer".to_string(), self.config.referer.clone())])
            .await?;
        self.bounded(BrowserStage::Navigate, page.goto(url)).await?;
        self.bounded(BrowserStage::Fetch, page.fetch_bytes(url)).await
    }

    async fn bounded<T>(
        &self,
        stage: BrowserStage,
        fut: impl Future<Output = Result<T, BrowserError>>,
    ) -> Result<T, BrowserError> {
        let timeout = self.config.navigation_timeout();
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| BrowserError::Timeout { stage, timeout })?
    }

    async fn write_file(&self, destination: &Path, bytes: &[u8]) -> Result<bool, DownloadError> {
        let write_error = |source: std::io::Error| DownloadError::WriteFailed {
            path: destination.to_path_buf(),
            source,
        };

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(write_error(e)),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(destination).await;
            return Err(write_error(e));
        }
        Ok(true)
    }
}

fn record(result: &DownloadResult) {
    let label = if result.skipped {
        "skipped"
    } else if result.success {
        "downloaded"
    } else {
        "failed"
    };
    metrics::DOWNLOADS_TOTAL.with_label_values(&[label]).inc();
    metrics::DOWNLOAD_DURATION
        .with_label_values(&[label])
        .observe(result.elapsed_seconds);
}

#[async_trait]
impl ImageDownloader for BrowserImageDownloader {
    fn name(&self) -> &str {
        "browser"
    }

    async fn download_image(
        &self,
        browser_path: &Path,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResult, DownloadError> {
        let started = Instant::now();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                DownloadError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        if let Ok(existing) = tokio::fs::metadata(destination).await {
            let result = if existing.is_file() {
                debug!(path = %destination.display(), "Destination exists, skipping");
                DownloadResult::skipped(url, destination, existing.len(), started.elapsed())
            } else {
                warn!(path = %destination.display(), "Destination exists and is not a file");
                DownloadResult::failed(
                    url,
                    destination,
                    "destination exists and is not a file",
                    started.elapsed(),
                )
            };
            record(&result);
            return Ok(result);
        }

        let fetched = match self.config.strategy {
            BrowserStrategy::PerDownload => {
                self.fetch_with_fresh_browser(browser_path, url).await?
            }
            BrowserStrategy::Pooled => self.fetch_with_pooled_browser(browser_path, url).await?,
        };

        let result = match fetched {
            Ok(bytes) => {
                if self.write_file(destination, &bytes).await? {
                    metrics::BYTES_WRITTEN.inc_by(bytes.len() as u64);
                    info!(url, path = %destination.display(), bytes = bytes.len(), "Image saved");
                    DownloadResult::downloaded(
                        url,
                        destination,
                        bytes.len() as u64,
                        started.elapsed(),
                    )
                } else {
                    // Another writer got there first; report what is on disk.
                    let on_disk = tokio::fs::metadata(destination)
                        .await
                        .map(|m| m.len())
                        .unwrap_or_default();
                    DownloadResult::skipped(url, destination, on_disk, started.elapsed())
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!(url, error = %e, "Image download timed out");
                } else {
                    warn!(url, error = %e, "Image download failed");
                }
                DownloadResult::failed(url, destination, e.to_string(), started.elapsed())
            }
        };

        record(&result);
        Ok(result)
    }

    async fn shutdown(&self) {
        if let Some(mut pooled) = self.pool.lock().await.take() {
            debug!(executable = %pooled.executable.display(), "Closing pooled browser");
            if let Err(e) = pooled.instance.close().await {
                warn!(error = %e, "Failed to close pooled browser");
            }
        }
    }
}
