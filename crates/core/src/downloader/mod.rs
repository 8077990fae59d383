//! Image downloading through a headless browser.
//!
//! This module provides the `ImageDownloader` trait and `BrowserImageDownloader`,
//! which saves one image per call:
//!
//! 1. Skip if the destination already exists
//! 2. Acquire a browser (fresh per download, or one pooled browser)
//! 3. Set the `Referer` header, navigate, and fetch the bytes in-page
//! 4. Write the file
//! 5. Release the browser/page on every exit path
//!
//! Timeouts and other in-page failures come back as an unsuccessful
//! `DownloadResult`; only launch and filesystem failures are errors.

mod browser_downloader;
mod config;
mod error;
mod traits;
mod types;

pub use browser_downloader::BrowserImageDownloader;
pub use config::{BrowserStrategy, DownloaderConfig};
pub use error::DownloadError;
pub use traits::ImageDownloader;
pub use types::DownloadResult;
