//! Trait definitions for the browser module.

use async_trait::async_trait;
use std::path::Path;

use super::error::BrowserError;

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Returns the name of this launcher implementation.
    fn name(&self) -> &str;

    /// Launches a new, isolated browser process from `executable`.
    async fn launch(&self, executable: &Path) -> Result<Box<dyn BrowserInstance>, BrowserError>;
}

/// A running browser process.
#[async_trait]
pub trait BrowserInstance: Send + Sync {
    /// Opens a fresh blank page (tab).
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError>;

    /// Terminates the process. Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// A single page inside a browser.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Sets headers sent with every request the page makes.
    async fn set_extra_headers(&self, headers: &[(String, String)]) -> Result<(), BrowserError>;

    /// Navigates to `url` and waits for the load to finish.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Runs `fetch(url)` inside the page and returns the response body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, BrowserError>;

    /// Closes the page. Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
