//! Mock browser launcher for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::browser::{BrowserError, BrowserInstance, BrowserLauncher, BrowserPage, BrowserStage};

/// How mock browsers and pages behave.
#[derive(Debug, Clone)]
struct MockBrowserScript {
    bytes: Vec<u8>,
    navigation_delay: Duration,
    fetch_delay: Duration,
    launch_error: Option<String>,
    page_error: Option<String>,
    fetch_error: Option<String>,
}

impl Default for MockBrowserScript {
    fn default() -> Self {
        Self {
            bytes: b"\x89PNG\r\n\x1a\nmock".to_vec(),
            navigation_delay: Duration::ZERO,
            fetch_delay: Duration::ZERO,
            launch_error: None,
            page_error: None,
            fetch_error: None,
        }
    }
}

/// Everything the mock saw.
#[derive(Debug, Default)]
struct MockBrowserLog {
    executables: Vec<PathBuf>,
    browser_closes: usize,
    pages_opened: usize,
    page_closes: usize,
    headers: Vec<(String, String)>,
    navigations: Vec<String>,
    fetches: Vec<String>,
}

/// Mock implementation of the BrowserLauncher trait.
///
/// Provides controllable behavior for testing:
/// - Count launches, page opens and closes
/// - Record headers, navigations and in-page fetches
/// - Simulate slow navigation or fetch (for timeout paths)
/// - Simulate launch, page and fetch failures
///
/// # Example
///
/// ```rust,ignore
/// use picgrab_core::testing::MockBrowserLauncher;
///
/// let launcher = MockBrowserLauncher::new();
/// launcher.set_navigation_delay(Duration::from_secs(60)).await;
///
/// // Run a download with a short navigation timeout...
///
/// assert_eq!(launcher.launch_count().await, 1);
/// assert_eq!(launcher.browser_close_count().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBrowserLauncher {
    script: Arc<RwLock<MockBrowserScript>>,
    log: Arc<RwLock<MockBrowserLog>>,
}

impl MockBrowserLauncher {
    /// Create a new mock launcher whose pages return a small PNG-like body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bytes returned by the in-page fetch.
    pub async fn set_bytes(&self, bytes: Vec<u8>) {
        self.script.write().await.bytes = bytes;
    }

    /// Delay navigation by `delay`.
    pub async fn set_navigation_delay(&self, delay: Duration) {
        self.script.write().await.navigation_delay = delay;
    }

    /// Delay the in-page fetch by `delay`.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        self.script.write().await.fetch_delay = delay;
    }

    /// Make every launch fail with this reason.
    pub async fn set_launch_error(&self, reason: Option<String>) {
        self.script.write().await.launch_error = reason;
    }

    /// Make opening a page fail with a protocol error.
    pub async fn set_page_error(&self, reason: Option<String>) {
        self.script.write().await.page_error = reason;
    }

    /// Make the in-page fetch fail with this reason.
    pub async fn set_fetch_error(&self, reason: Option<String>) {
        self.script.write().await.fetch_error = reason;
    }

    /// Number of launch attempts, failed ones included.
    pub async fn launch_count(&self) -> usize {
        self.log.read().await.executables.len()
    }

    /// Executables passed to `launch`, in order.
    pub async fn executables(&self) -> Vec<PathBuf> {
        self.log.read().await.executables.clone()
    }

    /// Number of `close` calls on browser instances.
    pub async fn browser_close_count(&self) -> usize {
        self.log.read().await.browser_closes
    }

    /// Number of pages opened.
    pub async fn page_open_count(&self) -> usize {
        self.log.read().await.pages_opened
    }

    /// Number of `close` calls on pages.
    pub async fn page_close_count(&self) -> usize {
        self.log.read().await.page_closes
    }

    /// Extra headers set on pages, in order.
    pub async fn headers(&self) -> Vec<(String, String)> {
        self.log.read().await.headers.clone()
    }

    /// URLs navigated to, in order.
    pub async fn navigations(&self) -> Vec<String> {
        self.log.read().await.navigations.clone()
    }

    /// URLs fetched in-page, in order.
    pub async fn fetches(&self) -> Vec<String> {
        self.log.read().await.fetches.clone()
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowserLauncher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn launch(&self, executable: &Path) -> Result<Box<dyn BrowserInstance>, BrowserError> {
        self.log
            .write()
            .await
            .executables
            .push(executable.to_path_buf());

        if let Some(reason) = self.script.read().await.launch_error.clone() {
            return Err(BrowserError::Launch {
                path: executable.to_path_buf(),
                reason,
            });
        }

        Ok(Box::new(MockBrowser {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockBrowser {
    script: Arc<RwLock<MockBrowserScript>>,
    log: Arc<RwLock<MockBrowserLog>>,
}

#[async_trait]
impl BrowserInstance for MockBrowser {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        if let Some(reason) = self.script.read().await.page_error.clone() {
            return Err(BrowserError::protocol(BrowserStage::OpenPage, reason));
        }
        self.log.write().await.pages_opened += 1;

        Ok(Box::new(MockPage {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.write().await.browser_closes += 1;
        Ok(())
    }
}

struct MockPage {
    script: Arc<RwLock<MockBrowserScript>>,
    log: Arc<RwLock<MockBrowserLog>>,
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn set_extra_headers(&self, headers: &[(String, String)]) -> Result<(), BrowserError> {
        self.log.write().await.headers.extend_from_slice(headers);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.log.write().await.navigations.push(url.to_string());
        let delay = self.script.read().await.navigation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, BrowserError> {
        self.log.write().await.fetches.push(url.to_string());
        let script = self.script.read().await.clone();
        if !script.fetch_delay.is_zero() {
            tokio::time::sleep(script.fetch_delay).await;
        }
        match script.fetch_error {
            Some(reason) => Err(BrowserError::Evaluation {
                url: url.to_string(),
                reason,
            }),
            None => Ok(script.bytes),
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.write().await.page_closes += 1;
        Ok(())
    }
}
