//! Configuration for the image downloader.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How browser processes are used across downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserStrategy {
    /// Launch and tear down a browser for every image.
    #[default]
    PerDownload,
    /// Keep one browser for the whole run and open a page per image.
    Pooled,
}

impl BrowserStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerDownload => "per_download",
            Self::Pooled => "pooled",
        }
    }
}

/// Configuration for the browser-backed downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Bound on navigation and on the in-page fetch, each (seconds).
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// `Referer` the image host expects.
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Browser reuse strategy.
    #[serde(default)]
    pub strategy: BrowserStrategy,

    /// Run the browser without a window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Extra command-line arguments for the browser.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_referer() -> String {
    "https://re.bluepoch.com/activity/official/websites/picture".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout(),
            referer: default_referer(),
            strategy: BrowserStrategy::default(),
            headless: true,
            chrome_args: Vec::new(),
        }
    }
}

impl DownloaderConfig {
    /// Bound applied to navigation and to the in-page fetch.
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Sets the browser strategy.
    pub fn with_strategy(mut self, strategy: BrowserStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the referer header value.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }
}
