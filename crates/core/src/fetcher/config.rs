//! Configuration for the page fetcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the HTTP page fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Bound on one page request, body included (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent sent with every page request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; ImageDownloader/1.0)".to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetcherConfig {
    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
