use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::downloader::DownloaderConfig;
use crate::fetcher::FetcherConfig;
use crate::orchestrator::RunRequest;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub download: DownloadConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// The five parameters a download run is started with.
///
/// These are the values the desktop form used to persist between sessions.
/// The control API may override any of them per run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Paginated JSON endpoint (POST).
    pub api_url: String,
    /// First page to request.
    #[serde(default = "default_start_page")]
    pub start_page: u32,
    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Directory images are saved into.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Chrome/Chromium executable used for the headless browser.
    pub browser_path: PathBuf,
}

fn default_start_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl DownloadConfig {
    /// Builds the run request these defaults describe.
    pub fn to_run_request(&self) -> RunRequest {
        RunRequest {
            api_url: self.api_url.clone(),
            start_page: self.start_page,
            page_size: self.page_size,
            download_dir: self.download_dir.clone(),
            browser_path: self.browser_path.clone(),
        }
    }
}
