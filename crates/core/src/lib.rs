pub mod browser;
pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod reporter;
pub mod testing;

pub use browser::{
    BrowserError, BrowserInstance, BrowserLauncher, BrowserPage, BrowserStage, ChromiumLauncher,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloadConfig,
    ServerConfig,
};
pub use downloader::{
    BrowserImageDownloader, BrowserStrategy, DownloadError, DownloadResult, DownloaderConfig,
    ImageDownloader,
};
pub use fetcher::{
    FetchError, FetcherConfig, HttpPageFetcher, ImageItem, PageFetcher, PageRequest, PageResponse,
};
pub use orchestrator::{
    DownloadOrchestrator, OrchestratorError, RunOutcome, RunRequest, RunSummary, StopSignal,
};
pub use reporter::{StatusLevel, StatusLine, StatusReporter, TracingReporter};
