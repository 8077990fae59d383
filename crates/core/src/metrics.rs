//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Page fetching (requests by result, duration)
//! - Image downloads (results, duration, bytes written)
//! - Browser processes (launches)
//! - Runs (outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Page Fetcher Metrics
// =============================================================================

/// Listing page requests by result.
pub static PAGES_FETCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("picgrab_pages_fetched_total", "Total listing page requests"),
        &["result"], // "ok", "empty", or a FetchError kind
    )
    .unwrap()
});

/// Listing page request duration in seconds.
pub static PAGE_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "picgrab_page_fetch_duration_seconds",
            "Duration of listing page requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Downloader Metrics
// =============================================================================

/// Image downloads by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("picgrab_downloads_total", "Total image downloads"),
        &["result"], // "downloaded", "skipped", "failed"
    )
    .unwrap()
});

/// Image download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "picgrab_download_duration_seconds",
            "Duration of image downloads",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Bytes written to the download directory.
pub static BYTES_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "picgrab_bytes_written_total",
        "Total image bytes written to disk",
    )
    .unwrap()
});

/// Browser process launches by strategy.
pub static BROWSER_LAUNCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("picgrab_browser_launches_total", "Total browser launches"),
        &["strategy"],
    )
    .unwrap()
});

// =============================================================================
// Run Metrics
// =============================================================================

/// Finished runs by outcome.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("picgrab_runs_total", "Total download runs"),
        &["outcome"], // "completed", "cancelled", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PAGES_FETCHED.clone()),
        Box::new(PAGE_FETCH_DURATION.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(BYTES_WRITTEN.clone()),
        Box::new(BROWSER_LAUNCHES.clone()),
        Box::new(RUNS_TOTAL.clone()),
    ]
}
