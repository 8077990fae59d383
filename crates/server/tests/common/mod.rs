//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, so the control API can be exercised
//! without a network or a browser.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use picgrab_core::testing::{MockImageDownloader, MockPageFetcher, RecordingReporter};
use picgrab_core::{
    Config, DownloadConfig, DownloadOrchestrator, DownloaderConfig, FetcherConfig, ServerConfig,
};
use picgrab_server::api::{create_router, WsBroadcaster};
use picgrab_server::runs::RunController;
use picgrab_server::state::AppState;

/// Re-export fixtures for test convenience
pub use picgrab_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process server with controllable mocks for:
/// - Listing pages (MockPageFetcher)
/// - Image downloads (MockImageDownloader)
/// - Status lines (RecordingReporter)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - configure listing pages
    pub fetcher: MockPageFetcher,
    /// Mock downloader - control per-item results
    pub downloader: MockImageDownloader,
    /// Every status line a run reported
    pub reporter: Arc<RecordingReporter>,
    /// Broadcaster the run controller publishes to
    pub ws_broadcaster: WsBroadcaster,
    /// Temporary directory used as the default download directory
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let fetcher = MockPageFetcher::new();
        let downloader = MockImageDownloader::new();
        let reporter = Arc::new(RecordingReporter::new());

        let config = Config {
            download: DownloadConfig {
                api_url: "https://api.example.com/pictures".to_string(),
                start_page: 1,
                page_size: 20,
                download_dir: temp_dir.path().join("downloads"),
                browser_path: PathBuf::from("/usr/bin/chromium"),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            fetcher: FetcherConfig::default(),
            downloader: DownloaderConfig::default(),
        };

        let orchestrator = Arc::new(DownloadOrchestrator::new(
            Arc::new(fetcher.clone()),
            Arc::new(downloader.clone()),
            reporter.clone(),
        ));

        let ws_broadcaster = WsBroadcaster::default();
        let runs = RunController::new(orchestrator, ws_broadcaster.clone());
        let state = Arc::new(AppState::new(config, runs, ws_broadcaster.clone()));

        Self {
            router: create_router(state),
            fetcher,
            downloader,
            reporter,
            ws_broadcaster,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body.to_string())).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.to_string())).await
    }

    /// Poll the status endpoint until no run is active.
    pub async fn wait_until_idle(&self) -> Value {
        for _ in 0..200 {
            let status = self.get("/api/v1/runs/status").await;
            if status.body["running"] == false {
                return status.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run did not finish in time");
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<String>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(raw) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(raw)
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
