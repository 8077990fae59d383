//! The pagination and download loop.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::downloader::{DownloadResult, ImageDownloader};
use crate::fetcher::{ImageItem, PageFetcher, PageResponse};
use crate::metrics;
use crate::reporter::StatusReporter;

use super::naming::destination_for;
use super::types::{OrchestratorError, RunOutcome, RunRequest, RunSummary, StopSignal};

/// Drives one run: fetch pages in order, download every item, stop at the
/// first empty page.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    downloader: Arc<dyn ImageDownloader>,
    reporter: Arc<dyn StatusReporter>,
}

/// Mutable per-run bookkeeping.
struct RunState {
    summary: RunSummary,
    items_seen: u64,
    total_warned: bool,
}

impl DownloadOrchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        downloader: Arc<dyn ImageDownloader>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            fetcher,
            downloader,
            reporter,
        }
    }

    /// Runs to completion, cancellation, or the first fatal error.
    pub async fn run(
        &self,
        request: &RunRequest,
        stop: &StopSignal,
    ) -> Result<RunSummary, OrchestratorError> {
        self.run_with_id(Uuid::new_v4(), request, stop).await
    }

    /// Same as [`run`](Self::run), with a caller-chosen run id.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        request: &RunRequest,
        stop: &StopSignal,
    ) -> Result<RunSummary, OrchestratorError> {
        info!(
            %run_id,
            api_url = %request.api_url,
            start_page = request.start_page,
            page_size = request.page_size,
            download_dir = %request.download_dir.display(),
            "Starting download run"
        );

        let mut state = RunState {
            summary: RunSummary::start(run_id),
            items_seen: 0,
            total_warned: false,
        };

        let result = self.run_pages(request, stop, &mut state).await;

        // Pooled browsers must not outlive the run, whatever the outcome.
        self.downloader.shutdown().await;

        match result {
            Ok(outcome) => {
                let summary = state.summary.finish(outcome);
                metrics::RUNS_TOTAL
                    .with_label_values(&[outcome.as_str()])
                    .inc();
                info!(
                    %run_id,
                    %outcome,
                    attempted = summary.attempted,
                    downloaded = summary.downloaded,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    elapsed_secs = summary.elapsed_seconds(),
                    "Download run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                let chain = error_chain(&e);
                metrics::RUNS_TOTAL.with_label_values(&["failed"]).inc();
                error!(%run_id, error = %chain, "Download run failed");
                self.reporter.error(&format!("运行失败: {}", chain));
                Err(e)
            }
        }
    }

    async fn run_pages(
        &self,
        request: &RunRequest,
        stop: &StopSignal,
        state: &mut RunState,
    ) -> Result<RunOutcome, OrchestratorError> {
        request.validate()?;

        let mut page = request.start_page;
        loop {
            if stop.is_stop_requested() {
                return Ok(self.cancelled(state));
            }

            let response = self.fetch_page(request, page).await?;
            state.summary.pages_fetched += 1;
            state.summary.last_page = Some(page);
            state.summary.reported_total = Some(response.total);

            if response.is_empty() {
                self.reporter.success(&format!(
                    "下载完成，共下载 {} 张图片",
                    state.summary.attempted
                ));
                return Ok(RunOutcome::Completed);
            }

            for item in &response.items {
                if stop.is_stop_requested() {
                    return Ok(self.cancelled(state));
                }
                self.note_item_seen(state, &response);
                self.download_item(request, item, state).await?;
            }

            page = page.checked_add(1).ok_or_else(|| {
                OrchestratorError::InvalidRequest(format!("page number overflow after {}", page))
            })?;
        }
    }

    async fn fetch_page(
        &self,
        request: &RunRequest,
        page: u32,
    ) -> Result<PageResponse, OrchestratorError> {
        let started = Instant::now();
        let result = self.fetcher.fetch_page(&request.page_request(page)).await;
        metrics::PAGE_FETCH_DURATION
            .with_label_values(&[])
            .observe(started.elapsed().as_secs_f64());

        let label = match &result {
            Ok(response) if response.is_empty() => "empty",
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::PAGES_FETCHED.with_label_values(&[label]).inc();

        let response = result?;
        debug!(
            page,
            items = response.items.len(),
            total = response.total,
            "Listing page received"
        );
        Ok(response)
    }

    /// The API's `total` never bounds the loop; exceeding it is only flagged.
    fn note_item_seen(&self, state: &mut RunState, response: &PageResponse) {
        state.items_seen += 1;
        if !state.total_warned && state.items_seen > response.total {
            state.total_warned = true;
            warn!(
                seen = state.items_seen,
                total = response.total,
                "Listing returned more items than its reported total"
            );
            self.reporter.warning(&format!(
                "接口返回的图片数量超过总数 {}，继续下载直到空页",
                response.total
            ));
        }
    }

    async fn download_item(
        &self,
        request: &RunRequest,
        item: &ImageItem,
        state: &mut RunState,
    ) -> Result<(), OrchestratorError> {
        let url = item.picture_url.as_str();
        state.summary.attempted += 1;
        let count = state.summary.attempted;

        self.reporter.info(&format!("开始下载第 {} 张图片", count));

        let Some(destination) = destination_for(&request.download_dir, url) else {
            warn!(url, "Image URL has no file name");
            state.summary.failed += 1;
            self.reporter
                .warning(&format!("⚠️ 下载失败: {} (无法从地址解析文件名)", url));
            return Ok(());
        };

        let started = Instant::now();
        let result = self
            .downloader
            .download_image(&request.browser_path, url, &destination)
            .await?;
        let elapsed = started.elapsed().as_secs_f64();

        self.reporter
            .info(&format!("第 {} 张图片下载耗时：{:.2}s", count, elapsed));
        self.report_result(&result, state);
        Ok(())
    }

    fn report_result(&self, result: &DownloadResult, state: &mut RunState) {
        if !result.success {
            state.summary.failed += 1;
            let message = match &result.error {
                Some(reason) => format!("⚠️ 下载失败: {} ({})", result.url, reason),
                None => format!("⚠️ 下载失败: {}", result.url),
            };
            self.reporter.warning(&message);
            return;
        }

        if result.skipped {
            state.summary.skipped += 1;
            self.reporter.warning(&format!(
                "文件已存在，跳过下载: {}",
                result.output_path.display()
            ));
        } else {
            state.summary.downloaded += 1;
            state.summary.bytes_written += result.file_size_bytes.unwrap_or(0);
        }

        self.reporter.success(&format!(
            "✅ 下载成功，使用 {:.2}s，文件大小：{:.2} MB",
            result.elapsed_seconds,
            result.file_size_mb().unwrap_or(0.0)
        ));
    }

    fn cancelled(&self, state: &RunState) -> RunOutcome {
        info!(run_id = %state.summary.run_id, "Stop requested");
        self.reporter.warning(&format!(
            "下载已停止，共下载 {} 张图片",
            state.summary.attempted
        ));
        RunOutcome::Cancelled
    }
}

/// Formats an error with all of its sources, outermost first.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchError, PageResponse};
    use crate::reporter::StatusLevel;
    use crate::testing::fixtures::{page_of, run_request};
    use crate::testing::{MockImageDownloader, MockPageFetcher, RecordingReporter};
    use std::path::PathBuf;
    use std::time::Duration;

    struct Harness {
        fetcher: MockPageFetcher,
        downloader: MockImageDownloader,
        reporter: RecordingReporter,
        orchestrator: DownloadOrchestrator,
    }

    fn harness() -> Harness {
        let fetcher = MockPageFetcher::new();
        let downloader = MockImageDownloader::new();
        let reporter = RecordingReporter::new();
        let orchestrator = DownloadOrchestrator::new(
            Arc::new(fetcher.clone()),
            Arc::new(downloader.clone()),
            Arc::new(reporter.clone()),
        );
        Harness {
            fetcher,
            downloader,
            reporter,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_two_items_then_empty_page() {
        let h = harness();
        h.fetcher
            .set_page(
                1,
                page_of(
                    &[
                        "https://cdn.example.com/a/one.png",
                        "https://cdn.example.com/a/two.png",
                    ],
                    2,
                ),
            )
            .await;

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.last_page, Some(2));
        assert_eq!(h.fetcher.requested_pages().await, vec![1, 2]);

        let downloads = h.downloader.recorded_downloads().await;
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].destination, PathBuf::from("/out/one.png"));
        assert_eq!(downloads[1].destination, PathBuf::from("/out/two.png"));
        assert_eq!(downloads[0].browser_path, PathBuf::from("/usr/bin/chromium"));

        assert!(h.reporter.contains("共下载 2 张图片"));
        assert!(h.reporter.contains("开始下载第 1 张图片"));
        assert!(h.reporter.contains("第 2 张图片下载耗时："));
        assert_eq!(h.downloader.shutdown_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_first_page_downloads_nothing() {
        let h = harness();

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.attempted, 0);
        assert_eq!(h.fetcher.requested_pages().await, vec![1]);
        assert!(h.downloader.recorded_downloads().await.is_empty());
        assert!(h.reporter.contains("下载完成，共下载 0 张图片"));
    }

    #[tokio::test]
    async fn test_pagination_starts_at_start_page_without_gaps() {
        let h = harness();
        for page in 5..=7 {
            let url = format!("https://cdn.example.com/p{}.png", page);
            h.fetcher.set_page(page, page_of(&[url.as_str()], 100)).await;
        }

        let mut request = run_request("/out");
        request.start_page = 5;
        request.page_size = 1;
        h.orchestrator.run(&request, &StopSignal::new()).await.unwrap();

        assert_eq!(h.fetcher.requested_pages().await, vec![5, 6, 7, 8]);
        let sizes: Vec<u32> = h
            .fetcher
            .recorded_requests()
            .await
            .iter()
            .map(|r| r.page_size)
            .collect();
        assert_eq!(sizes, vec![1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_failed_download_does_not_stop_run() {
        let h = harness();
        h.fetcher
            .set_page(
                1,
                page_of(
                    &["https://cdn.example.com/bad.png", "https://cdn.example.com/good.png"],
                    2,
                ),
            )
            .await;
        h.downloader.fail_url("https://cdn.example.com/bad.png").await;

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.downloaded, 1);
        assert!(h.reporter.contains("⚠️ 下载失败: https://cdn.example.com/bad.png"));
        assert_eq!(h.reporter.lines_at(StatusLevel::Warning).len(), 1);
    }

    #[tokio::test]
    async fn test_url_without_file_name_counts_as_failure() {
        let h = harness();
        h.fetcher
            .set_page(1, page_of(&["https://cdn.example.com/dir/"], 1))
            .await;

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.failed, 1);
        assert!(h.downloader.recorded_downloads().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_ends_run() {
        let h = harness();
        h.fetcher
            .set_page(1, page_of(&["https://cdn.example.com/one.png"], 10))
            .await;
        h.fetcher
            .set_page_error(
                2,
                FetchError::NetworkTimeout {
                    page: 2,
                    timeout: Duration::from_secs(20),
                },
            )
            .await;

        let err = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Fetch(FetchError::NetworkTimeout { .. })));
        assert_eq!(h.fetcher.requested_pages().await, vec![1, 2]);
        assert_eq!(h.downloader.shutdown_count().await, 1);

        let errors = h.reporter.lines_at(StatusLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("运行失败: page fetch failed: "));
        assert!(errors[0].message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_fetching() {
        let h = harness();
        let mut request = run_request("/out");
        request.page_size = 0;

        let err = h
            .orchestrator
            .run(&request, &StopSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::InvalidRequest(_)));
        assert!(h.fetcher.requested_pages().await.is_empty());
        assert_eq!(h.downloader.shutdown_count().await, 1);
    }

    #[tokio::test]
    async fn test_stop_before_start_fetches_nothing() {
        let h = harness();
        let stop = StopSignal::new();
        stop.request_stop();

        let summary = h.orchestrator.run(&run_request("/out"), &stop).await.unwrap();

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert!(h.fetcher.requested_pages().await.is_empty());
        assert!(h.reporter.contains("下载已停止"));
    }

    #[tokio::test]
    async fn test_stop_mid_page_skips_remaining_items() {
        let h = harness();
        h.fetcher
            .set_page(
                1,
                page_of(
                    &[
                        "https://cdn.example.com/1.png",
                        "https://cdn.example.com/2.png",
                        "https://cdn.example.com/3.png",
                    ],
                    3,
                ),
            )
            .await;
        let stop = StopSignal::new();
        h.downloader.stop_after(1, stop.clone()).await;

        let summary = h.orchestrator.run(&run_request("/out"), &stop).await.unwrap();

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.attempted, 1);
        assert_eq!(h.fetcher.requested_pages().await, vec![1]);
        assert_eq!(h.downloader.shutdown_count().await, 1);
    }

    #[tokio::test]
    async fn test_total_mismatch_warns_once() {
        let h = harness();
        h.fetcher
            .set_page(1, page_of(&["https://cdn.example.com/1.png"], 1))
            .await;
        h.fetcher
            .set_page(
                2,
                page_of(
                    &["https://cdn.example.com/2.png", "https://cdn.example.com/3.png"],
                    1,
                ),
            )
            .await;
        // The terminating page still carries the API's total.
        h.fetcher.set_page(3, PageResponse::empty(1)).await;

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.reported_total, Some(1));
        assert_eq!(h.reporter.lines_at(StatusLevel::Warning).len(), 1);
        assert!(h.reporter.contains("超过总数 1"));
    }

    #[tokio::test]
    async fn test_skipped_items_are_counted() {
        let h = harness();
        h.fetcher
            .set_page(1, page_of(&["https://cdn.example.com/old.png"], 1))
            .await;
        h.downloader.skip_url("https://cdn.example.com/old.png").await;

        let summary = h
            .orchestrator
            .run(&run_request("/out"), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.downloaded, 0);
        assert!(h.reporter.contains("文件已存在，跳过下载: /out/old.png"));
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = OrchestratorError::Fetch(FetchError::MalformedResponse {
            page: 3,
            reason: "missing field `data`".to_string(),
        });
        assert_eq!(
            error_chain(&err),
            "page fetch failed: Malformed response for page 3: missing field `data`"
        );
    }
}
