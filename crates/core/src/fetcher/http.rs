//! HTTP page fetcher implementation.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::PageFetcher;
use super::types::{PageRequest, PageResponse};

/// Fetches listing pages with a JSON POST.
pub struct HttpPageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpPageFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder().build().map_err(FetchError::ClientInit)?;
        Ok(Self { client, config })
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    fn map_send_error(&self, page: u32, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::NetworkTimeout {
                page,
                timeout: self.timeout(),
            }
        } else {
            FetchError::Request {
                page,
                source: error,
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, FetchError> {
        let page = request.page_number;
        debug!(
            page,
            page_size = request.page_size,
            url = %request.api_url,
            "Fetching page"
        );

        // The timeout covers the whole exchange, body included.
        let response = self
            .client
            .post(&request.api_url)
            .timeout(self.timeout())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.config.user_agent)
            .json(&request.payload())
            .send()
            .await
            .map_err(|e| self.map_send_error(page, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(page, e))?;

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                page,
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed = PageResponse::from_body(page, &body)?;
        debug!(
            page,
            items = parsed.items.len(),
            total = parsed.total,
            "Page fetched"
        );
        Ok(parsed)
    }
}
