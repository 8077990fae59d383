//! Mock page fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, PageFetcher, PageRequest, PageResponse};

/// Mock implementation of the PageFetcher trait.
///
/// Pages without a configured response come back empty, which ends a run.
/// Errors are returned once and then cleared.
#[derive(Debug, Clone, Default)]
pub struct MockPageFetcher {
    pages: Arc<RwLock<HashMap<u32, PageResponse>>>,
    errors: Arc<RwLock<HashMap<u32, FetchError>>>,
    requests: Arc<RwLock<Vec<PageRequest>>>,
}

impl MockPageFetcher {
    /// Create a new mock fetcher with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for `page`.
    pub async fn set_page(&self, page: u32, response: PageResponse) {
        self.pages.write().await.insert(page, response);
    }

    /// Make the next request for `page` fail with `error`.
    pub async fn set_page_error(&self, page: u32, error: FetchError) {
        self.errors.write().await.insert(page, error);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<PageRequest> {
        self.requests.read().await.clone()
    }

    /// Page numbers requested, in order.
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requests
            .read()
            .await
            .iter()
            .map(|r| r.page_number)
            .collect()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, FetchError> {
        self.requests.write().await.push(request.clone());

        if let Some(error) = self.errors.write().await.remove(&request.page_number) {
            return Err(error);
        }

        let pages = self.pages.read().await;
        Ok(pages
            .get(&request.page_number)
            .cloned()
            .unwrap_or_else(|| PageResponse::empty(0)))
    }
}
