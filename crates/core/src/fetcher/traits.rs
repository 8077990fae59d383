//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;
use super::types::{PageRequest, PageResponse};

/// A source of paginated picture listings.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches one page.
    ///
    /// An empty `items` list is a successful response that marks the end of
    /// the listing; any failure to obtain or parse the page is an error.
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, FetchError>;
}
