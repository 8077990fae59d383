//! Paginated picture-list fetching.
//!
//! This module provides the `PageFetcher` trait and an HTTP implementation
//! that POSTs `{"current": n, "pageSize": m}` to the listing endpoint and
//! extracts `data.pageData` / `data.total` from the JSON reply.

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use http::HttpPageFetcher;
pub use traits::PageFetcher;
pub use types::{ImageItem, PagePayload, PageRequest, PageResponse};
