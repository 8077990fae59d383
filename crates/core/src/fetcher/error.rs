//! Error types for the fetcher module.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a page of the picture list.
///
/// Every variant is fatal for a run: a page that cannot be read is never
/// mistaken for the empty page that ends pagination.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured bound.
    #[error("Request for page {page} timed out after {timeout:?}")]
    NetworkTimeout { page: u32, timeout: Duration },

    /// The body was not JSON or lacked `data.pageData` / `data.total`.
    #[error("Malformed response for page {page}: {reason}")]
    MalformedResponse { page: u32, reason: String },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} for page {page}: {body}")]
    HttpStatus { page: u32, status: u16, body: String },

    /// Connection-level or protocol failure.
    #[error("Request for page {page} failed")]
    Request {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client")]
    ClientInit(#[source] reqwest::Error),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkTimeout { .. } => "timeout",
            Self::MalformedResponse { .. } => "malformed",
            Self::HttpStatus { .. } => "http_status",
            Self::Request { .. } => "request",
            Self::ClientInit(_) => "client_init",
        }
    }
}
