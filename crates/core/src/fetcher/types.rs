//! Types for the fetcher module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::FetchError;

/// One page request against the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Listing endpoint.
    pub api_url: String,
    /// 1-based page number.
    pub page_number: u32,
    /// Items per page.
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(api_url: impl Into<String>, page_number: u32, page_size: u32) -> Self {
        Self {
            api_url: api_url.into(),
            page_number,
            page_size,
        }
    }

    /// The JSON body sent to the endpoint.
    pub fn payload(&self) -> PagePayload {
        PagePayload {
            current: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Wire form of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    pub current: u32,
    pub page_size: u32,
}

/// A picture entry from the listing.
///
/// Only `pictureUrl` is interpreted; every other field the API returns is
/// carried along untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(rename = "pictureUrl")]
    pub picture_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageItem {
    pub fn new(picture_url: impl Into<String>) -> Self {
        Self {
            picture_url: picture_url.into(),
            extra: Map::new(),
        }
    }
}

/// One page of the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub items: Vec<ImageItem>,
    /// Total reported by the API. Informational only.
    pub total: u64,
}

impl PageResponse {
    pub fn new(items: Vec<ImageItem>, total: u64) -> Self {
        Self { items, total }
    }

    /// An empty page, which ends pagination.
    pub fn empty(total: u64) -> Self {
        Self {
            items: Vec::new(),
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parses a response body shaped `{"data": {"pageData": [...], "total": n}}`.
    pub fn from_body(page: u32, body: &str) -> Result<Self, FetchError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse {
                page,
                reason: e.to_string(),
            })?;

        Ok(Self {
            items: envelope.data.page_data,
            total: envelope.data.total,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(rename = "pageData")]
    page_data: Vec<ImageItem>,
    total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization() {
        let request = PageRequest::new("https://api.example.com", 3, 24);
        let json = serde_json::to_value(request.payload()).unwrap();
        assert_eq!(json, serde_json::json!({"current": 3, "pageSize": 24}));
    }

    #[test]
    fn test_parse_page_keeps_extra_fields() {
        let body = r#"{
            "code": 200,
            "data": {
                "pageData": [
                    {"pictureUrl": "https://cdn.example.com/a/one.png", "id": 7, "title": "one"},
                    {"pictureUrl": "https://cdn.example.com/a/two.jpg"}
                ],
                "total": 42
            }
        }"#;

        let page = PageResponse::from_body(1, body).unwrap();
        assert_eq!(page.total, 42);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].picture_url, "https://cdn.example.com/a/one.png");
        assert_eq!(page.items[0].extra.get("id"), Some(&serde_json::json!(7)));
        assert_eq!(page.items[0].extra.get("title"), Some(&serde_json::json!("one")));
        assert!(page.items[1].extra.is_empty());
    }

    #[test]
    fn test_parse_empty_page() {
        let body = r#"{"data": {"pageData": [], "total": 42}}"#;
        let page = PageResponse::from_body(5, body).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 42);
    }

    #[test]
    fn test_parse_missing_page_data_is_malformed() {
        let body = r#"{"data": {"total": 0}}"#;
        let err = PageResponse::from_body(2, body).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { page: 2, .. }));
    }

    #[test]
    fn test_parse_missing_data_is_malformed() {
        let body = r#"{"code": 500, "msg": "internal error"}"#;
        let err = PageResponse::from_body(1, body).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_item_without_picture_url_is_malformed() {
        let body = r#"{"data": {"pageData": [{"id": 1}], "total": 1}}"#;
        let err = PageResponse::from_body(1, body).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_non_json_is_malformed() {
        let err = PageResponse::from_body(1, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }
}
