//! The page fetching seam.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::cancellation::CancellationToken;
use crate::errors::JobScoutError;

/// Result of a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body as text.
    pub text: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchResult {
    /// A 200 HTML response, mostly for tests and canned fetchers.
    #[must_use]
    pub fn html(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            text: text.into(),
            final_url: url.into(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            duration_ms: 0.0,
        }
    }

    /// Whether the response is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Converts to dictionary, without the body.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("status_code".to_string(), serde_json::json!(self.status_code));
        dict.insert("final_url".to_string(), serde_json::json!(self.final_url));
        dict.insert("content_type".to_string(), serde_json::json!(self.content_type));
        dict.insert("duration_ms".to_string(), serde_json::json!(self.duration_ms));
        dict.insert("bytes".to_string(), serde_json::json!(self.text.len()));
        dict
    }
}

/// Retrieves pages for the search and detail pipelines.
///
/// Implementations bound each fetch in time, stop when `cancel` fires, and
/// return `Ok` only for successful responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL.
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchResult, JobScoutError>;
}
