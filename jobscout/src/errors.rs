//! Error types for the jobscout core.
//!
//! Only fetch-level failures and configuration problems are errors. Query
//! ambiguity resolves to defaults inside the parser, extraction gaps resolve
//! to sentinels or skipped cards inside the extractors, and an unknown job
//! reference is a first-class [`DetailOutcome::NotFound`] value.
//!
//! [`DetailOutcome::NotFound`]: crate::models::DetailOutcome::NotFound

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for jobscout operations.
#[derive(Debug, Clone, Error)]
pub enum JobScoutError {
    /// A page could not be retrieved: network error or non-success status.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        /// The attempted URL.
        url: String,
        /// Human-readable failure reason.
        reason: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },

    /// A fetch exceeded its time bound.
    #[error("Fetch timed out after {timeout_seconds}s: {url}")]
    Timeout {
        /// The attempted URL.
        url: String,
        /// The bound that was exceeded.
        timeout_seconds: f64,
    },

    /// The caller cancelled the operation.
    #[error("Fetch cancelled for {url}: {reason}")]
    Cancelled {
        /// The URL being fetched when cancellation was observed.
        url: String,
        /// The cancellation reason.
        reason: String,
    },

    /// A configuration value cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl JobScoutError {
    /// Creates a non-retryable fetch error.
    #[must_use]
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
            status: None,
            retryable: false,
        }
    }

    /// Creates a retryable fetch error (connection reset, DNS hiccup, ...).
    #[must_use]
    pub fn transient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
            status: None,
            retryable: true,
        }
    }

    /// Creates a fetch error for a non-success HTTP status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16, retryable: bool) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: format!("HTTP {status}"),
            status: Some(status),
            retryable,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>, timeout_seconds: f64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_seconds,
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            Self::Cancelled { .. } | Self::InvalidConfig(_) | Self::Serialization(_) => false,
        }
    }

    /// Whether this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The URL involved in the failure, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. } | Self::Timeout { url, .. } | Self::Cancelled { url, .. } => {
                Some(url)
            }
            Self::InvalidConfig(_) | Self::Serialization(_) => None,
        }
    }

    /// Short machine-readable kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "FetchFailure",
            Self::Timeout { .. } => "FetchTimeout",
            Self::Cancelled { .. } => "Cancelled",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::Serialization(_) => "Serialization",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map.insert("retryable".to_string(), serde_json::json!(self.is_retryable()));

        match self {
            Self::Fetch { url, status, .. } => {
                map.insert("url".to_string(), serde_json::json!(url));
                if let Some(code) = status {
                    map.insert("status".to_string(), serde_json::json!(code));
                }
            }
            Self::Timeout { url, timeout_seconds } => {
                map.insert("url".to_string(), serde_json::json!(url));
                map.insert("timeout_seconds".to_string(), serde_json::json!(timeout_seconds));
            }
            Self::Cancelled { url, reason } => {
                map.insert("url".to_string(), serde_json::json!(url));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::InvalidConfig(_) | Self::Serialization(_) => {}
        }

        map
    }
}

impl From<serde_json::Error> for JobScoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for JobScoutError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidConfig(format!("invalid pattern: {err}"))
    }
}

impl From<url::ParseError> for JobScoutError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(format!("invalid URL: {err}"))
    }
}
