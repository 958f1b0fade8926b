//! Page fetching.
//!
//! This module provides:
//! - [`PageFetcher`], the async seam the pipelines fetch through
//! - [`HttpFetcher`], a `reqwest`-backed implementation with retries

mod http;
mod protocols;

pub use http::HttpFetcher;
pub use protocols::{FetchResult, PageFetcher};

#[cfg(test)]
pub use protocols::MockPageFetcher;
