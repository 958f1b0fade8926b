//! # Jobscout
//!
//! Natural-language job search over scraped listing pages.
//!
//! Jobscout turns a request such as "hr admin jobs near winnetka within
//! 5 miles" into a listing-site search, extracts the result cards into
//! numbered summaries, and keeps recent result sets in a bounded cache so
//! follow-up requests ("tell me more about job 2") can fetch the full
//! posting.
//!
//! - **Query parsing**: free text to title, location, radius and recency
//! - **Listing extraction**: resilient selector chains over result cards
//! - **Session cache**: the most recent searches, indexed by number and id
//! - **Detail fetching**: full postings with partial results on failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobscout::prelude::*;
//!
//! let service = JobSearchService::builder()
//!     .config(JobScoutConfig::default().with_env_overrides())
//!     .build()?;
//!
//! let outcome = service.search("hr admin jobs near winnetka", None).await?;
//! for job in &outcome.jobs {
//!     println!("{}", job.description);
//! }
//!
//! match service.detail(&JobReference::by_sequence(1)).await {
//!     DetailOutcome::Found(detail) => println!("{}", detail.full_text),
//!     other => println!("{}", other.status()),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod detail;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod observability;
pub mod query;
pub mod service;
pub mod store;
pub mod testing;

#[cfg(test)]
mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{
        DetailSelectors, FetchConfig, JobScoutConfig, LimitConfig, ListingSelectors,
        QueryDefaults, RetryConfig, StoreConfig, UrlConfig,
    };
    pub use crate::detail::DetailFetcher;
    pub use crate::errors::JobScoutError;
    pub use crate::extract::{DetailExtractor, ListingExtractor};
    pub use crate::fetch::{FetchResult, HttpFetcher, PageFetcher};
    pub use crate::models::{
        DetailFailure, DetailOutcome, JobBrief, JobDetail, JobReference, JobSummary, NotFound,
        PartialDetail, Recency, SearchOutcome, SearchParameters, SearchSession,
    };
    pub use crate::observability::{
        init_tracing, LoggingSearchObserver, NoOpSearchObserver, SearchObserver,
    };
    pub use crate::query::{QueryParser, SearchUrlBuilder};
    pub use crate::service::{JobSearchService, JobSearchServiceBuilder};
    pub use crate::store::{Clock, EvictionPolicy, FifoEviction, ResultStore, SystemClock};
}
