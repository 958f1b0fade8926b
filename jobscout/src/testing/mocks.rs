//! Test doubles for the fetch, clock and observer seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::time::Duration;

use crate::cancellation::{run_until_cancelled, CancellationToken};
use crate::errors::JobScoutError;
use crate::fetch::{FetchResult, PageFetcher};
use crate::models::JobReference;
use crate::observability::SearchObserver;
use crate::store::Clock;

/// A fetcher serving canned responses by exact URL.
///
/// Unknown URLs get the default page when one is set, otherwise a 404
/// fetch error.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: RwLock<HashMap<String, Result<String, JobScoutError>>>,
    default_page: RwLock<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates a fetcher with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        self.set_page(url, body);
        self
    }

    /// Fails `url` with `error`.
    #[must_use]
    pub fn with_error(self, url: &str, error: JobScoutError) -> Self {
        self.responses.write().insert(url.to_string(), Err(error));
        self
    }

    /// Serves `body` for any URL without its own response.
    #[must_use]
    pub fn with_default_page(self, body: impl Into<String>) -> Self {
        *self.default_page.write() = Some(body.into());
        self
    }

    /// Replaces the response for `url`.
    pub fn set_page(&self, url: &str, body: impl Into<String>) {
        self.responses.write().insert(url.to_string(), Ok(body.into()));
    }

    /// URLs fetched so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of fetches so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchResult, JobScoutError> {
        self.calls.lock().push(url.to_string());
        if cancel.is_cancelled() {
            return Err(JobScoutError::cancelled(url, cancel.reason().unwrap_or_default()));
        }

        let response = self.responses.read().get(url).cloned();
        match response {
            Some(Ok(body)) => Ok(FetchResult::html(url, body)),
            Some(Err(err)) => Err(err),
            None => self
                .default_page
                .read()
                .clone()
                .map(|body| FetchResult::html(url, body))
                .ok_or_else(|| JobScoutError::status(url, 404, false)),
        }
    }
}

/// A fetcher that takes `delay` to answer and honours cancellation.
#[derive(Debug)]
pub struct SlowFetcher {
    delay: Duration,
    body: String,
    calls: Mutex<usize>,
}

impl SlowFetcher {
    /// Creates a slow fetcher answering with an empty page.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            body: "<html><body></body></html>".to_string(),
            calls: Mutex::new(0),
        }
    }

    /// Sets the page returned once the delay has passed.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Number of fetches started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl PageFetcher for SlowFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchResult, JobScoutError> {
        *self.calls.lock() += 1;
        run_until_cancelled(cancel, tokio::time::sleep(self.delay))
            .await
            .map(|()| FetchResult::html(url, self.body.clone()))
            .ok_or_else(|| JobScoutError::cancelled(url, cancel.reason().unwrap_or_default()))
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        *self.now.write() += by;
    }

    /// Sets the current time.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// An observer that records each event as a short string.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl SearchObserver for RecordingObserver {
    fn on_search_start(&self, _query: &str, url: &str) {
        self.events.lock().push(format!("search_start:{url}"));
    }

    fn on_search_complete(&self, _session_id: &str, total_found: usize, _skipped: usize, _duration_ms: f64) {
        self.events.lock().push(format!("search_complete:{total_found}"));
    }

    fn on_fetch_error(&self, _url: &str, error: &JobScoutError) {
        self.events.lock().push(format!("fetch_error:{}", error.kind()));
    }

    fn on_detail_complete(&self, _reference: &JobReference, status: &str, _duration_ms: f64) {
        self.events.lock().push(format!("detail_complete:{status}"));
    }
}
