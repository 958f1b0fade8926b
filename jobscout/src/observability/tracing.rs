//! Structured logging for the search and detail pipelines.

use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::errors::JobScoutError;
use crate::models::JobReference;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// global subscriber was already installed.
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Callbacks fired by the search service.
pub trait SearchObserver: Send + Sync {
    /// A search is about to fetch `url`.
    fn on_search_start(&self, query: &str, url: &str);

    /// A search finished and its session was stored.
    fn on_search_complete(&self, session_id: &str, total_found: usize, skipped: usize, duration_ms: f64);

    /// A listing or detail fetch failed.
    fn on_fetch_error(&self, url: &str, error: &JobScoutError);

    /// A detail lookup finished; `status` is `found`, `partial` or `not_found`.
    fn on_detail_complete(&self, reference: &JobReference, status: &str, duration_ms: f64);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Default)]
pub struct NoOpSearchObserver;

impl SearchObserver for NoOpSearchObserver {
    fn on_search_start(&self, _query: &str, _url: &str) {}
    fn on_search_complete(&self, _session_id: &str, _total_found: usize, _skipped: usize, _duration_ms: f64) {}
    fn on_fetch_error(&self, _url: &str, _error: &JobScoutError) {}
    fn on_detail_complete(&self, _reference: &JobReference, _status: &str, _duration_ms: f64) {}
}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct LoggingSearchObserver;

impl SearchObserver for LoggingSearchObserver {
    fn on_search_start(&self, query: &str, url: &str) {
        tracing::info!(query, url, "Search started");
    }

    fn on_search_complete(&self, session_id: &str, total_found: usize, skipped: usize, duration_ms: f64) {
        tracing::info!(
            session_id,
            total_found,
            skipped,
            duration_ms,
            "Search completed"
        );
    }

    fn on_fetch_error(&self, url: &str, error: &JobScoutError) {
        tracing::warn!(
            url,
            kind = error.kind(),
            retryable = error.is_retryable(),
            %error,
            "Fetch failed"
        );
    }

    fn on_detail_complete(&self, reference: &JobReference, status: &str, duration_ms: f64) {
        tracing::info!(
            sequence_number = ?reference.sequence_number,
            external_id = ?reference.external_id,
            status,
            duration_ms,
            "Detail lookup completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("extract");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "extract");
        assert!(timer.finish() >= 10.0);
    }

    #[test]
    fn test_observers_do_not_panic() {
        let error = JobScoutError::timeout("https://example.com", 15.0);
        let reference = JobReference::by_sequence(1);
        let observers: Vec<Box<dyn SearchObserver>> =
            vec![Box::new(NoOpSearchObserver), Box::new(LoggingSearchObserver)];

        for observer in observers {
            observer.on_search_start("hr admin jobs", "https://example.com/jobs");
            observer.on_search_complete("abc", 3, 1, 12.5);
            observer.on_fetch_error("https://example.com", &error);
            observer.on_detail_complete(&reference, "found", 4.0);
        }
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let _ = init_tracing("jobscout=debug", false);
        assert!(!init_tracing("jobscout=debug", true));
    }
}
