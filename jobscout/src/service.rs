//! The two operations the core exposes: `search` and `detail`.

use std::sync::Arc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::config::JobScoutConfig;
use crate::detail::DetailFetcher;
use crate::errors::JobScoutError;
use crate::extract::ListingExtractor;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{
    DetailFailure, DetailOutcome, JobReference, NotFound, SearchOutcome, SearchParameters,
    SearchSession,
};
use crate::observability::{NoOpSearchObserver, SearchObserver, SpanTimer};
use crate::query::{QueryParser, SearchUrlBuilder};
use crate::store::{Clock, EvictionPolicy, ResultStore, SystemClock};

/// Runs searches and detail lookups against a shared session cache.
///
/// Each request runs parse, build, fetch and extract in sequence; many
/// requests may run at once on a shared service.
pub struct JobSearchService {
    config: JobScoutConfig,
    parser: QueryParser,
    urls: SearchUrlBuilder,
    listing: ListingExtractor,
    details: DetailFetcher,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<ResultStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn SearchObserver>,
}

impl std::fmt::Debug for JobSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSearchService")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl JobSearchService {
    /// Starts building a service.
    #[must_use]
    pub fn builder() -> JobSearchServiceBuilder {
        JobSearchServiceBuilder::new()
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &JobScoutConfig {
        &self.config
    }

    /// The shared session cache.
    #[must_use]
    pub const fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Parses free text without searching.
    #[must_use]
    pub fn parse(&self, text: &str) -> SearchParameters {
        self.parser.parse(text)
    }

    /// Builds the listing URL for parameters without searching.
    #[must_use]
    pub fn search_url(&self, parameters: &SearchParameters) -> Url {
        self.urls.build(parameters)
    }

    /// Searches with the default cancellation-free token.
    ///
    /// `limit` defaults to the configured default and is capped at
    /// `max_limit`; a limit of zero returns no jobs.
    pub async fn search(&self, text: &str, limit: Option<usize>) -> Result<SearchOutcome, JobScoutError> {
        self.search_with_cancel(text, limit, &CancellationToken::new()).await
    }

    /// Searches, stopping early if `cancel` fires during the fetch.
    ///
    /// Zero extracted jobs is a successful outcome; the session is stored
    /// either way. Only fetch-level failures are errors.
    pub async fn search_with_cancel(
        &self,
        text: &str,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, JobScoutError> {
        let timer = SpanTimer::start("search");
        let limits = &self.config.limits;
        let limit = limits.clamp(limit.unwrap_or(limits.default_limit));

        let parameters = self.parser.parse(text);
        let url = self.urls.build(&parameters);
        self.observer.on_search_start(text, url.as_str());

        let page = match self.fetcher.fetch(url.as_str(), cancel).await {
            Ok(page) => page,
            Err(err) => {
                self.observer.on_fetch_error(url.as_str(), &err);
                return Err(err);
            }
        };

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| url.clone());
        let extraction = self.listing.extract_report(&page.text, &base, limit);
        if extraction.cards_seen == 0 {
            warn!(url = %url, "No job cards recognized on listing page");
        }

        let session = SearchSession {
            session_id: Uuid::new_v4().to_string(),
            created_at: self.clock.now(),
            parameters,
            search_url: url.to_string(),
            jobs: extraction.jobs,
        };
        let outcome = SearchOutcome::from_session(&session);
        let report = self.store.put(session);

        let duration_ms = timer.finish();
        info!(
            session_id = %outcome.session_id,
            total_found = outcome.total_found,
            skipped = extraction.skipped.len(),
            evicted = report.evicted.len(),
            duration_ms,
            "Search stored"
        );
        self.observer.on_search_complete(
            &outcome.session_id,
            outcome.total_found,
            extraction.skipped.len(),
            duration_ms,
        );
        Ok(outcome)
    }

    /// Looks up a cached job and fetches its full record.
    pub async fn detail(&self, reference: &JobReference) -> DetailOutcome {
        self.detail_with_cancel(reference, &CancellationToken::new()).await
    }

    /// Looks up a cached job and fetches its full record, honouring `cancel`.
    ///
    /// Unknown references yield [`DetailOutcome::NotFound`] listing the jobs
    /// that do resolve; fetch or extraction failures yield
    /// [`DetailOutcome::Partial`].
    pub async fn detail_with_cancel(
        &self,
        reference: &JobReference,
        cancel: &CancellationToken,
    ) -> DetailOutcome {
        let timer = SpanTimer::start("detail");

        let outcome = match self.store.resolve(reference) {
            None => DetailOutcome::NotFound(NotFound {
                reference: reference.clone(),
                available: self.store.available(),
            }),
            Some(job) => match self.details.fetch_detail(&job, cancel).await {
                Ok(detail) => DetailOutcome::Found(detail),
                Err(partial) => {
                    if let DetailFailure::Fetch(ref err) = partial.failure {
                        self.observer.on_fetch_error(&job.source_url, err);
                    }
                    DetailOutcome::Partial(partial)
                }
            },
        };

        self.observer
            .on_detail_complete(reference, outcome.status(), timer.finish());
        outcome
    }
}

/// Builder for [`JobSearchService`].
#[derive(Default)]
pub struct JobSearchServiceBuilder {
    config: JobScoutConfig,
    fetcher: Option<Arc<dyn PageFetcher>>,
    store: Option<Arc<ResultStore>>,
    clock: Option<Arc<dyn Clock>>,
    policy: Option<Arc<dyn EvictionPolicy>>,
    observer: Option<Arc<dyn SearchObserver>>,
}

impl JobSearchServiceBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: JobScoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the page fetcher; defaults to an [`HttpFetcher`].
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Shares an existing store; its own clock and policy are kept.
    #[must_use]
    pub fn store(mut self, store: Arc<ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the clock used to stamp and expire sessions.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the eviction policy of the store built by this builder.
    #[must_use]
    pub fn eviction_policy(mut self, policy: Arc<dyn EvictionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the observer.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validates the configuration and compiles parsers and selectors.
    pub fn build(self) -> Result<JobSearchService, JobScoutError> {
        let config = self.config;
        config.validate()?;

        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new(config.fetch.clone())));

        let (store, clock) = match self.store {
            Some(store) => {
                let clock = self.clock.unwrap_or_else(|| store.clock());
                (store, clock)
            }
            None => {
                let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                let mut store = ResultStore::from_config(&config.store).with_clock(Arc::clone(&clock));
                if let Some(policy) = self.policy {
                    store = store.with_policy(policy);
                }
                (Arc::new(store), clock)
            }
        };

        Ok(JobSearchService {
            parser: QueryParser::new(config.query.clone())?,
            urls: SearchUrlBuilder::new(config.url.clone())?,
            listing: ListingExtractor::new(&config.listing)?,
            details: DetailFetcher::new(Arc::clone(&fetcher), &config.detail)?,
            fetcher,
            store,
            clock,
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(NoOpSearchObserver)),
            config,
        })
    }
}
