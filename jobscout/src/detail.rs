//! Fetching full records for cached jobs.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::config::DetailSelectors;
use crate::errors::JobScoutError;
use crate::extract::DetailExtractor;
use crate::fetch::PageFetcher;
use crate::models::{DetailFailure, JobDetail, JobSummary, PartialDetail};
use crate::observability::SpanTimer;

/// Fetches a job's detail page and extracts the full record.
///
/// Failures never touch the cached summary; they come back as a
/// [`PartialDetail`] carrying the summary and the reason.
#[derive(Clone)]
pub struct DetailFetcher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: DetailExtractor,
}

impl std::fmt::Debug for DetailFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailFetcher")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl DetailFetcher {
    /// Creates a detail fetcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>, selectors: &DetailSelectors) -> Result<Self, JobScoutError> {
        Ok(Self {
            fetcher,
            extractor: DetailExtractor::new(selectors)?,
        })
    }

    /// Fetches and extracts the detail record for `job`.
    pub async fn fetch_detail(
        &self,
        job: &JobSummary,
        cancel: &CancellationToken,
    ) -> Result<JobDetail, PartialDetail> {
        let partial = |failure: DetailFailure| PartialDetail {
            summary: job.clone(),
            failure,
        };

        let timer = SpanTimer::start("detail_fetch");
        let page = self
            .fetcher
            .fetch(&job.source_url, cancel)
            .await
            .map_err(|err| {
                warn!(url = %job.source_url, error = %err, "Detail fetch failed");
                partial(DetailFailure::Fetch(err))
            })?;
        debug!(
            url = %job.source_url,
            fetch_ms = timer.elapsed_ms(),
            bytes = page.text.len(),
            "Fetched detail page"
        );

        let detail = self.extractor.extract(&page.text, job).map_err(|failure| {
            warn!(url = %job.source_url, %failure, "Detail extraction failed");
            partial(failure)
        })?;
        debug!(
            sequence_number = job.sequence_number,
            requirements = detail.requirements.len(),
            total_ms = timer.finish(),
            "Extracted job detail"
        );
        Ok(detail)
    }
}
