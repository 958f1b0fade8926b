//! Job detail page to [`JobDetail`].

use scraper::Html;

use super::selectors::{element_text, SelectorChain};
use crate::config::DetailSelectors;
use crate::errors::JobScoutError;
use crate::models::{DetailFailure, JobDetail, JobSummary, NOT_AVAILABLE, NOT_SPECIFIED};

/// Pulls the full record out of a job's detail page.
///
/// The page must contain one of the container selectors. Header fields are
/// looked up page-wide and fall back to the cached summary; requirements and
/// full text come from the container only.
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    container: SelectorChain,
    title: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    salary: SelectorChain,
    job_type: SelectorChain,
    requirements: SelectorChain,
    full_text_max_chars: usize,
}

impl DetailExtractor {
    /// Compiles all selector chains.
    pub fn new(config: &DetailSelectors) -> Result<Self, JobScoutError> {
        Ok(Self {
            container: SelectorChain::compile("container", &config.container)?,
            title: SelectorChain::compile("title", &config.title)?,
            company: SelectorChain::compile("company", &config.company)?,
            location: SelectorChain::compile("location", &config.location)?,
            salary: SelectorChain::compile("salary", &config.salary)?,
            job_type: SelectorChain::compile("job_type", &config.job_type)?,
            requirements: SelectorChain::compile("requirements", &config.requirements)?,
            full_text_max_chars: config.full_text_max_chars,
        })
    }

    /// Extracts the detail record for `summary` from `html`.
    pub fn extract(&self, html: &str, summary: &JobSummary) -> Result<JobDetail, DetailFailure> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let container = self.container.first_element(root).ok_or_else(|| {
            DetailFailure::Extraction("no detail container found on page".to_string())
        })?;

        let keep = |found: Option<String>, cached: &str, sentinel: &str| {
            found.unwrap_or_else(|| {
                if cached.is_empty() {
                    sentinel.to_string()
                } else {
                    cached.to_string()
                }
            })
        };

        let title = keep(self.title.first_text(root), &summary.title, NOT_AVAILABLE);
        let company = keep(self.company.first_text(root), &summary.company, NOT_AVAILABLE);
        let location = keep(self.location.first_text(root), &summary.location, NOT_AVAILABLE);
        let salary = keep(self.salary.first_text(root), &summary.salary, NOT_SPECIFIED);
        let job_type = self
            .job_type
            .first_text(root)
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());

        let description =
            JobSummary::describe(&title, &company, &location, &salary, &summary.recency);

        Ok(JobDetail {
            summary: JobSummary {
                title,
                company,
                location,
                salary,
                description,
                ..summary.clone()
            },
            requirements: self.requirements.all_texts(container),
            job_type,
            full_text: truncate_chars(&element_text(container), self.full_text_max_chars),
        })
    }
}

/// Truncates to at most `max` characters, on a character boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}
