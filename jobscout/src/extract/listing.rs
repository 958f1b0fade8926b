//! Search results page to [`JobSummary`] records.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use tracing::debug;
use url::Url;

use super::selectors::SelectorChain;
use crate::config::ListingSelectors;
use crate::errors::JobScoutError;
use crate::models::{JobSummary, NOT_AVAILABLE, NOT_SPECIFIED};

/// Why a card was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No title selector produced text.
    MissingTitle,
    /// No link selector produced an `href`.
    MissingLink,
    /// The `href` could not be resolved to an absolute URL.
    InvalidLink(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => f.write_str("missing title"),
            Self::MissingLink => f.write_str("missing link"),
            Self::InvalidLink(href) => write!(f, "unresolvable link '{href}'"),
        }
    }
}

/// A card that was dropped, with its position among all cards on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCard {
    /// 0-based index among the page's cards.
    pub index: usize,
    /// Why it was dropped.
    pub reason: SkipReason,
}

/// Fields of one card before it gets its sequence number.
#[derive(Debug, Clone)]
struct ExtractedCard {
    external_id: Option<String>,
    title: String,
    company: String,
    location: String,
    salary: String,
    recency: String,
    source_url: String,
}

impl ExtractedCard {
    fn into_summary(self, sequence_number: u32) -> JobSummary {
        let description = JobSummary::describe(
            &self.title,
            &self.company,
            &self.location,
            &self.salary,
            &self.recency,
        );
        JobSummary {
            sequence_number,
            external_id: self.external_id,
            title: self.title,
            company: self.company,
            location: self.location,
            salary: self.salary,
            recency: self.recency,
            description,
            source_url: self.source_url,
        }
    }
}

/// Everything one extraction pass produced.
#[derive(Debug, Clone, Default)]
pub struct ListingExtraction {
    /// Extracted jobs, numbered from 1.
    pub jobs: Vec<JobSummary>,
    /// Cards dropped before the limit was reached.
    pub skipped: Vec<SkippedCard>,
    /// Card elements found on the page.
    pub cards_seen: usize,
}

#[derive(Default)]
struct Fold {
    cards: Vec<ExtractedCard>,
    skipped: Vec<SkippedCard>,
    seen: usize,
}

/// Pulls job cards out of a results page.
///
/// Each card is parsed on its own into `Result<card, SkipReason>`; a skip
/// drops that card only. Title and link are required, every other field
/// falls back to a sentinel.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    cards: Vec<Selector>,
    title: SelectorChain,
    link: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    salary: SelectorChain,
    recency: SelectorChain,
    id_attributes: Vec<String>,
    id_patterns: Vec<Regex>,
    origin: Url,
}

impl ListingExtractor {
    /// Compiles all selectors and id patterns.
    pub fn new(config: &ListingSelectors) -> Result<Self, JobScoutError> {
        let cards = config
            .cards
            .iter()
            .map(|s| {
                Selector::parse(s).map_err(|e| {
                    JobScoutError::InvalidConfig(format!("invalid card selector '{s}': {e:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id_patterns = config
            .id_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cards,
            title: SelectorChain::compile("title", &config.title)?,
            link: SelectorChain::compile("link", &config.link)?,
            company: SelectorChain::compile("company", &config.company)?,
            location: SelectorChain::compile("location", &config.location)?,
            salary: SelectorChain::compile("salary", &config.salary)?,
            recency: SelectorChain::compile("recency", &config.recency)?,
            id_attributes: config.id_attributes.clone(),
            id_patterns,
            origin: Url::parse(&config.site_origin)?,
        })
    }

    /// Extracts at most `limit` jobs, resolving links against the site origin.
    #[must_use]
    pub fn extract(&self, html: &str, limit: usize) -> Vec<JobSummary> {
        self.extract_report(html, &self.origin, limit).jobs
    }

    /// Extracts at most `limit` jobs with skip diagnostics, resolving
    /// relative links against `base`.
    #[must_use]
    pub fn extract_report(&self, html: &str, base: &Url, limit: usize) -> ListingExtraction {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let Some(cards) = self
            .cards
            .iter()
            .map(|selector| root.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
        else {
            debug!("No job cards matched any card selector");
            return ListingExtraction::default();
        };

        let fold = cards
            .into_iter()
            .enumerate()
            .fold(Fold::default(), |mut acc, (index, card)| {
                acc.seen += 1;
                if acc.cards.len() >= limit {
                    return acc;
                }
                match self.parse_card(card, base) {
                    Ok(extracted) => acc.cards.push(extracted),
                    Err(reason) => {
                        debug!(index, %reason, "Skipping job card");
                        acc.skipped.push(SkippedCard { index, reason });
                    }
                }
                acc
            });

        let jobs = fold
            .cards
            .into_iter()
            .zip(1u32..)
            .map(|(card, sequence_number)| card.into_summary(sequence_number))
            .collect();

        ListingExtraction {
            jobs,
            skipped: fold.skipped,
            cards_seen: fold.seen,
        }
    }

    fn parse_card(&self, card: ElementRef<'_>, base: &Url) -> Result<ExtractedCard, SkipReason> {
        let title = self.title.first_text(card).ok_or(SkipReason::MissingTitle)?;
        let href = self
            .link
            .first_attr(card, "href")
            .ok_or(SkipReason::MissingLink)?;
        let source_url = base
            .join(&href)
            .map_err(|_| SkipReason::InvalidLink(href.clone()))?;

        Ok(ExtractedCard {
            external_id: self.external_id(card, &source_url),
            title,
            company: self.company.first_text(card).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            location: self.location.first_text(card).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            salary: self.salary.first_text(card).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            recency: self.recency.first_text(card).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            source_url: source_url.into(),
        })
    }

    /// Explicit id attribute on the card or its link, else an id pattern
    /// matched against the job URL.
    fn external_id(&self, card: ElementRef<'_>, url: &Url) -> Option<String> {
        let from_attribute = self.id_attributes.iter().find_map(|attr| {
            card.value()
                .attr(attr)
                .map(str::to_string)
                .or_else(|| self.link.first_attr(card, attr))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

        from_attribute.or_else(|| {
            self.id_patterns.iter().find_map(|pattern| {
                pattern
                    .captures(url.as_str())
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
        })
    }
}
