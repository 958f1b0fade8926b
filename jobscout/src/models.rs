//! Data models for job searches, sessions and detail lookups.
//!
//! Records are plain values: once a [`JobSummary`] or [`SearchSession`] is
//! built it is only ever shared (behind an `Arc` in the store), never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::JobScoutError;

/// Sentinel for a field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel for a salary that the listing does not state.
pub const NOT_SPECIFIED: &str = "not specified";

/// Recency filter narrowing results to recently posted jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recency {
    /// Posted today.
    #[serde(rename = "today")]
    Today,
    /// Posted within the last two days.
    #[serde(rename = "last_2_days")]
    Last2Days,
    /// Posted within the last week.
    #[default]
    #[serde(rename = "last_week")]
    LastWeek,
    /// Posted within the last two weeks.
    #[serde(rename = "last_2_weeks")]
    Last2Weeks,
}

impl Recency {
    /// All variants, in increasing window size.
    pub const ALL: [Self; 4] = [Self::Today, Self::Last2Days, Self::LastWeek, Self::Last2Weeks];

    /// The wire name of this filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Last2Days => "last_2_days",
            Self::LastWeek => "last_week",
            Self::Last2Weeks => "last_2_weeks",
        }
    }

    /// Parses a wire name, falling back to `fallback` for anything unknown.
    #[must_use]
    pub fn parse_or(value: &str, fallback: Self) -> Self {
        value.parse().unwrap_or(fallback)
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recency {
    type Err = JobScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| JobScoutError::InvalidConfig(format!("unknown recency '{s}'")))
    }
}

/// Structured search parameters produced by the query parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Job title keywords, lower-cased.
    pub job_title: String,
    /// Free-form location (town, "town, st", zip code).
    pub location: String,
    /// Search radius in miles, before any range clamping.
    pub radius_miles: u32,
    /// Recency filter.
    pub recency: Recency,
}

impl SearchParameters {
    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("job_title".to_string(), serde_json::json!(self.job_title));
        dict.insert("location".to_string(), serde_json::json!(self.location));
        dict.insert("radius_miles".to_string(), serde_json::json!(self.radius_miles));
        dict.insert("recency".to_string(), serde_json::json!(self.recency.as_str()));
        dict
    }
}

/// A job as it appears on a search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// 1-based position within the owning session.
    pub sequence_number: u32,
    /// Identifier scraped from the source site, when recoverable.
    pub external_id: Option<String>,
    /// Job title.
    pub title: String,
    /// Hiring company, or [`NOT_AVAILABLE`].
    pub company: String,
    /// Job location, or [`NOT_AVAILABLE`].
    pub location: String,
    /// Salary text, or [`NOT_SPECIFIED`].
    pub salary: String,
    /// Posting age as shown by the site, or [`NOT_AVAILABLE`].
    pub recency: String,
    /// Sentence built from the other fields.
    pub description: String,
    /// Absolute URL of the job's detail page.
    pub source_url: String,
}

impl JobSummary {
    /// Builds the synthesized description for a job.
    ///
    /// The salary clause is only added when a salary was found.
    #[must_use]
    pub fn describe(title: &str, company: &str, location: &str, salary: &str, recency: &str) -> String {
        let mut text = format!("{company} is hiring for a {title} position in {location}.");
        if salary != NOT_SPECIFIED && !salary.is_empty() {
            text.push_str(&format!(" Salary: {salary}."));
        }
        text.push_str(&format!(" Posted: {recency}."));
        text
    }

    /// The short form shown when a reference cannot be resolved.
    #[must_use]
    pub fn brief(&self) -> JobBrief {
        JobBrief {
            sequence_number: self.sequence_number,
            title: self.title.clone(),
            company: self.company.clone(),
        }
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("sequence_number".to_string(), serde_json::json!(self.sequence_number));
        if let Some(ref id) = self.external_id {
            dict.insert("external_id".to_string(), serde_json::json!(id));
        }
        dict.insert("title".to_string(), serde_json::json!(self.title));
        dict.insert("company".to_string(), serde_json::json!(self.company));
        dict.insert("location".to_string(), serde_json::json!(self.location));
        dict.insert("salary".to_string(), serde_json::json!(self.salary));
        dict.insert("recency".to_string(), serde_json::json!(self.recency));
        dict.insert("description".to_string(), serde_json::json!(self.description));
        dict.insert("source_url".to_string(), serde_json::json!(self.source_url));
        dict
    }
}

/// Title/company/sequence triple listing what a caller can still ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBrief {
    /// Sequence number the job resolves under.
    pub sequence_number: u32,
    /// Job title.
    pub title: String,
    /// Hiring company.
    pub company: String,
}

/// Full job record fetched from the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    /// Summary fields, refreshed from the detail page where it has them.
    #[serde(flatten)]
    pub summary: JobSummary,
    /// Requirement bullet points.
    pub requirements: Vec<String>,
    /// Employment type (full-time, contract, ...), or [`NOT_SPECIFIED`].
    pub job_type: String,
    /// Detail page text, truncated.
    pub full_text: String,
}

impl JobDetail {
    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = self.summary.to_dict();
        dict.insert("requirements".to_string(), serde_json::json!(self.requirements));
        dict.insert("job_type".to_string(), serde_json::json!(self.job_type));
        dict.insert("full_text".to_string(), serde_json::json!(self.full_text));
        dict
    }
}

/// One completed search and its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSession {
    /// Unique session id.
    pub session_id: String,
    /// When the search completed.
    pub created_at: DateTime<Utc>,
    /// Parsed parameters the search ran with.
    pub parameters: SearchParameters,
    /// The listing URL that was fetched.
    pub search_url: String,
    /// Extracted jobs in sequence order.
    pub jobs: Vec<JobSummary>,
}

impl SearchSession {
    /// Finds a job by its sequence number within this session.
    #[must_use]
    pub fn job(&self, sequence_number: u32) -> Option<&JobSummary> {
        self.jobs.iter().find(|j| j.sequence_number == sequence_number)
    }
}

/// What `search` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Id of the stored session.
    pub session_id: String,
    /// Parsed parameters.
    pub parameters: SearchParameters,
    /// The listing URL that was fetched.
    pub search_url: String,
    /// Extracted jobs.
    pub jobs: Vec<JobSummary>,
    /// Number of jobs found; zero is a valid answer, not a failure.
    pub total_found: usize,
}

impl SearchOutcome {
    /// Builds the outcome for a stored session.
    #[must_use]
    pub fn from_session(session: &SearchSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            parameters: session.parameters.clone(),
            search_url: session.search_url.clone(),
            jobs: session.jobs.clone(),
            total_found: session.jobs.len(),
        }
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("session_id".to_string(), serde_json::json!(self.session_id));
        dict.insert("parameters".to_string(), serde_json::json!(self.parameters.to_dict()));
        dict.insert("search_url".to_string(), serde_json::json!(self.search_url));
        dict.insert(
            "jobs".to_string(),
            serde_json::json!(self.jobs.iter().map(JobSummary::to_dict).collect::<Vec<_>>()),
        );
        dict.insert("total_found".to_string(), serde_json::json!(self.total_found));
        dict
    }
}

/// A short-lived pointer to a cached job.
///
/// Resolution order: external id, then sequence number (scoped to
/// `session_id` when set), then free-text match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    /// Restricts sequence and text lookups to one session.
    pub session_id: Option<String>,
    /// Sequence number within a session.
    pub sequence_number: Option<u32>,
    /// External id scraped from the site.
    pub external_id: Option<String>,
    /// Free text matched against titles and companies.
    pub text: Option<String>,
}

impl JobReference {
    /// References a job by sequence number.
    #[must_use]
    pub fn by_sequence(sequence_number: u32) -> Self {
        Self {
            sequence_number: Some(sequence_number),
            ..Default::default()
        }
    }

    /// References a job by external id.
    #[must_use]
    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Default::default()
        }
    }

    /// References a job by free text ("the AML specialist one").
    #[must_use]
    pub fn by_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Scopes the reference to a session.
    #[must_use]
    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Whether the reference names nothing to look up.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence_number.is_none()
            && self.external_id.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.text.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

/// Why a detail lookup only produced partial information.
#[derive(Debug, Clone)]
pub enum DetailFailure {
    /// The detail page could not be fetched.
    Fetch(JobScoutError),
    /// The page was fetched but held no recognizable detail container.
    Extraction(String),
}

impl DetailFailure {
    /// Whether retrying the lookup may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_retryable(),
            Self::Extraction(_) => false,
        }
    }
}

impl fmt::Display for DetailFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Extraction(reason) => write!(f, "Extraction failed: {reason}"),
        }
    }
}

/// Known summary fields plus the reason the detail lookup fell short.
#[derive(Debug, Clone)]
pub struct PartialDetail {
    /// The cached summary the lookup started from.
    pub summary: JobSummary,
    /// What went wrong.
    pub failure: DetailFailure,
}

impl PartialDetail {
    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("title".to_string(), serde_json::json!(self.summary.title));
        dict.insert("company".to_string(), serde_json::json!(self.summary.company));
        dict.insert(
            "sequence_number".to_string(),
            serde_json::json!(self.summary.sequence_number),
        );
        dict.insert("source_url".to_string(), serde_json::json!(self.summary.source_url));
        dict.insert("error".to_string(), serde_json::json!(self.failure.to_string()));
        dict.insert("retryable".to_string(), serde_json::json!(self.failure.is_retryable()));
        dict
    }
}

/// A reference that matched nothing in the retained sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    /// The reference as given.
    pub reference: JobReference,
    /// Jobs that currently resolve, to help the caller pick again.
    pub available: Vec<JobBrief>,
}

/// Result of a detail lookup.
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    /// The detail page was fetched and extracted.
    Found(JobDetail),
    /// The job was known but its detail page could not be used.
    Partial(PartialDetail),
    /// The reference resolved to no cached job.
    NotFound(NotFound),
}

impl DetailOutcome {
    /// Whether a full detail record was produced.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Whether the reference was unknown.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The full detail record, if any.
    #[must_use]
    pub const fn detail(&self) -> Option<&JobDetail> {
        match self {
            Self::Found(detail) => Some(detail),
            Self::Partial(_) | Self::NotFound(_) => None,
        }
    }

    /// Short status name: `found`, `partial` or `not_found`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Partial(_) => "partial",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = match self {
            Self::Found(detail) => detail.to_dict(),
            Self::Partial(partial) => partial.to_dict(),
            Self::NotFound(not_found) => {
                let mut dict = HashMap::new();
                dict.insert(
                    "available_jobs".to_string(),
                    serde_json::json!(not_found.available),
                );
                dict
            }
        };
        dict.insert("status".to_string(), serde_json::json!(self.status()));
        dict
    }
}
