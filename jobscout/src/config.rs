//! Configuration types for query parsing, fetching, extraction and caching.
//!
//! Every field has a serde default so partial JSON documents are valid
//! configurations.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::errors::JobScoutError;
use crate::models::Recency;

/// Lower bound applied to the fetch timeout.
pub const MIN_TIMEOUT_SECONDS: f64 = 1.0;

/// Upper bound applied to the fetch timeout.
pub const MAX_TIMEOUT_SECONDS: f64 = 60.0;

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds, per attempt.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Pool of user agent strings; each request picks one at random.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    /// Additional headers to include.
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_size")]
    pub max_response_size: usize,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout() -> f64 {
    15.0
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:116.0) Gecko/20100101 Firefox/116.0".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15".to_string(),
    ]
}

fn default_headers() -> HashMap<String, String> {
    [
        ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("Accept-Language", "en-US,en;q=0.5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_max_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agents: default_user_agents(),
            headers: default_headers(),
            max_response_size: default_max_size(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Replaces the user agent pool with a single agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agents = vec![user_agent.into()];
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets the timeout as a Duration, clamped into the supported range.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        let seconds = if self.timeout_seconds.is_finite() {
            self.timeout_seconds
        } else {
            default_timeout()
        };
        Duration::from_secs_f64(seconds.clamp(MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS))
    }

    /// Picks a user agent from the pool.
    #[must_use]
    pub fn pick_user_agent(&self) -> String {
        use rand::seq::SliceRandom;
        self.user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| format!("jobscout/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Retry configuration for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base delay in seconds; attempt `n` waits roughly `n * base`.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Whether to randomize delays.
    #[serde(default = "default_true")]
    pub jitter: bool,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_delay() -> f64 {
    1.2
}

fn default_max_delay() -> f64 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_seconds: default_retry_delay(),
            max_delay_seconds: default_max_delay(),
            jitter: true,
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculates the delay before retry number `attempt` (1-based).
    ///
    /// Back-off is linear; with jitter the delay is scaled by a random
    /// factor in `[0.5, 1.0]`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let delay = (self.retry_delay_seconds * attempt as f64).min(self.max_delay_seconds);
        let delay = if self.jitter {
            delay * (0.5 + 0.5 * rand::random::<f64>())
        } else {
            delay
        };
        Duration::from_secs_f64(delay.max(0.0))
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Defaults the query parser falls back to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Radius when the text has no "within N miles" clause.
    #[serde(default = "default_radius")]
    pub radius_miles: u32,
    /// Recency when the text names no recognized window.
    #[serde(default)]
    pub recency: Recency,
    /// Title when nothing precedes "near".
    #[serde(default)]
    pub job_title: String,
    /// Location when the text has no "near X" clause.
    #[serde(default)]
    pub location: String,
}

fn default_radius() -> u32 {
    5
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            radius_miles: default_radius(),
            recency: Recency::default(),
            job_title: String::new(),
            location: String::new(),
        }
    }
}

impl QueryDefaults {
    /// Sets the default radius.
    #[must_use]
    pub const fn with_radius(mut self, miles: u32) -> Self {
        self.radius_miles = miles;
        self
    }

    /// Sets the default recency.
    #[must_use]
    pub const fn with_recency(mut self, recency: Recency) -> Self {
        self.recency = recency;
        self
    }
}

/// How search URLs are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Search page address without query string.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Smallest radius the site accepts.
    #[serde(default = "default_min_radius")]
    pub min_radius_miles: u32,
    /// Largest radius the site accepts.
    #[serde(default = "default_max_radius")]
    pub max_radius_miles: u32,
    /// Name of the fixed sort parameter.
    #[serde(default = "default_sort_param")]
    pub sort_param: String,
    /// Value of the fixed sort parameter.
    #[serde(default = "default_sort_value")]
    pub sort_value: String,
    /// Recency that is left out of the URL.
    #[serde(default)]
    pub default_recency: Recency,
}

fn default_base_url() -> String {
    "https://www.monster.com/jobs/search".to_string()
}

fn default_min_radius() -> u32 {
    1
}

fn default_max_radius() -> u32 {
    50
}

fn default_sort_param() -> String {
    "so".to_string()
}

fn default_sort_value() -> String {
    "m.h.sh".to_string()
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            min_radius_miles: default_min_radius(),
            max_radius_miles: default_max_radius(),
            sort_param: default_sort_param(),
            sort_value: default_sort_value(),
            default_recency: Recency::default(),
        }
    }
}

impl UrlConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Selector chains for search result pages.
///
/// Each field lists CSS selectors in preference order; the first one that
/// yields non-empty text wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Job card containers; the first selector matching any element is used.
    #[serde(default = "default_card_selectors")]
    pub cards: Vec<String>,
    /// Job title.
    #[serde(default = "default_title_selectors")]
    pub title: Vec<String>,
    /// Anchor whose `href` is the job's detail page.
    #[serde(default = "default_link_selectors")]
    pub link: Vec<String>,
    /// Hiring company.
    #[serde(default = "default_company_selectors")]
    pub company: Vec<String>,
    /// Job location.
    #[serde(default = "default_location_selectors")]
    pub location: Vec<String>,
    /// Salary text.
    #[serde(default = "default_salary_selectors")]
    pub salary: Vec<String>,
    /// Posting age.
    #[serde(default = "default_recency_selectors")]
    pub recency: Vec<String>,
    /// Attributes carrying an explicit job id, on the card or its link.
    #[serde(default = "default_id_attributes")]
    pub id_attributes: Vec<String>,
    /// Regex patterns recovering a job id from its URL (first capture group).
    #[serde(default = "default_id_patterns")]
    pub id_patterns: Vec<String>,
    /// Origin used to resolve relative job links.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_card_selectors() -> Vec<String> {
    strings(&[
        "article[data-testid=\"JobCard\"]",
        "#card-scroll-container div[class*=\"JobCardWrap\"]",
        "section.card-content",
        "div.flex-row",
    ])
}

fn default_title_selectors() -> Vec<String> {
    strings(&["a[data-testid=\"jobTitle\"]", "h2.title a", "h2.card-title a", "h2", "h3"])
}

fn default_link_selectors() -> Vec<String> {
    strings(&["a[data-testid=\"jobTitle\"]", "h2.title a", "h2.card-title a", "a[href]"])
}

fn default_company_selectors() -> Vec<String> {
    strings(&[
        "span[data-testid=\"company\"]",
        "div.company span.name",
        "div.company",
        "p.company",
    ])
}

fn default_location_selectors() -> Vec<String> {
    strings(&["span[data-testid=\"jobDetailLocation\"]", "div.location", ".location"])
}

fn default_salary_selectors() -> Vec<String> {
    strings(&["span[data-testid=\"jobDetailSalary\"]", ".salary"])
}

fn default_recency_selectors() -> Vec<String> {
    strings(&["span[data-testid=\"jobDetailDateRecency\"]", "time", ".posted"])
}

fn default_id_attributes() -> Vec<String> {
    strings(&["data-job-id", "data-jobid", "data-id"])
}

fn default_id_patterns() -> Vec<String> {
    strings(&[
        r"([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
        r"[?&]jobid=([A-Za-z0-9_-]+)",
    ])
}

fn default_site_origin() -> String {
    "https://www.monster.com".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            cards: default_card_selectors(),
            title: default_title_selectors(),
            link: default_link_selectors(),
            company: default_company_selectors(),
            location: default_location_selectors(),
            salary: default_salary_selectors(),
            recency: default_recency_selectors(),
            id_attributes: default_id_attributes(),
            id_patterns: default_id_patterns(),
            site_origin: default_site_origin(),
        }
    }
}

/// Selector chains for job detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    /// Main detail container; a page matching none of these is unusable.
    #[serde(default = "default_container_selectors")]
    pub container: Vec<String>,
    /// Job title.
    #[serde(default = "default_detail_title_selectors")]
    pub title: Vec<String>,
    /// Hiring company.
    #[serde(default = "default_detail_company_selectors")]
    pub company: Vec<String>,
    /// Job location.
    #[serde(default = "default_location_selectors")]
    pub location: Vec<String>,
    /// Salary text.
    #[serde(default = "default_salary_selectors")]
    pub salary: Vec<String>,
    /// Employment type.
    #[serde(default = "default_job_type_selectors")]
    pub job_type: Vec<String>,
    /// Requirement items, searched inside the container.
    #[serde(default = "default_requirement_selectors")]
    pub requirements: Vec<String>,
    /// Maximum characters of container text kept.
    #[serde(default = "default_full_text_max")]
    pub full_text_max_chars: usize,
}

fn default_container_selectors() -> Vec<String> {
    strings(&[
        "div[class*=\"SmallJobViewWrapper\"]",
        "[data-testid=\"job-description\"]",
        ".job-description",
        ".job-details",
        "main",
        "article",
    ])
}

fn default_detail_title_selectors() -> Vec<String> {
    strings(&["h1", "[data-testid=\"jobTitle\"]", ".job-title"])
}

fn default_detail_company_selectors() -> Vec<String> {
    strings(&["[data-testid=\"jobHeaderCompanyName\"]", "[data-testid=\"company\"]", ".company"])
}

fn default_job_type_selectors() -> Vec<String> {
    strings(&["[data-testid=\"jobDetailJobType\"]", ".job-type", ".employment-type"])
}

fn default_requirement_selectors() -> Vec<String> {
    strings(&[
        "[data-testid=\"jobRequirements\"] li",
        ".requirements li",
        ".qualifications li",
    ])
}

fn default_full_text_max() -> usize {
    2000
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            container: default_container_selectors(),
            title: default_detail_title_selectors(),
            company: default_detail_company_selectors(),
            location: default_location_selectors(),
            salary: default_salary_selectors(),
            job_type: default_job_type_selectors(),
            requirements: default_requirement_selectors(),
            full_text_max_chars: default_full_text_max(),
        }
    }
}

/// Configuration for the session cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum retained sessions.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Sessions older than this are dropped; `None` keeps them until evicted.
    #[serde(default)]
    pub session_ttl_seconds: Option<u64>,
}

fn default_capacity() -> usize {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            session_ttl_seconds: None,
        }
    }
}

impl StoreConfig {
    /// The session TTL as a Duration.
    #[must_use]
    pub fn session_ttl(&self) -> Option<Duration> {
        self.session_ttl_seconds.map(Duration::from_secs)
    }
}

/// Combined configuration for the job search core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobScoutConfig {
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Query parser defaults.
    #[serde(default)]
    pub query: QueryDefaults,
    /// URL building configuration.
    #[serde(default)]
    pub url: UrlConfig,
    /// Search page selectors.
    #[serde(default)]
    pub listing: ListingSelectors,
    /// Detail page selectors.
    #[serde(default)]
    pub detail: DetailSelectors,
    /// Session cache configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Search limits.
    #[serde(default)]
    pub limits: LimitConfig,
}

/// Bounds on how many jobs a search returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Limit used when the caller gives none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Largest limit a caller may ask for.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    50
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl LimitConfig {
    /// Caps a requested limit at `max_limit`. Zero stays zero.
    #[must_use]
    pub fn clamp(&self, requested: usize) -> usize {
        requested.min(self.max_limit)
    }
}

impl JobScoutConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, JobScoutError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, JobScoutError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            JobScoutError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Applies `JOBSCOUT_*` environment overrides.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("JOBSCOUT_TIMEOUT_SECONDS") {
            match raw.trim().parse::<f64>() {
                Ok(v) => self.fetch.timeout_seconds = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid JOBSCOUT_TIMEOUT_SECONDS"),
            }
        }
        if let Some(raw) = lookup("JOBSCOUT_DEFAULT_RADIUS") {
            match raw.trim().parse::<u32>() {
                Ok(v) => self.query.radius_miles = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid JOBSCOUT_DEFAULT_RADIUS"),
            }
        }
        if let Some(raw) = lookup("JOBSCOUT_BASE_URL") {
            if url::Url::parse(raw.trim()).is_ok() {
                self.url.base_url = raw.trim().to_string();
            } else {
                warn!(value = %raw, "Ignoring invalid JOBSCOUT_BASE_URL");
            }
        }
        if let Some(raw) = lookup("JOBSCOUT_STORE_CAPACITY") {
            match raw.trim().parse::<usize>() {
                Ok(v) if v > 0 => self.store.capacity = v,
                _ => warn!(value = %raw, "Ignoring invalid JOBSCOUT_STORE_CAPACITY"),
            }
        }
        self
    }

    /// Checks values that would make the core unusable.
    pub fn validate(&self) -> Result<(), JobScoutError> {
        if self.store.capacity == 0 {
            return Err(JobScoutError::InvalidConfig(
                "store.capacity must be at least 1".to_string(),
            ));
        }
        if self.url.min_radius_miles > self.url.max_radius_miles {
            return Err(JobScoutError::InvalidConfig(format!(
                "url.min_radius_miles ({}) exceeds url.max_radius_miles ({})",
                self.url.min_radius_miles, self.url.max_radius_miles
            )));
        }
        if self.fetch.retry.max_attempts == 0 {
            return Err(JobScoutError::InvalidConfig(
                "fetch.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.url.base_url)?;
        url::Url::parse(&self.listing.site_origin)?;
        Ok(())
    }
}
