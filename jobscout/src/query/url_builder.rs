//! [`SearchParameters`] to a search page address.

use url::Url;

use crate::config::UrlConfig;
use crate::errors::JobScoutError;
use crate::models::SearchParameters;

/// Builds canonical listing URLs.
///
/// Parameters are written in a fixed order (`q`, `where`, `rd`, `page`, the
/// sort parameter, then `recency` when it is not the default) so equal
/// parameters always produce byte-identical URLs.
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    base: Url,
    config: UrlConfig,
}

impl SearchUrlBuilder {
    /// Creates a builder, validating the base URL once.
    pub fn new(config: UrlConfig) -> Result<Self, JobScoutError> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(JobScoutError::InvalidConfig(format!(
                "base URL cannot carry a query: {}",
                config.base_url
            )));
        }
        if config.min_radius_miles > config.max_radius_miles {
            return Err(JobScoutError::InvalidConfig(format!(
                "radius range {}..={} is empty",
                config.min_radius_miles, config.max_radius_miles
            )));
        }
        Ok(Self { base, config })
    }

    /// Clamps a radius into the configured range.
    #[must_use]
    pub fn clamp_radius(&self, miles: u32) -> u32 {
        miles.clamp(self.config.min_radius_miles, self.config.max_radius_miles)
    }

    /// Builds the search URL.
    #[must_use]
    pub fn build(&self, params: &SearchParameters) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", params.job_title.trim())
                .append_pair("where", params.location.trim())
                .append_pair("rd", &self.clamp_radius(params.radius_miles).to_string())
                .append_pair("page", "1")
                .append_pair(&self.config.sort_param, &self.config.sort_value);
            if params.recency != self.config.default_recency {
                query.append_pair("recency", params.recency.as_str());
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recency;
    use pretty_assertions::assert_eq;

    fn builder() -> SearchUrlBuilder {
        SearchUrlBuilder::new(UrlConfig::default()).unwrap()
    }

    fn params(title: &str, location: &str, radius: u32, recency: Recency) -> SearchParameters {
        SearchParameters {
            job_title: title.to_string(),
            location: location.to_string(),
            radius_miles: radius,
            recency,
        }
    }

    #[test]
    fn test_default_recency_is_omitted() {
        let url = builder().build(&params("hr admin", "winnetka", 5, Recency::LastWeek));
        assert_eq!(
            url.as_str(),
            "https://www.monster.com/jobs/search?q=hr+admin&where=winnetka&rd=5&page=1&so=m.h.sh"
        );
        assert!(!url.as_str().contains("recency"));
    }

    #[test]
    fn test_non_default_recency_is_appended() {
        let url = builder().build(&params("clerk", "chicago", 10, Recency::Today));
        assert!(url.as_str().ends_with("&recency=today"));
    }

    #[test]
    fn test_radius_is_clamped() {
        let b = builder();
        assert!(b.build(&params("a", "b", 0, Recency::LastWeek)).as_str().contains("rd=1&"));
        assert!(b.build(&params("a", "b", 500, Recency::LastWeek)).as_str().contains("rd=50&"));
    }

    #[test]
    fn test_location_is_form_encoded() {
        let url = builder().build(&params("fraud", "winnetka, il", 5, Recency::LastWeek));
        assert!(url.as_str().contains("where=winnetka%2C+il"));
    }

    #[test]
    fn test_deterministic() {
        let b = builder();
        let p = params("data scientist", "91306", 15, Recency::Last2Days);
        assert_eq!(b.build(&p), b.build(&p));
    }

    #[test]
    fn test_base_query_is_replaced() {
        let b = SearchUrlBuilder::new(
            UrlConfig::default().with_base_url("https://jobs.example.com/search?stale=1#frag"),
        )
        .unwrap();
        let url = b.build(&params("a", "b", 5, Recency::LastWeek));
        assert_eq!(url.as_str(), "https://jobs.example.com/search?q=a&where=b&rd=5&page=1&so=m.h.sh");
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(SearchUrlBuilder::new(UrlConfig::default().with_base_url("not a url")).is_err());
        assert!(SearchUrlBuilder::new(UrlConfig::default().with_base_url("mailto:jobs@example.com")).is_err());
    }
}
