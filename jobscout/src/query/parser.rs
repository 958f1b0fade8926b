//! Free text to [`SearchParameters`].

use regex::Regex;

use crate::config::QueryDefaults;
use crate::errors::JobScoutError;
use crate::models::{Recency, SearchParameters};

const RADIUS_PATTERN: &str = r"\bwithin\s+(\d+)\s*(?:mi|mile|miles)\b";
const LOCATION_MARKER_PATTERN: &str = r"\b(?:jobs?\s+)?near\b|\bjobs?\s+in\b";
const FILLER_PATTERN: &str =
    r"^(?:please\s+)?(?:get|find(?:\s+me)?|show(?:\s+me)?|search(?:\s+for)?|look(?:\s+for)?)\b";
const JOBS_SUFFIX_PATTERN: &str = r"\bjobs?$";
const LOCATION_END_PATTERN: &str = r"\bwithin\b";
const WHITESPACE_PATTERN: &str = r"\s+";

/// Recency phrases, checked in order. Longer windows come before `last week`
/// so "last 2 weeks" is not read as "last week".
const RECENCY_PATTERNS: [(&str, Recency); 4] = [
    (r"\b(?:posted\s+)?(?:in\s+the\s+)?(?:last|past)\s+(?:2|two)\s+days?\b", Recency::Last2Days),
    (r"\b(?:posted\s+)?(?:in\s+the\s+)?(?:last|past)\s+(?:2|two)\s+weeks?\b", Recency::Last2Weeks),
    (r"\b(?:posted\s+)?(?:in\s+the\s+)?(?:last|past|this)\s+week\b", Recency::LastWeek),
    (r"\b(?:posted\s+)?today\b", Recency::Today),
];

/// Turns a request like "hr admin jobs near winnetka within 5 miles" into
/// structured parameters.
///
/// Parsing is total: any field the text does not determine takes its value
/// from [`QueryDefaults`].
#[derive(Debug, Clone)]
pub struct QueryParser {
    defaults: QueryDefaults,
    radius: Regex,
    location_marker: Regex,
    filler: Regex,
    jobs_suffix: Regex,
    location_end: Regex,
    whitespace: Regex,
    recency: Vec<(Regex, Recency)>,
}

impl QueryParser {
    /// Creates a parser with the given defaults.
    pub fn new(defaults: QueryDefaults) -> Result<Self, JobScoutError> {
        let recency = RECENCY_PATTERNS
            .iter()
            .map(|(pattern, value)| Ok((Regex::new(pattern)?, *value)))
            .collect::<Result<Vec<_>, JobScoutError>>()?;

        Ok(Self {
            defaults,
            radius: Regex::new(RADIUS_PATTERN)?,
            location_marker: Regex::new(LOCATION_MARKER_PATTERN)?,
            filler: Regex::new(FILLER_PATTERN)?,
            jobs_suffix: Regex::new(JOBS_SUFFIX_PATTERN)?,
            location_end: Regex::new(LOCATION_END_PATTERN)?,
            whitespace: Regex::new(WHITESPACE_PATTERN)?,
            recency,
        })
    }

    /// The defaults applied to undetermined fields.
    #[must_use]
    pub const fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Parses free text. Never fails.
    #[must_use]
    pub fn parse(&self, text: &str) -> SearchParameters {
        let normalized = self.normalize(text);
        // Filler only counts at the very start of the request.
        let mut remaining = self.collapse(&self.filler.replace(&normalized, ""));

        let recency = self.take_recency(&mut remaining);
        let radius_miles = self.take_radius(&mut remaining);

        let (title_part, location_part) = match self.location_marker.find(&remaining) {
            Some(m) => (
                remaining[..m.start()].to_string(),
                Some(remaining[m.end()..].to_string()),
            ),
            None => (remaining.clone(), None),
        };

        let location = location_part
            .map(|l| match self.location_end.find(&l) {
                Some(end) => self.clean_fragment(&l[..end.start()]),
                None => self.clean_fragment(&l),
            })
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.defaults.location.clone());

        let job_title = Some(self.clean_title(&title_part))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.defaults.job_title.clone());

        SearchParameters {
            job_title,
            location,
            radius_miles,
            recency,
        }
    }

    /// Lower-cases, replaces punctuation other than commas with spaces and
    /// collapses whitespace.
    fn normalize(&self, text: &str) -> String {
        let replaced: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_punctuation() && c != ',' { ' ' } else { c })
            .collect();
        self.collapse(&replaced)
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }

    fn take_recency(&self, text: &mut String) -> Recency {
        for (pattern, value) in &self.recency {
            if pattern.is_match(text) {
                *text = self.collapse(&pattern.replace(text, " "));
                return *value;
            }
        }
        self.defaults.recency
    }

    fn take_radius(&self, text: &mut String) -> u32 {
        let parsed = self
            .radius
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());

        match parsed {
            Some(miles) => {
                *text = self.collapse(&self.radius.replace(text, " "));
                miles
            }
            None => self.defaults.radius_miles,
        }
    }

    fn clean_title(&self, text: &str) -> String {
        let text = self.clean_fragment(text);
        let text = self.jobs_suffix.replace(&text, "");
        self.clean_fragment(&text)
    }

    fn clean_fragment(&self, text: &str) -> String {
        self.collapse(text)
            .trim_matches(|c: char| c == ',' || c.is_whitespace())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser() -> QueryParser {
        QueryParser::new(QueryDefaults::default()).unwrap()
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
    fn test_parses_canonical_request() {
        assert_eq!(
            parser().parse("hr admin jobs near winnetka within 5 miles"),
            params("hr admin", "winnetka", 5, Recency::LastWeek)
        );
    }

    #[test]
    fn test_strips_leading_filler() {
        assert_eq!(
            parser().parse("Get fraud jobs near Winnetka, IL within 15 miles"),
            params("fraud", "winnetka, il", 15, Recency::LastWeek)
        );
        assert_eq!(
            parser().parse("find me data scientist jobs near 91306").job_title,
            "data scientist"
        );
    }

    #[test]
    fn test_radius_defaults_when_absent() {
        let parsed = parser().parse("data scientist jobs near chicago, il");
        assert_eq!(parsed.radius_miles, 5);
        assert_eq!(parsed.location, "chicago, il");
    }

    #[test]
    fn test_configured_defaults_apply() {
        let parser = QueryParser::new(
            QueryDefaults::default()
                .with_radius(10)
                .with_recency(Recency::Last2Weeks),
        )
        .unwrap();
        let parsed = parser.parse("nurse jobs near evanston");
        assert_eq!(parsed.radius_miles, 10);
        assert_eq!(parsed.recency, Recency::Last2Weeks);
    }

    #[test]
    fn test_recency_phrases() {
        let p = parser();
        assert_eq!(p.parse("cashier jobs near skokie posted today").recency, Recency::Today);
        assert_eq!(
            p.parse("cashier jobs near skokie from the last 2 days").recency,
            Recency::Last2Days
        );
        let parsed = p.parse("cashier jobs near skokie in the last 2 weeks within 3 miles");
        assert_eq!(parsed.recency, Recency::Last2Weeks);
        assert_eq!(parsed.radius_miles, 3);
    }

    #[test]
    fn test_recency_phrase_is_not_part_of_location() {
        let parsed = parser().parse("welder jobs near gary today");
        assert_eq!(parsed.location, "gary");
        assert_eq!(parsed.recency, Recency::Today);
    }

    #[test]
    fn test_location_before_radius_clause() {
        let parsed = parser().parse("barista near evanston, il within 2 miles");
        assert_eq!(parsed, params("barista", "evanston, il", 2, Recency::LastWeek));
    }

    #[test]
    fn test_jobs_in_marks_location() {
        let parsed = parser().parse("accountant jobs in denver");
        assert_eq!(parsed.job_title, "accountant");
        assert_eq!(parsed.location, "denver");
    }

    #[test]
    fn test_no_location_clause() {
        let parsed = parser().parse("remote rust developer jobs");
        assert_eq!(parsed.job_title, "remote rust developer");
        assert_eq!(parsed.location, "");
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(
            parser().parse("  HR   Admin JOBS   NEAR   Winnetka  WITHIN 5   MILES "),
            parser().parse("hr admin jobs near winnetka within 5 miles")
        );
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let p = parser();
        for input in ["", "   ", "near", "within miles", "!!!???", "jobs near", "within 99999999999999 miles"] {
            let parsed = p.parse(input);
            assert_eq!(parsed.recency, Recency::LastWeek);
            assert_eq!(parsed.radius_miles, 5, "input {input:?}");
        }
    }

    #[test]
    fn test_location_stops_at_within() {
        let p = parser();
        let parsed = p.parse("clerk jobs near chicago within ten miles");
        assert_eq!(parsed.location, "chicago");
        assert_eq!(parsed.radius_miles, 5);

        let parsed = p.parse("clerk jobs near chicago within 5 km");
        assert_eq!(parsed.location, "chicago");
        assert_eq!(parsed.job_title, "clerk");
    }

    #[test]
    fn test_location_stops_at_within_after_recency() {
        let parsed = parser().parse("clerk jobs near oak park, il within walking distance posted today");
        assert_eq!(parsed.location, "oak park, il");
        assert_eq!(parsed.recency, Recency::Today);
    }

    #[test]
    fn test_filler_word_after_recency_stays_in_title() {
        let parsed = parser().parse("today show producer jobs near burbank");
        assert_eq!(parsed.job_title, "show producer");
        assert_eq!(parsed.location, "burbank");
        assert_eq!(parsed.recency, Recency::Today);
    }

    #[test]
    fn test_leading_filler_with_recency_is_stripped() {
        let parsed = parser().parse("please find me nurse jobs near evanston posted today");
        assert_eq!(parsed.job_title, "nurse");
        assert_eq!(parsed.recency, Recency::Today);
    }

    #[test]
    fn test_oversized_radius_is_left_in_text() {
        let parsed = parser().parse("within 99999999999999 miles");
        assert_eq!(parsed.radius_miles, 5);
    }
}
