//! Compiled selector fallback chains.

use scraper::{ElementRef, Selector};

use crate::errors::JobScoutError;

/// Collapses runs of whitespace into single spaces and trims.
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, cleaned.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// An ordered list of CSS selectors for one field.
///
/// Lookups try each selector in turn and return the first non-empty value.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Compiles a chain; any invalid selector rejects the whole chain.
    pub fn compile<S: AsRef<str>>(field: &str, selectors: &[S]) -> Result<Self, JobScoutError> {
        let selectors = selectors
            .iter()
            .map(|s| {
                Selector::parse(s.as_ref()).map_err(|e| {
                    JobScoutError::InvalidConfig(format!(
                        "invalid {field} selector '{}': {e:?}",
                        s.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// First element matched by the earliest selector that matches anything.
    #[must_use]
    pub fn first_element<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// First non-empty text in chain order.
    #[must_use]
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// First non-empty value of `attr` in chain order.
    #[must_use]
    pub fn first_attr(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
    }

    /// Non-empty texts of every element matched by the first productive selector.
    #[must_use]
    pub fn all_texts(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.selectors
            .iter()
            .map(|selector| {
                scope
                    .select(selector)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
            })
            .find(|texts| !texts.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"
        <html><body>
          <div class="card">
            <h2 class="primary">   </h2>
            <h3 class="secondary">  Backup   Title </h3>
            <a class="link" href="  ">empty</a>
            <a class="link" href="/job/1">one</a>
            <ul><li>first</li><li> </li><li>second</li></ul>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \n\t b  "), "a b");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_first_text_falls_back() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::compile("title", &["h2.primary", "h3.secondary"]).unwrap();
        assert_eq!(chain.first_text(doc.root_element()), Some("Backup Title".to_string()));
    }

    #[test]
    fn test_first_text_none_when_all_miss() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::compile("title", &["h4", "span.nothing"]).unwrap();
        assert_eq!(chain.first_text(doc.root_element()), None);
    }

    #[test]
    fn test_first_attr_skips_blank_values() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::compile("link", &["a.link"]).unwrap();
        assert_eq!(chain.first_attr(doc.root_element(), "href"), Some("/job/1".to_string()));
    }

    #[test]
    fn test_all_texts_drops_empty_items() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::compile("requirements", &["ol li", "ul li"]).unwrap();
        assert_eq!(chain.all_texts(doc.root_element()), vec!["first", "second"]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let err = SelectorChain::compile("title", &["h2", "[[["]).unwrap_err();
        assert!(matches!(err, JobScoutError::InvalidConfig(ref m) if m.contains("title")));
    }
}
