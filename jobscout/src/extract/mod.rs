//! HTML extraction.
//!
//! Every field is read through a [`SelectorChain`]: selectors are tried in
//! order until one yields a non-empty value, otherwise the field takes a
//! sentinel default. Markup changes degrade results instead of failing them.

mod detail;
mod listing;
mod selectors;

pub use detail::DetailExtractor;
pub use listing::{ListingExtraction, ListingExtractor, SkipReason, SkippedCard};
pub use selectors::{clean_text, element_text, SelectorChain};
