//! Query understanding.
//!
//! This module provides:
//! - [`QueryParser`], turning free text into [`SearchParameters`]
//! - [`SearchUrlBuilder`], turning parameters into a listing page address
//!
//! [`SearchParameters`]: crate::models::SearchParameters

mod parser;
mod url_builder;

pub use parser::QueryParser;
pub use url_builder::SearchUrlBuilder;
