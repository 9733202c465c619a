//! Extraction of catalog data from HTML
//!
//! This module handles:
//! - Parsing the index page into entry names
//! - Parsing a detail page into raw, unsanitized attributes
//! - Whitespace sanitization of field values
//! - Splitting dependency lists into (name, constraint) pairs
//! - Building a `CatalogEntry` from the raw attributes

mod builder;
mod dependency;
mod detail;
mod index;
mod sanitize;

pub use builder::build_entry;
pub use dependency::{parse_dependency_list, ParsedDependency};
pub use detail::{parse_detail, RawAttributes, FIELD_LABELS};
pub use index::{parse_index, IndexPage, IndexRows, RowSkipped};
pub use sanitize::sanitize;

use scraper::Selector;
use thiserror::Error;

/// Structural extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Malformed index page: {reason}")]
    MalformedIndexPage { reason: String },

    #[error("Malformed detail page: {reason}")]
    MalformedDetailPage { reason: String },
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Parses a selector written into the source
///
/// Only for literal selectors; user-supplied selectors are validated with the config.
pub(crate) fn static_selector(css: &str) -> Selector {
    Selector::parse(css)
        .unwrap_or_else(|e| panic!("static selector '{}' is invalid: {:?}", css, e))
}
