//! Detail page parsing
//!
//! # Field Rules
//!
//! | Field | Source | Required |
//! |-------|--------|----------|
//! | name | `<title>` text before the first `:` | yes |
//! | description | text of the first `<p>` | yes |
//! | everything else | `<td>` following the cell labelled e.g. `Version:` | no |

use crate::extract::{static_selector, ExtractError, ExtractResult};
use scraper::{ElementRef, Html};

/// Labels of the optional attribute cells, in page order
pub const FIELD_LABELS: [&str; 8] = [
    "Version:",
    "Published:",
    "Author:",
    "Maintainer:",
    "License:",
    "NeedsCompilation:",
    "Depends:",
    "Imports:",
];

/// Unsanitized field values read from a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributes {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
    pub maintainer: Option<String>,
    pub license: Option<String>,
    pub needs_compilation: Option<String>,
    pub depends: Option<String>,
    pub imports: Option<String>,
}

impl RawAttributes {
    /// Returns the value read for an attribute label
    pub fn get(&self, label: &str) -> Option<&str> {
        let value = match label {
            "Version:" => &self.version,
            "Published:" => &self.published,
            "Author:" => &self.author,
            "Maintainer:" => &self.maintainer,
            "License:" => &self.license,
            "NeedsCompilation:" => &self.needs_compilation,
            "Depends:" => &self.depends,
            "Imports:" => &self.imports,
            _ => return None,
        };
        value.as_deref()
    }

    fn slot(&mut self, label: &str) -> Option<&mut Option<String>> {
        match label {
            "Version:" => Some(&mut self.version),
            "Published:" => Some(&mut self.published),
            "Author:" => Some(&mut self.author),
            "Maintainer:" => Some(&mut self.maintainer),
            "License:" => Some(&mut self.license),
            "NeedsCompilation:" => Some(&mut self.needs_compilation),
            "Depends:" => Some(&mut self.depends),
            "Imports:" => Some(&mut self.imports),
            _ => None,
        }
    }
}

/// Parses a detail page into raw attributes
///
/// # Returns
///
/// * `Ok(RawAttributes)` - Name and description were found
/// * `Err(ExtractError::MalformedDetailPage)` - A required field is missing
pub fn parse_detail(html: &str) -> ExtractResult<RawAttributes> {
    let document = Html::parse_document(html);

    let name = extract_name(&document).ok_or_else(|| ExtractError::MalformedDetailPage {
        reason: "title missing or has no name".to_string(),
    })?;

    let description =
        extract_description(&document).ok_or_else(|| ExtractError::MalformedDetailPage {
            reason: format!("no description paragraph for '{}'", name),
        })?;

    let mut attributes = RawAttributes {
        name,
        description,
        ..RawAttributes::default()
    };

    for cell in document.select(&static_selector("td")) {
        let label = cell.text().collect::<String>();
        let Some(slot) = attributes.slot(label.trim()) else {
            continue;
        };

        // First occurrence of a label wins
        if slot.is_some() {
            continue;
        }

        if let Some(value_cell) = next_sibling_cell(cell) {
            *slot = Some(value_cell.text().collect::<String>());
        }
    }

    Ok(attributes)
}

/// Entry name: title text up to the first ':'
fn extract_name(document: &Html) -> Option<String> {
    let title = document
        .select(&static_selector("title"))
        .next()
        .map(|element| element.text().collect::<String>())?;

    let name = title.split(':').next()?.trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Description: text of the first paragraph
fn extract_description(document: &Html) -> Option<String> {
    document
        .select(&static_selector("p"))
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The nearest following sibling `<td>` of a cell
fn next_sibling_cell(cell: ElementRef<'_>) -> Option<ElementRef<'_>> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "td")
}
