//! Index page parsing
//!
//! The index page holds a single table; the first cell of every data row
//! carries an anchor whose text is the entry name.

use crate::extract::{static_selector, ExtractError, ExtractResult};
use scraper::element_ref::Select;
use scraper::{Html, Selector};
use std::fmt;

/// A data row that could not be turned into an entry name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkipped {
    /// 1-based row position within the table
    pub row: usize,

    /// Why the row was skipped
    pub reason: String,
}

impl fmt::Display for RowSkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} skipped: {}", self.row, self.reason)
    }
}

/// A parsed index page
///
/// Rows are scanned lazily by `rows()`, which can be called any number of times.
pub struct IndexPage {
    document: Html,
    table: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
}

impl IndexPage {
    /// Parses the index HTML
    ///
    /// # Returns
    ///
    /// * `Ok(IndexPage)` - The page contains a table
    /// * `Err(ExtractError::MalformedIndexPage)` - No table was found
    pub fn parse(html: &str) -> ExtractResult<Self> {
        let page = Self {
            document: Html::parse_document(html),
            table: static_selector("table"),
            row: static_selector("tr"),
            cell: static_selector("td"),
            anchor: static_selector("a"),
        };

        if page.document.select(&page.table).next().is_none() {
            return Err(ExtractError::MalformedIndexPage {
                reason: "no table found".to_string(),
            });
        }

        Ok(page)
    }

    /// Iterates over the data rows of the table
    ///
    /// Header rows (no `td` cells) are passed over silently; malformed data
    /// rows yield `Err(RowSkipped)` and the scan continues.
    pub fn rows(&self) -> IndexRows<'_> {
        let rows = self
            .document
            .select(&self.table)
            .next()
            .map(|table| table.select(&self.row));

        IndexRows {
            rows,
            cell: &self.cell,
            anchor: &self.anchor,
            position: 0,
        }
    }

    /// Collects every entry name, logging skipped rows as warnings
    pub fn names(&self) -> Vec<String> {
        self.rows()
            .filter_map(|row| match row {
                Ok(name) => Some(name),
                Err(skipped) => {
                    tracing::warn!("Index {}", skipped);
                    None
                }
            })
            .collect()
    }
}

/// Lazy iterator over index table rows
pub struct IndexRows<'a> {
    rows: Option<Select<'a, 'a>>,
    cell: &'a Selector,
    anchor: &'a Selector,
    position: usize,
}

impl<'a> Iterator for IndexRows<'a> {
    type Item = Result<String, RowSkipped>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.rows.as_mut()?;

        for row in rows.by_ref() {
            self.position += 1;

            let Some(first_cell) = row.select(self.cell).next() else {
                continue;
            };

            let Some(anchor) = first_cell.select(self.anchor).next() else {
                return Some(Err(RowSkipped {
                    row: self.position,
                    reason: "first cell has no anchor".to_string(),
                }));
            };

            let name = anchor.text().collect::<String>().trim().to_string();
            if name.is_empty() {
                return Some(Err(RowSkipped {
                    row: self.position,
                    reason: "anchor text is empty".to_string(),
                }));
            }

            return Some(Ok(name));
        }

        None
    }
}

/// Parses the index page and returns every well-formed entry name
pub fn parse_index(html: &str) -> ExtractResult<Vec<String>> {
    Ok(IndexPage::parse(html)?.names())
}
