//! Dependency list parsing
//!
//! A dependency list is comma separated; each entry is a bare name or
//! `name (constraint)`. Every entry is parsed on its own, so an entry without
//! a constraint never shifts the constraints of the entries after it.

use crate::extract::sanitize;

/// One entry of a dependency list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDependency {
    pub name: String,
    pub constraint: Option<String>,
}

/// Splits a raw dependency list into (name, constraint) entries
///
/// Empty entries are dropped; empty parentheses give no constraint.
pub fn parse_dependency_list(raw: &str) -> Vec<ParsedDependency> {
    raw.split(',')
        .filter_map(|entry| parse_entry(entry.trim()))
        .collect()
}

fn parse_entry(entry: &str) -> Option<ParsedDependency> {
    if entry.is_empty() {
        return None;
    }

    let (name, constraint) = match split_constraint(entry) {
        Some((name, inner)) => {
            let inner = sanitize(inner);
            (name, (!inner.is_empty()).then_some(inner))
        }
        None => (entry, None),
    };

    let name = sanitize(name);
    if name.is_empty() {
        return None;
    }

    Some(ParsedDependency { name, constraint })
}

/// Splits `name (constraint)` at the trailing parenthesized group
fn split_constraint(entry: &str) -> Option<(&str, &str)> {
    let body = entry.strip_suffix(')')?;
    let open = body.rfind('(')?;
    Some((&body[..open], &body[open + 1..]))
}
