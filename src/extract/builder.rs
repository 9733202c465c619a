//! Builds catalog entries from raw detail page attributes

use crate::extract::{parse_dependency_list, sanitize, RawAttributes};
use crate::model::{CatalogEntry, DependencyKind, DependencyRef};

/// Builds a full entry from the attributes of its detail page
///
/// The entry keeps the name it was requested under (the index name); the
/// title-derived name is only compared against it.
///
/// # Arguments
///
/// * `name` - Entry name as listed on the index page
/// * `raw` - Attributes parsed from the detail page
/// * `detail_url` - Canonical detail page URL, recorded as the first link
pub fn build_entry(name: &str, raw: &RawAttributes, detail_url: &str) -> CatalogEntry {
    if raw.name != name {
        tracing::debug!(
            "Detail page title names '{}' while '{}' was requested",
            raw.name,
            name
        );
    }

    let mut entry = CatalogEntry::new(name);

    entry.description = Some(sanitize(&raw.description));
    entry.version = raw.version.as_deref().map(sanitize);
    entry.publication_date = raw.published.as_deref().map(sanitize);
    entry.authors = raw.author.as_deref().map(sanitize);
    entry.maintainer = raw
        .maintainer
        .as_deref()
        .map(|m| sanitize(m).replace(" at ", "@"));
    entry.licenses = raw.license.as_deref().map(sanitize);
    entry.requires_compilation = Some(
        raw.needs_compilation
            .as_deref()
            .map(sanitize)
            .is_some_and(|flag| flag == "yes"),
    );

    for (list, kind) in [
        (&raw.depends, DependencyKind::Required),
        (&raw.imports, DependencyKind::Imported),
    ] {
        let Some(list) = list else {
            continue;
        };
        for parsed in parse_dependency_list(list) {
            let dependency = DependencyRef::new(parsed.name, parsed.constraint, kind);
            if !entry.add_dependency(dependency) {
                tracing::debug!("Dropped duplicate {} dependency in '{}'", kind, name);
            }
        }
    }

    entry.add_link(detail_url);
    entry
}
