//! Domain model for harvested catalog entries
//!
//! These types describe a catalog entry and the dependencies it declares,
//! independent of how they were fetched or where they are stored.
//!
//! # Components
//!
//! - `CatalogEntry`: One package tracked by the catalog
//! - `DependencyRef`: An edge from an entry to a named dependency
//! - `DependencyKind`: Whether the dependency was declared as required or imported

mod dependency;
mod entry;

pub use dependency::{DependencyKind, DependencyRef};
pub use entry::CatalogEntry;
