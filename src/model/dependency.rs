//! Dependency definitions for catalog entries
//!
//! A dependency is identified globally by its name, version constraint and kind.

use std::fmt;

/// How a dependency was declared on the detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Declared in the "Depends:" field
    Required,

    /// Declared in the "Imports:" field
    Imported,
}

impl DependencyKind {
    /// Converts the kind to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Imported => "imported",
        }
    }

    /// Parses a kind from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "required" => Some(Self::Required),
            "imported" => Some(Self::Imported),
            _ => None,
        }
    }

    /// Maps a detail page field label to the kind it declares
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Depends:" => Some(Self::Required),
            "Imports:" => Some(Self::Imported),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A reference from a catalog entry to one of its dependencies
///
/// Ids are `None` until the owning entry has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    /// Row id in the dependencies table
    pub id: Option<i64>,

    /// Row id of the owning entry
    pub entry_id: Option<i64>,

    /// Dependency name (e.g. "Rcpp")
    pub name: String,

    /// Optional version constraint (e.g. ">= 1.0")
    pub version_constraint: Option<String>,

    /// Declaration kind
    pub kind: DependencyKind,
}

impl DependencyRef {
    /// Creates a dependency that has not been persisted yet
    pub fn new(
        name: impl Into<String>,
        version_constraint: Option<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            id: None,
            entry_id: None,
            name: name.into(),
            version_constraint,
            kind,
        }
    }

    /// Returns true if both refer to the same global dependency row
    pub fn same_identity(&self, other: &DependencyRef) -> bool {
        self.name == other.name
            && self.version_constraint == other.version_constraint
            && self.kind == other.kind
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_constraint {
            Some(constraint) => write!(f, "{} ({}) [{}]", self.name, constraint, self.kind),
            None => write!(f, "{} [{}]", self.name, self.kind),
        }
    }
}
