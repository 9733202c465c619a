use crate::model::{DependencyKind, DependencyRef};
use std::fmt;

/// One package tracked by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Row id, assigned when the entry is stored
    pub id: Option<i64>,

    /// Unique package name
    pub name: String,

    pub description: Option<String>,

    pub version: Option<String>,

    /// Publication date as printed on the detail page
    pub publication_date: Option<String>,

    /// Maintainer name and contact address
    pub maintainer: Option<String>,

    /// Free-text author list
    pub authors: Option<String>,

    pub licenses: Option<String>,

    /// Whether the package needs compilation (None when unknown)
    pub requires_compilation: Option<bool>,

    /// Listed in the primary repository (the catalog being harvested)
    pub present_in_primary_repo: bool,

    /// Listed in the secondary repository (None when unknown)
    pub present_in_secondary_repo: Option<bool>,

    dependencies: Vec<DependencyRef>,

    links: Vec<String>,
}

impl CatalogEntry {
    /// Creates a placeholder entry holding only its name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            version: None,
            publication_date: None,
            maintainer: None,
            authors: None,
            licenses: None,
            requires_compilation: None,
            present_in_primary_repo: true,
            present_in_secondary_repo: None,
            dependencies: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Dependencies in declaration order
    pub fn dependencies(&self) -> &[DependencyRef] {
        &self.dependencies
    }

    /// Mutable access for assigning ids after persistence
    pub(crate) fn dependencies_mut(&mut self) -> &mut [DependencyRef] {
        &mut self.dependencies
    }

    /// Links in insertion order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Adds a dependency unless one with the same name and kind is already present
    ///
    /// Returns false when the dependency was dropped as a duplicate.
    pub fn add_dependency(&mut self, dependency: DependencyRef) -> bool {
        if self.has_dependency(&dependency.name, dependency.kind) {
            return false;
        }
        self.dependencies.push(dependency);
        true
    }

    /// Returns true if a dependency with this name and kind is declared
    pub fn has_dependency(&self, name: &str, kind: DependencyKind) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.name == name && d.kind == kind)
    }

    /// Adds a link unless it is already present
    pub fn add_link(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.links.contains(&url) {
            return false;
        }
        self.links.push(url);
        true
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;

        if let Some(description) = &self.description {
            writeln!(f, "\nDescription:\n{}", description)?;
        }
        if let Some(version) = &self.version {
            writeln!(f, "\nVersion: {}", version)?;
        }
        if let Some(date) = &self.publication_date {
            writeln!(f, "\nPublication date: {}", date)?;
        }
        if let Some(maintainer) = &self.maintainer {
            writeln!(f, "\nMaintainer: {}", maintainer)?;
        }
        if let Some(authors) = self.authors.as_deref().filter(|a| !a.is_empty()) {
            writeln!(f, "\nAuthors:\n{}", authors)?;
        }
        if !self.dependencies.is_empty() {
            writeln!(f, "\nDependencies:")?;
            for dependency in &self.dependencies {
                writeln!(f, "  - {}", dependency)?;
            }
        }
        if let Some(flag) = self.requires_compilation {
            writeln!(f, "\nRequires compilation: {}", flag)?;
        }
        writeln!(f, "\nIn primary repository: {}", self.present_in_primary_repo)?;
        if let Some(flag) = self.present_in_secondary_repo {
            writeln!(f, "\nIn secondary repository: {}", flag)?;
        }
        if let Some(licenses) = self.licenses.as_deref().filter(|l| !l.is_empty()) {
            writeln!(f, "\nLicenses:\n{}", licenses)?;
        }
        if !self.links.is_empty() {
            writeln!(f, "\nLinks:")?;
            for link in &self.links {
                writeln!(f, "{}", link)?;
            }
        }

        Ok(())
    }
}
