//! Workspace, catalog and package models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the unnamed `catalog:` table in pnpm-workspace.yaml
pub const DEFAULT_CATALOG: &str = "default";

/// Which dependency table of a package.json references a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
}

impl DependencyType {
    /// All dependency tables, in package.json order
    pub fn all() -> &'static [DependencyType] {
        &[
            DependencyType::Dependencies,
            DependencyType::DevDependencies,
            DependencyType::PeerDependencies,
            DependencyType::OptionalDependencies,
        ]
    }

    /// The package.json key for this table
    pub fn json_key(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "dependencies",
            DependencyType::DevDependencies => "devDependencies",
            DependencyType::PeerDependencies => "peerDependencies",
            DependencyType::OptionalDependencies => "optionalDependencies",
        }
    }

    /// Returns true if the dependency ships with the package at runtime
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            DependencyType::Dependencies | DependencyType::PeerDependencies
        )
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_key())
    }
}

/// A named table of package name to version range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog name (`default` for the unnamed catalog)
    pub name: String,
    /// Package name to range string
    pub entries: BTreeMap<String, String>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry (builder pattern)
    pub fn with_entry(mut self, package: impl Into<String>, range: impl Into<String>) -> Self {
        self.entries.insert(package.into(), range.into());
        self
    }

    /// Returns the declared range for a package
    pub fn get(&self, package: &str) -> Option<&str> {
        self.entries.get(package).map(String::as_str)
    }

    /// Returns true if the package is declared
    pub fn contains(&self, package: &str) -> bool {
        self.entries.contains_key(package)
    }

    /// Replaces the range of an existing entry, returning the previous one
    ///
    /// Returns None and leaves the catalog untouched if the package is absent.
    pub fn set_range(&mut self, package: &str, range: impl Into<String>) -> Option<String> {
        self.entries
            .get_mut(package)
            .map(|slot| std::mem::replace(slot, range.into()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A package.json dependency that resolves through a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogReference {
    /// Catalog name
    pub catalog: String,
    /// Dependency package name
    pub package: String,
    /// Dependency table the reference lives in
    pub dependency_type: DependencyType,
}

impl CatalogReference {
    pub fn new(
        catalog: impl Into<String>,
        package: impl Into<String>,
        dependency_type: DependencyType,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            package: package.into(),
            dependency_type,
        }
    }
}

/// A workspace member package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name from package.json
    pub name: String,
    /// Directory containing package.json
    pub path: PathBuf,
    /// Catalog references found in package.json
    pub catalog_references: Vec<CatalogReference>,
}

impl Package {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            catalog_references: Vec::new(),
        }
    }

    /// Adds a catalog reference (builder pattern)
    pub fn with_reference(mut self, reference: CatalogReference) -> Self {
        self.catalog_references.push(reference);
        self
    }

    /// Returns the reference to (catalog, package), if any
    pub fn reference_to(&self, catalog: &str, package: &str) -> Option<&CatalogReference> {
        self.catalog_references
            .iter()
            .find(|r| r.catalog == catalog && r.package == package)
    }
}

/// A pnpm workspace with its catalogs and member packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace root directory
    pub root: PathBuf,
    /// Workspace name (root package.json name or directory name)
    pub name: String,
    /// Catalogs in declaration order, `default` first when present
    pub catalogs: Vec<Catalog>,
    /// Member packages
    pub packages: Vec<Package>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            catalogs: Vec::new(),
            packages: Vec::new(),
        }
    }

    /// Adds a catalog (builder pattern)
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalogs.push(catalog);
        self
    }

    /// Adds a package (builder pattern)
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.iter().find(|c| c.name == name)
    }

    pub fn catalog_mut(&mut self, name: &str) -> Option<&mut Catalog> {
        self.catalogs.iter_mut().find(|c| c.name == name)
    }

    /// Packages referencing the (catalog, package) pair, with the reference
    pub fn packages_using<'a>(
        &'a self,
        catalog: &'a str,
        package: &'a str,
    ) -> impl Iterator<Item = (&'a Package, &'a CatalogReference)> + 'a {
        self.packages
            .iter()
            .filter_map(move |p| p.reference_to(catalog, package).map(|r| (p, r)))
    }

    /// Names of packages referencing the (catalog, package) pair
    pub fn affected_package_names(&self, catalog: &str, package: &str) -> Vec<String> {
        self.packages_using(catalog, package)
            .map(|(p, _)| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workspace() -> Workspace {
        Workspace::new("/ws", "ws")
            .with_catalog(Catalog::new(DEFAULT_CATALOG).with_entry("react", "^17.0.0"))
            .with_catalog(Catalog::new("legacy").with_entry("react", "^16.14.0"))
            .with_package(Package::new("web", "/ws/apps/web").with_reference(
                CatalogReference::new(DEFAULT_CATALOG, "react", DependencyType::Dependencies),
            ))
            .with_package(Package::new("old", "/ws/apps/old").with_reference(
                CatalogReference::new("legacy", "react", DependencyType::DevDependencies),
            ))
    }

    #[test]
    fn test_catalog_lookup() {
        let ws = sample_workspace();
        assert_eq!(ws.catalog("default").unwrap().get("react"), Some("^17.0.0"));
        assert!(ws.catalog("missing").is_none());
    }

    #[test]
    fn test_set_range_existing() {
        let mut catalog = Catalog::new("default").with_entry("react", "^17.0.0");
        let previous = catalog.set_range("react", "^18.2.0");
        assert_eq!(previous, Some("^17.0.0".to_string()));
        assert_eq!(catalog.get("react"), Some("^18.2.0"));
    }

    #[test]
    fn test_set_range_missing_leaves_catalog_untouched() {
        let mut catalog = Catalog::new("default").with_entry("react", "^17.0.0");
        assert!(catalog.set_range("vue", "^3.0.0").is_none());
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.contains("vue"));
    }

    #[test]
    fn test_packages_using() {
        let ws = sample_workspace();
        let users: Vec<_> = ws.packages_using("default", "react").collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].0.name, "web");
        assert_eq!(users[0].1.dependency_type, DependencyType::Dependencies);
        assert_eq!(ws.affected_package_names("legacy", "react"), vec!["old"]);
        assert!(ws.affected_package_names("default", "vue").is_empty());
    }

    #[test]
    fn test_dependency_type_keys() {
        assert_eq!(DependencyType::DevDependencies.json_key(), "devDependencies");
        assert!(DependencyType::PeerDependencies.is_runtime());
        assert!(!DependencyType::DevDependencies.is_runtime());
        assert_eq!(DependencyType::all().len(), 4);
    }

    #[test]
    fn test_serde_dependency_type() {
        let json = serde_json::to_string(&DependencyType::OptionalDependencies).unwrap();
        assert_eq!(json, "\"optionalDependencies\"");
    }
}
