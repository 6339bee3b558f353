//! pnpm workspace repository
//!
//! Reads catalogs from `pnpm-workspace.yaml`:
//! - `catalog:` is the default catalog (`catalog:` references)
//! - `catalogs.<name>:` are named catalogs (`catalog:<name>` references)
//!
//! Members come from the `packages` globs (`!` negates) plus the root
//! `package.json`.

use crate::domain::{
    Catalog, CatalogReference, DependencyType, Package, Workspace, DEFAULT_CATALOG,
};
use crate::error::WorkspaceError;
use crate::workspace::{CatalogChange, CatalogWriter, WorkspaceRepository};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace definition file name
pub const WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

/// Member manifest file name
const PACKAGE_JSON: &str = "package.json";

/// Catalog reference protocol in package.json
const CATALOG_PROTOCOL: &str = "catalog:";

/// Raw pnpm-workspace.yaml content
#[derive(Debug, Default, Deserialize)]
struct WorkspaceFile {
    #[serde(default)]
    packages: Vec<String>,
    #[serde(default)]
    catalog: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    catalogs: BTreeMap<String, BTreeMap<String, serde_yaml::Value>>,
}

/// Catalog values may be written as YAML numbers (`lodash: 4`)
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn build_catalog(name: &str, entries: &BTreeMap<String, serde_yaml::Value>) -> Catalog {
    entries
        .iter()
        .fold(Catalog::new(name), |catalog, (package, value)| {
            match scalar_to_string(value) {
                Some(range) => catalog.with_entry(package, range),
                None => {
                    log::warn!("ignoring non-scalar catalog entry {} [{}]", package, name);
                    catalog
                }
            }
        })
}

impl WorkspaceFile {
    fn load(path: &Path) -> Result<Self, WorkspaceError> {
        let content =
            fs::read_to_string(path).map_err(|e| WorkspaceError::read_error(path, e))?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, WorkspaceError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| WorkspaceError::parse_error(path, e.to_string()))
    }

    /// Default catalog first, then named catalogs by name
    fn catalogs(&self) -> Vec<Catalog> {
        let mut catalogs = Vec::new();

        let mut default_entries = self.catalog.clone();
        if let Some(extra) = self.catalogs.get(DEFAULT_CATALOG) {
            // `catalogs.default` is an alias of `catalog`
            for (package, value) in extra {
                default_entries
                    .entry(package.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        if !default_entries.is_empty() {
            catalogs.push(build_catalog(DEFAULT_CATALOG, &default_entries));
        }

        for (name, entries) in &self.catalogs {
            if name != DEFAULT_CATALOG {
                catalogs.push(build_catalog(name, entries));
            }
        }
        catalogs
    }
}

/// Catalog references declared by one package.json
fn parse_package_json(path: &Path, dir: &Path) -> Result<Package, WorkspaceError> {
    let content = fs::read_to_string(path).map_err(|e| WorkspaceError::read_error(path, e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| WorkspaceError::parse_error(path, e.to_string()))?;

    let name = json
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    let mut package = Package::new(name, dir);
    for dependency_type in DependencyType::all() {
        let Some(deps) = json.get(dependency_type.json_key()).and_then(|d| d.as_object()) else {
            continue;
        };
        for (dep_name, spec) in deps {
            let Some(catalog) = spec.as_str().and_then(|s| s.strip_prefix(CATALOG_PROTOCOL)) else {
                continue;
            };
            let catalog = match catalog.trim() {
                "" => DEFAULT_CATALOG,
                named => named,
            };
            package = package.with_reference(CatalogReference::new(
                catalog,
                dep_name,
                *dependency_type,
            ));
        }
    }
    Ok(package)
}

/// Repository for pnpm workspaces on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct PnpmWorkspaceRepository;

impl PnpmWorkspaceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Expand member globs relative to the root
    fn member_dirs(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, WorkspaceError> {
        let mut excludes = Vec::new();
        for pattern in patterns.iter().filter_map(|p| p.strip_prefix('!')) {
            let compiled = glob::Pattern::new(pattern.trim_start_matches("./")).map_err(|e| {
                WorkspaceError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }
            })?;
            excludes.push(compiled);
        }

        let mut dirs = BTreeSet::new();
        for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
            let full_pattern = root.join(pattern.trim_start_matches("./"));
            let pattern_str = full_pattern.to_string_lossy();

            let entries = glob::glob(&pattern_str).map_err(|e| WorkspaceError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        log::debug!("skipping unreadable path: {}", e);
                        continue;
                    }
                };
                if !path.join(PACKAGE_JSON).is_file() {
                    continue;
                }
                let relative = path.strip_prefix(root).unwrap_or(&path);
                if relative.components().any(|c| c.as_os_str() == "node_modules") {
                    continue;
                }
                if excludes.iter().any(|ex| ex.matches_path(relative)) {
                    continue;
                }
                dirs.insert(path);
            }
        }
        Ok(dirs.into_iter().collect())
    }

    fn load(&self, root: &Path) -> Result<Workspace, WorkspaceError> {
        let file = WorkspaceFile::load(&root.join(WORKSPACE_FILE))?;

        let root_manifest = root.join(PACKAGE_JSON);
        let root_package = if root_manifest.is_file() {
            Some(parse_package_json(&root_manifest, root)?)
        } else {
            None
        };

        let name = root_package
            .as_ref()
            .map(|p| p.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "workspace".to_string());

        let mut workspace = Workspace::new(root, name);
        for catalog in file.catalogs() {
            workspace = workspace.with_catalog(catalog);
        }
        if let Some(package) = root_package {
            workspace = workspace.with_package(package);
        }

        for dir in Self::member_dirs(root, &file.packages)? {
            if dir == root {
                continue;
            }
            match parse_package_json(&dir.join(PACKAGE_JSON), &dir) {
                Ok(package) => workspace = workspace.with_package(package),
                Err(e) => log::warn!("skipping workspace member: {}", e),
            }
        }

        log::debug!(
            "loaded workspace {} with {} catalogs and {} packages",
            workspace.name,
            workspace.catalogs.len(),
            workspace.packages.len()
        );
        Ok(workspace)
    }
}

impl WorkspaceRepository for PnpmWorkspaceRepository {
    fn find_by_path(&self, path: &Path) -> Result<Option<Workspace>, WorkspaceError> {
        if !path.join(WORKSPACE_FILE).is_file() {
            return Ok(None);
        }
        self.load(path).map(Some)
    }

    fn discover(&self, path: &Path) -> Result<Option<Workspace>, WorkspaceError> {
        let start = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| WorkspaceError::read_error(path, e))?
                .join(path)
        };

        for dir in start.ancestors() {
            if let Some(workspace) = self.find_by_path(dir)? {
                return Ok(Some(workspace));
            }
        }
        Ok(None)
    }

    fn save(&self, workspace: &Workspace) -> Result<(), WorkspaceError> {
        let path = workspace.root().join(WORKSPACE_FILE);
        let content =
            fs::read_to_string(&path).map_err(|e| WorkspaceError::read_error(&path, e))?;
        let on_disk = WorkspaceFile::parse(&path, &content)?.catalogs();

        let mut changes = Vec::new();
        for catalog in &workspace.catalogs {
            let stored = on_disk.iter().find(|c| c.name == catalog.name);
            for (package, range) in &catalog.entries {
                let unchanged = stored.and_then(|c| c.get(package)) == Some(range.as_str());
                if !unchanged {
                    changes.push(CatalogChange::new(&catalog.name, package, range));
                }
            }
        }

        if changes.is_empty() {
            return Ok(());
        }

        let writer = CatalogWriter::new(&path)?;
        let updated = writer.apply(&content, &changes)?;
        fs::write(&path, updated).map_err(|e| WorkspaceError::write_error(&path, e))?;
        log::info!("wrote {} catalog change(s) to {}", changes.len(), path.display());
        Ok(())
    }
}
