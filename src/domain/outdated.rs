//! Outdated detection results

use crate::domain::{UpdateType, Version};
use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reason why a catalog entry could not be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Registry returned 404 for the package
    NotFound,
    /// Network failure, timeout or rate limiting
    Network,
    /// Registry lists no usable versions
    EmptyVersion,
    /// Declared range or a registry version could not be parsed
    InvalidVersion,
    /// Anything else (malformed registry response, ...)
    Other,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::Network => write!(f, "network error"),
            SkipReason::EmptyVersion => write!(f, "no versions"),
            SkipReason::InvalidVersion => write!(f, "invalid version"),
            SkipReason::Other => write!(f, "other error"),
        }
    }
}

impl From<&RegistryError> for SkipReason {
    fn from(error: &RegistryError) -> Self {
        match error {
            RegistryError::PackageNotFound { .. } => SkipReason::NotFound,
            RegistryError::NetworkError { .. }
            | RegistryError::Timeout { .. }
            | RegistryError::RateLimitExceeded { .. } => SkipReason::Network,
            RegistryError::EmptyVersions { .. } => SkipReason::EmptyVersion,
            RegistryError::InvalidResponse { .. } => SkipReason::Other,
        }
    }
}

/// A catalog entry that was not checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPackage {
    pub package_name: String,
    pub reason: SkipReason,
    /// Underlying error text
    pub message: String,
}

impl SkippedPackage {
    pub fn new(
        package_name: impl Into<String>,
        reason: SkipReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            reason,
            message: message.into(),
        }
    }
}

/// A catalog entry for which a newer version exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedDependencyInfo {
    pub package_name: String,
    /// Range as declared in the catalog
    pub current_version: String,
    pub target_version: Version,
    pub update_type: UpdateType,
    /// The current version has known advisories
    pub is_security_update: bool,
    /// Workspace packages referencing this catalog entry
    pub affected_packages: Vec<String>,
}

/// Detection results for one catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOutdatedReport {
    pub catalog: String,
    /// Number of entries checked after filtering
    pub total_packages: usize,
    pub outdated: Vec<OutdatedDependencyInfo>,
    pub skipped: Vec<SkippedPackage>,
}

impl CatalogOutdatedReport {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            total_packages: 0,
            outdated: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn has_updates(&self) -> bool {
        !self.outdated.is_empty()
    }
}

/// Detection results for a whole workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedReport {
    pub workspace: String,
    pub catalogs: Vec<CatalogOutdatedReport>,
}

impl OutdatedReport {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            catalogs: Vec::new(),
        }
    }

    pub fn has_updates(&self) -> bool {
        self.catalogs.iter().any(|c| c.has_updates())
    }

    pub fn total_outdated(&self) -> usize {
        self.catalogs.iter().map(|c| c.outdated.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.catalogs.iter().map(|c| c.skipped.len()).sum()
    }

    /// Number of security findings across all catalogs
    pub fn security_updates(&self) -> usize {
        self.catalogs
            .iter()
            .flat_map(|c| &c.outdated)
            .filter(|o| o.is_security_update)
            .count()
    }

    /// Skipped packages counted by reason
    pub fn skip_summary(&self) -> BTreeMap<SkipReason, usize> {
        let mut summary = BTreeMap::new();
        for skipped in self.catalogs.iter().flat_map(|c| &c.skipped) {
            *summary.entry(skipped.reason).or_insert(0) += 1;
        }
        summary
    }
}
