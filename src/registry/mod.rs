//! Registry gateway for fetching package version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Per-command response cache with per-kind TTLs
//! - Target version selection by policy
//! - npm registry gateway and an in-memory gateway

mod cache;
mod client;
mod npm;
mod resolve;
mod version_info;

pub use cache::{CacheKind, CacheTtl, RegistryCache};
pub use client::{HttpClient, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use npm::{NpmRegistry, NPM_REGISTRY_URL};
pub use resolve::{select_newest, select_target};
pub use version_info::{PackageMetadata, PackageVersions, VersionInfo};

use crate::domain::{SecurityReport, TargetPolicy, Version, VersionRange};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Narrow interface the update engine uses to reach a package registry
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Base URL of the registry, used for cache keys and messages
    fn registry_url(&self) -> &str;

    /// Fetch every published version of a package plus its dist-tags
    async fn fetch_versions(&self, package: &str) -> Result<PackageVersions, RegistryError>;

    /// Fetch the full package document with publish dates
    async fn fetch_metadata(&self, package: &str) -> Result<PackageMetadata, RegistryError>;

    /// Known advisories for a package version
    ///
    /// Never fails: lookup errors yield an empty report.
    async fn security_report(&self, package: &str, version: &Version) -> SecurityReport;

    /// Resolve the candidate version for a package under a target policy
    async fn resolve_target(
        &self,
        package: &str,
        current: &VersionRange,
        policy: TargetPolicy,
        include_prerelease: bool,
    ) -> Result<Version, RegistryError> {
        match policy {
            TargetPolicy::Newest => {
                let metadata = self.fetch_metadata(package).await?;
                select_newest(&metadata, current, include_prerelease)
            }
            _ => {
                let versions = self.fetch_versions(package).await?;
                select_target(&versions, current, policy, include_prerelease)
            }
        }
    }
}

/// In-memory registry serving fixed data
///
/// Used for offline runs and tests. Packages without versions or metadata
/// report `PackageNotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    versions: HashMap<String, PackageVersions>,
    metadata: HashMap<String, PackageMetadata>,
    advisories: HashMap<(String, String), SecurityReport>,
    failures: HashMap<String, RegistryError>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a version list
    pub fn with_versions(mut self, versions: PackageVersions) -> Self {
        self.versions.insert(versions.name.clone(), versions);
        self
    }

    /// Serve a full package document
    pub fn with_metadata(mut self, metadata: PackageMetadata) -> Self {
        self.metadata.insert(metadata.name.clone(), metadata);
        self
    }

    /// Serve an advisory report for one package version
    pub fn with_security(
        mut self,
        package: impl Into<String>,
        version: &Version,
        report: SecurityReport,
    ) -> Self {
        self.advisories
            .insert((package.into(), version.to_string()), report);
        self
    }

    /// Make every lookup of a package fail with the given error
    pub fn with_failure(mut self, package: impl Into<String>, error: RegistryError) -> Self {
        self.failures.insert(package.into(), error);
        self
    }

    fn check_failure(&self, package: &str) -> Result<(), RegistryError> {
        match self.failures.get(package) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RegistryGateway for StaticRegistry {
    fn registry_url(&self) -> &str {
        "memory://static"
    }

    async fn fetch_versions(&self, package: &str) -> Result<PackageVersions, RegistryError> {
        self.check_failure(package)?;
        self.versions
            .get(package)
            .cloned()
            .ok_or_else(|| RegistryError::package_not_found(package, "static"))
    }

    async fn fetch_metadata(&self, package: &str) -> Result<PackageMetadata, RegistryError> {
        self.check_failure(package)?;
        self.metadata
            .get(package)
            .cloned()
            .ok_or_else(|| RegistryError::package_not_found(package, "static"))
    }

    async fn security_report(&self, package: &str, version: &Version) -> SecurityReport {
        self.advisories
            .get(&(package.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}
