//! Outdated dependency detection
//!
//! Every catalog entry becomes one registry lookup. Lookups for all catalogs
//! share a single bounded worker pool; results are re-sorted afterwards so
//! reports do not depend on completion order.

use crate::domain::{
    CatalogOutdatedReport, OutdatedDependencyInfo, OutdatedReport, SkipReason, SkippedPackage,
    TargetPolicy, VersionRange, Workspace,
};
use crate::error::{RegistryError, WorkspaceError};
use crate::registry::RegistryGateway;
use crate::update::PackageFilter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

/// Default number of concurrent registry lookups
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Options controlling detection
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Default target policy
    pub target: TargetPolicy,
    /// Per-catalog policy overrides
    pub catalog_targets: HashMap<String, TargetPolicy>,
    /// Accept prerelease targets
    pub include_prerelease: bool,
    /// Package name filter
    pub filter: PackageFilter,
    /// Maximum concurrent lookups
    pub concurrency: usize,
    /// Time budget for one package lookup, retries included
    pub lookup_timeout: Option<Duration>,
    /// Catalogs to check (empty means all)
    pub catalogs: Vec<String>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            target: TargetPolicy::default(),
            catalog_targets: HashMap::new(),
            include_prerelease: false,
            filter: PackageFilter::new(),
            concurrency: DEFAULT_CONCURRENCY,
            lookup_timeout: None,
            catalogs: Vec::new(),
        }
    }
}

impl DetectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default target policy
    pub fn with_target(mut self, target: TargetPolicy) -> Self {
        self.target = target;
        self
    }

    /// Override the policy for one catalog
    pub fn with_catalog_target(mut self, catalog: impl Into<String>, target: TargetPolicy) -> Self {
        self.catalog_targets.insert(catalog.into(), target);
        self
    }

    pub fn with_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        self
    }

    pub fn with_filter(mut self, filter: PackageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the worker pool size (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Restrict detection to the named catalogs
    pub fn with_catalogs(mut self, catalogs: Vec<String>) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Policy applying to a catalog
    pub fn target_for(&self, catalog: &str) -> TargetPolicy {
        self.catalog_targets
            .get(catalog)
            .copied()
            .unwrap_or(self.target)
    }
}

/// One catalog entry queued for lookup
struct Lookup {
    catalog_index: usize,
    package: String,
    raw_range: String,
    range: VersionRange,
    policy: TargetPolicy,
    affected_packages: Vec<String>,
}

/// What a lookup concluded
enum Finding {
    Outdated(OutdatedDependencyInfo),
    UpToDate,
    Skipped(SkippedPackage),
}

/// Detects outdated catalog entries
pub struct OutdatedDetector {
    gateway: Arc<dyn RegistryGateway>,
    options: DetectOptions,
}

impl OutdatedDetector {
    pub fn new(gateway: Arc<dyn RegistryGateway>, options: DetectOptions) -> Self {
        Self { gateway, options }
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    /// Number of lookups `detect` would run, after filtering
    pub fn count_lookups(&self, workspace: &Workspace) -> usize {
        workspace
            .catalogs
            .iter()
            .filter(|c| self.is_selected(&c.name))
            .flat_map(|c| c.entries.keys())
            .filter(|name| self.options.filter.should_process_package(name))
            .count()
    }

    fn is_selected(&self, catalog: &str) -> bool {
        self.options.catalogs.is_empty() || self.options.catalogs.iter().any(|c| c == catalog)
    }

    /// Detect outdated entries in every selected catalog
    pub async fn detect(&self, workspace: &Workspace) -> Result<OutdatedReport, WorkspaceError> {
        self.detect_with_progress(workspace, |_| {}).await
    }

    /// Like `detect`, calling `on_lookup` with each package name as its lookup finishes
    pub async fn detect_with_progress<F>(
        &self,
        workspace: &Workspace,
        mut on_lookup: F,
    ) -> Result<OutdatedReport, WorkspaceError>
    where
        F: FnMut(&str),
    {
        // explicitly requested catalogs must exist
        for name in &self.options.catalogs {
            if workspace.catalog(name).is_none() {
                return Err(WorkspaceError::catalog_not_found(name));
            }
        }

        let mut reports = Vec::new();
        let mut lookups = Vec::new();

        for catalog in workspace.catalogs.iter().filter(|c| self.is_selected(&c.name)) {
            let catalog_index = reports.len();
            let mut report = CatalogOutdatedReport::new(&catalog.name);
            let policy = self.options.target_for(&catalog.name);

            for (package, raw_range) in &catalog.entries {
                if !self.options.filter.should_process_package(package) {
                    log::debug!("{} filtered out", package);
                    continue;
                }
                report.total_packages += 1;

                match VersionRange::parse(raw_range) {
                    Ok(range) => lookups.push(Lookup {
                        catalog_index,
                        package: package.clone(),
                        raw_range: raw_range.clone(),
                        range,
                        policy,
                        affected_packages: workspace.affected_package_names(&catalog.name, package),
                    }),
                    Err(e) => {
                        log::warn!("skipping {} [{}]: {}", package, catalog.name, e);
                        report.skipped.push(SkippedPackage::new(
                            package,
                            SkipReason::InvalidVersion,
                            e.to_string(),
                        ));
                    }
                }
            }
            reports.push(report);
        }

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<task::Id, (usize, String)> = HashMap::new();

        for lookup in lookups {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let include_prerelease = self.options.include_prerelease;
            let timeout = self.options.lookup_timeout;

            let catalog_index = lookup.catalog_index;
            let package = lookup.package.clone();
            let handle = tasks.spawn(async move {
                let finding = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        check_package(gateway.as_ref(), &lookup, include_prerelease, timeout).await
                    }
                    Err(_) => Finding::Skipped(SkippedPackage::new(
                        &lookup.package,
                        SkipReason::Other,
                        "worker pool closed",
                    )),
                };
                (lookup.catalog_index, lookup.package, finding)
            });
            pending.insert(handle.id(), (catalog_index, package));
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (catalog_index, package, finding) = match joined {
                Ok((_, result)) => result,
                Err(e) => {
                    let Some((catalog_index, package)) = pending.remove(&e.id()) else {
                        log::warn!("lookup task failed: {}", e);
                        continue;
                    };
                    log::warn!("skipping {}: lookup task failed: {}", package, e);
                    let skipped = SkippedPackage::new(
                        &package,
                        SkipReason::Other,
                        format!("lookup task failed: {}", e),
                    );
                    (catalog_index, package, Finding::Skipped(skipped))
                }
            };
            on_lookup(&package);

            let report = &mut reports[catalog_index];
            match finding {
                Finding::Outdated(info) => report.outdated.push(info),
                Finding::Skipped(skipped) => report.skipped.push(skipped),
                Finding::UpToDate => {}
            }
        }

        for report in &mut reports {
            report
                .outdated
                .sort_by(|a, b| a.package_name.cmp(&b.package_name));
            report
                .skipped
                .sort_by(|a, b| a.package_name.cmp(&b.package_name));
        }

        let mut result = OutdatedReport::new(&workspace.name);
        result.catalogs = reports;
        Ok(result)
    }
}

/// Run one lookup; registry failures become skip records
async fn check_package(
    gateway: &dyn RegistryGateway,
    lookup: &Lookup,
    include_prerelease: bool,
    timeout: Option<Duration>,
) -> Finding {
    let package = lookup.package.as_str();
    let resolve = gateway.resolve_target(package, &lookup.range, lookup.policy, include_prerelease);

    let resolved = match timeout {
        Some(limit) => match tokio::time::timeout(limit, resolve).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::timeout(package, gateway.registry_url())),
        },
        None => resolve.await,
    };

    let target = match resolved {
        Ok(target) => target,
        Err(e) => {
            log::warn!("skipping {}: {}", package, e);
            return Finding::Skipped(SkippedPackage::new(
                package,
                SkipReason::from(&e),
                e.to_string(),
            ));
        }
    };

    if target.is_prerelease() && !include_prerelease {
        log::debug!("{}: ignoring prerelease target {}", package, target);
        return Finding::UpToDate;
    }

    let current = lookup.range.min_version();
    if !target.is_newer_than(current) {
        log::debug!("{} {} is up to date", package, lookup.raw_range);
        return Finding::UpToDate;
    }

    let security = gateway.security_report(package, current);
    let report = match timeout {
        Some(limit) => tokio::time::timeout(limit, security)
            .await
            .unwrap_or_else(|_| {
                log::warn!("security check timed out for {}, assuming no advisories", package);
                Default::default()
            }),
        None => security.await,
    };

    Finding::Outdated(OutdatedDependencyInfo {
        package_name: package.to_string(),
        current_version: lookup.raw_range.clone(),
        update_type: current.difference_type(&target),
        target_version: target,
        is_security_update: report.has_vulnerabilities,
        affected_packages: lookup.affected_packages.clone(),
    })
}
