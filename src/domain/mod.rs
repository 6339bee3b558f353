//! Core domain models for catup
//!
//! This module contains the fundamental types used throughout the application:
//! - Semantic versions and npm ranges
//! - Workspace, catalog and package structures
//! - Target policies and security reports
//! - Outdated reports, update plans, impact analyses and execution results

mod impact;
mod outdated;
mod plan;
mod security;
mod target;
mod update_result;
mod version;
mod version_range;
mod workspace;

pub use impact::{ImpactAnalysis, PackageImpact, RiskLevel, SecurityImpact, SeverityChange};
pub use outdated::{
    CatalogOutdatedReport, OutdatedDependencyInfo, OutdatedReport, SkipReason, SkippedPackage,
};
pub use plan::{ConflictEntry, PlannedUpdate, UpdatePlan, VersionConflict};
pub use security::{SecurityReport, Severity, Vulnerability};
pub use target::TargetPolicy;
pub use update_result::{SkippedDependency, UpdateError, UpdateResult, UpdatedDependency};
pub use version::{UpdateType, Version};
pub use version_range::{RangeKind, VersionRange};
pub use workspace::{
    Catalog, CatalogReference, DependencyType, Package, Workspace, DEFAULT_CATALOG,
};
