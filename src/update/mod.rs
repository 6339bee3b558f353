//! Update resolution engine
//!
//! This module provides:
//! - Package name filter from CLI args and config
//! - Outdated detection over all catalogs
//! - Update planning with conflict detection
//! - Impact analysis for a single proposed update
//! - Plan execution with partial-failure semantics

mod detector;
mod executor;
mod filter;
mod impact;
mod planner;

pub use detector::{DetectOptions, OutdatedDetector, DEFAULT_CONCURRENCY};
pub use executor::{ExecuteOptions, UpdateExecutor};
pub use filter::PackageFilter;
pub use impact::{assess_risk, recommendations, security_delta, ImpactAnalyzer};
pub use planner::{update_reason, UpdatePlanner};
