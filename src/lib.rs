//! catup - pnpm catalog update engine
//!
//! This library checks the catalogs of a pnpm workspace against the npm
//! registry and updates them:
//! - Outdated detection with per-catalog target policies
//! - Update planning with cross-catalog conflict detection
//! - Impact analysis for a single proposed update
//! - Format-preserving writes to pnpm-workspace.yaml

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod update;
pub mod workspace;
