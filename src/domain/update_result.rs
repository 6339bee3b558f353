//! Update execution result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog entry that was (or in dry-run would be) rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedDependency {
    pub catalog: String,
    pub package_name: String,
    /// Range before the update
    pub from: String,
    /// Range written by the update
    pub to: String,
}

impl fmt::Display for UpdatedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} → {}",
            self.package_name, self.catalog, self.from, self.to
        )
    }
}

/// A planned update that was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDependency {
    pub catalog: String,
    pub package_name: String,
    pub reason: String,
}

impl fmt::Display for SkippedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: skipped ({})",
            self.package_name, self.catalog, self.reason
        )
    }
}

/// A failure recorded during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub message: String,
    /// A fatal error makes the whole execution unsuccessful
    pub fatal: bool,
}

impl UpdateError {
    /// A non-fatal failure of one catalog mutation
    pub fn for_dependency(
        catalog: impl Into<String>,
        package_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            catalog: Some(catalog.into()),
            package_name: Some(package_name.into()),
            message: message.into(),
            fatal: false,
        }
    }

    /// A fatal failure not tied to one dependency
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            catalog: None,
            package_name: None,
            message: message.into(),
            fatal: true,
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.package_name, &self.catalog) {
            (Some(package), Some(catalog)) => {
                write!(f, "{} [{}]: {}", package, catalog, self.message)
            }
            _ => f.write_str(&self.message),
        }
    }
}

/// Outcome of executing an update plan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateResult {
    pub dry_run: bool,
    pub updated_dependencies: Vec<UpdatedDependency>,
    pub skipped_dependencies: Vec<SkippedDependency>,
    pub errors: Vec<UpdateError>,
}

impl UpdateResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// True unless a fatal error was recorded
    pub fn success(&self) -> bool {
        !self.errors.iter().any(|e| e.fatal)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn total_updated(&self) -> usize {
        self.updated_dependencies.len()
    }
}
