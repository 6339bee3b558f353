//! Update plan types

use crate::domain::{UpdateType, Version};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One catalog entry transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedUpdate {
    pub catalog: String,
    pub package_name: String,
    /// Range as declared in the catalog
    pub current_version: String,
    pub new_version: Version,
    pub update_type: UpdateType,
    pub is_security_update: bool,
    /// Human-readable explanation
    pub reason: String,
}

impl fmt::Display for PlannedUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} → {}",
            self.package_name, self.catalog, self.current_version, self.new_version
        )
    }
}

/// One catalog's side of a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub catalog: String,
    pub current_version: String,
    pub proposed_version: Version,
}

/// The same package proposed at different versions by different catalogs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConflict {
    pub package_name: String,
    pub catalogs: Vec<ConflictEntry>,
    pub recommendation: String,
}

impl VersionConflict {
    /// Returns true if the catalog takes part in this conflict
    pub fn involves(&self, catalog: &str) -> bool {
        self.catalogs.iter().any(|c| c.catalog == catalog)
    }
}

/// Updates to apply plus the conflicts gating them
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub updates: Vec<PlannedUpdate>,
    pub conflicts: Vec<VersionConflict>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// The conflict for a package, if it has one
    pub fn conflict_for(&self, package_name: &str) -> Option<&VersionConflict> {
        self.conflicts
            .iter()
            .find(|c| c.package_name == package_name)
    }
}
