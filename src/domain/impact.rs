//! Impact analysis types

use crate::domain::{DependencyType, UpdateType, Version, Vulnerability};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Qualitative disruption estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Compatibility risk implied by an update type alone
    pub fn from_update_type(update_type: UpdateType) -> Self {
        match update_type {
            UpdateType::Major => RiskLevel::High,
            UpdateType::Minor => RiskLevel::Medium,
            UpdateType::Patch | UpdateType::None => RiskLevel::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(name)
    }
}

/// Whether the proposed version improves the advisory picture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityChange {
    Better,
    Worse,
    Same,
}

/// Effect of an update on one workspace package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageImpact {
    pub package_name: String,
    pub path: PathBuf,
    pub dependency_type: DependencyType,
    pub compatibility_risk: RiskLevel,
    /// The update may break this package's runtime code
    pub breaking_change: bool,
}

/// Advisory delta between current and proposed versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityImpact {
    /// Advisories present in current but not in proposed
    pub fixed: Vec<Vulnerability>,
    /// Advisories present in proposed but not in current
    pub introduced: Vec<Vulnerability>,
    pub severity_change: SeverityChange,
}

impl SecurityImpact {
    pub fn fixed_vulnerabilities(&self) -> usize {
        self.fixed.len()
    }

    pub fn new_vulnerabilities(&self) -> usize {
        self.introduced.len()
    }
}

/// Risk verdict for a single proposed catalog update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub catalog: String,
    pub package_name: String,
    pub current_version: String,
    pub proposed_version: Version,
    pub update_type: UpdateType,
    pub affected_packages: Vec<PackageImpact>,
    pub risk_level: RiskLevel,
    pub security_impact: SecurityImpact,
    pub recommendations: Vec<String>,
}

impl ImpactAnalysis {
    /// Returns true if any affected package flags a breaking change
    pub fn has_breaking_changes(&self) -> bool {
        self.affected_packages.iter().any(|p| p.breaking_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_from_update_type() {
        assert_eq!(RiskLevel::from_update_type(UpdateType::Major), RiskLevel::High);
        assert_eq!(RiskLevel::from_update_type(UpdateType::Minor), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_update_type(UpdateType::Patch), RiskLevel::Low);
        assert_eq!(RiskLevel::from_update_type(UpdateType::None), RiskLevel::Low);
    }

    #[test]
    fn test_risk_order() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"medium\"");
        assert_eq!(
            serde_json::to_string(&SeverityChange::Better).unwrap(),
            "\"better\""
        );
    }
}
