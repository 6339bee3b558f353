//! Security advisory report types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory severity as reported by the npm audit endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Parse an advisory label, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "low" => Some(Severity::Low),
            "moderate" | "medium" => Some(Severity::Moderate),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A single advisory affecting a package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Advisory identifier
    pub id: String,
    /// Short advisory title
    pub title: String,
    pub severity: Severity,
    /// Advisory URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Affected range, as published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerable_versions: Option<String>,
}

/// Known advisories for one package version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityReport {
    pub has_vulnerabilities: bool,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl SecurityReport {
    /// A report with no known advisories
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a report from a list of advisories
    pub fn from_vulnerabilities(vulnerabilities: Vec<Vulnerability>) -> Self {
        Self {
            has_vulnerabilities: !vulnerabilities.is_empty(),
            vulnerabilities,
        }
    }

    /// Highest severity present, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|v| v.severity).max()
    }

    /// Returns true if the advisory id appears in this report
    pub fn contains(&self, id: &str) -> bool {
        self.vulnerabilities.iter().any(|v| v.id == id)
    }
}
