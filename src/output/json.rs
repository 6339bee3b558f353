//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of outdated reports and update plans
//! - Structured execution results and impact analyses

use crate::domain::{
    CatalogOutdatedReport, ImpactAnalysis, OutdatedReport, SkippedDependency, UpdateError,
    UpdatePlan, UpdateResult, UpdatedDependency, VersionConflict,
};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    outdated: usize,
    security: usize,
    skipped: usize,
    conflicts: usize,
}

/// Result of `check`
#[derive(Serialize)]
struct JsonCheck<'a> {
    workspace: &'a str,
    summary: JsonSummary,
    catalogs: Vec<&'a CatalogOutdatedReport>,
    #[serde(skip_serializing_if = "is_empty")]
    conflicts: &'a [VersionConflict],
}

/// Result of `update`
#[derive(Serialize)]
struct JsonUpdate<'a> {
    workspace: &'a str,
    dry_run: bool,
    success: bool,
    summary: JsonSummary,
    updated: &'a [UpdatedDependency],
    #[serde(skip_serializing_if = "is_empty")]
    skipped: &'a [SkippedDependency],
    #[serde(skip_serializing_if = "is_empty")]
    errors: &'a [UpdateError],
    #[serde(skip_serializing_if = "is_empty")]
    conflicts: &'a [VersionConflict],
}

impl JsonFormatter {
    fn summary(report: &OutdatedReport, plan: &UpdatePlan) -> JsonSummary {
        JsonSummary {
            outdated: report.total_outdated(),
            security: report.security_updates(),
            skipped: report.total_skipped(),
            conflicts: plan.conflicts.len(),
        }
    }

    fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writeln!(writer, "{}", json)
    }

    /// Catalogs with outdated entries; in verbose mode also those with only skips
    fn catalogs<'a>(&self, report: &'a OutdatedReport) -> Vec<&'a CatalogOutdatedReport> {
        report
            .catalogs
            .iter()
            .filter(|c| {
                c.has_updates() || (self.verbosity == Verbosity::Verbose && !c.skipped.is_empty())
            })
            .collect()
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_check(
        &self,
        report: &OutdatedReport,
        plan: &UpdatePlan,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonCheck {
            workspace: &report.workspace,
            summary: Self::summary(report, plan),
            catalogs: self.catalogs(report),
            conflicts: &plan.conflicts,
        };
        Self::write_json(&output, writer)
    }

    fn format_update(
        &self,
        report: &OutdatedReport,
        plan: &UpdatePlan,
        result: &UpdateResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonUpdate {
            workspace: &report.workspace,
            dry_run: result.dry_run,
            success: result.success(),
            summary: Self::summary(report, plan),
            updated: &result.updated_dependencies,
            skipped: &result.skipped_dependencies,
            errors: &result.errors,
            conflicts: &plan.conflicts,
        };
        Self::write_json(&output, writer)
    }

    fn format_analysis(
        &self,
        analysis: &ImpactAnalysis,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        Self::write_json(analysis, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        OutdatedDependencyInfo, SkipReason, SkippedPackage, UpdateType, Version,
    };

    fn report() -> OutdatedReport {
        let mut outdated = CatalogOutdatedReport::new("default");
        outdated.total_packages = 1;
        outdated.outdated.push(OutdatedDependencyInfo {
            package_name: "react".to_string(),
            current_version: "^17.0.0".to_string(),
            target_version: Version::new(18, 2, 0),
            update_type: UpdateType::Major,
            is_security_update: false,
            affected_packages: vec!["web".to_string()],
        });

        let mut skipped_only = CatalogOutdatedReport::new("legacy");
        skipped_only
            .skipped
            .push(SkippedPackage::new("ghost", SkipReason::NotFound, "404"));

        let mut report = OutdatedReport::new("ws");
        report.catalogs.push(outdated);
        report.catalogs.push(skipped_only);
        report
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> serde_json::Value {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_format_check() {
        let formatter = JsonFormatter::new(Verbosity::Normal);
        let json = render(|w| formatter.format_check(&report(), &UpdatePlan::default(), w));

        assert_eq!(json["workspace"], "ws");
        assert_eq!(json["summary"]["outdated"], 1);
        assert_eq!(json["summary"]["skipped"], 1);
        assert_eq!(json["catalogs"].as_array().unwrap().len(), 1);
        let finding = &json["catalogs"][0]["outdated"][0];
        assert_eq!(finding["package_name"], "react");
        assert_eq!(finding["target_version"], "18.2.0");
        assert_eq!(finding["update_type"], "major");
        assert!(json.get("conflicts").is_none());
    }

    #[test]
    fn test_format_check_verbose_includes_skip_only_catalogs() {
        let formatter = JsonFormatter::new(Verbosity::Verbose);
        let json = render(|w| formatter.format_check(&report(), &UpdatePlan::default(), w));
        let catalogs = json["catalogs"].as_array().unwrap();
        assert_eq!(catalogs.len(), 2);
        assert_eq!(catalogs[1]["skipped"][0]["reason"], "not-found");
    }

    #[test]
    fn test_format_update() {
        let mut result = UpdateResult::new(false);
        result.updated_dependencies.push(UpdatedDependency {
            catalog: "default".to_string(),
            package_name: "react".to_string(),
            from: "^17.0.0".to_string(),
            to: "^18.2.0".to_string(),
        });
        result.errors.push(UpdateError::fatal("failed to save workspace"));

        let formatter = JsonFormatter::new(Verbosity::Normal);
        let json = render(|w| {
            formatter.format_update(&report(), &UpdatePlan::default(), &result, w)
        });
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["success"], false);
        assert_eq!(json["updated"][0]["to"], "^18.2.0");
        assert_eq!(json["errors"][0]["fatal"], true);
        assert!(json.get("skipped").is_none());
    }
}
