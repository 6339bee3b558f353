//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Outdated catalog entries grouped by catalog, with update type labels
//! - Cross-catalog conflicts and skipped lookups
//! - Applied updates and execution errors
//! - Impact analysis reports

use crate::domain::{
    CatalogOutdatedReport, ImpactAnalysis, OutdatedReport, RiskLevel, SeverityChange, UpdatePlan,
    UpdateResult, UpdateType,
};
use crate::output::{OutputFormatter, Verbosity};
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Minimum width of the package name column
const NAME_WIDTH: usize = 20;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    dry_run: bool,
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self::with_color(verbosity, dry_run, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Apply a style only when colors are enabled
    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            format!("{} ", self.paint("(dry-run)", |s| s.cyan()))
        } else {
            String::new()
        }
    }

    fn update_type_label(&self, update_type: UpdateType) -> String {
        let label = update_type.as_str();
        match update_type {
            UpdateType::Major => self.paint(label, |s| s.red().bold()),
            UpdateType::Minor => self.paint(label, |s| s.yellow()),
            UpdateType::Patch => self.paint(label, |s| s.green()),
            UpdateType::None => self.paint(label, |s| s.dimmed()),
        }
    }

    fn risk_label(&self, risk: RiskLevel) -> String {
        let label = risk.to_string();
        match risk {
            RiskLevel::High => self.paint(&label, |s| s.red().bold()),
            RiskLevel::Medium => self.paint(&label, |s| s.yellow()),
            RiskLevel::Low => self.paint(&label, |s| s.green()),
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    /// Write one catalog's findings
    fn format_catalog(
        &self,
        catalog: &CatalogOutdatedReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let verbose = self.verbosity == Verbosity::Verbose;
        if !catalog.has_updates() && !(verbose && !catalog.skipped.is_empty()) {
            return Ok(());
        }

        writeln!(
            writer,
            "{} {}",
            self.heading(&format!("catalog:{}", catalog.catalog)),
            self.paint(
                &format!(
                    "({} checked, {} outdated)",
                    catalog.total_packages,
                    catalog.outdated.len()
                ),
                |s| s.dimmed()
            )
        )?;

        let width = catalog
            .outdated
            .iter()
            .map(|o| o.package_name.len())
            .max()
            .unwrap_or(0)
            .max(NAME_WIDTH);

        for finding in &catalog.outdated {
            let security = if finding.is_security_update {
                format!(" {}", self.paint("security", |s| s.red().bold()))
            } else {
                String::new()
            };
            writeln!(
                writer,
                "  {:width$} {} {} {} [{}]{}",
                finding.package_name,
                self.paint(&finding.current_version, |s| s.dimmed()),
                self.paint("→", |s| s.dimmed()),
                self.paint(&finding.target_version.to_string(), |s| s
                    .bright_white()
                    .bold()),
                self.update_type_label(finding.update_type),
                security,
                width = width
            )?;
            if verbose && !finding.affected_packages.is_empty() {
                writeln!(
                    writer,
                    "  {:width$} {}",
                    "",
                    self.paint(
                        &format!("used by {}", finding.affected_packages.join(", ")),
                        |s| s.dimmed()
                    ),
                    width = width
                )?;
            }
        }

        if verbose && !catalog.skipped.is_empty() {
            writeln!(writer, "  {}", self.paint("Skipped:", |s| s.dimmed()))?;
            for skipped in &catalog.skipped {
                writeln!(
                    writer,
                    "  {:width$} {}",
                    self.paint(&skipped.package_name, |s| s.dimmed()),
                    self.paint(
                        &format!("({}: {})", skipped.reason, skipped.message),
                        |s| s.dimmed()
                    ),
                    width = width
                )?;
            }
        }

        writeln!(writer)
    }

    fn format_conflicts(&self, plan: &UpdatePlan, writer: &mut dyn Write) -> std::io::Result<()> {
        if !plan.has_conflicts() {
            return Ok(());
        }

        writeln!(writer, "{}:", self.paint("Conflicts", |s| s.yellow().bold()))?;
        for conflict in &plan.conflicts {
            let sides: Vec<String> = conflict
                .catalogs
                .iter()
                .map(|c| format!("{} → {}", c.catalog, c.proposed_version))
                .collect();
            writeln!(
                writer,
                "  {} {} ({})",
                self.paint("!", |s| s.yellow()),
                conflict.package_name,
                sides.join(", ")
            )?;
            writeln!(
                writer,
                "    {}",
                self.paint(&conflict.recommendation, |s| s.dimmed())
            )?;
        }
        writeln!(writer)
    }

    /// Summary line counting findings by update type
    fn format_report_summary(
        &self,
        report: &OutdatedReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let total = report.total_outdated();
        if total == 0 {
            writeln!(
                writer,
                "{}",
                self.paint("All catalog entries are up to date", |s| s.green())
            )?;
        } else {
            let count = |kind: UpdateType| {
                report
                    .catalogs
                    .iter()
                    .flat_map(|c| &c.outdated)
                    .filter(|o| o.update_type == kind)
                    .count()
            };
            let mut parts = Vec::new();
            for kind in [UpdateType::Major, UpdateType::Minor, UpdateType::Patch] {
                let n = count(kind);
                if n > 0 {
                    parts.push(format!("{} {}", n, self.update_type_label(kind)));
                }
            }
            let security = report.security_updates();
            if security > 0 {
                parts.push(format!(
                    "{} {}",
                    security,
                    self.paint("security", |s| s.red())
                ));
            }
            writeln!(
                writer,
                "{} outdated ({})",
                self.paint(&total.to_string(), |s| s.yellow().bold()),
                parts.join(", ")
            )?;
        }

        let skip_summary = report.skip_summary();
        if !skip_summary.is_empty() {
            let parts: Vec<String> = skip_summary
                .iter()
                .map(|(reason, n)| format!("{} {}", n, reason))
                .collect();
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!("{} skipped ({})", report.total_skipped(), parts.join(", ")),
                    |s| s.dimmed()
                )
            )?;
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_check(
        &self,
        report: &OutdatedReport,
        plan: &UpdatePlan,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            for catalog in &report.catalogs {
                self.format_catalog(catalog, writer)?;
            }
            self.format_conflicts(plan, writer)?;
            writeln!(writer, "{}:", self.heading("Summary"))?;
        }
        self.format_report_summary(report, writer)
    }

    fn format_update(
        &self,
        report: &OutdatedReport,
        plan: &UpdatePlan,
        result: &UpdateResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let quiet = self.verbosity == Verbosity::Quiet;

        if !quiet {
            self.format_conflicts(plan, writer)?;

            let width = result
                .updated_dependencies
                .iter()
                .map(|u| u.package_name.len())
                .max()
                .unwrap_or(0)
                .max(NAME_WIDTH);
            for updated in &result.updated_dependencies {
                writeln!(
                    writer,
                    "{}  {} {:width$} {} {} {}",
                    prefix,
                    self.paint("✓", |s| s.green()),
                    updated.package_name,
                    self.paint(&updated.from, |s| s.dimmed()),
                    self.paint("→", |s| s.dimmed()),
                    self.paint(&updated.to, |s| s.bright_white().bold()),
                    width = width
                )?;
                if self.verbosity == Verbosity::Verbose {
                    writeln!(
                        writer,
                        "     {}",
                        self.paint(&format!("catalog:{}", updated.catalog), |s| s.dimmed())
                    )?;
                }
            }

            for skipped in &result.skipped_dependencies {
                writeln!(
                    writer,
                    "  {} {}",
                    self.paint("-", |s| s.yellow()),
                    self.paint(&skipped.to_string(), |s| s.dimmed())
                )?;
            }

            if result.has_errors() {
                writeln!(writer, "{}:", self.paint("Errors", |s| s.red().bold()))?;
                for error in &result.errors {
                    writeln!(writer, "  {} {}", self.paint("✗", |s| s.red()), error)?;
                }
            }

            let skipped = report.total_skipped();
            if skipped > 0 {
                writeln!(
                    writer,
                    "{}",
                    self.paint(
                        &format!("{} catalog entries could not be checked", skipped),
                        |s| s.dimmed()
                    )
                )?;
            }
        }

        let updated = result.total_updated();
        if updated == 0 {
            writeln!(writer, "{}{}", prefix, self.paint("No updates", |s| s.dimmed()))
        } else {
            let verb = if result.dry_run {
                "would be updated"
            } else {
                "updated"
            };
            writeln!(
                writer,
                "{}{} catalog entr{} {}",
                prefix,
                self.paint(&updated.to_string(), |s| s.green()),
                if updated == 1 { "y" } else { "ies" },
                verb
            )
        }
    }

    fn format_analysis(
        &self,
        analysis: &ImpactAnalysis,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{} [catalog:{}] {} {} {} [{}]",
            self.heading(&analysis.package_name),
            analysis.catalog,
            self.paint(&analysis.current_version, |s| s.dimmed()),
            self.paint("→", |s| s.dimmed()),
            self.paint(&analysis.proposed_version.to_string(), |s| s
                .bright_white()
                .bold()),
            self.update_type_label(analysis.update_type)
        )?;
        writeln!(writer, "Risk: {}", self.risk_label(analysis.risk_level))?;

        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "{} ({}):",
            self.heading("Affected packages"),
            analysis.affected_packages.len()
        )?;
        for impact in &analysis.affected_packages {
            let breaking = if impact.breaking_change {
                format!(" {}", self.paint("breaking", |s| s.red().bold()))
            } else {
                String::new()
            };
            writeln!(
                writer,
                "  {:width$} {} [{}]{}",
                impact.package_name,
                self.paint(&impact.dependency_type.to_string(), |s| s.dimmed()),
                self.risk_label(impact.compatibility_risk),
                breaking,
                width = NAME_WIDTH
            )?;
            if self.verbosity == Verbosity::Verbose {
                writeln!(
                    writer,
                    "    {}",
                    self.paint(&impact.path.display().to_string(), |s| s.dimmed())
                )?;
            }
        }

        let security = &analysis.security_impact;
        writeln!(writer)?;
        let change = match security.severity_change {
            SeverityChange::Better => self.paint("better", |s| s.green()),
            SeverityChange::Worse => self.paint("worse", |s| s.red().bold()),
            SeverityChange::Same => self.paint("same", |s| s.dimmed()),
        };
        writeln!(
            writer,
            "{}: {} fixed, {} introduced ({})",
            self.heading("Security"),
            security.fixed_vulnerabilities(),
            security.new_vulnerabilities(),
            change
        )?;
        if self.verbosity == Verbosity::Verbose {
            for vuln in &security.fixed {
                writeln!(writer, "  - fixed [{}] {}", vuln.severity, vuln.title)?;
            }
            for vuln in &security.introduced {
                writeln!(writer, "  + new [{}] {}", vuln.severity, vuln.title)?;
            }
        }

        if !analysis.recommendations.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}:", self.heading("Recommendations"))?;
            for recommendation in &analysis.recommendations {
                writeln!(writer, "  • {}", recommendation)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CatalogOutdatedReport, ConflictEntry, DependencyType, OutdatedDependencyInfo,
        PackageImpact, SecurityImpact, SkipReason, SkippedPackage, UpdatedDependency, Version,
        VersionConflict,
    };
    use std::path::PathBuf;

    fn report() -> OutdatedReport {
        let mut catalog = CatalogOutdatedReport::new("default");
        catalog.total_packages = 3;
        catalog.outdated.push(OutdatedDependencyInfo {
            package_name: "react".to_string(),
            current_version: "^17.0.0".to_string(),
            target_version: Version::new(18, 2, 0),
            update_type: UpdateType::Major,
            is_security_update: false,
            affected_packages: vec!["web".to_string()],
        });
        catalog.outdated.push(OutdatedDependencyInfo {
            package_name: "lodash".to_string(),
            current_version: "^4.17.0".to_string(),
            target_version: Version::new(4, 17, 21),
            update_type: UpdateType::Patch,
            is_security_update: true,
            affected_packages: vec![],
        });
        catalog
            .skipped
            .push(SkippedPackage::new("ghost", SkipReason::NotFound, "404"));

        let mut report = OutdatedReport::new("ws");
        report.catalogs.push(catalog);
        report
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_check_normal() {
        let formatter = TextFormatter::with_color(Verbosity::Normal, false, false);
        let output = render(|w| formatter.format_check(&report(), &UpdatePlan::default(), w));

        assert!(output.contains("catalog:default (3 checked, 2 outdated)"));
        assert!(output.contains("^17.0.0 → 18.2.0 [major]"));
        assert!(output.contains("^4.17.0 → 4.17.21 [patch] security"));
        assert!(output.contains("2 outdated (1 major, 1 patch, 1 security)"));
        assert!(output.contains("1 skipped (1 not found)"));
        // skipped details only in verbose mode
        assert!(!output.contains("ghost"));
    }

    #[test]
    fn test_format_check_verbose_shows_details() {
        let formatter = TextFormatter::with_color(Verbosity::Verbose, false, false);
        let output = render(|w| formatter.format_check(&report(), &UpdatePlan::default(), w));
        assert!(output.contains("used by web"));
        assert!(output.contains("ghost"));
        assert!(output.contains("(not found: 404)"));
    }

    #[test]
    fn test_format_check_quiet_only_summary() {
        let formatter = TextFormatter::with_color(Verbosity::Quiet, false, false);
        let output = render(|w| formatter.format_check(&report(), &UpdatePlan::default(), w));
        assert!(!output.contains("catalog:default"));
        assert!(output.starts_with("2 outdated"));
    }

    #[test]
    fn test_format_check_up_to_date() {
        let formatter = TextFormatter::with_color(Verbosity::Normal, false, false);
        let output = render(|w| {
            formatter.format_check(&OutdatedReport::new("ws"), &UpdatePlan::default(), w)
        });
        assert!(output.contains("All catalog entries are up to date"));
    }

    #[test]
    fn test_format_conflicts() {
        let plan = UpdatePlan {
            updates: vec![],
            conflicts: vec![VersionConflict {
                package_name: "x".to_string(),
                catalogs: vec![
                    ConflictEntry {
                        catalog: "a".to_string(),
                        current_version: "^1.0.0".to_string(),
                        proposed_version: Version::new(1, 1, 0),
                    },
                    ConflictEntry {
                        catalog: "b".to_string(),
                        current_version: "^1.0.0".to_string(),
                        proposed_version: Version::new(2, 0, 0),
                    },
                ],
                recommendation: "Unify x".to_string(),
            }],
        };
        let formatter = TextFormatter::with_color(Verbosity::Normal, false, false);
        let output = render(|w| formatter.format_check(&OutdatedReport::new("ws"), &plan, w));
        assert!(output.contains("! x (a → 1.1.0, b → 2.0.0)"));
        assert!(output.contains("Unify x"));
    }

    #[test]
    fn test_format_update_dry_run() {
        let mut result = UpdateResult::new(true);
        result.updated_dependencies.push(UpdatedDependency {
            catalog: "default".to_string(),
            package_name: "react".to_string(),
            from: "^17.0.0".to_string(),
            to: "^18.2.0".to_string(),
        });
        let formatter = TextFormatter::with_color(Verbosity::Normal, true, false);
        let output = render(|w| {
            formatter.format_update(&report(), &UpdatePlan::default(), &result, w)
        });
        assert!(output.contains("(dry-run)"));
        assert!(output.contains("^17.0.0 → ^18.2.0"));
        assert!(output.contains("1 catalog entry would be updated"));
    }

    #[test]
    fn test_format_update_nothing() {
        let formatter = TextFormatter::with_color(Verbosity::Quiet, false, false);
        let output = render(|w| {
            formatter.format_update(
                &OutdatedReport::new("ws"),
                &UpdatePlan::default(),
                &UpdateResult::new(false),
                w,
            )
        });
        assert_eq!(output, "No updates\n");
    }

    #[test]
    fn test_format_analysis() {
        let analysis = ImpactAnalysis {
            catalog: "default".to_string(),
            package_name: "react".to_string(),
            current_version: "^17.0.0".to_string(),
            proposed_version: Version::new(18, 2, 0),
            update_type: UpdateType::Major,
            affected_packages: vec![PackageImpact {
                package_name: "web".to_string(),
                path: PathBuf::from("/ws/apps/web"),
                dependency_type: DependencyType::Dependencies,
                compatibility_risk: RiskLevel::High,
                breaking_change: true,
            }],
            risk_level: RiskLevel::Medium,
            security_impact: SecurityImpact {
                fixed: vec![],
                introduced: vec![],
                severity_change: SeverityChange::Same,
            },
            recommendations: vec!["Review the changelog".to_string()],
        };
        let formatter = TextFormatter::with_color(Verbosity::Normal, false, false);
        let output = render(|w| formatter.format_analysis(&analysis, w));
        assert!(output.contains("react [catalog:default] ^17.0.0 → 18.2.0 [major]"));
        assert!(output.contains("Risk: medium"));
        assert!(output.contains("Affected packages (1):"));
        assert!(output.contains("[high] breaking"));
        assert!(output.contains("Security: 0 fixed, 0 introduced (same)"));
        assert!(output.contains("• Review the changelog"));
    }
}
