//! Impact analysis for a single proposed update

use crate::domain::{
    ImpactAnalysis, PackageImpact, RiskLevel, SecurityImpact, SecurityReport, SeverityChange,
    UpdateType, Version, VersionRange, Workspace,
};
use crate::error::{AppError, WorkspaceError};
use crate::registry::RegistryGateway;
use std::sync::Arc;

/// Affected packages above which a major update is high risk
const MAJOR_HIGH_RISK_THRESHOLD: usize = 5;

/// Affected packages above which a minor update is medium risk
const MINOR_MEDIUM_RISK_THRESHOLD: usize = 10;

/// Compare advisory sets of the current and proposed versions
pub fn security_delta(current: &SecurityReport, proposed: &SecurityReport) -> SecurityImpact {
    let fixed: Vec<_> = current
        .vulnerabilities
        .iter()
        .filter(|v| !proposed.contains(&v.id))
        .cloned()
        .collect();
    let introduced: Vec<_> = proposed
        .vulnerabilities
        .iter()
        .filter(|v| !current.contains(&v.id))
        .cloned()
        .collect();

    let severity_change = match fixed.len().cmp(&introduced.len()) {
        std::cmp::Ordering::Greater => SeverityChange::Better,
        std::cmp::Ordering::Less => SeverityChange::Worse,
        std::cmp::Ordering::Equal => SeverityChange::Same,
    };

    SecurityImpact {
        fixed,
        introduced,
        severity_change,
    }
}

/// Overall risk of an update
pub fn assess_risk(
    update_type: UpdateType,
    affected_count: usize,
    security: &SecurityImpact,
) -> RiskLevel {
    if security.fixed_vulnerabilities() > 0 {
        return match update_type {
            UpdateType::Major => RiskLevel::Medium,
            _ => RiskLevel::Low,
        };
    }
    if security.new_vulnerabilities() > 0 {
        return RiskLevel::High;
    }

    match update_type {
        UpdateType::Major if affected_count > MAJOR_HIGH_RISK_THRESHOLD => RiskLevel::High,
        UpdateType::Major => RiskLevel::Medium,
        UpdateType::Minor if affected_count > MINOR_MEDIUM_RISK_THRESHOLD => RiskLevel::Medium,
        UpdateType::Minor | UpdateType::Patch | UpdateType::None => RiskLevel::Low,
    }
}

/// Human-readable advice, security notes first
pub fn recommendations(
    update_type: UpdateType,
    affected: &[PackageImpact],
    security: &SecurityImpact,
) -> Vec<String> {
    let mut advice = Vec::new();

    if security.fixed_vulnerabilities() > 0 {
        advice.push(format!(
            "Security update recommended: fixes {} known vulnerabilit{}",
            security.fixed_vulnerabilities(),
            if security.fixed_vulnerabilities() == 1 { "y" } else { "ies" }
        ));
    }
    if security.new_vulnerabilities() > 0 {
        advice.push(format!(
            "Warning: the proposed version has {} new vulnerabilit{}",
            security.new_vulnerabilities(),
            if security.new_vulnerabilities() == 1 { "y" } else { "ies" }
        ));
    }

    if update_type == UpdateType::Major {
        advice.push("Review the changelog for breaking changes before updating".to_string());
        advice.push("Test in a staging environment before deploying".to_string());
    }

    let breaking = affected.iter().filter(|p| p.breaking_change).count();
    if breaking > 0 {
        advice.push(format!(
            "Manual code changes may be needed in {} package{}",
            breaking,
            if breaking == 1 { "" } else { "s" }
        ));
    }

    if advice.is_empty() {
        advice.push("This update is low-risk and can be applied safely".to_string());
    }
    advice
}

/// Analyzes the impact of updating one catalog entry
pub struct ImpactAnalyzer {
    gateway: Arc<dyn RegistryGateway>,
}

impl ImpactAnalyzer {
    pub fn new(gateway: Arc<dyn RegistryGateway>) -> Self {
        Self { gateway }
    }

    /// Analyze moving `package` in `catalog` to `proposed`
    ///
    /// Fails when the catalog or the entry does not exist, or when the
    /// current range is malformed.
    pub async fn analyze(
        &self,
        workspace: &Workspace,
        catalog: &str,
        package: &str,
        proposed: &Version,
    ) -> Result<ImpactAnalysis, AppError> {
        let current_range = workspace
            .catalog(catalog)
            .ok_or_else(|| WorkspaceError::catalog_not_found(catalog))?
            .get(package)
            .ok_or_else(|| WorkspaceError::package_not_found(catalog, package))?;

        let range = VersionRange::parse(current_range)?;
        let current = range.min_version();
        let update_type = current.difference_type(proposed);

        let affected_packages: Vec<PackageImpact> = workspace
            .packages_using(catalog, package)
            .map(|(member, reference)| PackageImpact {
                package_name: member.name.clone(),
                path: member.path.clone(),
                dependency_type: reference.dependency_type,
                compatibility_risk: RiskLevel::from_update_type(update_type),
                breaking_change: update_type == UpdateType::Major
                    && reference.dependency_type.is_runtime(),
            })
            .collect();

        let (current_report, proposed_report) = tokio::join!(
            self.gateway.security_report(package, current),
            self.gateway.security_report(package, proposed),
        );
        let security_impact = security_delta(&current_report, &proposed_report);

        let risk_level = assess_risk(update_type, affected_packages.len(), &security_impact);
        let recommendations = recommendations(update_type, &affected_packages, &security_impact);

        log::debug!(
            "{} [{}] {} -> {}: {} risk",
            package,
            catalog,
            current_range,
            proposed,
            risk_level
        );

        Ok(ImpactAnalysis {
            catalog: catalog.to_string(),
            package_name: package.to_string(),
            current_version: current_range.to_string(),
            proposed_version: proposed.clone(),
            update_type,
            affected_packages,
            risk_level,
            security_impact,
            recommendations,
        })
    }
}
