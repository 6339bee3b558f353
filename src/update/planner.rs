//! Update planning and cross-catalog conflict detection

use crate::domain::{
    ConflictEntry, OutdatedDependencyInfo, OutdatedReport, PlannedUpdate, UpdatePlan, UpdateType,
    VersionConflict,
};
use std::collections::BTreeMap;

/// Explanation attached to a planned update
///
/// Precedence is security, then major, minor, patch.
pub fn update_reason(info: &OutdatedDependencyInfo) -> String {
    if info.is_security_update {
        return format!(
            "Security update: {} has known vulnerabilities",
            info.current_version
        );
    }
    match info.update_type {
        UpdateType::Major => format!(
            "Major update to {}: may contain breaking changes",
            info.target_version
        ),
        UpdateType::Minor => format!("Minor update to {}: new features", info.target_version),
        UpdateType::Patch => format!("Patch update to {}: bug fixes", info.target_version),
        UpdateType::None => format!("Update to {}", info.target_version),
    }
}

/// Builds update plans from detection findings
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdatePlanner;

impl UpdatePlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plan updates for every finding in an outdated report
    pub fn plan_report(&self, report: &OutdatedReport) -> UpdatePlan {
        let findings = report
            .catalogs
            .iter()
            .flat_map(|c| c.outdated.iter().map(move |info| (c.catalog.as_str(), info)));
        self.plan(findings)
    }

    /// Plan updates from (catalog, finding) pairs, in any order
    pub fn plan<'a, I>(&self, findings: I) -> UpdatePlan
    where
        I: IntoIterator<Item = (&'a str, &'a OutdatedDependencyInfo)>,
    {
        let mut updates: Vec<PlannedUpdate> = findings
            .into_iter()
            .map(|(catalog, info)| PlannedUpdate {
                catalog: catalog.to_string(),
                package_name: info.package_name.clone(),
                current_version: info.current_version.clone(),
                new_version: info.target_version.clone(),
                update_type: info.update_type,
                is_security_update: info.is_security_update,
                reason: update_reason(info),
            })
            .collect();

        updates.sort_by(|a, b| {
            a.package_name
                .cmp(&b.package_name)
                .then_with(|| a.catalog.cmp(&b.catalog))
        });

        let mut by_package: BTreeMap<&str, Vec<&PlannedUpdate>> = BTreeMap::new();
        for update in &updates {
            by_package
                .entry(update.package_name.as_str())
                .or_default()
                .push(update);
        }

        let conflicts = by_package
            .into_iter()
            .filter_map(|(package, group)| detect_conflict(package, &group))
            .collect();

        UpdatePlan { updates, conflicts }
    }
}

/// A conflict exists when one package gets string-distinct targets in two or more catalogs
fn detect_conflict(package: &str, group: &[&PlannedUpdate]) -> Option<VersionConflict> {
    if group.len() < 2 {
        return None;
    }

    let first = group[0].new_version.to_string();
    if group.iter().all(|u| u.new_version.to_string() == first) {
        return None;
    }

    log::debug!(
        "{} has diverging targets across {} catalogs",
        package,
        group.len()
    );

    let catalogs = group
        .iter()
        .map(|u| ConflictEntry {
            catalog: u.catalog.clone(),
            current_version: u.current_version.clone(),
            proposed_version: u.new_version.clone(),
        })
        .collect();

    Some(VersionConflict {
        package_name: package.to_string(),
        catalogs,
        recommendation: format!(
            "Unify {} to a single version across all catalogs before updating",
            package
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;

    fn finding(package: &str, current: &str, target: &str, update_type: UpdateType) -> OutdatedDependencyInfo {
        OutdatedDependencyInfo {
            package_name: package.to_string(),
            current_version: current.to_string(),
            target_version: Version::parse(target).unwrap(),
            update_type,
            is_security_update: false,
            affected_packages: Vec::new(),
        }
    }

    #[test]
    fn test_same_target_is_not_a_conflict() {
        let a = finding("x", "1.0.0", "2.0.0", UpdateType::Major);
        let b = finding("x", "1.0.0", "2.0.0", UpdateType::Major);

        let plan = UpdatePlanner::new().plan([("a", &a), ("b", &b)]);
        assert_eq!(plan.updates.len(), 2);
        assert!(!plan.has_conflicts());
    }

    #[test]
    fn test_diverging_targets_produce_one_conflict() {
        let a = finding("x", "1.0.0", "1.1.0", UpdateType::Minor);
        let b = finding("x", "1.0.0", "2.0.0", UpdateType::Major);

        let plan = UpdatePlanner::new().plan([("a", &a), ("b", &b)]);
        assert_eq!(plan.conflicts.len(), 1);

        let conflict = &plan.conflicts[0];
        assert_eq!(conflict.package_name, "x");
        assert!(conflict.involves("a"));
        assert!(conflict.involves("b"));
        assert_eq!(conflict.catalogs[0].proposed_version.to_string(), "1.1.0");
        assert_eq!(conflict.catalogs[1].proposed_version.to_string(), "2.0.0");
        assert!(conflict.recommendation.contains("Unify"));
    }

    #[test]
    fn test_build_metadata_makes_targets_distinct() {
        let a = finding("x", "1.0.0", "2.0.0+build.1", UpdateType::Major);
        let b = finding("x", "1.0.0", "2.0.0", UpdateType::Major);

        let plan = UpdatePlanner::new().plan([("a", &a), ("b", &b)]);
        assert_eq!(plan.conflicts.len(), 1);
    }

    #[test]
    fn test_plan_is_independent_of_input_order() {
        let a = finding("x", "1.0.0", "1.1.0", UpdateType::Minor);
        let b = finding("x", "1.0.0", "2.0.0", UpdateType::Major);
        let c = finding("y", "^3.0.0", "3.0.1", UpdateType::Patch);

        let planner = UpdatePlanner::new();
        let forward = planner.plan([("a", &a), ("b", &b), ("default", &c)]);
        let backward = planner.plan([("default", &c), ("b", &b), ("a", &a)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_reason_precedence() {
        let mut info = finding("x", "^1.0.0", "2.0.0", UpdateType::Major);
        assert!(update_reason(&info).starts_with("Major update"));

        info.is_security_update = true;
        assert!(update_reason(&info).starts_with("Security update"));

        let minor = finding("x", "^1.0.0", "1.1.0", UpdateType::Minor);
        assert!(update_reason(&minor).starts_with("Minor update"));

        let patch = finding("x", "^1.0.0", "1.0.1", UpdateType::Patch);
        assert!(update_reason(&patch).starts_with("Patch update"));
    }

    #[test]
    fn test_single_catalog_never_conflicts() {
        let a = finding("x", "1.0.0", "1.1.0", UpdateType::Minor);
        let plan = UpdatePlanner::new().plan([("default", &a)]);
        assert!(plan.conflict_for("x").is_none());
    }
}
