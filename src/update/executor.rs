//! Update execution
//!
//! Applies a plan to the in-memory workspace, then persists it once. Each
//! planned update ends up applied, skipped or errored; only a failed save is
//! fatal.

use crate::domain::{
    PlannedUpdate, SkippedDependency, UpdateError, UpdatePlan, UpdateResult, UpdatedDependency,
    VersionRange, Workspace,
};
use crate::workspace::WorkspaceRepository;

/// Options controlling execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Classify and report without mutating or saving
    pub dry_run: bool,
    /// Apply updates even when they take part in a conflict
    pub force: bool,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Applies update plans through a workspace repository
pub struct UpdateExecutor<'a> {
    repository: &'a dyn WorkspaceRepository,
    options: ExecuteOptions,
}

impl<'a> UpdateExecutor<'a> {
    pub fn new(repository: &'a dyn WorkspaceRepository, options: ExecuteOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    /// Execute a plan against a workspace
    pub fn execute(&self, workspace: &mut Workspace, plan: &UpdatePlan) -> UpdateResult {
        let mut result = UpdateResult::new(self.options.dry_run);

        for update in &plan.updates {
            if !self.options.force {
                if let Some(conflict) = plan.conflict_for(&update.package_name) {
                    let catalogs: Vec<&str> =
                        conflict.catalogs.iter().map(|c| c.catalog.as_str()).collect();
                    let reason = format!(
                        "unresolved version conflict across catalogs {}; use --force to apply",
                        catalogs.join(", ")
                    );
                    log::info!("skipping {}: {}", update, reason);
                    result.skipped_dependencies.push(SkippedDependency {
                        catalog: update.catalog.clone(),
                        package_name: update.package_name.clone(),
                        reason,
                    });
                    continue;
                }
            }

            match self.apply(workspace, update) {
                Ok(updated) => result.updated_dependencies.push(updated),
                Err(message) => {
                    log::warn!("failed to update {}: {}", update, message);
                    result.errors.push(UpdateError::for_dependency(
                        &update.catalog,
                        &update.package_name,
                        message,
                    ));
                }
            }
        }

        if !self.options.dry_run && !result.updated_dependencies.is_empty() {
            if let Err(e) = self.repository.save(workspace) {
                log::warn!("failed to save workspace: {}", e);
                result
                    .errors
                    .push(UpdateError::fatal(format!("failed to save workspace: {}", e)));
            }
        }

        result
    }

    /// Apply one catalog mutation, or in dry-run mode check that it would apply
    fn apply(
        &self,
        workspace: &mut Workspace,
        update: &PlannedUpdate,
    ) -> Result<UpdatedDependency, String> {
        let catalog = workspace
            .catalog_mut(&update.catalog)
            .ok_or_else(|| format!("catalog '{}' no longer exists", update.catalog))?;

        match catalog.get(&update.package_name) {
            None => {
                return Err(format!(
                    "'{}' is no longer declared in catalog '{}'",
                    update.package_name, update.catalog
                ))
            }
            Some(current) if current != update.current_version => {
                return Err(format!(
                    "entry changed since planning (now '{}')",
                    current
                ))
            }
            Some(_) => {}
        }

        let new_range = VersionRange::parse(&update.current_version)
            .map(|range| range.with_version(&update.new_version))
            .unwrap_or_else(|_| update.new_version.to_string());

        if !self.options.dry_run {
            catalog.set_range(&update.package_name, new_range.clone());
        }

        Ok(UpdatedDependency {
            catalog: update.catalog.clone(),
            package_name: update.package_name.clone(),
            from: update.current_version.clone(),
            to: new_range,
        })
    }
}
