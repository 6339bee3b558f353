//! Command orchestration for catup
//!
//! This module provides:
//! - Workspace discovery and settings resolution
//! - Workflow coordination: detect → plan → (execute)
//! - Standalone impact analysis
//! - Progress display while registry lookups run

use crate::cli::{AnalyzeArgs, CliArgs, Command, UpdateArgs};
use crate::config::Settings;
use crate::domain::{ImpactAnalysis, OutdatedReport, UpdatePlan, UpdateResult, Workspace};
use crate::error::{AppError, WorkspaceError};
use crate::progress::Progress;
use crate::registry::{HttpClient, NpmRegistry, RegistryCache, RegistryGateway};
use crate::update::{ExecuteOptions, ImpactAnalyzer, OutdatedDetector, UpdateExecutor, UpdatePlanner};
use crate::workspace::{PnpmWorkspaceRepository, WorkspaceRepository};
use std::sync::Arc;
use std::time::Duration;

/// Exit code when nothing needs doing or a dry run succeeded
pub const EXIT_OK: u8 = 0;
/// Exit code when updates are available or were applied with errors
pub const EXIT_UPDATES: u8 = 1;
/// Exit code for unrecoverable errors
pub const EXIT_FATAL: u8 = 2;

/// Result of one command
#[derive(Debug)]
pub enum CommandOutcome {
    Check {
        report: OutdatedReport,
        plan: UpdatePlan,
    },
    Update {
        report: OutdatedReport,
        plan: UpdatePlan,
        result: UpdateResult,
    },
    Analyze(ImpactAnalysis),
}

impl CommandOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandOutcome::Check { report, .. } => {
                if report.has_updates() {
                    EXIT_UPDATES
                } else {
                    EXIT_OK
                }
            }
            CommandOutcome::Update { result, .. } => {
                if !result.success() {
                    EXIT_FATAL
                } else if result.has_errors() {
                    EXIT_UPDATES
                } else {
                    EXIT_OK
                }
            }
            CommandOutcome::Analyze(_) => EXIT_OK,
        }
    }
}

/// Orchestrator for one CLI invocation
pub struct Orchestrator<R: WorkspaceRepository = PnpmWorkspaceRepository> {
    args: CliArgs,
    settings: Settings,
    repository: R,
    workspace: Workspace,
    gateway: Arc<dyn RegistryGateway>,
    /// Upper bound for one package lookup, retries included
    lookup_budget: Duration,
}

impl Orchestrator<PnpmWorkspaceRepository> {
    /// Discover the workspace and build the npm gateway from settings
    pub fn new(args: CliArgs) -> Result<Self, AppError> {
        let repository = PnpmWorkspaceRepository::new();
        let workspace = repository
            .discover(&args.workspace)?
            .ok_or_else(|| WorkspaceError::not_found(&args.workspace))?;
        log::info!("using workspace {}", workspace.root().display());

        let settings = Settings::load(&args, workspace.root())?;
        let client = HttpClient::with_timeout(settings.timeout)?.with_max_retries(settings.retries);
        let lookup_budget = client.call_budget();
        // one cache per command, shared by every lookup
        let cache = Arc::new(RegistryCache::new());
        let gateway = Arc::new(NpmRegistry::with_registry_url(
            client,
            cache,
            settings.registry_url.clone(),
        ));
        log::debug!(
            "registry {} (timeout {:?}, {} retries)",
            settings.registry_url,
            settings.timeout,
            settings.retries
        );

        Ok(Self {
            args,
            settings,
            repository,
            workspace,
            gateway,
            lookup_budget,
        })
    }
}

impl<R: WorkspaceRepository> Orchestrator<R> {
    /// Create an orchestrator from prepared parts (for testing)
    pub fn with_parts(
        args: CliArgs,
        settings: Settings,
        repository: R,
        workspace: Workspace,
        gateway: Arc<dyn RegistryGateway>,
    ) -> Self {
        let lookup_budget = settings
            .timeout
            .saturating_mul(settings.retries.saturating_add(1));
        Self {
            args,
            settings,
            repository,
            workspace,
            gateway,
            lookup_budget,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the selected command
    pub async fn run(&mut self, show_progress: bool) -> Result<CommandOutcome, AppError> {
        let mut progress = Progress::new(show_progress);
        match self.args.command.clone() {
            Command::Check(_) => {
                let (report, plan) = self.detect(&mut progress).await?;
                Ok(CommandOutcome::Check { report, plan })
            }
            Command::Update(update) => self.update(&update, &mut progress).await,
            Command::Analyze(analyze) => self.analyze(&analyze, &mut progress).await,
        }
    }

    /// Detect outdated catalog entries and plan their updates
    async fn detect(
        &self,
        progress: &mut Progress,
    ) -> Result<(OutdatedReport, UpdatePlan), AppError> {
        let options = self.settings.detect_options(self.lookup_budget)?;
        let detector = OutdatedDetector::new(Arc::clone(&self.gateway), options);

        let total = detector.count_lookups(&self.workspace);
        progress.start(total as u64, "Checking catalogs");
        let report = detector
            .detect_with_progress(&self.workspace, |package| progress.inc(package))
            .await;
        progress.finish_and_clear();
        let report = report?;

        log::info!(
            "{} outdated, {} skipped",
            report.total_outdated(),
            report.total_skipped()
        );

        let plan = UpdatePlanner::new().plan_report(&report);
        Ok((report, plan))
    }

    async fn update(
        &mut self,
        args: &UpdateArgs,
        progress: &mut Progress,
    ) -> Result<CommandOutcome, AppError> {
        let (report, plan) = self.detect(progress).await?;

        let options = ExecuteOptions::new()
            .with_dry_run(args.dry_run)
            .with_force(args.force);
        let executor = UpdateExecutor::new(&self.repository, options);
        let result = executor.execute(&mut self.workspace, &plan);
        log::info!(
            "{} catalog entries {}",
            result.total_updated(),
            if result.dry_run { "would change" } else { "updated" }
        );

        Ok(CommandOutcome::Update {
            report,
            plan,
            result,
        })
    }

    async fn analyze(
        &self,
        args: &AnalyzeArgs,
        progress: &mut Progress,
    ) -> Result<CommandOutcome, AppError> {
        progress.spinner(&format!("Analyzing {}...", args.package));
        let analyzer = ImpactAnalyzer::new(Arc::clone(&self.gateway));
        let analysis = analyzer
            .analyze(&self.workspace, &args.catalog, &args.package, &args.version)
            .await;
        progress.finish_and_clear();
        Ok(CommandOutcome::Analyze(analysis?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, Version};
    use crate::registry::{PackageVersions, StaticRegistry};
    use clap::Parser;
    use std::cell::Cell;
    use std::path::Path;

    #[derive(Default)]
    struct CountingRepository {
        saves: Cell<usize>,
    }

    impl WorkspaceRepository for CountingRepository {
        fn find_by_path(&self, _path: &Path) -> Result<Option<Workspace>, WorkspaceError> {
            Ok(None)
        }

        fn discover(&self, _path: &Path) -> Result<Option<Workspace>, WorkspaceError> {
            Ok(None)
        }

        fn save(&self, _workspace: &Workspace) -> Result<(), WorkspaceError> {
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    fn workspace() -> Workspace {
        Workspace::new("/ws", "ws")
            .with_catalog(Catalog::new("default").with_entry("react", "^17.0.0"))
    }

    fn gateway() -> Arc<dyn RegistryGateway> {
        let versions = PackageVersions::new(
            "react",
            vec![Version::new(17, 0, 2), Version::new(18, 2, 0)],
        )
        .with_tag("latest", Version::new(18, 2, 0));
        Arc::new(StaticRegistry::new().with_versions(versions))
    }

    fn orchestrator(argv: &[&str]) -> Orchestrator<CountingRepository> {
        let args = CliArgs::parse_from(argv);
        let settings = Settings::resolve(&args, Default::default(), None);
        Orchestrator::with_parts(
            args,
            settings,
            CountingRepository::default(),
            workspace(),
            gateway(),
        )
    }

    #[tokio::test]
    async fn test_check_reports_updates() {
        let mut orchestrator = orchestrator(&["catup", "check"]);
        let outcome = orchestrator.run(false).await.unwrap();
        match &outcome {
            CommandOutcome::Check { report, plan } => {
                assert_eq!(report.total_outdated(), 1);
                assert_eq!(plan.updates.len(), 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.exit_code(), EXIT_UPDATES);
    }

    #[tokio::test]
    async fn test_update_applies_and_saves_once() {
        let mut orchestrator = orchestrator(&["catup", "update"]);
        let outcome = orchestrator.run(false).await.unwrap();
        assert_eq!(outcome.exit_code(), EXIT_OK);
        assert_eq!(
            orchestrator.workspace().catalog("default").unwrap().get("react"),
            Some("^18.2.0")
        );
        assert_eq!(orchestrator.repository.saves.get(), 1);
    }

    #[tokio::test]
    async fn test_update_dry_run_leaves_workspace() {
        let mut orchestrator = orchestrator(&["catup", "update", "--dry-run"]);
        let outcome = orchestrator.run(false).await.unwrap();
        match &outcome {
            CommandOutcome::Update { result, .. } => {
                assert!(result.dry_run);
                assert_eq!(result.total_updated(), 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.exit_code(), EXIT_OK);
        assert_eq!(
            orchestrator.workspace().catalog("default").unwrap().get("react"),
            Some("^17.0.0")
        );
        assert_eq!(orchestrator.repository.saves.get(), 0);
    }

    #[tokio::test]
    async fn test_check_unknown_catalog_is_error() {
        let mut orchestrator = orchestrator(&["catup", "check", "--catalog", "missing"]);
        let err = orchestrator.run(false).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Workspace(WorkspaceError::CatalogNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze() {
        let mut orchestrator = orchestrator(&["catup", "analyze", "react", "18.2.0"]);
        let outcome = orchestrator.run(false).await.unwrap();
        match &outcome {
            CommandOutcome::Analyze(analysis) => {
                assert_eq!(analysis.package_name, "react");
                assert_eq!(analysis.current_version, "^17.0.0");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.exit_code(), EXIT_OK);
    }

    #[tokio::test]
    async fn test_check_with_extreme_retry_settings() {
        let mut orchestrator = orchestrator(&[
            "catup",
            "check",
            "--retries",
            "4294967295",
            "--timeout",
            "18446744073709551615",
        ]);
        assert_eq!(orchestrator.lookup_budget, Duration::MAX);
        let outcome = orchestrator.run(false).await.unwrap();
        assert_eq!(outcome.exit_code(), EXIT_UPDATES);
    }

    #[test]
    fn test_exit_code_nothing_to_do() {
        let outcome = CommandOutcome::Check {
            report: OutdatedReport::new("ws"),
            plan: UpdatePlan::default(),
        };
        assert_eq!(outcome.exit_code(), EXIT_OK);

        let mut result = UpdateResult::new(false);
        result
            .errors
            .push(crate::domain::UpdateError::fatal("failed to save workspace"));
        let outcome = CommandOutcome::Update {
            report: OutdatedReport::new("ws"),
            plan: UpdatePlan::default(),
            result,
        };
        assert_eq!(outcome.exit_code(), EXIT_FATAL);
    }
}
