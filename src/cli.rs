//! CLI argument parsing module for catup

use crate::domain::{TargetPolicy, Version};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse a version argument
fn parse_version(s: &str) -> Result<Version, String> {
    Version::parse(s).map_err(|e| e.to_string())
}

/// pnpm catalog updater
#[derive(Parser, Debug, Clone)]
#[command(name = "catup", version, about = "Check and update pnpm workspace catalogs")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Workspace directory (searched upwards for pnpm-workspace.yaml)
    #[arg(short = 'w', long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Registry URL (default: .npmrc registry or https://registry.npmjs.org)
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retries per registry request
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Maximum concurrent registry lookups
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    // Output options
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List outdated catalog entries
    Check(DetectArgs),

    /// Update catalog entries in pnpm-workspace.yaml
    Update(UpdateArgs),

    /// Analyze the impact of moving one catalog entry to a version
    Analyze(AnalyzeArgs),
}

/// Options shared by `check` and `update`
#[derive(Args, Debug, Clone, Default)]
pub struct DetectArgs {
    /// Only process these catalogs (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub catalog: Vec<String>,

    /// Target version policy
    #[arg(long, value_enum)]
    pub target: Option<TargetPolicy>,

    /// Only process packages matching these patterns (`*` and `?` wildcards)
    #[arg(long, action = ArgAction::Append)]
    pub include: Vec<String>,

    /// Exclude packages matching these patterns (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Consider prerelease versions
    #[arg(long)]
    pub prerelease: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply updates that are part of a cross-catalog conflict
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Package name as declared in the catalog
    pub package: String,

    /// Proposed version
    #[arg(value_parser = parse_version)]
    pub version: Version,

    /// Catalog holding the package
    #[arg(long, default_value = "default")]
    pub catalog: String,
}

impl CliArgs {
    /// Detection options of the current command, if it detects
    pub fn detect_args(&self) -> Option<&DetectArgs> {
        match &self.command {
            Command::Check(args) => Some(args),
            Command::Update(args) => Some(&args.detect),
            Command::Analyze(_) => None,
        }
    }

    /// Whether the command only reports what it would do
    pub fn is_dry_run(&self) -> bool {
        matches!(&self.command, Command::Update(args) if args.dry_run)
    }
}
