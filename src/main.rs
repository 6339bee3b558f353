//! catup - pnpm catalog updater CLI tool
//!
//! Checks the `catalog:` and `catalogs:` tables of a pnpm workspace against
//! the npm registry, and rewrites them in place.

use catup::cli::CliArgs;
use catup::orchestrator::{CommandOutcome, Orchestrator, EXIT_FATAL};
use catup::output::{create_formatter, OutputConfig};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// `--verbose` raises the default filter to debug; RUST_LOG always wins
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("catup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Workspace: {}", args.workspace.display());
        if args.is_dry_run() {
            eprintln!("Mode: dry-run");
        }
    }

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.is_dry_run());

    let mut orchestrator = Orchestrator::new(args)?;
    let outcome = orchestrator.run(output_config.show_progress()).await?;

    let formatter = create_formatter(&output_config);
    let mut stdout = io::stdout().lock();
    match &outcome {
        CommandOutcome::Check { report, plan } => {
            formatter.format_check(report, plan, &mut stdout)?
        }
        CommandOutcome::Update {
            report,
            plan,
            result,
        } => formatter.format_update(report, plan, result, &mut stdout)?,
        CommandOutcome::Analyze(analysis) => formatter.format_analysis(analysis, &mut stdout)?,
    }
    stdout.flush()?;

    Ok(ExitCode::from(outcome.exit_code()))
}
