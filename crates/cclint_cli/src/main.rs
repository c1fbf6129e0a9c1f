//! cclint CLI
//!
//! Validates the agent, command, settings and CLAUDE.md files of a project.

mod cli;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cclint_core::{ConfigLoader, LintOptions, Linter, ProjectInfo};

use crate::cli::{Cli, Commands, LintArgs, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(failed) => {
            if failed {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the run should fail.
fn run(cli: &Cli) -> Result<bool> {
    let loader = ConfigLoader::new()
        .allow_scripts(!cli.no_scripts)
        .verbose(cli.verbose);
    match &cli.command {
        Commands::Lint(args) => run_lint(args, &loader, cli),
        Commands::Detect { path, format } => run_detect(path, *format, &loader).map(|_| false),
    }
}

fn run_lint(args: &LintArgs, loader: &ConfigLoader, cli: &Cli) -> Result<bool> {
    let options = LintOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        fail_on: args.fail_on.into(),
        custom_schemas: !args.no_custom_schemas,
        parallel: !args.no_parallel,
        concurrency: args.concurrency.max(1),
        follow_symlinks: args.follow_symlinks,
        allow_scripts: !cli.no_scripts,
        include_files: args.include_files.clone(),
        exclude_files: args.exclude_files.clone(),
        deadline: args
            .timeout
            .map(|secs| Instant::now() + Duration::from_secs(secs)),
    };
    let fail_on = options.fail_on;

    let linter = Linter::new(&args.path, options, loader).into_diagnostic()?;
    if let Some(source) = linter.config().and_then(|c| c.source.as_deref()) {
        debug!("Using configuration from {}", source.display());
    }

    let summary = linter.run();
    match args.format {
        OutputFormat::Json => output::json::output_json(&summary)?,
        OutputFormat::Text => output::text::output_text(&summary, linter.root(), cli.quiet),
    }

    Ok(fail_on.should_fail(&summary))
}

fn run_detect(path: &Path, format: OutputFormat, loader: &ConfigLoader) -> Result<()> {
    let info = ProjectInfo::detect(path, loader).into_diagnostic()?;
    match format {
        OutputFormat::Json => output::json::output_project(&info),
        OutputFormat::Text => {
            output::text::output_project(&info);
            Ok(())
        }
    }
}
