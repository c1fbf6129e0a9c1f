//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cclint_core::FailOn;

/// cclint - Linter for Claude agents, commands, settings and CLAUDE.md
#[derive(Parser)]
#[command(name = "cclint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never evaluate script configuration files
    #[arg(long, global = true)]
    pub no_scripts: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint a project
    Lint(LintArgs),

    /// Show what cclint detects about a project
    Detect {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Args)]
pub struct LintArgs {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Lowest finding severity that makes the command fail
    #[arg(long, value_enum, default_value_t = FailOnArg::Error)]
    pub fail_on: FailOnArg,

    /// Ignore schema extensions and validation hooks from the project configuration
    #[arg(long)]
    pub no_custom_schemas: bool,

    /// Lint files one at a time
    #[arg(long)]
    pub no_parallel: bool,

    /// Number of worker threads
    #[arg(long, default_value_t = cclint_core::pool::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Follow symbolic links that stay inside the project
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Only report files matching this substring or glob (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    pub include_files: Vec<String>,

    /// Skip files matching this substring or glob (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude_files: Vec<String>,

    /// Stop starting new files after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOnArg {
    Error,
    Warning,
    Suggestion,
}

impl From<FailOnArg> for FailOn {
    fn from(arg: FailOnArg) -> Self {
        match arg {
            FailOnArg::Error => FailOn::Error,
            FailOnArg::Warning => FailOn::Warning,
            FailOnArg::Suggestion => FailOn::Suggestion,
        }
    }
}
