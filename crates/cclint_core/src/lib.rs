//! # cclint_core
//!
//! Validation engine for Claude project files: agent definitions, slash
//! commands, `settings.json` and `CLAUDE.md`.
//!
//! This crate provides:
//! - Project configuration loading (JSON, JSONC, YAML, `package.json` and
//!   sandboxed script configuration)
//! - Schema composition and validation
//! - Secure file discovery
//! - Parallel linting with deterministic result ordering
//!
//! ## Example
//!
//! ```rust,ignore
//! use cclint_core::{LintOptions, run_lint};
//!
//! let summary = run_lint(Path::new("."), LintOptions::default(), None)?;
//! for result in &summary.results {
//!     println!("{}: {} errors", result.file.display(), result.errors.len());
//! }
//! ```

pub mod config;
pub mod config_loader;
mod error;
pub mod file_finder;
pub mod frontmatter;
mod linter;
pub mod linters;
pub mod pool;
pub mod project;
mod result;
pub mod schema;
pub mod script;
pub mod security;
mod summary;

pub use config::{
    CclintConfig, ClaudeMdRules, CustomValidator, KindConfig, RulesConfig, UnknownFieldSeverity,
};
pub use config_loader::{ConfigLoader, load_project_config};
pub use error::{ConfigError, LinterError, PathSecurityError, ScriptError};
pub use file_finder::{ArtifactKind, FileFinder};
pub use linter::{FailOn, LintOptions, Linter, detect_project, run_lint};
pub use project::{PackageManager, ProjectInfo, find_project_root};
pub use result::LintResult;
pub use schema::{FieldSpec, Schema, SchemaKind, get_schema};
pub use summary::LintSummary;
