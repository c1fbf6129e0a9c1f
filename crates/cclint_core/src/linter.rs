//! Lint orchestration: discovery, scheduling and aggregation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use globset::GlobSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CclintConfig, RulesConfig};
use crate::config_loader::{ConfigLoader, default_loader, shared_loader};
use crate::error::LinterError;
use crate::file_finder::{ArtifactKind, FileFinder, build_globset};
use crate::linters::{self, LintContext};
use crate::pool::{self, DEFAULT_CONCURRENCY, PoolOptions};
use crate::project::ProjectInfo;
use crate::result::LintResult;
use crate::security;
use crate::summary::LintSummary;

/// Which findings make a run fail. Consumed by callers choosing an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    Error,
    Warning,
    Suggestion,
}

impl FailOn {
    pub fn should_fail(self, summary: &LintSummary) -> bool {
        let errors = summary.total_errors > 0;
        let warnings = summary.total_warnings > 0;
        match self {
            Self::Error => errors,
            Self::Warning => errors || warnings,
            Self::Suggestion => errors || warnings || summary.total_suggestions > 0,
        }
    }
}

/// Options for a lint run.
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Suppresses documentation suggestions.
    pub quiet: bool,
    /// Logs recovered failures at `warn` instead of `debug`.
    pub verbose: bool,
    pub fail_on: FailOn,
    /// Honour schema extensions, overrides and validation hooks from the
    /// project configuration.
    pub custom_schemas: bool,
    pub parallel: bool,
    pub concurrency: usize,
    pub follow_symlinks: bool,
    /// Consider script configuration files when loading the project
    /// configuration through [`run_lint`].
    pub allow_scripts: bool,
    /// Keep only results whose path matches one of these (substring or glob).
    pub include_files: Vec<String>,
    /// Drop results whose path matches one of these (substring or glob).
    pub exclude_files: Vec<String>,
    /// Files not started by this instant are reported instead of linted.
    pub deadline: Option<Instant>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: false,
            fail_on: FailOn::Error,
            custom_schemas: true,
            parallel: true,
            concurrency: DEFAULT_CONCURRENCY,
            follow_symlinks: false,
            allow_scripts: true,
            include_files: Vec::new(),
            exclude_files: Vec::new(),
            deadline: None,
        }
    }
}

/// Post-hoc filter over result paths.
struct FileFilter {
    patterns: Vec<String>,
    globs: Option<GlobSet>,
}

impl FileFilter {
    fn new(patterns: &[String]) -> Result<Self, LinterError> {
        Ok(Self {
            patterns: patterns.to_vec(),
            globs: build_globset(patterns)?,
        })
    }

    fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn matches(&self, path: &Path, root: &Path) -> bool {
        let text = path.to_string_lossy();
        if self.patterns.iter().any(|p| text.contains(p.as_str())) {
            return true;
        }
        let Some(globs) = &self.globs else {
            return false;
        };
        globs.is_match(path) || path.strip_prefix(root).is_ok_and(|rel| globs.is_match(rel))
    }
}

/// Lints the artifacts of one project.
pub struct Linter {
    project: ProjectInfo,
    options: LintOptions,
    finder: FileFinder,
    include: FileFilter,
    exclude: FileFilter,
}

impl Linter {
    /// Creates a linter for `project_root`, loading its configuration through
    /// `loader`.
    pub fn new(
        project_root: &Path,
        options: LintOptions,
        loader: &ConfigLoader,
    ) -> Result<Self, LinterError> {
        Self::with_project(ProjectInfo::detect(project_root, loader)?, options)
    }

    /// Creates a linter with an explicit configuration; nothing is loaded
    /// from disk.
    pub fn with_config(
        project_root: &Path,
        options: LintOptions,
        config: Option<Arc<CclintConfig>>,
    ) -> Result<Self, LinterError> {
        let mut project = ProjectInfo::probe(project_root)?;
        project.cclint_config = config;
        Self::with_project(project, options)
    }

    /// Creates a linter from project facts the caller already holds. The
    /// project's configuration is used as is and is handed to every linter.
    pub fn with_project(
        mut project: ProjectInfo,
        options: LintOptions,
    ) -> Result<Self, LinterError> {
        project.root = security::resolve_project_root(&project.root)?;

        let default_rules = RulesConfig::default();
        let rules = project.config().map_or(&default_rules, |c| &c.rules);
        let finder = FileFinder::new(&project.root, rules, options.follow_symlinks)?;
        let include = FileFilter::new(&options.include_files)?;
        let exclude = FileFilter::new(&options.exclude_files)?;

        Ok(Self {
            project,
            options,
            finder,
            include,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.project.root
    }

    pub fn config(&self) -> Option<&CclintConfig> {
        self.project.config()
    }

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    /// Runs every linter and aggregates the filtered results.
    pub fn run(&self) -> LintSummary {
        let start = Instant::now();

        let mut results: Vec<LintResult> = ArtifactKind::ALL
            .iter()
            .flat_map(|kind| self.lint_kind(*kind))
            .collect();
        results.sort_by(|a, b| a.file.cmp(&b.file));
        let results = self.filter_results(results);

        let summary = LintSummary::from_results(results, start);
        info!(
            "Linted {} files in {} ms ({} errors, {} warnings)",
            summary.total_files, summary.duration, summary.total_errors, summary.total_warnings
        );
        summary
    }

    pub fn lint_agents(&self) -> Vec<LintResult> {
        self.lint_kind(ArtifactKind::Agent)
    }

    pub fn lint_commands(&self) -> Vec<LintResult> {
        self.lint_kind(ArtifactKind::Command)
    }

    pub fn lint_settings(&self) -> Vec<LintResult> {
        self.lint_kind(ArtifactKind::Settings)
    }

    pub fn lint_docs(&self) -> Vec<LintResult> {
        self.lint_kind(ArtifactKind::Doc)
    }

    /// Discovers and lints every file of `kind`. Results are sorted by path.
    pub fn lint_kind(&self, kind: ArtifactKind) -> Vec<LintResult> {
        let files = self.finder.discover(kind);
        if files.is_empty() {
            return Vec::new();
        }

        debug!("Linting {} {} files", files.len(), kind);
        let ctx = LintContext::new(self.root(), self.config(), &self.options)
            .with_project(Some(&self.project));
        let pool_options = PoolOptions {
            parallel: self.options.parallel,
            concurrency: self.options.concurrency,
            deadline: self.options.deadline,
        };
        pool::run_all(&files, |path| linters::lint_file(kind, path, &ctx), pool_options)
    }

    fn filter_results(&self, results: Vec<LintResult>) -> Vec<LintResult> {
        if self.include.is_empty() && self.exclude.is_empty() {
            return results;
        }
        results
            .into_iter()
            .filter(|r| self.include.is_empty() || self.include.matches(&r.file, self.root()))
            .filter(|r| !self.exclude.matches(&r.file, self.root()))
            .collect()
    }
}

/// Lints `project_root`, loading its configuration through the process-wide
/// loader matching `options.allow_scripts` and `options.verbose`.
///
/// An explicit `config` replaces whatever the project declares.
pub fn run_lint(
    project_root: &Path,
    options: LintOptions,
    config: Option<Arc<CclintConfig>>,
) -> Result<LintSummary, LinterError> {
    let linter = match config {
        Some(config) => Linter::with_config(project_root, options, Some(config))?,
        None => {
            let loader = shared_loader(options.allow_scripts, options.verbose);
            Linter::new(project_root, options, loader)?
        }
    };
    Ok(linter.run())
}

/// Detects project facts for `project_root` (default: the current directory).
pub fn detect_project(project_root: Option<&Path>) -> Result<ProjectInfo, LinterError> {
    let root = match project_root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir()?,
    };
    ProjectInfo::detect(&root, default_loader())
}
