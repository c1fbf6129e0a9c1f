//! Project detection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::CclintConfig;
use crate::config_loader::ConfigLoader;
use crate::error::LinterError;
use crate::security;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Bun,
    Pnpm,
    Yarn,
    Npm,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bun => "bun",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
        };
        f.write_str(name)
    }
}

const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

/// Facts about a project gathered once per run.
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub root: PathBuf,
    pub has_git: bool,
    pub has_claude_dir: bool,
    pub has_package_json: bool,
    pub package_manager: Option<PackageManager>,
    pub cclint_config: Option<Arc<CclintConfig>>,
}

impl ProjectInfo {
    /// Probes `root` and loads its configuration through `loader`.
    pub fn detect(root: &Path, loader: &ConfigLoader) -> Result<Self, LinterError> {
        let mut info = Self::probe(root)?;
        info.cclint_config = loader.load(&info.root)?;
        Ok(info)
    }

    /// Probes `root` without loading any configuration.
    pub fn probe(root: &Path) -> Result<Self, LinterError> {
        let root = security::resolve_project_root(root)?;

        let package_manager = LOCKFILES
            .iter()
            .find(|(file, _)| root.join(file).is_file())
            .map(|(_, pm)| *pm);

        let info = Self {
            has_git: root.join(".git").exists(),
            has_claude_dir: root.join(".claude").is_dir(),
            has_package_json: root.join("package.json").is_file(),
            package_manager,
            cclint_config: None,
            root,
        };
        debug!(
            "Detected project at {} (git: {}, .claude: {}, package manager: {:?})",
            info.root.display(),
            info.has_git,
            info.has_claude_dir,
            info.package_manager
        );
        Ok(info)
    }

    pub fn config(&self) -> Option<&CclintConfig> {
        self.cclint_config.as_deref()
    }
}

/// Walks up from `start` to the first directory that looks like a project root.
///
/// Falls back to `start` itself when no ancestor carries `.claude/`, `.git`
/// or `package.json`.
pub fn find_project_root(start: &Path) -> PathBuf {
    let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| {
            dir.join(".claude").is_dir()
                || dir.join(".git").exists()
                || dir.join("package.json").is_file()
        })
        .map(Path::to_path_buf)
        .unwrap_or(start)
}
