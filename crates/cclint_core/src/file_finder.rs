//! Candidate file discovery per artifact kind.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::RulesConfig;
use crate::error::LinterError;

/// Bound on directory nesting, including levels reached through symlinks.
pub const MAX_DEPTH: usize = 64;

/// Directories never entered when expanding include patterns.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// The four kinds of project files the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Agent,
    Command,
    Settings,
    Doc,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Agent,
        ArtifactKind::Command,
        ArtifactKind::Settings,
        ArtifactKind::Doc,
    ];

    fn candidate_dirs(self) -> &'static [&'static str] {
        match self {
            Self::Agent => &[".claude/agents", "src/agents", "agents"],
            Self::Command => &[".claude/commands", "src/commands", "commands"],
            Self::Settings | Self::Doc => &[],
        }
    }

    fn candidate_files(self) -> &'static [&'static str] {
        match self {
            Self::Settings => &[".claude/settings.json", ".claude/settings.local.json"],
            Self::Doc => &["CLAUDE.md", ".claude/CLAUDE.md", "CLAUDE.local.md"],
            Self::Agent | Self::Command => &[],
        }
    }

    /// Kind a file matched by an include pattern belongs to, judged by its path.
    pub fn route(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".json") {
            return name.starts_with("settings").then_some(Self::Settings);
        }
        if !is_markdown(path) {
            return None;
        }
        if name == "CLAUDE.md" || name == "CLAUDE.local.md" {
            return Some(Self::Doc);
        }
        let in_commands = path
            .parent()
            .is_some_and(|dir| dir.components().any(|c| c.as_os_str() == "commands"));
        Some(if in_commands { Self::Command } else { Self::Agent })
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Settings => "settings",
            Self::Doc => "documentation",
        })
    }
}

/// Finds the files of each kind below a project root.
pub struct FileFinder {
    root: PathBuf,
    cwd: Option<PathBuf>,
    include_globs: Option<GlobSet>,
    exclude_globs: Option<GlobSet>,
    follow_symlinks: bool,
}

impl FileFinder {
    /// `root` should already have passed the path security gate.
    pub fn new(root: &Path, rules: &RulesConfig, follow_symlinks: bool) -> Result<Self, LinterError> {
        let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| fs::canonicalize(dir).ok());

        Ok(Self {
            root,
            cwd,
            include_globs: build_globset(&rules.include_patterns)?,
            exclude_globs: build_globset(&rules.exclude_patterns)?,
            follow_symlinks,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true when `path` matches an exclude pattern, tested relative to
    /// the project root and relative to the working directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(excludes) = &self.exclude_globs else {
            return false;
        };

        let from_root = path.strip_prefix(&self.root).ok();
        let from_cwd = self.cwd.as_ref().and_then(|cwd| path.strip_prefix(cwd).ok());

        from_root.is_some_and(|rel| excludes.is_match(rel))
            || from_cwd.is_some_and(|rel| excludes.is_match(rel))
    }

    /// Discovers the files of `kind`, deduplicated and sorted.
    pub fn discover(&self, kind: ArtifactKind) -> Vec<PathBuf> {
        let mut found = Found::default();

        for dir in kind.candidate_dirs() {
            self.collect_dir(&self.root.join(dir), 0, &mut found);
        }
        for file in kind.candidate_files() {
            self.collect_file(&self.root.join(file), &mut found);
        }
        for path in self.included(kind) {
            self.collect_file(&path, &mut found);
        }

        let mut files: Vec<PathBuf> = found
            .files
            .into_iter()
            .filter(|path| {
                let excluded = self.is_excluded(path);
                if excluded {
                    debug!("Excluded {}", path.display());
                }
                !excluded
            })
            .collect();
        files.sort();

        info!("Discovered {} {} files", files.len(), kind);
        files
    }

    /// Files below the root matched by an include pattern and routed to `kind`.
    fn included(&self, kind: ArtifactKind) -> Vec<PathBuf> {
        let Some(includes) = &self.include_globs else {
            return Vec::new();
        };

        WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(MAX_DEPTH)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !SKIPPED_DIRS.iter().any(|skip| entry.file_name() == *skip)
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_type().is_dir())
            .filter(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .is_ok_and(|rel| includes.is_match(rel) && ArtifactKind::route(rel) == Some(kind))
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    fn collect_file(&self, path: &Path, found: &mut Found) {
        let Ok(meta) = fs::symlink_metadata(path) else {
            return;
        };

        if meta.file_type().is_symlink() {
            if let Some(real) = self.resolve_link(path)
                && real.is_file()
            {
                found.push(path.to_path_buf(), real);
            }
        } else if meta.is_file() {
            let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            found.push(path.to_path_buf(), real);
        }
    }

    /// Collects markdown files below `dir`. Missing directories are skipped.
    fn collect_dir(&self, dir: &Path, depth: usize, found: &mut Found) {
        if depth >= MAX_DEPTH {
            debug!("Maximum depth reached at {}", dir.display());
            return;
        }
        let Ok(meta) = fs::symlink_metadata(dir) else {
            return;
        };

        let (walk_root, real_dir) = if meta.file_type().is_symlink() {
            match self.resolve_link(dir) {
                Some(real) if real.is_dir() => (real.clone(), real),
                _ => return,
            }
        } else if meta.is_dir() {
            let real = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
            (dir.to_path_buf(), real)
        } else {
            return;
        };

        if !found.visited_dirs.insert(real_dir) {
            debug!("Skipping already visited directory {}", dir.display());
            return;
        }

        let walker = WalkDir::new(&walk_root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(MAX_DEPTH - depth);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            if entry.path_is_symlink() {
                let Some(real) = self.resolve_link(path) else {
                    continue;
                };
                if real.is_dir() {
                    self.collect_dir(path, depth + entry.depth(), found);
                } else if real.is_file() && is_markdown(path) {
                    found.push(path.to_path_buf(), real);
                }
            } else if entry.file_type().is_file() && is_markdown(path) {
                let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                found.push(path.to_path_buf(), real);
            }
        }
    }

    /// Resolves a symlink, or returns `None` if links are not followed, the
    /// link is broken, or it points outside the project root.
    fn resolve_link(&self, link: &Path) -> Option<PathBuf> {
        if !self.follow_symlinks {
            debug!("Skipping symlink {}", link.display());
            return None;
        }
        let real = match fs::canonicalize(link) {
            Ok(real) => real,
            Err(e) => {
                debug!("Skipping broken symlink {}: {}", link.display(), e);
                return None;
            }
        };
        if !real.starts_with(&self.root) {
            debug!(
                "Skipping symlink {} pointing outside the project ({})",
                link.display(),
                real.display()
            );
            return None;
        }
        Some(real)
    }
}

#[derive(Default)]
struct Found {
    seen: HashSet<PathBuf>,
    visited_dirs: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl Found {
    fn push(&mut self, path: PathBuf, real: PathBuf) {
        if self.seen.insert(real) {
            self.files.push(path);
        }
    }
}

pub(crate) fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, LinterError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            LinterError::config(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }

    let globset = builder
        .build()
        .map_err(|e| LinterError::config(format!("Failed to build globset: {}", e)))?;

    Ok(Some(globset))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "---\nname: x\n---\n").unwrap();
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        files
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn finder(root: &Path, rules: RulesConfig, follow: bool) -> FileFinder {
        FileFinder::new(root, &rules, follow).unwrap()
    }

    #[test]
    fn test_build_globset() {
        assert!(build_globset(&[]).unwrap().is_none());
        assert!(build_globset(&["**/*.md".to_string()]).unwrap().is_some());
        assert!(build_globset(&["[invalid".to_string()]).is_err());
    }

    #[rstest]
    #[case::doc("CLAUDE.md", Some(ArtifactKind::Doc))]
    #[case::local_doc("docs/CLAUDE.local.md", Some(ArtifactKind::Doc))]
    #[case::command("tools/commands/deploy.md", Some(ArtifactKind::Command))]
    #[case::nested_command("commands/git/commit.md", Some(ArtifactKind::Command))]
    #[case::agent("team/reviewer.md", Some(ArtifactKind::Agent))]
    #[case::settings("config/settings.shared.json", Some(ArtifactKind::Settings))]
    #[case::other_json("config/other.json", None)]
    #[case::text("notes.txt", None)]
    fn test_route(#[case] path: &str, #[case] expected: Option<ArtifactKind>) {
        assert_eq!(ArtifactKind::route(Path::new(path)), expected);
    }

    #[test]
    fn test_discover_candidates() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".claude/agents/a.md");
        touch(dir.path(), ".claude/agents/nested/b.md");
        touch(dir.path(), "agents/c.md");
        touch(dir.path(), ".claude/agents/notes.txt");
        touch(dir.path(), ".claude/commands/run.md");
        fs::write(dir.path().join(".claude/settings.json"), "{}").unwrap();
        fs::write(dir.path().join("CLAUDE.md"), "# Doc").unwrap();

        let finder = finder(dir.path(), RulesConfig::default(), false);
        assert_eq!(
            names(&finder.discover(ArtifactKind::Agent), dir.path()),
            vec![".claude/agents/a.md", ".claude/agents/nested/b.md", "agents/c.md"]
        );
        assert_eq!(
            names(&finder.discover(ArtifactKind::Command), dir.path()),
            vec![".claude/commands/run.md"]
        );
        assert_eq!(
            names(&finder.discover(ArtifactKind::Settings), dir.path()),
            vec![".claude/settings.json"]
        );
        assert_eq!(
            names(&finder.discover(ArtifactKind::Doc), dir.path()),
            vec!["CLAUDE.md"]
        );
    }

    #[test]
    fn test_missing_dirs_are_skipped() {
        let dir = tempdir().unwrap();
        let finder = finder(dir.path(), RulesConfig::default(), false);
        for kind in ArtifactKind::ALL {
            assert!(finder.discover(kind).is_empty());
        }
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".claude/agents/keep.md");
        touch(dir.path(), ".claude/agents/drafts/skip.md");

        let rules = RulesConfig {
            exclude_patterns: vec!["**/drafts/**".to_string()],
            ..RulesConfig::default()
        };
        let finder = finder(dir.path(), rules, false);
        assert_eq!(
            names(&finder.discover(ArtifactKind::Agent), dir.path()),
            vec![".claude/agents/keep.md"]
        );
    }

    #[test]
    fn test_include_patterns_route_and_dedupe() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".claude/agents/a.md");
        touch(dir.path(), "extra/reviewer.md");
        touch(dir.path(), "extra/commands/ship.md");
        touch(dir.path(), "node_modules/pkg/agent.md");

        let rules = RulesConfig {
            include_patterns: vec!["extra/**/*.md".to_string(), ".claude/**/*.md".to_string(), "**/agent.md".to_string()],
            ..RulesConfig::default()
        };
        let finder = finder(dir.path(), rules, false);
        assert_eq!(
            names(&finder.discover(ArtifactKind::Agent), dir.path()),
            vec![".claude/agents/a.md", "extra/reviewer.md"]
        );
        assert_eq!(
            names(&finder.discover(ArtifactKind::Command), dir.path()),
            vec!["extra/commands/ship.md"]
        );
    }

    #[cfg(unix)]
    mod symlinks {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::os::unix::fs::symlink;
        use std::time::{Duration, Instant};

        #[test]
        fn test_symlinks_ignored_by_default() {
            let dir = tempdir().unwrap();
            touch(dir.path(), "shared/agent.md");
            fs::create_dir_all(dir.path().join(".claude/agents")).unwrap();
            symlink(
                dir.path().join("shared/agent.md"),
                dir.path().join(".claude/agents/linked.md"),
            )
            .unwrap();

            let finder = finder(dir.path(), RulesConfig::default(), false);
            assert!(finder.discover(ArtifactKind::Agent).is_empty());
        }

        #[test]
        fn test_symlink_inside_root_followed() {
            let dir = tempdir().unwrap();
            touch(dir.path(), "shared/agent.md");
            touch(dir.path(), "shared/more/other.md");
            fs::create_dir_all(dir.path().join(".claude/agents")).unwrap();
            symlink(
                dir.path().join("shared/agent.md"),
                dir.path().join(".claude/agents/linked.md"),
            )
            .unwrap();
            symlink(
                dir.path().join("shared/more"),
                dir.path().join(".claude/agents/more"),
            )
            .unwrap();

            let finder = finder(dir.path(), RulesConfig::default(), true);
            let found = names(&finder.discover(ArtifactKind::Agent), dir.path());
            assert_eq!(found.len(), 2, "{found:?}");
            assert!(found.contains(&".claude/agents/linked.md".to_string()));
        }

        #[test]
        fn test_symlink_outside_root_excluded() {
            let outside = tempdir().unwrap();
            touch(outside.path(), "secret.md");
            let dir = tempdir().unwrap();
            fs::create_dir_all(dir.path().join(".claude/agents")).unwrap();
            symlink(
                outside.path().join("secret.md"),
                dir.path().join(".claude/agents/secret.md"),
            )
            .unwrap();
            symlink(outside.path(), dir.path().join(".claude/agents/outside")).unwrap();

            let finder = finder(dir.path(), RulesConfig::default(), true);
            assert!(finder.discover(ArtifactKind::Agent).is_empty());
        }

        #[test]
        fn test_broken_symlink_skipped() {
            let dir = tempdir().unwrap();
            fs::create_dir_all(dir.path().join(".claude/agents")).unwrap();
            symlink(
                dir.path().join("missing.md"),
                dir.path().join(".claude/agents/broken.md"),
            )
            .unwrap();

            let finder = finder(dir.path(), RulesConfig::default(), true);
            assert!(finder.discover(ArtifactKind::Agent).is_empty());
        }

        #[test]
        fn test_circular_symlinks_terminate() {
            let dir = tempdir().unwrap();
            let a = dir.path().join(".claude/agents/a");
            let b = dir.path().join(".claude/agents/b");
            fs::create_dir_all(&a).unwrap();
            fs::create_dir_all(&b).unwrap();
            touch(dir.path(), ".claude/agents/a/one.md");
            symlink(&b, a.join("to_b")).unwrap();
            symlink(&a, b.join("to_a")).unwrap();

            let start = Instant::now();
            let finder = finder(dir.path(), RulesConfig::default(), true);
            let found = finder.discover(ArtifactKind::Agent);
            assert!(start.elapsed() < Duration::from_secs(5));
            assert_eq!(found.len(), 1);
        }
    }
}
