//! End-to-end tests over fixture projects built in temporary directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cclint_core::script::ScriptLimits;
use cclint_core::{
    CclintConfig, ConfigLoader, LintOptions, LintResult, LintSummary, Linter, run_lint,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn lint(root: &Path, options: LintOptions) -> LintSummary {
    Linter::new(root, options, &ConfigLoader::new())
        .expect("Failed to create linter")
        .run()
}

fn agent(name: &str, extra: &str) -> String {
    format!("---\nname: {name}\ndescription: Handles {name} related tasks well\n{extra}---\nYou are {name}.\n")
}

fn result_for<'a>(summary: &'a LintSummary, file_name: &str) -> &'a LintResult {
    summary
        .results
        .iter()
        .find(|r| r.file.file_name().is_some_and(|n| n == file_name))
        .unwrap_or_else(|| panic!("no result for {file_name}"))
}

fn mixed_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for i in 0..12 {
        let extra = if i % 3 == 0 { "foo: 1\n" } else { "" };
        write(root, &format!(".claude/agents/agent-{i:02}.md"), &agent(&format!("agent-{i:02}"), extra));
    }
    write(root, ".claude/agents/nameless.md", "---\ndescription: Missing its name field\n---\nBody\n");
    write(root, ".claude/commands/review.md", "---\nallowed-tools: Grep\n---\nRun !`git diff`\n");
    write(root, ".claude/commands/git/commit.md", "---\ndescription: Commit\n---\n");
    write(root, ".claude/settings.json", r#"{ "hooks": { "Frobnicate": [] } }"#);
    write(root, "CLAUDE.md", "# Project\n\nShort.\n");
    dir
}

#[test]
fn test_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, ".claude/agents/helper.md", "---\nname: helper\ndescription: \"does things\"\n---\nYou help.\n");
    write(root, ".claude/commands/empty.md", "---\n---\n");
    write(
        root,
        ".claude/settings.json",
        r#"{ "hooks": { "Frobnicate": [{ "matcher": "", "hooks": [{ "type": "command", "command": "echo hi" }] }] } }"#,
    );

    let summary = lint(root, LintOptions::default());

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.total_errors, 0);
    assert_eq!(summary.valid_files, 3);
    assert!(summary.total_warnings >= 1);
    let settings = result_for(&summary, "settings.json");
    assert!(settings.warnings.iter().any(|w| w.contains("Frobnicate")));
}

#[rstest]
#[case::sequential(false, 1)]
#[case::two_workers(true, 2)]
#[case::default_workers(true, 10)]
#[case::many_workers(true, 32)]
fn test_idempotent_and_order_independent(#[case] parallel: bool, #[case] concurrency: usize) {
    let dir = mixed_project();
    let baseline = lint(
        dir.path(),
        LintOptions {
            parallel: false,
            ..LintOptions::default()
        },
    );

    let options = LintOptions {
        parallel,
        concurrency,
        ..LintOptions::default()
    };
    let first = lint(dir.path(), options.clone());
    let second = lint(dir.path(), options);

    assert_eq!(first.results, second.results);
    assert_eq!(first.results, baseline.results);
    assert_eq!(first.total_files, baseline.total_files);
    assert_eq!(first.total_errors, baseline.total_errors);
    assert_eq!(first.total_warnings, baseline.total_warnings);

    let mut sorted: Vec<_> = first.results.iter().map(|r| r.file.clone()).collect();
    sorted.sort();
    let actual: Vec<_> = first.results.iter().map(|r| r.file.clone()).collect();
    assert_eq!(actual, sorted);
}

#[test]
fn test_strict_unknown_field_is_warning() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/agents/helper.md", &agent("helper", "foo: 1\n"));

    let summary = lint(dir.path(), LintOptions::default());
    let result = result_for(&summary, "helper.md");

    assert!(result.valid);
    assert_eq!(result.unused_fields, vec!["foo"]);
    assert!(result.warnings.iter().any(|w| w.contains("foo")));
}

#[test]
fn test_passthrough_mode_ignores_unknown_fields() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/agents/helper.md", &agent("helper", "foo: 1\n"));
    write(dir.path(), ".cclintrc.yaml", "rules:\n  strict: false\n");

    let summary = lint(dir.path(), LintOptions::default());
    let result = result_for(&summary, "helper.md");
    assert!(result.unused_fields.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_missing_required_field() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/agents/helper.md", "---\ndescription: Handles helper tasks well\n---\nBody\n");

    let summary = lint(dir.path(), LintOptions::default());
    let result = result_for(&summary, "helper.md");

    assert!(!result.valid);
    assert_eq!(result.missing_fields, vec!["name"]);
    assert!(result.errors.iter().any(|e| e.contains("name")));
}

#[rstest]
#[case::hex("\"#FF0000\"", false)]
#[case::allowed("blue", true)]
#[case::css_name("teal", false)]
fn test_color_allowlist(#[case] color: &str, #[case] valid: bool) {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        ".claude/agents/helper.md",
        &agent("helper", &format!("color: {color}\n")),
    );

    let summary = lint(dir.path(), LintOptions::default());
    assert_eq!(result_for(&summary, "helper.md").valid, valid);
}

#[test]
fn test_custom_validation_from_script_config() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "cclint.config.cclint",
        r#"
        // High-priority agents need an owner.
        export default {
          agentSchema: {
            extend: { priority: "number?", team: "string?" },
            customValidation: |data| if (data.priority ?? 0) > 3 && !has(data, "team") {
              error("High priority agents must have a team assigned")
            } else { [] },
          },
        }
        "#,
    );
    write(root, ".claude/agents/urgent.md", &agent("urgent", "priority: 5\n"));
    write(root, ".claude/agents/owned.md", &agent("owned", "priority: 5\nteam: platform\n"));
    write(root, ".claude/agents/relaxed.md", &agent("relaxed", "priority: 1\n"));

    let summary = lint(root, LintOptions::default());

    let urgent = result_for(&summary, "urgent.md");
    assert!(!urgent.valid);
    assert!(urgent.errors.iter().any(|e| e.contains("Custom validation")));
    assert_eq!(
        urgent.custom_schema_errors,
        Some(vec!["High priority agents must have a team assigned".to_string()])
    );
    assert!(result_for(&summary, "owned.md").valid);
    assert!(result_for(&summary, "relaxed.md").valid);
    // Custom errors count twice: once mirrored into `errors`, once on their own.
    assert_eq!(summary.total_errors, 2);

    let disabled = lint(
        root,
        LintOptions {
            custom_schemas: false,
            ..LintOptions::default()
        },
    );
    let urgent = result_for(&disabled, "urgent.md");
    assert!(urgent.errors.is_empty());
    assert_eq!(urgent.unused_fields, vec!["priority"]);
}

#[test]
fn test_failing_hook_is_isolated() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        ".cclintrc.cclint",
        "export default { agentSchema: { customValidation: |data| data.missing.field } }",
    );
    write(root, ".claude/agents/a.md", &agent("a", ""));
    write(root, ".claude/agents/b.md", &agent("b", ""));

    let summary = lint(root, LintOptions::default());
    assert_eq!(summary.total_files, 2);
    for result in &summary.results {
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Custom validation failed"));
    }
}

#[test]
fn test_forbidden_script_config_is_ignored() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "cclint.config.cclint",
        "let leak = require('fs');\nexport default { rules: { unknownFields: \"error\" } }",
    );
    write(root, ".claude/agents/helper.md", &agent("helper", "foo: 1\n"));

    assert!(ConfigLoader::new().load(root).unwrap().is_none());

    let summary = lint(root, LintOptions::default());
    let result = result_for(&summary, "helper.md");
    assert!(result.valid, "unknownFields from the rejected file must not apply");
}

#[test]
fn test_script_timeout_returns_none() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        ".cclintrc.cclint",
        "let spin = || all(range(1e15), |i| true);\nexport default spin",
    );
    let loader = ConfigLoader::new().script_limits(ScriptLimits {
        export_timeout: Duration::from_millis(200),
        hook_timeout: Duration::from_millis(200),
    });

    let start = Instant::now();
    assert!(loader.load(dir.path()).unwrap().is_none());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_include_and_exclude_patterns() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        ".cclintrc.json",
        r#"{ "rules": { "includePatterns": ["docs/**/*.md"], "excludePatterns": ["**/drafts/**"] } }"#,
    );
    write(root, "docs/agents/writer.md", &agent("writer", ""));
    write(root, "docs/commands/publish.md", "---\ndescription: Publish\n---\n");
    write(root, "docs/plain.md", "# Not an artifact\n");
    write(root, ".claude/agents/drafts/wip.md", &agent("wip", ""));

    let summary = lint(root, LintOptions::default());
    let names: Vec<_> = summary
        .results
        .iter()
        .map(|r| r.file.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["writer.md", "publish.md"]);
}

#[test]
fn test_run_lint_with_explicit_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/agents/helper.md", &agent("helper", "foo: 1\n"));

    let mut config = CclintConfig::new();
    config.rules.strict = false;
    let summary = run_lint(dir.path(), LintOptions::default(), Some(Arc::new(config))).unwrap();
    assert_eq!(summary.total_warnings, 0);
    assert_eq!(summary.valid_files, 1);
}

#[test]
fn test_expired_deadline_reports_every_file() {
    let dir = mixed_project();
    let options = LintOptions {
        deadline: Some(Instant::now() - Duration::from_millis(1)),
        ..LintOptions::default()
    };
    let summary = lint(dir.path(), options);
    assert!(summary.total_files > 0);
    assert_eq!(summary.valid_files, 0);
    assert!(
        summary
            .results
            .iter()
            .all(|r| r.errors == vec!["Lint deadline exceeded before this file was processed"])
    );
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_outside_root_is_excluded() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "secret.md", &agent("secret", ""));

        let dir = TempDir::new().unwrap();
        write(dir.path(), ".claude/agents/helper.md", &agent("helper", ""));
        symlink(
            outside.path().join("secret.md"),
            dir.path().join(".claude/agents/secret.md"),
        )
        .unwrap();

        let summary = lint(
            dir.path(),
            LintOptions {
                follow_symlinks: true,
                ..LintOptions::default()
            },
        );
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.total_errors, 0);
    }

    #[test]
    fn test_circular_symlinks_terminate() {
        let dir = TempDir::new().unwrap();
        let agents = dir.path().join(".claude/agents");
        fs::create_dir_all(agents.join("a")).unwrap();
        fs::create_dir_all(agents.join("b")).unwrap();
        write(&agents, "a/one.md", &agent("one", ""));
        symlink(agents.join("b"), agents.join("a/to-b")).unwrap();
        symlink(agents.join("a"), agents.join("b/to-a")).unwrap();

        let start = Instant::now();
        let summary = lint(
            dir.path(),
            LintOptions {
                follow_symlinks: true,
                ..LintOptions::default()
            },
        );
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(summary.total_files, 1);
    }
}
