//! Linter for slash-command definitions (`.claude/commands/**/*.md`).

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::agent::check_tool_field;
use super::{LintContext, lint_front_matter_file, tools};
use crate::result::LintResult;
use crate::schema::SchemaKind;

const BASH_MARKER: &str = "!`";

fn file_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^|\s)@[\w./~-]*[\w/]").expect("valid file reference pattern")
    })
}

fn argument_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(?:ARGUMENTS\b|[1-9])").expect("valid placeholder pattern"))
}

fn valid_filename() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w-]+$").expect("valid filename pattern"))
}

pub fn lint(path: &Path, ctx: &LintContext<'_>) -> Option<LintResult> {
    lint_front_matter_file(path, SchemaKind::Command, ctx, |result, data, body| {
        check_filename(result, path);

        let allowed = data.get("allowed-tools");
        if let Some(value) = allowed {
            check_tool_field(result, "allowed-tools", value);
        }
        let entries = allowed.map(tools::parse_tool_list);
        check_permissions(result, entries.as_deref(), body);

        check_description(result, data, body);
        if !data.contains_key("argument-hint") && argument_placeholder().is_match(body) {
            result.add_suggestion("Command uses $ARGUMENTS but has no argument-hint");
        }
    })
}

fn check_filename(result: &mut LintResult, path: &Path) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    if !valid_filename().is_match(stem) {
        result.add_warning(format!(
            "Command filename '{stem}' should contain only letters, numbers, hyphens and underscores"
        ));
    }
}

/// Compares what the body uses against what `allowed-tools` grants.
/// Without an `allowed-tools` field the command inherits the session's
/// permissions and nothing is reported.
fn check_permissions(result: &mut LintResult, entries: Option<&[String]>, body: &str) {
    let Some(entries) = entries else {
        return;
    };
    if body.contains(BASH_MARKER) && !tools::grants(entries, "Bash") {
        result.add_warning("Command executes bash (!`...`) but allowed-tools does not grant Bash");
    }
    if file_reference().is_match(body) && !tools::grants(entries, "Read") {
        result.add_suggestion("Command references files with @ but allowed-tools does not grant Read");
    }
}

fn check_description(result: &mut LintResult, data: &Map<String, Value>, body: &str) {
    if data.contains_key("description") {
        return;
    }
    let first_line = body
        .lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty());
    if let Some(line) = first_line {
        result.add_suggestion(format!(
            "Add a description field; the first line \"{line}\" is used in its place"
        ));
    }
}
