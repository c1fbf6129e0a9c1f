//! Linter for subagent definitions (`.claude/agents/*.md`).

use std::path::Path;

use serde_json::{Map, Value};

use super::{LintContext, lint_front_matter_file, tools};
use crate::result::LintResult;
use crate::schema::SchemaKind;

const MIN_DESCRIPTION_CHARS: usize = 20;
const TOOL_FIELDS: &[&str] = &["tools", "allowed-tools"];

pub fn lint(path: &Path, ctx: &LintContext<'_>) -> Option<LintResult> {
    lint_front_matter_file(path, SchemaKind::Agent, ctx, |result, data, body| {
        check_tools(result, data);
        check_name(result, data, path);
        check_description(result, data);
        if body.trim().is_empty() {
            result.add_warning("Agent has no system prompt after the front matter");
        }
    })
}

/// Tool syntax and naming checks shared with commands.
pub(super) fn check_tool_field(result: &mut LintResult, field: &str, value: &Value) {
    if tools::is_empty_tool_list(value) {
        result.add_warning(format!(
            "Field '{field}' is empty and grants no tools; remove it to inherit all tools"
        ));
        return;
    }

    for entry in tools::parse_tool_list(value) {
        if let Err(message) = tools::check_syntax(&entry) {
            result.add_error(message);
            continue;
        }
        let name = tools::base_name(&entry);
        if !tools::is_known_tool(name) {
            result.add_warning(format!("Unknown tool '{name}' in '{field}'"));
        }
    }
}

fn check_tools(result: &mut LintResult, data: &Map<String, Value>) {
    for field in TOOL_FIELDS {
        if let Some(value) = data.get(*field) {
            check_tool_field(result, field, value);
        }
    }
}

fn check_name(result: &mut LintResult, data: &Map<String, Value>, path: &Path) {
    let Some(name) = data.get("name").and_then(Value::as_str) else {
        return;
    };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    if name != stem {
        result.add_suggestion(format!(
            "Agent name '{name}' does not match filename '{stem}.md'"
        ));
    }
}

fn check_description(result: &mut LintResult, data: &Map<String, Value>) {
    let Some(description) = data.get("description").and_then(Value::as_str) else {
        return;
    };
    let len = description.trim().chars().count();
    if len > 0 && len < MIN_DESCRIPTION_CHARS {
        result.add_suggestion("Description is short; explain when this agent should be used");
    }
}
