//! Linter for `.claude/settings.json` and `.claude/settings.local.json`.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use super::{LintContext, apply_schema, invalid_field_message, read, run_custom_validation};
use crate::result::LintResult;
use crate::schema::SchemaKind;

/// Hook events Claude recognizes.
pub const HOOK_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "Notification",
    "UserPromptSubmit",
    "Stop",
    "SubagentStop",
    "PreCompact",
    "SessionStart",
    "SessionEnd",
];

/// Events whose hooks are filtered by a tool matcher.
const MATCHER_EVENTS: &[&str] = &["PreToolUse", "PostToolUse"];

const SHARED_SETTINGS_FILE: &str = "settings.json";

pub fn lint(path: &Path, ctx: &LintContext<'_>) -> Option<LintResult> {
    let content = match read(path) {
        Ok(content) => content,
        Err(result) => return Some(result),
    };

    let mut result = LintResult::new(path);
    let data: Value = match serde_json::from_str(&content) {
        Ok(data) => data,
        Err(e) => {
            result.add_error(format!("Invalid JSON: {e}"));
            return Some(result);
        }
    };

    apply_schema(&mut result, &ctx.schema(SchemaKind::Settings), &data, ctx);
    if let Value::Object(map) = &data {
        if let Some(Value::Object(hooks)) = map.get("hooks") {
            check_hooks(&mut result, hooks);
        }
        check_env(&mut result, map, path);
        check_permissions(&mut result, map);
    }
    run_custom_validation(
        &mut result,
        ctx.custom_validator(SchemaKind::Settings),
        std::slice::from_ref(&data),
        ctx,
    );
    Some(result)
}

fn check_hooks(result: &mut LintResult, hooks: &Map<String, Value>) {
    if hooks.is_empty() {
        result.add_warning("'hooks' is empty; remove it or add hook entries");
        return;
    }

    for (event, entries) in hooks {
        if !HOOK_EVENTS.contains(&event.as_str()) {
            result.add_warning(format!(
                "Unknown hook event '{event}'; expected one of: {}",
                HOOK_EVENTS.join(", ")
            ));
        }
        let Some(entries) = entries.as_array() else {
            continue;
        };
        for (i, entry) in entries.iter().enumerate() {
            check_hook_entry(result, event, i, entry);
        }
    }
}

fn check_hook_entry(result: &mut LintResult, event: &str, index: usize, entry: &Value) {
    let Some(entry) = entry.as_object() else {
        return;
    };
    let prefix = format!("hooks.{event}[{index}]");

    if let Some(matcher) = entry.get("matcher").and_then(Value::as_str)
        && !matcher.is_empty()
        && !MATCHER_EVENTS.contains(&event)
    {
        result.add_suggestion(format!(
            "Matcher on '{event}' has no effect; matchers only apply to PreToolUse and PostToolUse"
        ));
    }

    let Some(commands) = entry.get("hooks").and_then(Value::as_array) else {
        return;
    };
    if commands.is_empty() {
        result.add_warning(format!("Hook entry '{prefix}' has no commands"));
    }
    for (j, command) in commands.iter().enumerate() {
        if let Some(text) = command.get("command").and_then(Value::as_str)
            && text.trim().is_empty()
        {
            result.add_error_once(invalid_field_message(
                &format!("{prefix}.hooks[{j}].command"),
                "must not be empty",
            ));
        }
    }
}

fn check_env(result: &mut LintResult, map: &Map<String, Value>, path: &Path) {
    let is_shared = path
        .file_name()
        .is_some_and(|name| name == SHARED_SETTINGS_FILE);
    if !is_shared {
        return;
    }
    if let Some(Value::Object(env)) = map.get("env")
        && !env.is_empty()
    {
        result.add_suggestion(
            "Environment variables in settings.json are shared with the team; move personal values to settings.local.json",
        );
    }
}

fn check_permissions(result: &mut LintResult, map: &Map<String, Value>) {
    let Some(permissions) = map.get("permissions").and_then(Value::as_object) else {
        return;
    };
    let allow = rule_set(permissions, "allow");
    for rule in rule_set(permissions, "deny").intersection(&allow) {
        result.add_warning(format!("Permission '{rule}' is both allowed and denied"));
    }
}

fn rule_set<'a>(permissions: &'a Map<String, Value>, key: &str) -> BTreeSet<&'a str> {
    permissions
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
