//! Tool-list parsing shared by the agent and command linters.

use serde_json::Value;

/// Built-in tool names.
pub const KNOWN_TOOLS: &[&str] = &[
    "Bash",
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Glob",
    "Grep",
    "LS",
    "WebFetch",
    "WebSearch",
    "Task",
    "TodoWrite",
    "NotebookRead",
    "NotebookEdit",
    "BashOutput",
    "KillBash",
    "KillShell",
    "ExitPlanMode",
    "SlashCommand",
    "Skill",
];

/// Prefix of tools provided by MCP servers; such names are never flagged.
pub const MCP_PREFIX: &str = "mcp__";

/// Splits a tools field (comma-separated string or array) into entries.
///
/// Commas inside parentheses belong to the entry, so `Bash(git add:*, git
/// commit:*)` stays one entry. Non-string array items are dropped; the
/// schema reports them.
pub fn parse_tool_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_top_level(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn split_top_level(s: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth <= 0 => {
                entries.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    entries.push(current);

    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Returns true when `value` is an explicitly empty tool list. A key with
/// no value (`tools:`) counts as empty.
pub fn is_empty_tool_list(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Checks parenthesis balance in one entry such as `Bash(git:*)`.
pub fn check_syntax(entry: &str) -> Result<(), String> {
    let mut depth = 0i32;
    for c in entry.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("Unbalanced parentheses in tool pattern '{entry}'"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("Unbalanced parentheses in tool pattern '{entry}'"));
    }
    if entry.starts_with('(') {
        return Err(format!("Tool pattern '{entry}' is missing a tool name"));
    }
    Ok(())
}

/// Tool name of an entry, without any `(...)` restriction.
pub fn base_name(entry: &str) -> &str {
    entry.split('(').next().unwrap_or(entry).trim()
}

pub fn is_known_tool(name: &str) -> bool {
    name == "*" || name.starts_with(MCP_PREFIX) || KNOWN_TOOLS.contains(&name)
}

/// Returns true when an entry grants `tool`, either bare or restricted.
pub fn grants(entries: &[String], tool: &str) -> bool {
    entries
        .iter()
        .any(|entry| entry == "*" || base_name(entry) == tool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_parse_string_list() {
        assert_eq!(
            parse_tool_list(&json!("Read, Grep ,Bash(git add:*, git commit:*)")),
            vec!["Read", "Grep", "Bash(git add:*, git commit:*)"]
        );
    }

    #[test]
    fn test_parse_array_list() {
        assert_eq!(
            parse_tool_list(&json!(["Read", " ", 3, "Write"])),
            vec!["Read", "Write"]
        );
    }

    #[rstest]
    #[case::plain("Read", true)]
    #[case::restricted("Bash(git:*)", true)]
    #[case::nested("Bash(echo (a))", true)]
    #[case::unclosed("Bash(git:*", false)]
    #[case::extra_close("Bash)git(", false)]
    #[case::no_name("(git:*)", false)]
    fn test_check_syntax(#[case] entry: &str, #[case] ok: bool) {
        assert_eq!(check_syntax(entry).is_ok(), ok);
    }

    #[rstest]
    #[case("Read", true)]
    #[case("mcp__github__create_issue", true)]
    #[case("*", true)]
    #[case("Frobnicate", false)]
    #[case("read", false)]
    fn test_is_known_tool(#[case] name: &str, #[case] known: bool) {
        assert_eq!(is_known_tool(name), known);
    }

    #[test]
    fn test_grants() {
        let entries = vec!["Read".to_string(), "Bash(git:*)".to_string()];
        assert!(grants(&entries, "Bash"));
        assert!(grants(&entries, "Read"));
        assert!(!grants(&entries, "Write"));
        assert!(grants(&["*".to_string()], "Write"));
    }

    #[test]
    fn test_empty_tool_list() {
        assert!(is_empty_tool_list(&json!("")));
        assert!(is_empty_tool_list(&json!([])));
        assert!(is_empty_tool_list(&json!(null)));
        assert!(!is_empty_tool_list(&json!("Read")));
    }
}
