//! Linter for `CLAUDE.md` documentation files.

use std::path::Path;

use serde_json::Value;

use super::{LintContext, read, run_custom_validation, suggest};
use crate::result::LintResult;

pub const MIN_CHARS: usize = 100;
pub const MAX_CHARS: usize = 40_000;

/// A heading line outside fenced code.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    level: usize,
    title: String,
    line: usize,
}

pub fn lint(path: &Path, ctx: &LintContext<'_>) -> Option<LintResult> {
    let content = match read(path) {
        Ok(content) => content,
        Err(result) => return Some(result),
    };

    let mut result = LintResult::new(path);
    let rules = ctx.claude_md_rules();
    let lines: Vec<&str> = content.lines().collect();
    let headings = headings(&lines);
    let sections: Vec<&str> = headings
        .iter()
        .filter(|h| h.level <= 2)
        .map(|h| h.title.as_str())
        .collect();

    for required in &rules.required_sections {
        if !has_section(&sections, required) {
            result.add_error(format!("Missing required section: {required}"));
        }
    }
    for recommended in &rules.recommended_sections {
        if !has_section(&sections, recommended) {
            suggest(
                &mut result,
                ctx,
                format!("Consider adding a '{recommended}' section"),
            );
        }
    }

    if headings.is_empty() {
        result.add_warning("CLAUDE.md has no headings; organize it into sections");
    } else if !has_description(&lines, &headings) {
        suggest(
            &mut result,
            ctx,
            "Add a short project description before the first section",
        );
    }

    let chars = content.trim().chars().count();
    if chars < MIN_CHARS {
        result.add_warning(format!(
            "CLAUDE.md is very short ({chars} characters); add project context"
        ));
    } else if chars > MAX_CHARS {
        result.add_warning(format!(
            "CLAUDE.md is very long ({chars} characters); consider splitting it into imported files (@path/to/file.md)"
        ));
    }

    if !lines.iter().any(|line| is_fence(line)) {
        suggest(
            &mut result,
            ctx,
            "Add code examples (fenced code blocks) for common commands",
        );
    }

    if let Some(manager) = ctx.project.and_then(|p| p.package_manager) {
        let name = manager.to_string();
        if !mentions_word(&content, &name) {
            suggest(
                &mut result,
                ctx,
                format!(
                    "Project uses {name}; document the {name} commands for installing, building and testing"
                ),
            );
        }
    }

    let args = [
        Value::String(content.clone()),
        Value::Array(
            sections
                .iter()
                .map(|s| Value::String((*s).to_string()))
                .collect(),
        ),
    ];
    run_custom_validation(
        &mut result,
        rules.custom_validation.as_ref().filter(|_| ctx.options.custom_schemas),
        &args,
        ctx,
    );
    Some(result)
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn headings(lines: &[&str]) -> Vec<Heading> {
    let mut in_code = false;
    let mut found = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        let trimmed = line.trim_start();
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        if !(1..=6).contains(&level) {
            continue;
        }
        let rest = &trimmed[level..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let title = rest.trim().trim_end_matches('#').trim();
        if !title.is_empty() {
            found.push(Heading {
                level,
                title: title.to_string(),
                line: index,
            });
        }
    }
    found
}

fn mentions_word(content: &str, word: &str) -> bool {
    content
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

/// Case-insensitive substring match against the detected section titles.
fn has_section(sections: &[&str], wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    sections
        .iter()
        .any(|title| title.to_lowercase().contains(&wanted))
}

/// Looks for prose before the first section: below the H1 title when the
/// document opens with one, otherwise above the first heading.
fn has_description(lines: &[&str], headings: &[Heading]) -> bool {
    let first = &headings[0];
    let (start, end) = if first.level == 1 {
        let next = headings.get(1).map_or(lines.len(), |h| h.line);
        (first.line + 1, next)
    } else {
        (0, first.line)
    };
    lines[start..end].iter().any(|line| !line.trim().is_empty())
}
