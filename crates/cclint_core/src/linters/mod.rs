//! Per-artifact linters.
//!
//! Every linter follows the same steps for a file: read, parse, validate
//! against the composed schema, run heuristics, then the configured custom
//! validation hook. Failures are recorded on the file's [`LintResult`] and
//! never escape.

pub mod agent;
pub mod command;
pub mod docs;
pub mod settings;
pub mod tools;

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{CclintConfig, ClaudeMdRules, CustomValidator, UnknownFieldSeverity};
use crate::file_finder::ArtifactKind;
use crate::frontmatter;
use crate::linter::LintOptions;
use crate::project::ProjectInfo;
use crate::result::LintResult;
use crate::schema::{IssueKind, Schema, SchemaKind, get_schema};

/// Everything a linter needs besides the file itself.
#[derive(Clone, Copy)]
pub struct LintContext<'a> {
    pub root: &'a Path,
    pub config: Option<&'a CclintConfig>,
    pub options: &'a LintOptions,
    /// Facts about the project, when the caller detected them.
    pub project: Option<&'a ProjectInfo>,
}

impl<'a> LintContext<'a> {
    pub fn new(root: &'a Path, config: Option<&'a CclintConfig>, options: &'a LintOptions) -> Self {
        Self {
            root,
            config,
            options,
            project: None,
        }
    }

    pub fn with_project(mut self, project: Option<&'a ProjectInfo>) -> Self {
        self.project = project;
        self
    }

    pub fn schema(&self, kind: SchemaKind) -> Schema {
        get_schema(kind, self.config, self.options.custom_schemas)
    }

    fn unknown_field_severity(&self) -> UnknownFieldSeverity {
        self.config
            .map(|c| c.rules.unknown_fields)
            .unwrap_or_default()
    }

    fn custom_validator(&self, kind: SchemaKind) -> Option<&'a CustomValidator> {
        if !self.options.custom_schemas {
            return None;
        }
        self.config?.kind(kind).custom_validation.as_ref()
    }

    fn claude_md_rules(&self) -> ClaudeMdRules {
        self.config
            .map(|c| c.claude_md_rules.clone())
            .unwrap_or_default()
    }
}

/// Lints one file as `kind`. Returns `None` for files that are not artifacts
/// of that kind (markdown without front matter).
pub fn lint_file(kind: ArtifactKind, path: &Path, ctx: &LintContext<'_>) -> Option<LintResult> {
    match kind {
        ArtifactKind::Agent => agent::lint(path, ctx),
        ArtifactKind::Command => command::lint(path, ctx),
        ArtifactKind::Settings => settings::lint(path, ctx),
        ArtifactKind::Doc => docs::lint(path, ctx),
    }
}

pub(crate) fn missing_field_message(path: &str) -> String {
    format!("Missing required field: {path}")
}

pub(crate) fn invalid_field_message(path: &str, message: &str) -> String {
    if path.is_empty() {
        format!("Invalid document: {message}")
    } else {
        format!("Invalid field '{path}': {message}")
    }
}

/// Reads `path`, or returns the failed result to report instead.
fn read(path: &Path) -> Result<String, LintResult> {
    fs::read_to_string(path).map_err(|e| LintResult::failed(path, e))
}

/// Shared pipeline for markdown artifacts carrying YAML front matter.
///
/// `heuristics` receives the parsed front matter and the markdown body.
fn lint_front_matter_file(
    path: &Path,
    kind: SchemaKind,
    ctx: &LintContext<'_>,
    heuristics: impl FnOnce(&mut LintResult, &Map<String, Value>, &str),
) -> Option<LintResult> {
    let content = match read(path) {
        Ok(content) => content,
        Err(result) => return Some(result),
    };
    if !frontmatter::has_front_matter(&content) {
        debug!("Skipping {} (no front matter)", path.display());
        return None;
    }

    let mut result = LintResult::new(path);
    let parsed = match frontmatter::parse(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            result.add_error(format!("Invalid front matter: {e}"));
            return Some(result);
        }
    };

    let data = Value::Object(parsed.data);
    apply_schema(&mut result, &ctx.schema(kind), &data, ctx);
    if let Value::Object(map) = &data {
        heuristics(&mut result, map, &parsed.content);
    }
    run_custom_validation(
        &mut result,
        ctx.custom_validator(kind),
        std::slice::from_ref(&data),
        ctx,
    );
    Some(result)
}

/// Validates `data` and records each schema issue on `result`.
pub(crate) fn apply_schema(
    result: &mut LintResult,
    schema: &Schema,
    data: &Value,
    ctx: &LintContext<'_>,
) {
    for issue in schema.validate(data) {
        match issue.kind {
            IssueKind::Missing => {
                result.add_missing_field(issue.path.as_str());
                result.add_error_once(missing_field_message(&issue.path));
            }
            IssueKind::Unrecognized => {
                let message = format!("Unrecognized field: {}", issue.path);
                match ctx.unknown_field_severity() {
                    UnknownFieldSeverity::Error => {
                        result.add_unused_field(issue.path);
                        result.add_error(message);
                    }
                    UnknownFieldSeverity::Warning => {
                        result.add_unused_field(issue.path);
                        result.add_warning(message);
                    }
                    UnknownFieldSeverity::Suggestion => {
                        result.add_unused_field(issue.path);
                        result.add_suggestion(message);
                    }
                    UnknownFieldSeverity::Off => {}
                }
            }
            IssueKind::Invalid(message) => {
                result.add_error_once(invalid_field_message(&issue.path, &message));
            }
        }
    }
}

/// Invokes a custom validation hook, converting its failures into findings.
pub(crate) fn run_custom_validation(
    result: &mut LintResult,
    validator: Option<&CustomValidator>,
    args: &[Value],
    ctx: &LintContext<'_>,
) {
    let Some(validator) = validator else {
        return;
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| validator.call(args)))
        .unwrap_or_else(|_| Err("validator panicked".to_string()));

    match outcome {
        Ok(errors) => {
            for error in errors {
                result.add_custom_schema_error(error);
            }
        }
        Err(message) => {
            if ctx.options.verbose {
                warn!("Custom validation failed for {}: {}", result.file.display(), message);
            } else {
                debug!("Custom validation failed for {}: {}", result.file.display(), message);
            }
            result.add_error(format!("Custom validation failed: {message}"));
        }
    }
}

/// Adds heuristic output, honouring the quiet flag for suggestions.
pub(crate) fn suggest(result: &mut LintResult, ctx: &LintContext<'_>, message: impl Into<String>) {
    if !ctx.options.quiet {
        result.add_suggestion(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::agent_schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn with_config<T>(config: Option<&CclintConfig>, f: impl FnOnce(&LintContext<'_>) -> T) -> T {
        let options = LintOptions::default();
        let ctx = LintContext::new(Path::new("/p"), config, &options);
        f(&ctx)
    }

    #[test]
    fn test_schema_issue_translation() {
        let mut result = LintResult::new("/p/a.md");
        with_config(None, |ctx| {
            apply_schema(
                &mut result,
                &agent_schema(),
                &json!({ "description": "x", "color": "teal", "foo": 1 }),
                ctx,
            )
        });

        assert!(!result.valid);
        assert_eq!(result.missing_fields, vec!["name"]);
        assert_eq!(result.unused_fields, vec!["foo"]);
        assert_eq!(result.warnings, vec!["Unrecognized field: foo"]);
        assert!(result.errors.contains(&"Missing required field: name".to_string()));
        assert!(result.errors.iter().any(|e| e.contains("color")));
    }

    #[test]
    fn test_unknown_field_severity() {
        let mut config = CclintConfig::new();
        config.rules.unknown_fields = UnknownFieldSeverity::Error;
        let mut result = LintResult::new("/p/a.md");
        with_config(Some(&config), |ctx| {
            apply_schema(
                &mut result,
                &agent_schema(),
                &json!({ "name": "a", "description": "b", "foo": 1 }),
                ctx,
            )
        });
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Unrecognized field: foo"]);

        config.rules.unknown_fields = UnknownFieldSeverity::Off;
        let mut result = LintResult::new("/p/a.md");
        with_config(Some(&config), |ctx| {
            apply_schema(
                &mut result,
                &agent_schema(),
                &json!({ "name": "a", "description": "b", "foo": 1 }),
                ctx,
            )
        });
        assert!(result.valid);
        assert!(result.warnings.is_empty());
        assert!(result.unused_fields.is_empty());
    }

    #[test]
    fn test_custom_validation_outcomes() {
        let reject = CustomValidator::native(|_| Ok(vec!["nope".to_string()]));
        let fail = CustomValidator::native(|_| Err("bad input".to_string()));
        let boom = CustomValidator::native(|_| panic!("boom"));

        with_config(None, |ctx| {
            let mut result = LintResult::new("/p/a.md");
            run_custom_validation(&mut result, Some(&reject), &[json!({})], ctx);
            assert_eq!(result.errors, vec!["Custom validation: nope"]);
            assert_eq!(result.custom_schema_errors, Some(vec!["nope".to_string()]));

            let mut result = LintResult::new("/p/a.md");
            run_custom_validation(&mut result, Some(&fail), &[json!({})], ctx);
            assert_eq!(result.errors, vec!["Custom validation failed: bad input"]);

            let mut result = LintResult::new("/p/a.md");
            run_custom_validation(&mut result, Some(&boom), &[json!({})], ctx);
            assert!(!result.valid);
            assert!(result.custom_schema_errors.is_none());
        });
    }
}
