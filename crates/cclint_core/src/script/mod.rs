//! Embedded configuration language.
//!
//! Script configuration files (`cclint.config.cclint`, `.cclintrc.cclint`)
//! are evaluated by a small expression interpreter with no host access.
//! A script binds values with `let` and exports the configuration object
//! with `export default`. Only `customValidation` entries may hold
//! functions; everything else must be plain data.
//!
//! ```text
//! let known_teams = ["core", "infra"];
//!
//! export default {
//!   agentSchema: {
//!     extend: { priority: "number?", team: "string?" },
//!     customValidation: |data| if (data.priority ?? 0) > 3 && !has(data, "team") {
//!       ["High priority agents must have a team assigned"]
//!     } else { [] },
//!   },
//! }
//! ```

mod interpreter;
mod lexer;
mod parser;
mod scan;
mod value;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{CclintConfig, CustomValidator};
use crate::error::ScriptError;
use crate::schema::SchemaKind;

pub use interpreter::BUILTINS;
pub use scan::{Violation, find_violation};

use interpreter::{Budget, Interpreter};
use value::Value;

/// Default budget for evaluating a script's export.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default budget for each invocation of a validation hook.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(1);

/// Wall-clock budgets applied to script evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    pub export_timeout: Duration,
    pub hook_timeout: Duration,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            hook_timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }
}

/// A `customValidation` function exported by a script.
#[derive(Clone)]
pub struct ScriptHook {
    function: Value,
    timeout: Duration,
}

impl ScriptHook {
    /// Runs the hook under its own budget.
    ///
    /// The hook must return `null` or a list of strings.
    pub fn call(&self, args: &[serde_json::Value]) -> Result<Vec<String>, ScriptError> {
        let args = args.iter().map(Value::from_json).collect();
        let mut interpreter = Interpreter::new(Budget::with_timeout(self.timeout));
        match interpreter.call(&self.function, args)? {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ScriptError::runtime(format!(
                            "customValidation must return strings, found {}",
                            item.type_name()
                        ))
                    })
                })
                .collect(),
            other => Err(ScriptError::runtime(format!(
                "customValidation must return a list of strings, found {}",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for ScriptHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHook")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

const HOOK_SECTIONS: &[&str] = &[
    "agentSchema",
    "commandSchema",
    "settingsSchema",
    "claudeMdRules",
];

/// Evaluates a script and builds the configuration it exports.
pub fn load_config(source: &str, limits: ScriptLimits) -> Result<CclintConfig, ScriptError> {
    let program = parser::parse(lexer::tokenize(source)?)?;

    let mut interpreter = Interpreter::new(Budget::with_timeout(limits.export_timeout));
    let mut exported = interpreter.run(&program)?;
    if exported.is_callable() {
        debug!("Script exports a function; calling it for the configuration");
        exported = interpreter.call(&exported, Vec::new())?;
    }

    let root = match exported {
        Value::Object(root) => root,
        other => {
            return Err(ScriptError::runtime(format!(
                "export default must be an object, found {}",
                other.type_name()
            )));
        }
    };

    let mut root = Arc::unwrap_or_clone(root);
    let mut hooks: BTreeMap<&str, ScriptHook> = BTreeMap::new();
    for &section in HOOK_SECTIONS {
        let Some(Value::Object(body)) = root.get(section) else {
            continue;
        };
        let mut body = body.as_ref().clone();
        match body.remove("customValidation") {
            None | Some(Value::Null) => {}
            Some(function) if function.is_callable() => {
                hooks.insert(
                    section,
                    ScriptHook {
                        function,
                        timeout: limits.hook_timeout,
                    },
                );
            }
            Some(other) => {
                return Err(ScriptError::runtime(format!(
                    "{section}.customValidation must be a function, found {}",
                    other.type_name()
                )));
            }
        }
        root.insert(section.to_string(), Value::object(body));
    }

    let json = interpreter.to_json(&Value::object(root))?;
    let mut config = CclintConfig::from_value(&json).map_err(ScriptError::Runtime)?;

    for (section, hook) in hooks {
        let validator = Some(CustomValidator::Script(hook));
        match section {
            "agentSchema" => config.kind_mut(SchemaKind::Agent).custom_validation = validator,
            "commandSchema" => config.kind_mut(SchemaKind::Command).custom_validation = validator,
            "settingsSchema" => {
                config.kind_mut(SchemaKind::Settings).custom_validation = validator
            }
            _ => config.claude_md_rules.custom_validation = validator,
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownFieldSeverity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PRIORITY_CONFIG: &str = r#"
        export default {
          agentSchema: {
            extend: { priority: "number?", team: "string?" },
            customValidation: |data| if (data.priority ?? 0) > 3 && !has(data, "team") {
              ["High priority agents must have a team assigned"]
            } else { [] },
          },
          rules: { unknownFields: "error" },
        }
    "#;

    #[test]
    fn test_load_config_with_hook() {
        let config = load_config(PRIORITY_CONFIG, ScriptLimits::default()).unwrap();
        assert_eq!(config.agent_schema.extend.len(), 2);
        assert_eq!(config.rules.unknown_fields, UnknownFieldSeverity::Error);

        let hook = config.agent_schema.custom_validation.as_ref().unwrap();
        assert_eq!(
            hook.call(&[json!({ "name": "a", "priority": 5 })]).unwrap(),
            vec!["High priority agents must have a team assigned"]
        );
        assert!(
            hook.call(&[json!({ "name": "a", "priority": 5, "team": "core" })])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_exported_function_is_called() {
        let config = load_config(
            "export default || { rules: { strict: false } }",
            ScriptLimits::default(),
        )
        .unwrap();
        assert!(!config.rules.strict);
    }

    #[test]
    fn test_claude_md_hook_receives_sections() {
        let config = load_config(
            "export default { claudeMdRules: { customValidation: |content, sections| \
               if contains(sections, 'Security') { null } else { ['Missing Security'] } } }",
            ScriptLimits::default(),
        )
        .unwrap();
        let hook = config.claude_md_rules.custom_validation.unwrap();
        assert_eq!(
            hook.call(&[json!("# A"), json!(["A"])]).unwrap(),
            vec!["Missing Security"]
        );
        assert!(hook.call(&[json!("# Security"), json!(["Security"])]).unwrap().is_empty());
    }

    #[test]
    fn test_functions_outside_hooks_are_rejected() {
        let err = load_config(
            "export default { rules: { strict: |x| x } }",
            ScriptLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(_)));
    }

    #[test]
    fn test_non_object_export() {
        assert!(load_config("export default [1]", ScriptLimits::default()).is_err());
    }

    #[test]
    fn test_bad_hook_return() {
        let config = load_config(
            "export default { commandSchema: { customValidation: |d| 42 } }",
            ScriptLimits::default(),
        )
        .unwrap();
        let hook = config.command_schema.custom_validation.unwrap();
        assert!(hook.call(&[json!({})]).is_err());
    }

    #[test]
    fn test_export_timeout() {
        let limits = ScriptLimits {
            export_timeout: Duration::from_millis(50),
            ..ScriptLimits::default()
        };
        assert_eq!(
            load_config("export default any(range(1e12), |x| false)", limits).err(),
            Some(ScriptError::Timeout(50))
        );
    }

    #[test]
    fn test_expanding_ranges_respects_export_timeout() {
        let limits = ScriptLimits {
            export_timeout: Duration::from_millis(50),
            ..ScriptLimits::default()
        };
        let started = std::time::Instant::now();
        let result = load_config(
            "export default { rules: { strict: true }, extra: map(range(40), |i| range(1000000)) }",
            limits,
        );
        assert_eq!(result.err(), Some(ScriptError::Timeout(50)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_long_operator_chain_is_a_parse_error() {
        let source = format!(
            "export default {{ rules: {{ strict: {} > 0 }} }}",
            vec!["1"; 200_000].join(" + ")
        );
        assert!(matches!(
            load_config(&source, ScriptLimits::default()),
            Err(ScriptError::Parse { .. })
        ));
    }

    #[test]
    fn test_hook_timeout() {
        let limits = ScriptLimits {
            hook_timeout: Duration::from_millis(20),
            ..ScriptLimits::default()
        };
        let config = load_config(
            "export default { agentSchema: { customValidation: |d| any(range(1e12), |x| false) } }",
            limits,
        )
        .unwrap();
        let Some(CustomValidator::Script(hook)) = config.agent_schema.custom_validation else {
            panic!("expected a script hook");
        };
        assert!(matches!(hook.call(&[json!({})]), Err(ScriptError::Timeout(_))));
    }
}
