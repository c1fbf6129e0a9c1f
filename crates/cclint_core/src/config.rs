//! Project configuration model.
//!
//! A `CclintConfig` is what a project declares in `.cclintrc.*`,
//! `cclint.config.*` or the `cclint` key of `package.json`, merged with the
//! built-in defaults. Once loaded it is immutable and shared via `Arc`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::{FieldSpec, SchemaKind};
use crate::script::ScriptHook;

/// Sections suggested for CLAUDE.md when the project does not configure any.
pub const DEFAULT_RECOMMENDED_SECTIONS: &[&str] =
    &["Overview", "Commands", "Architecture", "Code Style", "Testing"];

const KNOWN_KEYS: &[&str] = &[
    "agentSchema",
    "commandSchema",
    "settingsSchema",
    "claudeMdRules",
    "rules",
    "$schema",
];

/// Signature of a custom validation hook supplied from Rust code.
pub type NativeValidator = dyn Fn(&[Value]) -> Result<Vec<String>, String> + Send + Sync;

/// A user-supplied validation callback.
///
/// Agent, command and settings hooks receive the parsed data as their only
/// argument. The CLAUDE.md hook receives the raw content and the list of
/// detected section titles. A hook returns the list of error messages.
#[derive(Clone)]
pub enum CustomValidator {
    /// A closure exported by a script configuration file.
    Script(ScriptHook),
    /// A closure registered programmatically.
    Native(Arc<NativeValidator>),
}

impl CustomValidator {
    pub fn native(
        f: impl Fn(&[Value]) -> Result<Vec<String>, String> + Send + Sync + 'static,
    ) -> Self {
        Self::Native(Arc::new(f))
    }

    /// Invokes the hook. Errors carry a description of the failure.
    pub fn call(&self, args: &[Value]) -> Result<Vec<String>, String> {
        match self {
            Self::Script(hook) => hook.call(args).map_err(|e| e.to_string()),
            Self::Native(f) => f(args),
        }
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(hook) => f.debug_tuple("Script").field(hook).finish(),
            Self::Native(_) => f.write_str("Native(<fn>)"),
        }
    }
}

/// Schema customization for one artifact kind.
#[derive(Debug, Clone, Default)]
pub struct KindConfig {
    /// Fields appended to (or replacing same-named fields of) the base schema.
    pub extend: Vec<FieldSpec>,
    /// Full replacement of the base field list.
    pub override_fields: Option<Vec<FieldSpec>>,
    pub custom_validation: Option<CustomValidator>,
}

/// Rules for CLAUDE.md documentation files.
#[derive(Debug, Clone)]
pub struct ClaudeMdRules {
    pub required_sections: Vec<String>,
    pub recommended_sections: Vec<String>,
    pub custom_validation: Option<CustomValidator>,
}

impl Default for ClaudeMdRules {
    fn default() -> Self {
        Self {
            required_sections: Vec::new(),
            recommended_sections: DEFAULT_RECOMMENDED_SECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            custom_validation: None,
        }
    }
}

/// Severity used for fields the schema does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldSeverity {
    Error,
    #[default]
    Warning,
    Suggestion,
    Off,
}

/// Global rule settings.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub unknown_fields: UnknownFieldSeverity,
    /// Reject (report) unknown fields when true, pass them through when false.
    pub strict: bool,
    /// Extra globs, relative to the project root, whose files are linted.
    pub include_patterns: Vec<String>,
    /// Globs whose matching files are never linted.
    pub exclude_patterns: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldSeverity::Warning,
            strict: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Effective project configuration.
#[derive(Debug, Clone, Default)]
pub struct CclintConfig {
    pub agent_schema: KindConfig,
    pub command_schema: KindConfig,
    pub settings_schema: KindConfig,
    pub claude_md_rules: ClaudeMdRules,
    pub rules: RulesConfig,
    /// File the configuration was loaded from, if any.
    pub source: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    agent_schema: Option<RawKindConfig>,
    command_schema: Option<RawKindConfig>,
    settings_schema: Option<RawKindConfig>,
    claude_md_rules: Option<RawClaudeMdRules>,
    rules: Option<RawRules>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawKindConfig {
    extend: Map<String, Value>,
    #[serde(rename = "override")]
    override_fields: Option<Map<String, Value>>,
    custom_validation: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawClaudeMdRules {
    required_sections: Vec<String>,
    recommended_sections: Option<Vec<String>>,
    custom_validation: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRules {
    unknown_fields: Option<UnknownFieldSeverity>,
    strict: Option<bool>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl CclintConfig {
    /// Creates a configuration holding only the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a parsed document.
    ///
    /// Data-only sources cannot carry validation hooks; a `customValidation`
    /// entry found here is ignored. Script sources attach their hooks
    /// separately after this call.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("configuration must be an object".to_string());
        };

        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                debug!("Ignoring unknown configuration key '{}'", key);
            }
        }

        let raw: RawConfig =
            serde_json::from_value(value.clone()).map_err(|e| format!("invalid configuration: {e}"))?;

        let mut config = Self::new();
        config.agent_schema = convert_kind(raw.agent_schema, "agentSchema")?;
        config.command_schema = convert_kind(raw.command_schema, "commandSchema")?;
        config.settings_schema = convert_kind(raw.settings_schema, "settingsSchema")?;

        if let Some(md) = raw.claude_md_rules {
            if md.custom_validation.is_some() {
                debug!("claudeMdRules.customValidation is only supported in script configuration");
            }
            config.claude_md_rules.required_sections = md.required_sections;
            if let Some(recommended) = md.recommended_sections {
                config.claude_md_rules.recommended_sections = recommended;
            }
        }

        if let Some(rules) = raw.rules {
            if let Some(severity) = rules.unknown_fields {
                config.rules.unknown_fields = severity;
            }
            if let Some(strict) = rules.strict {
                config.rules.strict = strict;
            }
            config.rules.include_patterns = rules.include_patterns;
            config.rules.exclude_patterns = rules.exclude_patterns;
        }

        Ok(config)
    }

    /// Schema customization for `kind`.
    pub fn kind(&self, kind: SchemaKind) -> &KindConfig {
        match kind {
            SchemaKind::Agent => &self.agent_schema,
            SchemaKind::Command => &self.command_schema,
            SchemaKind::Settings => &self.settings_schema,
        }
    }

    pub fn kind_mut(&mut self, kind: SchemaKind) -> &mut KindConfig {
        match kind {
            SchemaKind::Agent => &mut self.agent_schema,
            SchemaKind::Command => &mut self.command_schema,
            SchemaKind::Settings => &mut self.settings_schema,
        }
    }
}

fn convert_kind(raw: Option<RawKindConfig>, section: &str) -> Result<KindConfig, String> {
    let Some(raw) = raw else {
        return Ok(KindConfig::default());
    };

    if raw.custom_validation.is_some() {
        debug!("{section}.customValidation is only supported in script configuration");
    }

    let extend = parse_fields(&raw.extend).map_err(|e| format!("{section}.extend: {e}"))?;
    let override_fields = raw
        .override_fields
        .as_ref()
        .map(parse_fields)
        .transpose()
        .map_err(|e| format!("{section}.override: {e}"))?;

    Ok(KindConfig {
        extend,
        override_fields,
        custom_validation: None,
    })
}

fn parse_fields(map: &Map<String, Value>) -> Result<Vec<FieldSpec>, String> {
    map.iter()
        .map(|(name, descriptor)| FieldSpec::from_descriptor(name, descriptor))
        .collect()
}
