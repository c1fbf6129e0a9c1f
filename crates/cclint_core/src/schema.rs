//! Field-descriptor schemas for each artifact kind.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s plus a strictness flag.
//! Configuration can widen a base schema (`extend` appends descriptors) or
//! replace it outright (`override`). Validation yields structured
//! [`SchemaIssue`]s which the linters translate into findings.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::CclintConfig;

/// Models accepted by agents and commands.
pub const MODELS: &[&str] = &["sonnet", "opus", "haiku", "sonnet[1m]", "opusplan", "inherit"];

/// Agent colors. Hex values and other CSS names are not accepted.
pub const AGENT_COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "purple", "orange", "pink", "cyan",
];

/// Artifact kinds that are validated through a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Agent,
    Command,
    Settings,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Agent => f.write_str("agent"),
            SchemaKind::Command => f.write_str("command"),
            SchemaKind::Settings => f.write_str("settings"),
        }
    }
}

/// Constraints on a string value.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub pattern: Option<Regex>,
    /// Human-readable explanation used when `pattern` does not match.
    pub pattern_hint: Option<String>,
    pub allowed: Option<Vec<String>>,
}

/// The shape a field value must have.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Any,
    String(StringRules),
    Number {
        integer: bool,
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Array(Box<TypeSpec>),
    /// Object with arbitrary keys whose values share one type.
    Map(Box<TypeSpec>),
    Object(Schema),
    OneOf(Vec<TypeSpec>),
}

impl TypeSpec {
    pub fn string() -> Self {
        TypeSpec::String(StringRules::default())
    }

    pub fn non_empty_string() -> Self {
        TypeSpec::String(StringRules {
            min_length: Some(1),
            ..StringRules::default()
        })
    }

    pub fn one_of_strings(values: &[&str]) -> Self {
        TypeSpec::String(StringRules {
            allowed: Some(values.iter().map(|v| v.to_string()).collect()),
            ..StringRules::default()
        })
    }

    pub fn number() -> Self {
        TypeSpec::Number {
            integer: false,
            min: None,
            max: None,
        }
    }

    pub fn array_of(inner: TypeSpec) -> Self {
        TypeSpec::Array(Box::new(inner))
    }

    pub fn map_of(inner: TypeSpec) -> Self {
        TypeSpec::Map(Box::new(inner))
    }

    fn describe(&self) -> String {
        match self {
            TypeSpec::Any => "any value".to_string(),
            TypeSpec::String(rules) => match &rules.allowed {
                Some(values) => format!("one of: {}", values.join(", ")),
                None => "string".to_string(),
            },
            TypeSpec::Number { integer: true, .. } => "integer".to_string(),
            TypeSpec::Number { .. } => "number".to_string(),
            TypeSpec::Boolean => "boolean".to_string(),
            TypeSpec::Array(inner) => format!("array of {}", inner.describe()),
            TypeSpec::Map(_) | TypeSpec::Object(_) => "object".to_string(),
            TypeSpec::OneOf(variants) => variants
                .iter()
                .map(TypeSpec::describe)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }

    fn set_strict(&mut self, strict: bool) {
        match self {
            TypeSpec::Object(schema) => schema.set_strict(strict),
            TypeSpec::Array(inner) | TypeSpec::Map(inner) => inner.set_strict(strict),
            TypeSpec::OneOf(variants) => variants.iter_mut().for_each(|v| v.set_strict(strict)),
            _ => {}
        }
    }
}

/// One named field of a schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    pub ty: TypeSpec,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self {
            name: name.into(),
            required: true,
            ty,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self {
            name: name.into(),
            required: false,
            ty,
        }
    }

    /// Parses a type descriptor from configuration.
    ///
    /// Accepts shorthand strings (`"string"`, `"number?"`, `"string[]"`) or an
    /// object such as `{ "type": "string", "enum": ["a", "b"], "optional": true }`.
    pub fn from_descriptor(name: &str, descriptor: &Value) -> Result<Self, String> {
        match descriptor {
            Value::String(shorthand) => {
                let (ty_name, optional) = match shorthand.trim().strip_suffix('?') {
                    Some(stripped) => (stripped.trim(), true),
                    None => (shorthand.trim(), false),
                };
                let ty = parse_type_name(ty_name)
                    .ok_or_else(|| format!("unknown type '{ty_name}' for field '{name}'"))?;
                Ok(Self {
                    name: name.to_string(),
                    required: !optional,
                    ty,
                })
            }
            Value::Object(obj) => parse_descriptor_object(name, obj),
            other => Err(format!(
                "descriptor for field '{name}' must be a string or object, got {}",
                json_type_name(other)
            )),
        }
    }
}

fn parse_type_name(name: &str) -> Option<TypeSpec> {
    if let Some(inner) = name.strip_suffix("[]") {
        return parse_type_name(inner).map(TypeSpec::array_of);
    }
    match name {
        "string" => Some(TypeSpec::string()),
        "number" => Some(TypeSpec::number()),
        "integer" => Some(TypeSpec::Number {
            integer: true,
            min: None,
            max: None,
        }),
        "boolean" => Some(TypeSpec::Boolean),
        "any" => Some(TypeSpec::Any),
        "object" => Some(TypeSpec::map_of(TypeSpec::Any)),
        _ => None,
    }
}

fn parse_descriptor_object(name: &str, obj: &Map<String, Value>) -> Result<FieldSpec, String> {
    let ty_name = match obj.get("type") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(format!(
                "'type' of field '{name}' must be a string, got {}",
                json_type_name(other)
            ));
        }
        None if obj.contains_key("enum") => "string",
        None => "any",
    };
    let mut ty =
        parse_type_name(ty_name).ok_or_else(|| format!("unknown type '{ty_name}' for field '{name}'"))?;

    let optional = match obj.get("optional") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(format!("'optional' of field '{name}' must be a boolean")),
    };

    match &mut ty {
        TypeSpec::String(rules) => {
            if let Some(values) = obj.get("enum") {
                let values = values
                    .as_array()
                    .ok_or_else(|| format!("'enum' of field '{name}' must be an array"))?;
                let allowed = values
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| format!("'enum' of field '{name}' must contain strings"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                rules.allowed = Some(allowed);
            }
            if let Some(pattern) = obj.get("pattern") {
                let pattern = pattern
                    .as_str()
                    .ok_or_else(|| format!("'pattern' of field '{name}' must be a string"))?;
                let regex = Regex::new(pattern)
                    .map_err(|e| format!("invalid pattern for field '{name}': {e}"))?;
                rules.pattern_hint = Some(format!("must match pattern {pattern}"));
                rules.pattern = Some(regex);
            }
            if let Some(min) = obj.get("minLength") {
                let min = min
                    .as_u64()
                    .ok_or_else(|| format!("'minLength' of field '{name}' must be a non-negative integer"))?;
                rules.min_length = Some(min as usize);
            }
        }
        TypeSpec::Number { min, max, .. } => {
            if let Some(value) = obj.get("min") {
                *min = Some(
                    value
                        .as_f64()
                        .ok_or_else(|| format!("'min' of field '{name}' must be a number"))?,
                );
            }
            if let Some(value) = obj.get("max") {
                *max = Some(
                    value
                        .as_f64()
                        .ok_or_else(|| format!("'max' of field '{name}' must be a number"))?,
                );
            }
        }
        _ => {}
    }

    Ok(FieldSpec {
        name: name.to_string(),
        required: !optional,
        ty,
    })
}

/// What went wrong with one field.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// A required field is absent (or null).
    Missing,
    /// A field the schema does not know about (strict mode only).
    Unrecognized,
    /// The value has the wrong type or violates a constraint.
    Invalid(String),
}

/// A single schema violation located by a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    /// Dotted path such as `name` or `hooks.PreToolUse[0].matcher`;
    /// empty for the document root.
    pub path: String,
    pub kind: IssueKind,
}

/// A composed schema for one artifact kind.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    /// When true, unknown fields are reported; otherwise they pass through.
    pub strict: bool,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            strict: true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Adds or replaces fields by name.
    pub fn extend(&mut self, extra: impl IntoIterator<Item = FieldSpec>) {
        for field in extra {
            match self.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => self.fields.push(field),
            }
        }
    }

    /// Sets strictness on this schema and every nested object schema.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
        for field in &mut self.fields {
            field.ty.set_strict(strict);
        }
    }

    /// Validates a parsed document against this schema.
    pub fn validate(&self, value: &Value) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        match value {
            Value::Object(map) => self.validate_object(map, "", &mut issues),
            other => issues.push(SchemaIssue {
                path: String::new(),
                kind: IssueKind::Invalid(format!(
                    "expected an object, received {}",
                    json_type_name(other)
                )),
            }),
        }
        issues
    }

    fn validate_object(&self, map: &Map<String, Value>, prefix: &str, issues: &mut Vec<SchemaIssue>) {
        for field in &self.fields {
            let path = join_path(prefix, &field.name);
            match map.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        issues.push(SchemaIssue {
                            path,
                            kind: IssueKind::Missing,
                        });
                    }
                }
                Some(value) => check_value(&field.ty, value, &path, issues),
            }
        }

        if self.strict {
            for key in map.keys() {
                if self.field(key).is_none() {
                    issues.push(SchemaIssue {
                        path: join_path(prefix, key),
                        kind: IssueKind::Unrecognized,
                    });
                }
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_value(ty: &TypeSpec, value: &Value, path: &str, issues: &mut Vec<SchemaIssue>) {
    let mut invalid = |message: String| {
        issues.push(SchemaIssue {
            path: path.to_string(),
            kind: IssueKind::Invalid(message),
        })
    };

    match ty {
        TypeSpec::Any => {}
        TypeSpec::String(rules) => {
            let Some(s) = value.as_str() else {
                invalid(format!("expected string, received {}", json_type_name(value)));
                return;
            };
            if let Some(allowed) = &rules.allowed
                && !allowed.iter().any(|a| a == s)
            {
                invalid(format!("must be one of: {}", allowed.join(", ")));
                return;
            }
            if let Some(min) = rules.min_length
                && s.trim().chars().count() < min
            {
                if min <= 1 {
                    invalid("must not be empty".to_string());
                } else {
                    invalid(format!("must be at least {min} characters"));
                }
                return;
            }
            if let Some(pattern) = &rules.pattern
                && !pattern.is_match(s)
            {
                invalid(
                    rules
                        .pattern_hint
                        .clone()
                        .unwrap_or_else(|| format!("must match pattern {}", pattern.as_str())),
                );
            }
        }
        TypeSpec::Number { integer, min, max } => {
            let Some(n) = value.as_f64() else {
                invalid(format!("expected number, received {}", json_type_name(value)));
                return;
            };
            if *integer && n.fract() != 0.0 {
                invalid("expected integer".to_string());
            } else if let Some(min) = min
                && n < *min
            {
                invalid(format!("must be at least {min}"));
            } else if let Some(max) = max
                && n > *max
            {
                invalid(format!("must be at most {max}"));
            }
        }
        TypeSpec::Boolean => {
            if !value.is_boolean() {
                invalid(format!("expected boolean, received {}", json_type_name(value)));
            }
        }
        TypeSpec::Array(inner) => {
            let Some(items) = value.as_array() else {
                invalid(format!("expected array, received {}", json_type_name(value)));
                return;
            };
            for (i, item) in items.iter().enumerate() {
                check_value(inner, item, &format!("{path}[{i}]"), issues);
            }
        }
        TypeSpec::Map(inner) => {
            let Some(map) = value.as_object() else {
                invalid(format!("expected object, received {}", json_type_name(value)));
                return;
            };
            for (key, item) in map {
                check_value(inner, item, &join_path(path, key), issues);
            }
        }
        TypeSpec::Object(schema) => {
            let Some(map) = value.as_object() else {
                invalid(format!("expected object, received {}", json_type_name(value)));
                return;
            };
            schema.validate_object(map, path, issues);
        }
        TypeSpec::OneOf(variants) => {
            let matched = variants.iter().any(|variant| {
                let mut scratch = Vec::new();
                check_value(variant, value, path, &mut scratch);
                scratch.is_empty()
            });
            if !matched {
                invalid(format!(
                    "expected {}, received {}",
                    ty.describe(),
                    json_type_name(value)
                ));
            }
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn tools_type() -> TypeSpec {
    TypeSpec::OneOf(vec![
        TypeSpec::string(),
        TypeSpec::array_of(TypeSpec::string()),
    ])
}

fn agent_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[a-z0-9-]+$").expect("valid agent name pattern"))
}

/// Base schema for agent definitions.
pub fn agent_schema() -> Schema {
    let name_rules = StringRules {
        min_length: Some(1),
        pattern: Some(agent_name_pattern().clone()),
        pattern_hint: Some("must contain only lowercase letters, numbers, and hyphens".to_string()),
        allowed: None,
    };

    Schema::new(vec![
        FieldSpec::required("name", TypeSpec::String(name_rules)),
        FieldSpec::required("description", TypeSpec::non_empty_string()),
        FieldSpec::optional("tools", tools_type()),
        FieldSpec::optional("allowed-tools", tools_type()),
        FieldSpec::optional("model", TypeSpec::one_of_strings(MODELS)),
        FieldSpec::optional("color", TypeSpec::one_of_strings(AGENT_COLORS)),
    ])
}

/// Base schema for slash-command definitions. Every field is optional.
pub fn command_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::optional("allowed-tools", TypeSpec::string()),
        FieldSpec::optional("argument-hint", TypeSpec::string()),
        FieldSpec::optional("description", TypeSpec::string()),
        FieldSpec::optional("model", TypeSpec::one_of_strings(MODELS)),
        FieldSpec::optional("disable-model-invocation", TypeSpec::Boolean),
    ])
}

/// Base schema for `.claude/settings*.json`.
pub fn settings_schema() -> Schema {
    let hook_command = Schema::new(vec![
        FieldSpec::required("type", TypeSpec::one_of_strings(&["command"])),
        FieldSpec::required("command", TypeSpec::string()),
        FieldSpec::optional(
            "timeout",
            TypeSpec::Number {
                integer: false,
                min: Some(0.0),
                max: None,
            },
        ),
    ]);
    let hook_matcher = Schema::new(vec![
        FieldSpec::required("matcher", TypeSpec::string()),
        FieldSpec::required("hooks", TypeSpec::array_of(TypeSpec::Object(hook_command))),
    ]);
    let permissions = Schema::new(vec![
        FieldSpec::optional("allow", TypeSpec::array_of(TypeSpec::string())),
        FieldSpec::optional("deny", TypeSpec::array_of(TypeSpec::string())),
        FieldSpec::optional("ask", TypeSpec::array_of(TypeSpec::string())),
        FieldSpec::optional("additionalDirectories", TypeSpec::array_of(TypeSpec::string())),
        FieldSpec::optional("defaultMode", TypeSpec::string()),
        FieldSpec::optional("disableBypassPermissionsMode", TypeSpec::string()),
    ]);
    let string_list = || TypeSpec::array_of(TypeSpec::string());

    Schema::new(vec![
        FieldSpec::optional("$schema", TypeSpec::string()),
        FieldSpec::optional("apiKeyHelper", TypeSpec::string()),
        FieldSpec::optional("awsAuthRefresh", TypeSpec::string()),
        FieldSpec::optional("awsCredentialExport", TypeSpec::string()),
        FieldSpec::optional(
            "cleanupPeriodDays",
            TypeSpec::Number {
                integer: true,
                min: Some(0.0),
                max: None,
            },
        ),
        FieldSpec::optional("env", TypeSpec::map_of(TypeSpec::string())),
        FieldSpec::optional("includeCoAuthoredBy", TypeSpec::Boolean),
        FieldSpec::optional("permissions", TypeSpec::Object(permissions)),
        FieldSpec::optional(
            "hooks",
            TypeSpec::map_of(TypeSpec::array_of(TypeSpec::Object(hook_matcher))),
        ),
        FieldSpec::optional("disableAllHooks", TypeSpec::Boolean),
        FieldSpec::optional("model", TypeSpec::string()),
        FieldSpec::optional("statusLine", TypeSpec::map_of(TypeSpec::Any)),
        FieldSpec::optional("outputStyle", TypeSpec::string()),
        FieldSpec::optional("forceLoginMethod", TypeSpec::one_of_strings(&["claudeai", "console"])),
        FieldSpec::optional("forceLoginOrgUUID", TypeSpec::string()),
        FieldSpec::optional("enableAllProjectMcpServers", TypeSpec::Boolean),
        FieldSpec::optional("enabledMcpjsonServers", string_list()),
        FieldSpec::optional("disabledMcpjsonServers", string_list()),
    ])
}

/// Base schema for `kind` before any configuration is applied.
pub fn base_schema(kind: SchemaKind) -> Schema {
    match kind {
        SchemaKind::Agent => agent_schema(),
        SchemaKind::Command => command_schema(),
        SchemaKind::Settings => settings_schema(),
    }
}

/// Composes the effective schema for `kind`.
///
/// An `override` replaces the base schema entirely; otherwise `extend` fields
/// are merged into it. Both are ignored unless `custom_schemas` is set.
/// Strictness always follows `rules.strict` (default strict).
pub fn get_schema(kind: SchemaKind, config: Option<&CclintConfig>, custom_schemas: bool) -> Schema {
    let mut schema = base_schema(kind);

    if let Some(config) = config {
        if custom_schemas {
            let kind_config = config.kind(kind);
            if let Some(fields) = &kind_config.override_fields {
                schema = Schema::new(fields.clone());
            } else if !kind_config.extend.is_empty() {
                schema.extend(kind_config.extend.iter().cloned());
            }
        }
        schema.set_strict(config.rules.strict);
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn issue(path: &str, kind: IssueKind) -> SchemaIssue {
        SchemaIssue {
            path: path.to_string(),
            kind,
        }
    }

    #[test]
    fn test_valid_agent() {
        let issues = agent_schema().validate(&json!({
            "name": "helper",
            "description": "does things",
            "tools": "Read, Grep",
            "model": "sonnet",
            "color": "blue"
        }));
        assert_eq!(issues, vec![]);
    }

    #[test]
    fn test_missing_name() {
        let issues = agent_schema().validate(&json!({ "description": "does things" }));
        assert_eq!(issues, vec![issue("name", IssueKind::Missing)]);
    }

    #[test]
    fn test_unknown_field_strict_and_passthrough() {
        let data = json!({ "name": "a", "description": "b", "foo": 1 });

        let strict = agent_schema();
        assert_eq!(
            strict.validate(&data),
            vec![issue("foo", IssueKind::Unrecognized)]
        );

        let mut lenient = agent_schema();
        lenient.set_strict(false);
        assert!(lenient.validate(&data).is_empty());
    }

    #[rstest]
    #[case::hex("#FF0000", false)]
    #[case::named_allowed("blue", true)]
    #[case::css_named_not_allowed("teal", false)]
    #[case::cyan("cyan", true)]
    fn test_color_allowlist(#[case] color: &str, #[case] ok: bool) {
        let issues = agent_schema().validate(&json!({
            "name": "a",
            "description": "b",
            "color": color
        }));
        assert_eq!(issues.is_empty(), ok, "{color}: {issues:?}");
    }

    #[rstest]
    #[case::uppercase("Helper")]
    #[case::underscore("my_agent")]
    #[case::space("my agent")]
    fn test_invalid_agent_names(#[case] name: &str) {
        let issues = agent_schema().validate(&json!({ "name": name, "description": "b" }));
        assert_eq!(
            issues,
            vec![issue(
                "name",
                IssueKind::Invalid(
                    "must contain only lowercase letters, numbers, and hyphens".to_string()
                )
            )]
        );
    }

    #[test]
    fn test_tools_accepts_string_or_array() {
        let schema = agent_schema();
        for tools in [json!("*"), json!("Read, Write"), json!(["Read", "Bash(git:*)"])] {
            let data = json!({ "name": "a", "description": "b", "tools": tools });
            assert!(schema.validate(&data).is_empty());
        }
        let data = json!({ "name": "a", "description": "b", "tools": 5 });
        assert_eq!(schema.validate(&data).len(), 1);
    }

    #[test]
    fn test_command_fields_all_optional() {
        assert!(command_schema().validate(&json!({})).is_empty());
        let issues = command_schema().validate(&json!({ "model": "gpt" }));
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_settings_hook_shape() {
        let issues = settings_schema().validate(&json!({
            "hooks": {
                "PreToolUse": [
                    { "hooks": [ { "type": "script", "command": "echo" } ] }
                ]
            }
        }));
        assert_eq!(
            issues,
            vec![
                issue("hooks.PreToolUse[0].matcher", IssueKind::Missing),
                issue(
                    "hooks.PreToolUse[0].hooks[0].type",
                    IssueKind::Invalid("must be one of: command".to_string())
                ),
            ]
        );
    }

    #[test]
    fn test_settings_unknown_event_is_not_a_schema_error() {
        let issues = settings_schema().validate(&json!({
            "hooks": { "Frobnicate": [ { "matcher": "", "hooks": [] } ] }
        }));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_root_must_be_object() {
        let issues = settings_schema().validate(&json!([1, 2]));
        assert_eq!(
            issues,
            vec![issue(
                "",
                IssueKind::Invalid("expected an object, received array".to_string())
            )]
        );
    }

    #[rstest]
    #[case::required_string("string", true)]
    #[case::optional_number("number?", false)]
    #[case::array("string[]?", false)]
    fn test_descriptor_shorthand(#[case] descriptor: &str, #[case] required: bool) {
        let field = FieldSpec::from_descriptor("x", &json!(descriptor)).unwrap();
        assert_eq!(field.required, required);
    }

    #[test]
    fn test_descriptor_object() {
        let field = FieldSpec::from_descriptor(
            "tier",
            &json!({ "type": "string", "enum": ["gold", "silver"], "optional": true }),
        )
        .unwrap();
        assert!(!field.required);

        let schema = Schema::new(vec![field]);
        assert!(schema.validate(&json!({ "tier": "gold" })).is_empty());
        assert_eq!(schema.validate(&json!({ "tier": "bronze" })).len(), 1);
    }

    #[test]
    fn test_descriptor_errors() {
        assert!(FieldSpec::from_descriptor("x", &json!("strin")).is_err());
        assert!(FieldSpec::from_descriptor("x", &json!(3)).is_err());
        assert!(FieldSpec::from_descriptor("x", &json!({ "type": "string", "pattern": "(" })).is_err());
    }

    #[test]
    fn test_number_bounds() {
        let field = FieldSpec::from_descriptor(
            "priority",
            &json!({ "type": "integer", "min": 1, "max": 5 }),
        )
        .unwrap();
        let schema = Schema::new(vec![field]);
        assert!(schema.validate(&json!({ "priority": 3 })).is_empty());
        assert_eq!(schema.validate(&json!({ "priority": 9 })).len(), 1);
        assert_eq!(schema.validate(&json!({ "priority": 2.5 })).len(), 1);
    }

    #[test]
    fn test_extend_replaces_same_name() {
        let mut schema = agent_schema();
        schema.extend([FieldSpec::optional("name", TypeSpec::string())]);
        assert!(!schema.field("name").unwrap().required);
        assert_eq!(schema.fields.len(), agent_schema().fields.len());
    }
}
