//! Runtime values of the configuration script language.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};

use super::interpreter::Closure;
use crate::error::ScriptError;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Object(Arc<BTreeMap<String, Value>>),
    /// Half-open integer range produced by `range()`; iterated lazily.
    Range(i64, i64),
    Closure(Arc<Closure>),
    Builtin(&'static str),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn object(map: BTreeMap<String, Value>) -> Self {
        Value::Object(Arc::new(map))
    }

    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::str(s.as_str()),
            Json::Array(items) => Value::list(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to JSON. Functions have no JSON form and are rejected.
    ///
    /// `tick` is charged once per produced node, so expanding ranges and
    /// shared lists stays under the caller's execution budget.
    pub fn to_json(
        &self,
        tick: &mut dyn FnMut() -> Result<(), ScriptError>,
    ) -> Result<Json, ScriptError> {
        tick()?;
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => Json::String(s.to_string()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| item.to_json(tick))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map.iter() {
                    out.insert(k.clone(), v.to_json(tick)?);
                }
                Json::Object(out)
            }
            Value::Range(start, end) => {
                let mut out = Vec::new();
                for n in *start..*end {
                    tick()?;
                    out.push(Json::from(n));
                }
                Json::Array(out)
            }
            Value::Closure(_) | Value::Builtin(_) => {
                return Err(ScriptError::runtime(
                    "functions can only appear in customValidation",
                ));
            }
        })
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) | Value::Range(..) => "array",
            Value::Object(_) => "object",
            Value::Closure(_) | Value::Builtin(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value the way string concatenation sees it.
    pub fn display(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(","),
            Value::Range(start, end) => format!("range({start}, {end})"),
            Value::Object(_) => "[object]".to_string(),
            Value::Closure(_) | Value::Builtin(_) => "[function]".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Range(a0, a1), Value::Range(b0, b1)) => a0 == b0 && a1 == b1,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
            other => f.write_str(&other.display()),
        }
    }
}

fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Json::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
