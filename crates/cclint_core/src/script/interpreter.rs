//! Tree-walking evaluator with a step budget and a wall-clock deadline.
//!
//! Scripts have no access to the filesystem, the network, the process or
//! the clock. The only things they can reach are their own bindings and the
//! builtins listed in [`BUILTINS`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::RegexBuilder;

use super::parser::{BinaryOp, Expr, Program, UnaryOp};
use super::value::Value;
use crate::error::ScriptError;

pub(crate) const MAX_LIST_LEN: usize = 1_000_000;
const MAX_STRING_LEN: usize = 1 << 20;
const MAX_CALL_DEPTH: usize = 64;
/// Bounds `eval` recursion across nested calls; hooks run on worker threads.
const MAX_EVAL_DEPTH: usize = 512;
const DEFAULT_MAX_STEPS: u64 = 50_000_000;
const DEADLINE_CHECK_INTERVAL: u64 = 1024;
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Functions available to every script.
pub const BUILTINS: &[&str] = &[
    "len",
    "has",
    "keys",
    "contains",
    "starts_with",
    "ends_with",
    "lower",
    "upper",
    "trim",
    "matches",
    "type_of",
    "push",
    "concat",
    "join",
    "split",
    "range",
    "map",
    "filter",
    "any",
    "all",
    "error",
    "str",
];

/// Lexical environment as a persistent linked list of bindings.
#[derive(Clone, Default)]
pub struct Env {
    head: Option<Arc<Frame>>,
}

struct Frame {
    name: String,
    value: Value,
    parent: Option<Arc<Frame>>,
}

impl Env {
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Env {
        Env {
            head: Some(Arc::new(Frame {
                name: name.into(),
                value,
                parent: self.head.clone(),
            })),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.name == name {
                return Some(&f.value);
            }
            frame = f.parent.as_deref();
        }
        None
    }
}

/// A function value together with the environment it closes over.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Arc<Expr>,
    env: Env,
}

/// Execution limits for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_steps: u64,
    pub timeout: Duration,
}

impl Budget {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            timeout,
        }
    }
}

pub struct Interpreter {
    steps: u64,
    max_steps: u64,
    deadline: Instant,
    timeout: Duration,
    depth: usize,
    eval_depth: usize,
}

impl Interpreter {
    pub fn new(budget: Budget) -> Self {
        Self {
            steps: 0,
            max_steps: budget.max_steps,
            deadline: Instant::now() + budget.timeout,
            timeout: budget.timeout,
            depth: 0,
            eval_depth: 0,
        }
    }

    /// Evaluates top-level bindings in order and returns the exported value.
    pub fn run(&mut self, program: &Program) -> Result<Value, ScriptError> {
        let mut env = Env::default();
        for (name, expr) in &program.bindings {
            let value = self.eval(expr, &env)?;
            env = env.bind(name.as_str(), value);
        }
        self.eval(&program.export, &env)
    }

    /// Converts a result to JSON under the remaining budget.
    pub fn to_json(&mut self, value: &Value) -> Result<serde_json::Value, ScriptError> {
        value.to_json(&mut || self.tick())
    }

    fn tick(&mut self) -> Result<(), ScriptError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ScriptError::BudgetExceeded);
        }
        if self.steps % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            return Err(ScriptError::Timeout(self.timeout.as_millis()));
        }
        Ok(())
    }

    pub fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, ScriptError> {
        if self.eval_depth >= MAX_EVAL_DEPTH {
            return Err(ScriptError::runtime("expression evaluation nested too deeply"));
        }
        self.eval_depth += 1;
        let result = self.eval_node(expr, env);
        self.eval_depth -= 1;
        result
    }

    fn eval_node(&mut self, expr: &Expr, env: &Env) -> Result<Value, ScriptError> {
        self.tick()?;
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::str(s.as_str())),
            Expr::Ident(name) => resolve(name, env),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            }
            Expr::Object(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let value = self.eval(value, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::object(map))
            }
            Expr::Closure { params, body } => Ok(Value::Closure(Arc::new(Closure {
                params: params.clone(),
                body: Arc::clone(body),
                env: env.clone(),
            }))),
            Expr::Block { bindings, result } => {
                let mut scope = env.clone();
                for (name, expr) in bindings {
                    let value = self.eval(expr, &scope)?;
                    scope = scope.bind(name.as_str(), value);
                }
                self.eval(result, &scope)
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.eval(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, env)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(ScriptError::runtime(format!(
                            "cannot negate a {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            Expr::Binary(op, left, right) => self.binary(*op, left, right, env),
            Expr::Member(target, name) => {
                let target = self.eval(target, env)?;
                member(&target, name)
            }
            Expr::Index(target, index) => {
                let target = self.eval(target, env)?;
                let index = self.eval(index, env)?;
                index_value(&target, &index)
            }
            Expr::Call(callee, args) => {
                let callee = self.eval(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, args)
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        env: &Env,
    ) -> Result<Value, ScriptError> {
        let lhs = self.eval(left, env)?;
        match op {
            BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
            BinaryOp::And => return self.eval(right, env),
            BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
            BinaryOp::Or => return self.eval(right, env),
            BinaryOp::Coalesce if !matches!(lhs, Value::Null) => return Ok(lhs),
            BinaryOp::Coalesce => return self.eval(right, env),
            _ => {}
        }
        let rhs = self.eval(right, env)?;

        match op {
            BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinaryOp::NotEq => Ok(Value::Bool(lhs != rhs)),
            BinaryOp::Add => add(lhs, rhs),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = match (&lhs, &rhs) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => {
                        return Err(ScriptError::runtime(format!(
                            "cannot compare {} with {}",
                            lhs.type_name(),
                            rhs.type_name()
                        )));
                    }
                };
                let Some(ordering) = ordering else {
                    return Ok(Value::Bool(false));
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::LtEq => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let (Value::Number(a), Value::Number(b)) = (&lhs, &rhs) else {
                    return Err(ScriptError::runtime(format!(
                        "arithmetic needs numbers, got {} and {}",
                        lhs.type_name(),
                        rhs.type_name()
                    )));
                };
                Ok(Value::Number(match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => unreachable!(),
        }
    }

    /// Calls a function value with already-evaluated arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, ScriptError> {
        match callee {
            Value::Closure(closure) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(ScriptError::runtime("maximum call depth exceeded"));
                }
                let mut env = closure.env.clone();
                let mut args = args.into_iter();
                for param in &closure.params {
                    env = env.bind(param.as_str(), args.next().unwrap_or(Value::Null));
                }
                self.depth += 1;
                let result = self.eval(&closure.body, &env);
                self.depth -= 1;
                result
            }
            Value::Builtin(name) => self.builtin(name, args),
            other => Err(ScriptError::runtime(format!(
                "{} is not a function",
                other.type_name()
            ))),
        }
    }

    fn builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);

        match name {
            "len" => length(&arg(0)).map(|n| Value::Number(n as f64)),
            "has" => match (arg(0), arg(1)) {
                (Value::Object(map), Value::Str(key)) => Ok(Value::Bool(map.contains_key(&*key))),
                (Value::Null, _) => Ok(Value::Bool(false)),
                (other, _) => Err(type_error(name, "an object", &other)),
            },
            "keys" => match arg(0) {
                Value::Object(map) => Ok(Value::list(
                    map.keys().map(|k| Value::str(k.as_str())).collect(),
                )),
                other => Err(type_error(name, "an object", &other)),
            },
            "contains" => match (arg(0), arg(1)) {
                (Value::Str(haystack), Value::Str(needle)) => {
                    Ok(Value::Bool(haystack.contains(&*needle)))
                }
                (Value::List(items), needle) => Ok(Value::Bool(items.contains(&needle))),
                (Value::Object(map), Value::Str(key)) => Ok(Value::Bool(map.contains_key(&*key))),
                (Value::Null, _) => Ok(Value::Bool(false)),
                (other, _) => Err(type_error(name, "a string, array or object", &other)),
            },
            "starts_with" | "ends_with" => {
                let (s, affix) = (string_arg(name, &arg(0))?, string_arg(name, &arg(1))?);
                Ok(Value::Bool(if name == "starts_with" {
                    s.starts_with(&*affix)
                } else {
                    s.ends_with(&*affix)
                }))
            }
            "lower" => Ok(Value::str(string_arg(name, &arg(0))?.to_lowercase())),
            "upper" => Ok(Value::str(string_arg(name, &arg(0))?.to_uppercase())),
            "trim" => Ok(Value::str(string_arg(name, &arg(0))?.trim())),
            "matches" => {
                let (s, pattern) = (string_arg(name, &arg(0))?, string_arg(name, &arg(1))?);
                let regex = RegexBuilder::new(&pattern)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map_err(|e| ScriptError::runtime(format!("invalid pattern: {e}")))?;
                Ok(Value::Bool(regex.is_match(&s)))
            }
            "type_of" => Ok(Value::str(arg(0).type_name())),
            "str" => Ok(Value::str(check_string(arg(0).display())?)),
            "push" => match arg(0) {
                Value::List(items) => {
                    let mut items = Arc::unwrap_or_clone(items);
                    items.push(arg(1));
                    check_list(items)
                }
                other => Err(type_error(name, "an array", &other)),
            },
            "concat" => match (arg(0), arg(1)) {
                (Value::List(a), Value::List(b)) => {
                    let mut items = Arc::unwrap_or_clone(a);
                    items.extend(b.iter().cloned());
                    check_list(items)
                }
                (Value::Str(a), b) => Ok(Value::str(check_string(format!("{a}{}", b.display()))?)),
                (other, _) => Err(type_error(name, "an array or string", &other)),
            },
            "join" => {
                let items = self.materialize(name, &arg(0))?;
                let separator = match arg(1) {
                    Value::Null => ",".to_string(),
                    other => string_arg(name, &other)?.to_string(),
                };
                let joined = items
                    .iter()
                    .map(Value::display)
                    .collect::<Vec<_>>()
                    .join(&separator);
                Ok(Value::str(check_string(joined)?))
            }
            "split" => {
                let (s, separator) = (string_arg(name, &arg(0))?, string_arg(name, &arg(1))?);
                let parts: Vec<Value> = if separator.is_empty() {
                    s.chars().map(|c| Value::str(c.to_string())).collect()
                } else {
                    s.split(&*separator).map(Value::str).collect()
                };
                check_list(parts)
            }
            "range" => {
                let (start, end) = match (arg(0), arg(1)) {
                    (Value::Number(end), Value::Null) => (0.0, end),
                    (Value::Number(start), Value::Number(end)) => (start, end),
                    (other, _) => return Err(type_error(name, "numbers", &other)),
                };
                Ok(Value::Range(start as i64, (end as i64).max(start as i64)))
            }
            "map" | "filter" | "any" | "all" => self.higher_order(name, arg(0), arg(1)),
            "error" => Ok(Value::list(vec![Value::str(arg(0).display())])),
            other => Err(ScriptError::runtime(format!("unknown builtin '{other}'"))),
        }
    }

    fn higher_order(
        &mut self,
        name: &str,
        collection: Value,
        f: Value,
    ) -> Result<Value, ScriptError> {
        if !f.is_callable() {
            return Err(type_error(name, "a function as second argument", &f));
        }

        let mut mapped = Vec::new();
        let mut visit = |this: &mut Self, item: Value| -> Result<bool, ScriptError> {
            this.tick()?;
            let out = this.call(&f, vec![item.clone()])?;
            match name {
                "map" => {
                    mapped.push(out);
                    Ok(true)
                }
                "filter" => {
                    if out.is_truthy() {
                        mapped.push(item);
                    }
                    Ok(true)
                }
                "any" => Ok(!out.is_truthy()),
                _ => Ok(out.is_truthy()),
            }
        };

        let mut completed = true;
        match &collection {
            Value::Range(start, end) => {
                for i in *start..*end {
                    if !visit(self, Value::Number(i as f64))? {
                        completed = false;
                        break;
                    }
                }
            }
            Value::List(items) => {
                for item in items.iter() {
                    if !visit(self, item.clone())? {
                        completed = false;
                        break;
                    }
                }
            }
            Value::Null => {}
            other => return Err(type_error(name, "an array", other)),
        }

        match name {
            "any" => Ok(Value::Bool(!completed)),
            "all" => Ok(Value::Bool(completed)),
            _ => check_list(mapped),
        }
    }

    fn materialize(&mut self, name: &str, value: &Value) -> Result<Vec<Value>, ScriptError> {
        match value {
            Value::List(items) => Ok(items.as_ref().clone()),
            Value::Range(start, end) => {
                let len = end.saturating_sub(*start) as usize;
                if len > MAX_LIST_LEN {
                    return Err(ScriptError::runtime("list size limit exceeded"));
                }
                let mut items = Vec::with_capacity(len);
                for i in *start..*end {
                    self.tick()?;
                    items.push(Value::Number(i as f64));
                }
                Ok(items)
            }
            other => Err(type_error(name, "an array", other)),
        }
    }
}

fn resolve(name: &str, env: &Env) -> Result<Value, ScriptError> {
    if let Some(value) = env.lookup(name) {
        return Ok(value.clone());
    }
    BUILTINS
        .iter()
        .find(|b| **b == name)
        .copied()
        .map(Value::Builtin)
        .ok_or_else(|| ScriptError::runtime(format!("'{name}' is not defined")))
}

fn member(target: &Value, name: &str) -> Result<Value, ScriptError> {
    match target {
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::Null => Err(ScriptError::runtime(format!(
            "cannot read property '{name}' of null"
        ))),
        Value::Str(_) | Value::List(_) | Value::Range(..) if name == "length" => {
            length(target).map(|n| Value::Number(n as f64))
        }
        _ => Ok(Value::Null),
    }
}

fn index_value(target: &Value, index: &Value) -> Result<Value, ScriptError> {
    match (target, index) {
        (Value::Object(map), Value::Str(key)) => Ok(map.get(&**key).cloned().unwrap_or(Value::Null)),
        (Value::List(items), Value::Number(n)) => Ok(position(*n)
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null)),
        (Value::Str(s), Value::Number(n)) => Ok(position(*n)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::str(c.to_string()))
            .unwrap_or(Value::Null)),
        (Value::Range(start, end), Value::Number(n)) => Ok(position(*n)
            .map(|i| start + i as i64)
            .filter(|v| v < end)
            .map(|v| Value::Number(v as f64))
            .unwrap_or(Value::Null)),
        (_, Value::Str(key)) => member(target, key),
        (Value::Null, _) => Err(ScriptError::runtime("cannot index null")),
        _ => Ok(Value::Null),
    }
}

fn position(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

fn add(lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::List(a), Value::List(b)) => {
            let mut items = Arc::unwrap_or_clone(a);
            items.extend(b.iter().cloned());
            check_list(items)
        }
        (a @ Value::Str(_), b) | (a, b @ Value::Str(_)) => Ok(Value::str(check_string(format!(
            "{}{}",
            a.display(),
            b.display()
        ))?)),
        (a, b) => Err(ScriptError::runtime(format!(
            "cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn length(value: &Value) -> Result<usize, ScriptError> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.len()),
        Value::Object(map) => Ok(map.len()),
        Value::Range(start, end) => Ok(end.saturating_sub(*start) as usize),
        Value::Null => Ok(0),
        other => Err(type_error("len", "a string, array or object", other)),
    }
}

fn string_arg(name: &str, value: &Value) -> Result<Arc<str>, ScriptError> {
    match value {
        Value::Str(s) => Ok(Arc::clone(s)),
        other => Err(type_error(name, "a string", other)),
    }
}

fn check_string(s: String) -> Result<String, ScriptError> {
    if s.len() > MAX_STRING_LEN {
        return Err(ScriptError::runtime("string size limit exceeded"));
    }
    Ok(s)
}

fn check_list(items: Vec<Value>) -> Result<Value, ScriptError> {
    if items.len() > MAX_LIST_LEN {
        return Err(ScriptError::runtime("list size limit exceeded"));
    }
    Ok(Value::list(items))
}

fn type_error(name: &str, expected: &str, got: &Value) -> ScriptError {
    ScriptError::runtime(format!(
        "{name}() expects {expected}, got {}",
        got.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;
    use crate::script::parser::parse;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval_with(source: &str, budget: Budget) -> Result<Value, ScriptError> {
        let program = parse(tokenize(source)?)?;
        Interpreter::new(budget).run(&program)
    }

    fn eval(source: &str) -> Result<serde_json::Value, ScriptError> {
        let program = parse(tokenize(source)?)?;
        let mut interpreter = Interpreter::new(Budget::with_timeout(Duration::from_secs(5)));
        let value = interpreter.run(&program)?;
        interpreter.to_json(&value)
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval("export default 1 + 2 * 3").unwrap(), json!(7));
        assert_eq!(eval("export default 'a' + 1").unwrap(), json!("a1"));
        assert_eq!(eval("export default -(4 % 3)").unwrap(), json!(-1));
    }

    #[test]
    fn test_logic_returns_operands() {
        assert_eq!(eval("export default null ?? 'x'").unwrap(), json!("x"));
        assert_eq!(eval("export default 0 || 'y'").unwrap(), json!("y"));
        assert_eq!(eval("export default '' && 'z'").unwrap(), json!(""));
        assert_eq!(eval("export default false ?? 1").unwrap(), json!(false));
    }

    #[test]
    fn test_bindings_and_closures() {
        let result = eval(
            "let base = 10;\n\
             let add = |x| x + base;\n\
             export default map([1, 2], add)",
        )
        .unwrap();
        assert_eq!(result, json!([11, 12]));
    }

    #[test]
    fn test_fn_block_and_if() {
        let result = eval(
            "let check = fn(data) {\n\
               let p = data.priority ?? 0;\n\
               if p > 3 && !has(data, 'team') { ['high priority needs a team'] } else { [] }\n\
             };\n\
             export default [check({ priority: 5 }), check({ priority: 5, team: 'core' })]",
        )
        .unwrap();
        assert_eq!(result, json!([["high priority needs a team"], []]));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(
            eval("export default [len('abc'), lower('AB'), trim(' x '), type_of([])]").unwrap(),
            json!([3, "ab", "x", "array"])
        );
        assert_eq!(
            eval("export default join(filter(split('a,b,,c', ','), |s| len(s) > 0), '-')")
                .unwrap(),
            json!("a-b-c")
        );
        assert_eq!(
            eval("export default [matches('abc-1', '^[a-z]+-\\\\d$'), contains([1, 2], 2)]")
                .unwrap(),
            json!([true, true])
        );
        assert_eq!(eval("export default 'hello'.length").unwrap(), json!(5));
        assert_eq!(eval("export default keys({ b: 1, a: 2 })").unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_missing_member_is_null() {
        assert_eq!(eval("let o = {}; export default o.missing").unwrap(), json!(null));
        assert!(eval("let o = null; export default o.missing").is_err());
    }

    #[test]
    fn test_undefined_name() {
        assert!(matches!(
            eval("export default require('fs')"),
            Err(ScriptError::Runtime(_))
        ));
    }

    #[test]
    fn test_error_builtin() {
        assert_eq!(
            eval("export default error('boom')").unwrap(),
            json!(["boom"])
        );
    }

    #[test]
    fn test_step_budget() {
        let budget = Budget {
            max_steps: 10_000,
            timeout: Duration::from_secs(5),
        };
        assert_eq!(
            eval_with("export default any(range(1e9), |x| false)", budget).err(),
            Some(ScriptError::BudgetExceeded)
        );
    }

    #[test]
    fn test_deadline() {
        let result = eval_with(
            "export default any(range(1e12), |x| false)",
            Budget::with_timeout(Duration::from_millis(50)),
        );
        assert_eq!(result.err(), Some(ScriptError::Timeout(50)));
    }

    #[test]
    fn test_json_conversion_counts_against_deadline() {
        let program = parse(
            tokenize("export default map(range(40), |i| range(1000000))").unwrap(),
        )
        .unwrap();
        let mut interpreter = Interpreter::new(Budget::with_timeout(Duration::from_millis(50)));
        let value = interpreter.run(&program).unwrap();

        let started = Instant::now();
        assert_eq!(interpreter.to_json(&value).err(), Some(ScriptError::Timeout(50)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_eval_depth() {
        let source = format!(
            "let y = |f| {}f(f){};\nexport default y(y)",
            "[".repeat(100),
            "]".repeat(100)
        );
        assert_eq!(
            eval(&source),
            Err(ScriptError::Runtime(
                "expression evaluation nested too deeply".to_string()
            ))
        );
    }

    #[test]
    fn test_call_depth() {
        let result = eval("let y = |f| f(f);\nexport default y(y)");
        assert_eq!(
            result,
            Err(ScriptError::Runtime("maximum call depth exceeded".to_string()))
        );
    }

    #[test]
    fn test_size_limits() {
        let result = eval(
            "let double = |s| s + s;\n\
             let s = double(double(double(double(double(double(double(double(double(double('abcdefghijklmnop'))))))))));\n\
             export default double(double(double(double(double(double(double(s)))))))",
        );
        assert!(matches!(result, Err(ScriptError::Runtime(_))));
    }
}
