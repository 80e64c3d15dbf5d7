//! Namespace execution for environment programs.
//!
//! Every [`Namespace`] owns its bindings outright. Nothing is cached between
//! executions, so each evaluation starts from a clean slate. The only
//! capabilities a program has are the builtins listed in [`call`].

use crate::ast::{Expr, Program};
use crate::error::EnvLangError;
use crate::parser::parse_program;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix of names bound by the interpreter itself
pub const IMPLICIT_PREFIX: &str = "__";

/// An isolated set of bindings produced by executing a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    bindings: BTreeMap<String, Value>,
}

impl Namespace {
    /// Create a namespace with only the implicit `__name__` binding.
    pub fn new(name: &str) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert("__name__".to_string(), Value::String(name.to_string()));
        Self { bindings }
    }

    /// Create a namespace for a file, additionally binding `__file__`.
    pub fn for_file(name: &str, path: &Path) -> Self {
        let mut namespace = Self::new(name);
        namespace.bindings.insert(
            "__file__".to_string(),
            Value::String(path.to_string_lossy().into_owned()),
        );
        namespace
    }

    /// Parse and run `source` against this namespace.
    ///
    /// The whole source is parsed before any statement runs. On error the
    /// namespace may hold bindings from statements that already ran; callers
    /// that need all-or-nothing semantics should discard it.
    pub fn execute(&mut self, source: &str) -> Result<(), EnvLangError> {
        let program = parse_program(source)?;
        self.run(&program)
    }

    pub fn run(&mut self, program: &Program) -> Result<(), EnvLangError> {
        for statement in &program.statements {
            let value = self.eval(&statement.value, statement.line)?;
            self.bindings.insert(statement.name.clone(), value);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bindings visible to requests: everything except implicit names.
    pub fn into_exported(self) -> BTreeMap<String, Value> {
        self.bindings
            .into_iter()
            .filter(|(name, _)| !name.starts_with(IMPLICIT_PREFIX))
            .collect()
    }

    fn eval(&self, expr: &Expr, line: usize) -> Result<Value, EnvLangError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item, line))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Dict(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = match self.eval(key, line)? {
                        Value::String(key) => key,
                        other => {
                            return Err(EnvLangError::DictKey {
                                found: type_name(&other),
                                line,
                            })
                        }
                    };
                    map.insert(key, self.eval(value, line)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Name(name) => self.get(name).cloned().ok_or_else(|| EnvLangError::Undefined {
                name: name.clone(),
                line,
            }),
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, line))
                    .collect::<Result<Vec<_>, _>>()?;
                call(function, args, line)
            }
            Expr::Subscript { target, index } => {
                subscript(self.eval(target, line)?, self.eval(index, line)?, line)
            }
            Expr::Add(lhs, rhs) => add(self.eval(lhs, line)?, self.eval(rhs, line)?, line),
        }
    }
}

/// Execute `source` in a fresh namespace called `name`.
pub fn execute(name: &str, source: &str) -> Result<Namespace, EnvLangError> {
    let mut namespace = Namespace::new(name);
    namespace.execute(source)?;
    Ok(namespace)
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Render a value the way `str(...)` does.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

fn add(lhs: Value, rhs: Value, line: usize) -> Result<Value, EnvLangError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                if let Some(sum) = a.checked_add(b) {
                    return Ok(Value::Number(sum.into()));
                }
            }
            let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
            Ok(serde_json::Number::from_f64(sum)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Ok(Value::Array(a))
        }
        (Value::Object(mut a), Value::Object(b)) => {
            a.extend(b);
            Ok(Value::Object(a))
        }
        (a, b) => Err(EnvLangError::Operands {
            left: type_name(&a),
            right: type_name(&b),
            line,
        }),
    }
}

fn subscript(target: Value, index: Value, line: usize) -> Result<Value, EnvLangError> {
    match (&target, &index) {
        (Value::Array(items), Value::Number(n)) => {
            let len = items.len() as i64;
            let i = n.as_i64().ok_or_else(|| EnvLangError::Subscript {
                message: "list indices must be integers".to_string(),
                line,
            })?;
            let resolved = if i < 0 { len + i } else { i };
            if resolved < 0 || resolved >= len {
                return Err(EnvLangError::Subscript {
                    message: format!("list index {} out of range", i),
                    line,
                });
            }
            Ok(items[resolved as usize].clone())
        }
        (Value::Object(map), Value::String(key)) => {
            map.get(key).cloned().ok_or_else(|| EnvLangError::Subscript {
                message: format!("key '{}' not found", key),
                line,
            })
        }
        _ => Err(EnvLangError::Subscript {
            message: format!(
                "'{}' is not subscriptable with '{}'",
                type_name(&target),
                type_name(&index)
            ),
            line,
        }),
    }
}

/// Builtins available to environment programs:
/// - `env(name[, default])` reads a process environment variable
/// - `str(value)` converts to a string
fn call(function: &str, args: Vec<Value>, line: usize) -> Result<Value, EnvLangError> {
    let arity = |expected: &str| EnvLangError::Call {
        message: format!("{}() takes {} argument(s), got {}", function, expected, args.len()),
        line,
    };
    match function {
        "env" => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity("1 or 2"));
            }
            let name = match &args[0] {
                Value::String(name) => name,
                other => {
                    return Err(EnvLangError::Call {
                        message: format!("env() name must be str, not '{}'", type_name(other)),
                        line,
                    })
                }
            };
            match std::env::var(name) {
                Ok(value) => Ok(Value::String(value)),
                Err(_) => Ok(args.get(1).cloned().unwrap_or(Value::Null)),
            }
        }
        "str" => {
            if args.len() != 1 {
                return Err(arity("1"));
            }
            Ok(Value::String(to_display_string(&args[0])))
        }
        _ => Err(EnvLangError::Call {
            message: format!("name '{}' is not a known function", function),
            line,
        }),
    }
}
