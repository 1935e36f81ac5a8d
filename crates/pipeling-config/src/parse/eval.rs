//! Expression evaluation for `${path}` references inside block specs.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use thiserror::Error;

static RE_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Failed to convert value of '{path}': {message}")]
    Convert { path: String, message: String },
}

/// Variables visible to expressions while decoding a block.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    variables: Map<String, JsonValue>,
}

impl EvalContext {
    /// A context with no variables at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JsonValue) {
        self.variables.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolves a dotted path such as `integration.slack.ops`.
    pub fn lookup(&self, path: &str) -> Option<&JsonValue> {
        let mut parts = path.split('.');
        let mut current = self.variables.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Returns the referenced path if `s` is a whole-string `${...}` expression.
    pub fn expression(s: &str) -> Option<&str> {
        RE_EXPRESSION
            .captures(s)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Replaces every expression in `value` with the variable it references.
    pub fn evaluate(&self, value: &Value) -> Result<Value, EvalError> {
        match value {
            Value::String(s) => match Self::expression(s) {
                Some(path) => {
                    let resolved = self
                        .lookup(path)
                        .ok_or_else(|| EvalError::UnknownVariable(path.to_string()))?;
                    serde_yaml::to_value(resolved).map_err(|e| EvalError::Convert {
                        path: path.to_string(),
                        message: e.to_string(),
                    })
                }
                None => Ok(value.clone()),
            },
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut out = serde_yaml::Mapping::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.evaluate(v)?);
                }
                Ok(Value::Mapping(out))
            }
            Value::Tagged(tagged) => self.evaluate(&tagged.value),
            _ => Ok(value.clone()),
        }
    }
}
