use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Flat parameter object, raw or coerced.
pub type Params = Map<String, Value>;

/// Value type accepted by a single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    OneOf(Vec<String>),
}

impl ParamKind {
    /// Validate an in-memory value, coercing the textual forms of numbers and
    /// booleans into their typed representation. `Integer` is the `i64` range,
    /// the same range [`decode`](Self::decode) accepts.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::Integer, Value::Number(n)) if n.is_i64() => Ok(value.clone()),
            (Self::Number, Value::Number(_)) => Ok(value.clone()),
            (Self::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (Self::OneOf(_), Value::String(text)) => self.decode(text),
            (Self::Integer | Self::Number | Self::Boolean, Value::String(text)) => self.decode(text),
            (_, other) => Err(format!("expected {}, got `{other}`", self.describe())),
        }
    }

    /// Render a value as query-string text.
    pub fn encode(&self, value: &Value) -> Result<String, String> {
        match self.coerce(value)? {
            Value::String(text) => Ok(text),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            other => Err(format!("cannot encode `{other}` as {}", self.describe())),
        }
    }

    /// Parse query-string text back into a typed value.
    pub fn decode(&self, text: &str) -> Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(text.to_string())),
            Self::Integer => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("`{text}` is not an integer")),
            Self::Number => {
                if let Ok(int) = text.parse::<i64>() {
                    return Ok(Value::from(int));
                }
                if let Ok(int) = text.parse::<u64>() {
                    return Ok(Value::from(int));
                }
                text.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("`{text}` is not a number"))
            }
            Self::Boolean => match text {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("`{text}` is not a boolean")),
            },
            Self::OneOf(choices) => {
                if choices.iter().any(|choice| choice == text) {
                    Ok(Value::String(text.to_string()))
                } else {
                    Err(format!("`{text}` is not one of [{}]", choices.join(", ")))
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::OneOf(choices) => format!("one of [{}]", choices.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub optional: bool,
}

/// Parameters declared by one route level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    fields: BTreeMap<String, ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, key: impl Into<String>, kind: ParamKind) -> Self {
        self.fields.insert(
            key.into(),
            ParamSpec {
                kind,
                optional: false,
            },
        );
        self
    }

    pub fn optional(mut self, key: impl Into<String>, kind: ParamKind) -> Self {
        self.fields.insert(
            key.into(),
            ParamSpec {
                kind,
                optional: true,
            },
        );
        self
    }

    pub fn spec(&self, key: &str) -> Option<&ParamSpec> {
        self.fields.get(key)
    }

    pub fn declares(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The subset of `raw` this level declares, or `None` when nothing applies.
    /// `null` values count as absent.
    pub fn extract(&self, raw: &Params) -> Option<Params> {
        let subset: Params = raw
            .iter()
            .filter(|(key, value)| !value.is_null() && self.declares(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        (!subset.is_empty()).then_some(subset)
    }

    /// Validate raw params against this schema, returning the coerced values.
    pub fn validate(&self, raw: &Params) -> Result<Params, String> {
        let mut coerced = Params::new();
        for (key, value) in raw {
            if value.is_null() {
                continue;
            }
            let spec = self
                .fields
                .get(key)
                .ok_or_else(|| format!("param `{key}` is not declared"))?;
            let value = spec
                .kind
                .coerce(value)
                .map_err(|reason| format!("param `{key}`: {reason}"))?;
            coerced.insert(key.clone(), value);
        }
        if let Some((key, _)) = self
            .fields
            .iter()
            .find(|(key, spec)| !spec.optional && !coerced.contains_key(*key))
        {
            return Err(format!("missing required param `{key}`"));
        }
        Ok(coerced)
    }
}
