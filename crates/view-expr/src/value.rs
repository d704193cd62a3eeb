//! Runtime values bound into templates.

use indexmap::IndexMap;
use std::fmt;

/// A value that can be bound into a scope and produced by an expression.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    /// Absent or null.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// An already-sanitized HTML fragment; escaped interpolation passes it
    /// through untouched.
    Html(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Wrap markup that must not be escaped.
    pub fn html(markup: impl Into<String>) -> Self {
        Self::Html(markup.into())
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is tagged as pre-sanitized HTML.
    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html(_))
    }

    /// Truthiness: null, false, zero, `""`, `"0"` and empty containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) | Self::Html(s) => !(s.is_empty() || s == "0"),
            Self::List(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
        }
    }

    /// Name of this value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) | Self::Html(_) => "string",
            Self::List(_) | Self::Map(_) => "array",
        }
    }

    /// Read a named property (`->name`). Missing names and non-maps yield null.
    pub fn property(&self, name: &str) -> Value {
        match self {
            Self::Map(entries) => entries.get(name).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Read an index (`[key]`). Out-of-range and non-containers yield null.
    pub fn index(&self, key: &Value) -> Value {
        match (self, key) {
            (Self::List(items), Self::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or_default(),
            (Self::List(items), Self::String(s)) => s
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or_default(),
            (Self::Map(entries), key) => entries
                .get(key.to_string().as_str())
                .cloned()
                .unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Numeric view of this value, if it has one.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Null => Some(Number::Int(0)),
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(f) => Some(Number::Float(*f)),
            Self::String(s) | Self::Html(s) => parse_numeric(s),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Whether this is a number or a numeric string.
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Int(_) | Self::Float(_) => true,
            Self::String(s) => parse_numeric(s).is_some(),
            _ => false,
        }
    }

    /// Iterate as `(key, item)` pairs, the way a loop binds them.
    ///
    /// Lists yield integer keys; maps yield their string keys; null yields
    /// nothing. Returns `None` for values that cannot be iterated.
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        match self {
            Self::Null => Some(Vec::new()),
            Self::List(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (Value::Int(i as i64), item.clone()))
                    .collect(),
            ),
            Self::Map(entries) => Some(
                entries
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Convert to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) | Self::Html(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// A number produced by numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    // Reject "inf"/"nan", which Rust parses but are not numeric strings.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    s.parse::<f64>().ok().map(Number::Float)
}

/// Format a float the way templates print numbers: integral values drop the
/// fractional part.
fn format_float(f: f64, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        write!(out, "{}", f as i64)
    } else {
        write!(out, "{}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Bool(false) => Ok(()),
            Self::Bool(true) => f.write_str("1"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => format_float(*x, f),
            Self::String(s) | Self::Html(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}
