//! Dynamic values
//!
//! [`Value`] is the untyped input and output of every parse. It keeps the
//! distinction between `undefined` (a missing value) and `null`, carries
//! dates, sets and big integers as first-class variants, and can hold a
//! pending [`Promise`] for asynchronous schemas.
//!
//! # Example
//!
//! ```rust,ignore
//! use zod_runtime::Value;
//! use serde_json::json;
//!
//! let value = Value::from(json!({ "name": "Ada", "tags": ["x"] }));
//! assert_eq!(value.get("name"), Some(&Value::from("Ada")));
//! assert!(value.get("missing").is_none());
//! ```

use crate::path::{Path, PathSegment};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Insertion-ordered map backing [`Value::Object`].
pub type ObjectMap = IndexMap<String, Value>;

/// Largest integer a double can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// =============================================================================
// Runtime Type Tags
// =============================================================================

/// Runtime type tag of a [`Value`].
///
/// Serialized in lowercase (`"bigint"`, `"nan"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Nan,
    BigInt,
    Boolean,
    Symbol,
    Date,
    Undefined,
    Null,
    Array,
    Set,
    Object,
    Promise,
}

impl ValueType {
    /// Returns the lowercase name of the type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Nan => "nan",
            Self::BigInt => "bigint",
            Self::Boolean => "boolean",
            Self::Symbol => "symbol",
            Self::Date => "date",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Array => "array",
            Self::Set => "set",
            Self::Object => "object",
            Self::Promise => "promise",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Symbol & Promise
// =============================================================================

/// A unique symbol. Two symbols are equal only if they are clones of the same
/// symbol, regardless of description.
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a new unique symbol with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::from(description.into()))
    }

    /// The symbol's description.
    pub fn description(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// A pending value. Cloning a promise shares the underlying computation;
/// every clone resolves to the same value.
#[derive(Clone)]
pub struct Promise {
    inner: Shared<BoxFuture<'static, Value>>,
}

impl Promise {
    /// Wrap a future producing a value.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// A promise that is already resolved.
    pub fn resolved(value: Value) -> Self {
        Self::new(futures::future::ready(value))
    }

    /// Wait for the value.
    pub fn resolve(&self) -> impl Future<Output = Value> + Send + 'static {
        self.inner.clone()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Promise { .. }")
    }
}

// =============================================================================
// Value
// =============================================================================

/// An untyped value flowing through a schema.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// A missing value.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    /// Members in insertion order.
    Set(Vec<Value>),
    Object(ObjectMap),
    Promise(Promise),
}

impl Value {
    /// Build an object from key/value pairs.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array.
    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a set. Members are kept in the given order.
    pub fn set<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a big integer.
    pub fn bigint(value: i128) -> Self {
        Self::BigInt(value)
    }

    /// Build a promise from a future.
    pub fn promise<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        Self::Promise(Promise::new(future))
    }

    /// The runtime type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Undefined => ValueType::Undefined,
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Boolean,
            Self::Number(n) if n.is_nan() => ValueType::Nan,
            Self::Number(_) => ValueType::Number,
            Self::BigInt(_) => ValueType::BigInt,
            Self::String(_) => ValueType::String,
            Self::Symbol(_) => ValueType::Symbol,
            Self::Date(_) => ValueType::Date,
            Self::Array(_) => ValueType::Array,
            Self::Set(_) => ValueType::Set,
            Self::Object(_) => ValueType::Object,
            Self::Promise(_) => ValueType::Promise,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up an object member.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Follow a path of keys and indices.
    ///
    /// Index segments address array and set members; on objects they are
    /// treated as string keys.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| match (current, segment) {
                (Self::Object(map), PathSegment::Key(key)) => map.get(key),
                (Self::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
                (Self::Array(items) | Self::Set(items), PathSegment::Index(index)) => {
                    items.get(*index)
                }
                _ => None,
            })
    }

    /// JavaScript truthiness, used by boolean coercion.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::BigInt(n) => *n != 0,
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// String conversion following JavaScript's `String(value)`.
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::BigInt(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Symbol(s) => format!("Symbol({})", s.description()),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::Array(items) => items
                .iter()
                .map(|item| match item {
                    Self::Undefined | Self::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Set(_) => "[object Set]".to_string(),
            Self::Object(_) => "[object Object]".to_string(),
            Self::Promise(_) => "[object Promise]".to_string(),
        }
    }

    /// Convert to JSON. Undefined members are omitted; undefined, symbols and
    /// promises elsewhere become `null`; big integers become strings.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Format a number the way JavaScript prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            // promises are never structurally equal
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null | Self::Symbol(_) | Self::Promise(_) => {
                serializer.serialize_none()
            }
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if !n.is_finite() => serializer.serialize_none(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => serializer.serialize_str(&n.to_string()),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Array(items) | Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let present = map.iter().filter(|(_, v)| !v.is_undefined());
                let mut out = serializer.serialize_map(None)?;
                for (key, value) in present {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::String(s) => write!(f, "'{}'", s),
            Self::BigInt(n) => write!(f, "{}n", n),
            Self::Number(n) => f.write_str(&format_number(*n)),
            other => f.write_str(&other.to_json().to_string()),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<Promise> for Value {
    fn from(value: Promise) -> Self {
        Self::Promise(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<ObjectMap> for Value {
    fn from(value: ObjectMap) -> Self {
        Self::Object(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::object(iter)
    }
}
