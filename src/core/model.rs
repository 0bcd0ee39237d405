//! The configuration value tree: categories, keys, and tagged values.

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use std::collections::HashMap;
use std::fmt;

/// A configuration document: category name → [`Category`].
///
/// A `Config` is immutable once published. Updates replace the whole
/// snapshot rather than mutating it.
///
/// # Examples
///
/// ```rust
/// use polled_config::core::{Category, Config, Value};
///
/// let config = Config::new().with_category("local", Category::new().with("foo", "bar"));
/// assert_eq!(config.category("local").unwrap().get("foo"), Some(&Value::from("bar")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Config {
    categories: HashMap<String, Category>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a category, builder style.
    pub fn with_category(mut self, name: impl Into<String>, category: Category) -> Self {
        self.insert_category(name, category);
        self
    }

    /// Add or replace a category.
    pub fn insert_category(&mut self, name: impl Into<String>, category: Category) {
        self.categories.insert(name.into(), category);
    }

    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Iterate over category names.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the document has no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A named group of keys, e.g. an environment like `local` or `dev`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Category {
    values: HashMap<String, Value>,
}

impl Category {
    /// Create an empty category.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the category has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single configuration value.
///
/// Numbers are always `f64`: JSON does not distinguish integers from floats,
/// so integer-ness is checked when a value is read as an integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A JSON string
    String(String),
    /// A JSON number
    Number(f64),
    /// A JSON boolean
    Bool(bool),
    /// A JSON array
    List(Vec<Value>),
    /// An explicit JSON `null`
    Null,
}

impl Value {
    /// The tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::List(_) => ValueKind::List,
            Value::Null => ValueKind::Null,
        }
    }
}

/// The tag of a [`Value`], used in type errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// See [`Value::String`]
    String,
    /// See [`Value::Number`]
    Number,
    /// See [`Value::Bool`]
    Bool,
    /// See [`Value::List`]
    List,
    /// See [`Value::Null`]
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::List => "list",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Accepts scalars and arrays; objects fall through to the default
/// `visit_map`, which rejects nesting below the key level.
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean, null, or array")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }
}
