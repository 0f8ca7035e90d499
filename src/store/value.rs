//! # Document Values
//!
//! A small recursive value type shared by every document kind, an
//! insertion-ordered [`Table`], and [`infer_value`], the one routine that turns
//! user-typed text into a typed value (used by `set`, `edit` and variable
//! substitution alike).
//!
//! Merging follows a single rule: table into table recurses key by key,
//! anything else overwrites. Arrays are therefore replaced wholesale and a
//! scalar/table conflict is won by the incoming value.

use std::fmt;

/// A typed document value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Table(Table),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the variant, used in messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    /// Render the value the way it goes on the wire: scalars bare, arrays
    /// comma-joined, tables as compact JSON.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_plain_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Table(t) => t.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Table(t) => t.to_json(),
        }
    }

    pub fn to_toml(&self) -> toml::Value {
        match self {
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Integer(i) => toml::Value::Integer(*i),
            Value::Float(f) => toml::Value::Float(*f),
            Value::Boolean(b) => toml::Value::Boolean(*b),
            Value::Array(items) => toml::Value::Array(items.iter().map(Value::to_toml).collect()),
            Value::Table(t) => toml::Value::Table(t.to_toml()),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Boolean(b),
            // Datetimes are kept as their literal text
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(t) => Value::Table(Table::from_toml(t)),
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
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

/// Insertion-ordered string-keyed map of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: toml::map::Map<String, Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove a key; the remaining keys keep their order
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Look up a dotted path such as `user.address.city`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => match self.get(head)? {
                Value::Table(child) => child.get_path(rest),
                _ => None,
            },
        }
    }

    /// Set a dotted path, creating intermediate tables. A scalar standing in
    /// the way of the path is replaced by a table.
    pub fn set_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.insert(path, value);
            }
            Some((head, rest)) => {
                if !matches!(self.get(head), Some(Value::Table(_))) {
                    self.insert(head, Value::Table(Table::new()));
                }
                if let Some(Value::Table(child)) = self.get_mut(head) {
                    child.set_path(rest, value);
                }
            }
        }
    }

    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        match path.split_once('.') {
            None => self.remove(path),
            Some((head, rest)) => match self.get_mut(head)? {
                Value::Table(child) => child.remove_path(rest),
                _ => None,
            },
        }
    }

    /// Deep-merge `other` into `self`; `other` wins every non-table conflict.
    pub fn merge(&mut self, other: &Table) {
        for (key, incoming) in other.iter() {
            if let (Some(Value::Table(existing)), Value::Table(incoming_table)) =
                (self.get_mut(key), incoming)
            {
                existing.merge(incoming_table);
                continue;
            }
            self.insert(key, incoming.clone());
        }
    }

    pub fn from_toml(table: toml::Table) -> Self {
        let mut entries = toml::map::Map::new();
        for (key, value) in table {
            entries.insert(key, Value::from(value));
        }
        Self { entries }
    }

    pub fn to_toml(&self) -> toml::Table {
        let mut table = toml::Table::new();
        for (key, value) in self.iter() {
            table.insert(key.to_string(), value.to_toml());
        }
        table
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Infer a typed value from literal text.
///
/// `[a, "b"]` becomes an array of strings (quotes around items are dropped),
/// `true`/`false` in any case become booleans, everything else stays a string.
pub fn infer_value(text: &str) -> Value {
    if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
        let inner = text[1..text.len() - 1].trim();
        if inner.is_empty() {
            return Value::Array(Vec::new());
        }
        let items = inner
            .split(',')
            .map(|part| {
                let item = part.trim();
                let item = item
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(item);
                Value::String(item.to_string())
            })
            .collect();
        return Value::Array(items);
    }

    if text.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    Value::String(text.to_string())
}
