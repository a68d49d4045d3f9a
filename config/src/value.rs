//! The configuration tree.
//!
//! A [`Value`] is what every node of an experiment document is made of: a scalar, a
//! list, or an ordered [`Mapping`]. Mappings tagged with [`COMPONENT_KEY`] describe a
//! component to construct; strings starting with `$` are references (see
//! [`crate::reference`]).

use std::fmt;

/// The reserved key naming the component a mapping configures.
pub const COMPONENT_KEY: &str = "_name";

/// A single node of a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
  List(Vec<Value>),
  Map(Mapping),
}

/// The shape of a [`Value`], used in diagnostics and schema checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
  Null,
  Bool,
  Integer,
  Float,
  String,
  List,
  Map,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueKind::Null => "null",
      ValueKind::Bool => "bool",
      ValueKind::Integer => "integer",
      ValueKind::Float => "float",
      ValueKind::String => "string",
      ValueKind::List => "list",
      ValueKind::Map => "map",
    };
    f.write_str(name)
  }
}

/// Joins a dotted path prefix with one more segment.
pub fn join_path(prefix: &str, segment: &str) -> String {
  if prefix.is_empty() {
    segment.to_string()
  } else {
    format!("{}.{}", prefix, segment)
  }
}

impl Value {
  pub fn kind(&self) -> ValueKind {
    match self {
      Value::Null => ValueKind::Null,
      Value::Bool(_) => ValueKind::Bool,
      Value::Integer(_) => ValueKind::Integer,
      Value::Float(_) => ValueKind::Float,
      Value::String(_) => ValueKind::String,
      Value::List(_) => ValueKind::List,
      Value::Map(_) => ValueKind::Map,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn is_number(&self) -> bool {
    matches!(self, Value::Integer(_) | Value::Float(_))
  }

  /// Scalars, as opposed to lists and mappings.
  pub fn is_scalar(&self) -> bool {
    !matches!(self, Value::List(_) | Value::Map(_))
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      _ => None,
    }
  }

  /// Numeric view of the value. Integers widen to `f64`.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Integer(i) => Some(*i as f64),
      Value::Float(x) => Some(*x),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&Mapping> {
    match self {
      Value::Map(map) => Some(map),
      _ => None,
    }
  }

  /// The `_name` tag of a component mapping, if this value is one.
  pub fn component_name(&self) -> Option<&str> {
    self.as_map()?.get(COMPONENT_KEY)?.as_str()
  }

  /// One step down the tree. List items are addressed by their index.
  pub fn child(&self, segment: &str) -> Option<&Value> {
    match self {
      Value::Map(map) => map.get(segment),
      Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    }
  }

  /// Nested access by dotted path, e.g. `trainer.metrics.0`. An empty path is `self`.
  pub fn lookup(&self, path: &str) -> Option<&Value> {
    if path.is_empty() {
      return Some(self);
    }
    path
      .split('.')
      .try_fold(self, |node, segment| node.child(segment))
  }

  /// Depth-first, pre-order traversal. `visit` receives the dotted path of each node,
  /// starting with `prefix` for `self`.
  pub fn walk<'a, F>(&'a self, prefix: &str, visit: &mut F)
  where
    F: FnMut(&str, &'a Value),
  {
    visit(prefix, self);
    match self {
      Value::Map(map) => {
        for (key, child) in map.iter() {
          child.walk(&join_path(prefix, key), visit);
        }
      }
      Value::List(items) => {
        for (index, child) in items.iter().enumerate() {
          child.walk(&join_path(prefix, &index.to_string()), visit);
        }
      }
      _ => {}
    }
  }
}

impl fmt::Display for Value {
  /// Scalars render bare (strings without quotes); lists and mappings render as JSON.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => f.write_str("null"),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Integer(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::String(s) => f.write_str(s),
      Value::List(_) | Value::Map(_) => {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
      }
    }
  }
}

// --- Conversions ---

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Integer(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Integer(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(x: f64) -> Self {
    Value::Float(x)
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

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::List(items)
  }
}

impl From<Mapping> for Value {
  fn from(map: Mapping) -> Self {
    Value::Map(map)
  }
}

// --- Mapping ---

/// A string-keyed map that remembers insertion order.
///
/// Document order decides build order and is kept through a parse/serialize round
/// trip. Equality ignores order: two mappings are equal when they hold the same keys
/// with equal values.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
  entries: Vec<(String, Value)>,
}

impl Mapping {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: Vec::with_capacity(capacity),
    }
  }

  fn position(&self, key: &str) -> Option<usize> {
    self.entries.iter().position(|(k, _)| k == key)
  }

  /// Inserts `value` under `key`. An existing entry is replaced in place and its old
  /// value returned.
  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    let key = key.into();
    let value = value.into();
    match self.position(&key) {
      Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
      None => {
        self.entries.push((key, value));
        None
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.position(key).map(|index| &self.entries[index].1)
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
    self.position(key).map(move |index| &mut self.entries[index].1)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.position(key).is_some()
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.position(key).map(|index| self.entries.remove(index).1)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
    self.entries.iter().map(|(_, v)| v)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl PartialEq for Mapping {
  fn eq(&self, other: &Self) -> bool {
    self.len() == other.len()
      && self
        .iter()
        .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Mapping::new();
    for (key, value) in iter {
      map.insert(key, value);
    }
    map
  }
}

impl IntoIterator for Mapping {
  type Item = (String, Value);
  type IntoIter = std::vec::IntoIter<(String, Value)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}
