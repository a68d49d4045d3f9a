//! Built values.

use crate::registry::Plugin;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use trellis_config::Value;

/// A built node. Aliases hand out clones of the same `Shared`, so `Arc::ptr_eq` tells
/// a shared instance from a copy.
pub type Shared = Arc<Instance>;

/// What a configuration node turned into.
pub enum Instance {
  /// A scalar, kept as written (or interpolated).
  Value(Value),
  List(Vec<Shared>),
  /// A plain mapping, in document order.
  Map(Vec<(String, Shared)>),
  /// The output of a plugin factory.
  Object(Object),
  /// A registered plugin itself, reached through `$Name`.
  Plugin(Plugin),
}

impl Instance {
  /// Mirrors a raw value structurally. Nothing is resolved or instantiated.
  pub fn from_value(value: Value) -> Instance {
    match value {
      Value::List(items) => Instance::List(
        items
          .into_iter()
          .map(|item| Arc::new(Instance::from_value(item)))
          .collect(),
      ),
      Value::Map(map) => Instance::Map(
        map
          .into_iter()
          .map(|(key, item)| (key, Arc::new(Instance::from_value(item))))
          .collect(),
      ),
      scalar => Instance::Value(scalar),
    }
  }

  pub fn as_value(&self) -> Option<&Value> {
    match self {
      Instance::Value(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    self.as_value().and_then(Value::as_str)
  }

  pub fn as_list(&self) -> Option<&[Shared]> {
    match self {
      Instance::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&Object> {
    match self {
      Instance::Object(object) => Some(object),
      _ => None,
    }
  }

  pub fn as_plugin(&self) -> Option<&Plugin> {
    match self {
      Instance::Plugin(plugin) => Some(plugin),
      _ => None,
    }
  }

  /// The concrete object behind this instance, if it is an object of type `T`.
  pub fn object<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.as_object().and_then(Object::get::<T>)
  }

  /// One step down: map entries by key, list items by index, objects by the argument
  /// they were built with.
  pub fn child(&self, segment: &str) -> Option<&Shared> {
    match self {
      Instance::Map(entries) => entries.iter().find(|(k, _)| k == segment).map(|(_, v)| v),
      Instance::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      Instance::Object(object) => object.argument(segment),
      Instance::Value(_) | Instance::Plugin(_) => None,
    }
  }

  /// Short description used in error messages.
  pub fn describe(&self) -> String {
    match self {
      Instance::Value(value) => value.kind().to_string(),
      Instance::List(_) => "list".to_string(),
      Instance::Map(_) => "map".to_string(),
      Instance::Object(object) => format!("{} object", object.plugin()),
      Instance::Plugin(plugin) => format!("plugin {}", plugin.name()),
    }
  }
}

impl From<Value> for Instance {
  fn from(value: Value) -> Self {
    Instance::from_value(value)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instance::Value(value) => f.debug_tuple("Value").field(value).finish(),
      Instance::List(items) => f.debug_list().entries(items.iter()).finish(),
      Instance::Map(entries) => f
        .debug_map()
        .entries(entries.iter().map(|(k, v)| (k, v)))
        .finish(),
      Instance::Object(object) => fmt::Debug::fmt(object, f),
      Instance::Plugin(plugin) => write!(f, "Plugin({})", plugin.name()),
    }
  }
}

/// A type-erased object produced by a plugin.
///
/// The payload is always stored as an `Arc<T>` (`T` may be a trait object), so every
/// clone of an `Object` and every `get` hands out the same allocation.
#[derive(Clone)]
pub struct Object {
  plugin: Arc<str>,
  payload: Arc<dyn Any + Send + Sync>,
  arguments: Vec<(String, Shared)>,
}

impl Object {
  pub fn new<T: Any + Send + Sync>(plugin: &str, value: T) -> Self {
    Self::from_arc(plugin, Arc::new(value))
  }

  pub fn from_arc<T: ?Sized + Any + Send + Sync>(plugin: &str, value: Arc<T>) -> Self {
    Self {
      plugin: Arc::from(plugin),
      payload: Arc::new(value),
      arguments: Vec::new(),
    }
  }

  pub(crate) fn with_arguments(mut self, arguments: Vec<(String, Shared)>) -> Self {
    self.arguments = arguments;
    self
  }

  /// Name of the plugin that produced this object.
  pub fn plugin(&self) -> &str {
    &self.plugin
  }

  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.payload.downcast_ref::<Arc<T>>().cloned()
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.payload.is::<Arc<T>>()
  }

  /// The built argument `name` this object was constructed with.
  pub fn argument(&self, name: &str) -> Option<&Shared> {
    self
      .arguments
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v)
  }

  pub fn arguments(&self) -> impl Iterator<Item = (&str, &Shared)> + '_ {
    self.arguments.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Object")
      .field("plugin", &self.plugin)
      .field("arguments", &self.arguments.len())
      .finish()
  }
}

/// Name of the type an accessor expected, for error messages.
pub(crate) fn expected_name<T: ?Sized>() -> String {
  type_name::<T>().to_string()
}
