//! Keyword arguments handed to a plugin factory.

use crate::error::PluginError;
use crate::instance::{expected_name, Instance, Shared};
use std::any::Any;
use std::sync::Arc;
use trellis_config::Value;

/// The built arguments of one component (every key of its mapping except `_name`).
///
/// Every accessor consumes the key it reads. Once the factory returns, anything left
/// unread is an [`PluginError::UnexpectedArguments`] error, the way an unknown keyword
/// argument would be.
#[derive(Debug, Clone, Default)]
pub struct Args {
  path: String,
  entries: Vec<(String, Shared)>,
}

impl Args {
  /// Empty arguments for the component at dotted `path`.
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      entries: Vec::new(),
    }
  }

  /// Adds (or replaces) an argument.
  pub fn insert(&mut self, name: impl Into<String>, value: Shared) {
    let name = name.into();
    match self.entries.iter_mut().find(|(k, _)| *k == name) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((name, value)),
    }
  }

  /// Builder-style [`Args::insert`] for plain values.
  pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(name, Arc::new(Instance::from_value(value.into())));
    self
  }

  /// Dotted path of the component these arguments belong to.
  pub fn path(&self) -> &str {
    &self.path
  }

  pub(crate) fn entries(&self) -> &[(String, Shared)] {
    &self.entries
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.iter().any(|(k, _)| k == name)
  }

  /// Names not consumed yet, in document order.
  pub fn remaining(&self) -> impl Iterator<Item = &str> + '_ {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Consumes an argument of any shape.
  pub fn take(&mut self, name: &str) -> Option<Shared> {
    let index = self.entries.iter().position(|(k, _)| k == name)?;
    Some(self.entries.remove(index).1)
  }

  /// Consumes everything left, like a `**kwargs` catch-all.
  pub fn rest(&mut self) -> Vec<(String, Shared)> {
    std::mem::take(&mut self.entries)
  }

  pub(crate) fn finish(self) -> Result<(), PluginError> {
    if self.entries.is_empty() {
      Ok(())
    } else {
      Err(PluginError::UnexpectedArguments(
        self.entries.into_iter().map(|(k, _)| k).collect(),
      ))
    }
  }

  // --- Typed accessors ---

  pub fn instance(&mut self, name: &str) -> Result<Shared, PluginError> {
    self
      .take(name)
      .ok_or_else(|| PluginError::MissingArgument(name.to_owned()))
  }

  /// A required object argument, typically a reference to another component.
  pub fn object<T: ?Sized + Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>, PluginError> {
    let instance = self.instance(name)?;
    downcast::<T>(name, &instance)
  }

  pub fn optional_object<T: ?Sized + Any + Send + Sync>(
    &mut self,
    name: &str,
  ) -> Result<Option<Arc<T>>, PluginError> {
    self
      .take(name)
      .map(|instance| downcast::<T>(name, &instance))
      .transpose()
  }

  /// A required scalar, as written in the document.
  pub fn value(&mut self, name: &str) -> Result<Value, PluginError> {
    let instance = self.instance(name)?;
    match instance.as_value() {
      Some(value) => Ok(value.clone()),
      None => Err(type_error(name, "a scalar", &instance)),
    }
  }

  fn scalar<R>(
    &mut self,
    name: &str,
    expected: &'static str,
    convert: impl Fn(&Value) -> Option<R>,
  ) -> Result<Option<R>, PluginError> {
    let Some(instance) = self.take(name) else {
      return Ok(None);
    };
    instance
      .as_value()
      .and_then(&convert)
      .map(Some)
      .ok_or_else(|| type_error(name, expected, &instance))
  }

  fn required<R>(&mut self, name: &str, found: Result<Option<R>, PluginError>) -> Result<R, PluginError> {
    found?.ok_or_else(|| PluginError::MissingArgument(name.to_owned()))
  }

  pub fn i64(&mut self, name: &str) -> Result<i64, PluginError> {
    let found = self.scalar(name, "an integer", Value::as_i64);
    self.required(name, found)
  }

  pub fn i64_or(&mut self, name: &str, default: i64) -> Result<i64, PluginError> {
    Ok(self.scalar(name, "an integer", Value::as_i64)?.unwrap_or(default))
  }

  /// A number; integers are accepted and widened.
  pub fn f64(&mut self, name: &str) -> Result<f64, PluginError> {
    let found = self.scalar(name, "a number", Value::as_f64);
    self.required(name, found)
  }

  pub fn f64_or(&mut self, name: &str, default: f64) -> Result<f64, PluginError> {
    Ok(self.scalar(name, "a number", Value::as_f64)?.unwrap_or(default))
  }

  pub fn bool(&mut self, name: &str) -> Result<bool, PluginError> {
    let found = self.scalar(name, "a bool", Value::as_bool);
    self.required(name, found)
  }

  pub fn bool_or(&mut self, name: &str, default: bool) -> Result<bool, PluginError> {
    Ok(self.scalar(name, "a bool", Value::as_bool)?.unwrap_or(default))
  }

  pub fn string(&mut self, name: &str) -> Result<String, PluginError> {
    let found = self.scalar(name, "a string", |v| v.as_str().map(str::to_owned));
    self.required(name, found)
  }

  pub fn string_or(&mut self, name: &str, default: &str) -> Result<String, PluginError> {
    Ok(
      self
        .scalar(name, "a string", |v| v.as_str().map(str::to_owned))?
        .unwrap_or_else(|| default.to_owned()),
    )
  }
}

fn type_error(name: &str, expected: impl Into<String>, found: &Instance) -> PluginError {
  PluginError::ArgumentType {
    name: name.to_owned(),
    expected: expected.into(),
    found: found.describe(),
  }
}

fn downcast<T: ?Sized + Any + Send + Sync>(name: &str, instance: &Instance) -> Result<Arc<T>, PluginError> {
  instance
    .object::<T>()
    .ok_or_else(|| type_error(name, expected_name::<T>(), instance))
}
