//! Turns configuration nodes into instances.
//!
//! For a node at a dotted path, the first matching rule wins:
//!
//! 1. a mapping tagged with `_name` calls the named plugin with its other keys, built;
//! 2. any other mapping becomes a map of built children;
//! 3. a list becomes a list of built children;
//! 4. a `$key` alias resolves to, in order: a supplied variable, a registry entry, the
//!    top-level node `key` (built on demand), the process environment;
//! 5. a string embedding `$VAR` tokens is interpolated;
//! 6. everything else is kept as a simple value.

use crate::args::Args;
use crate::core::{BuildGuard, BuildStack};
use crate::error::{Error, Result};
use crate::instance::{Instance, Shared};
use crate::registry::Registry;

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use trellis_config::reference::{as_alias, interpolate, SIGIL};
use trellis_config::value::join_path;
use trellis_config::{Document, Mapping, Value, COMPONENT_KEY};

/// Knobs for a build.
#[derive(Debug, Clone)]
pub(crate) struct Options {
  pub(crate) strict: bool,
  pub(crate) process_env: bool,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      strict: false,
      process_env: true,
    }
  }
}

/// One build of one document. Top-level results are memoised so every alias to the
/// same key receives the same instance.
pub(crate) struct Session<'a> {
  document: &'a Document,
  registry: &'a Registry,
  variables: &'a Mapping,
  variable_instances: HashMap<String, Shared>,
  options: Options,
  built: RefCell<HashMap<String, Shared>>,
  stack: BuildStack,
}

impl<'a> Session<'a> {
  pub(crate) fn new(
    document: &'a Document,
    registry: &'a Registry,
    variables: &'a Mapping,
    options: Options,
  ) -> Self {
    let variable_instances = variables
      .iter()
      .map(|(name, value)| (name.to_owned(), Arc::new(Instance::from_value(value.clone()))))
      .collect();
    Self {
      document,
      registry,
      variables,
      variable_instances,
      options,
      built: RefCell::new(HashMap::new()),
      stack: BuildStack::default(),
    }
  }

  /// Builds every top-level key in document order and returns them in that order.
  pub(crate) fn build_all(&self) -> Result<Vec<(String, Shared)>> {
    let mut objects = Vec::with_capacity(self.document.root().len());
    for key in self.document.keys() {
      if let Some(instance) = self.build_key(key)? {
        objects.push((key.to_owned(), instance));
      }
    }
    Ok(objects)
  }

  /// Builds (or returns the already built) top-level node `key`. `None` when the
  /// document has no such key.
  pub(crate) fn build_key(&self, key: &str) -> Result<Option<Shared>> {
    let Some(node) = self.document.get(key) else {
      return Ok(None);
    };
    let cached = self.built.borrow().get(key).cloned();
    if let Some(instance) = cached {
      return Ok(Some(instance));
    }

    let _guard = BuildGuard::enter(&self.stack, key)?;
    let instance = self.build_node(node, key)?;
    self
      .built
      .borrow_mut()
      .insert(key.to_owned(), instance.clone());
    Ok(Some(instance))
  }

  fn build_node(&self, node: &Value, path: &str) -> Result<Shared> {
    match node {
      Value::Map(map) => match map.get(COMPONENT_KEY) {
        Some(tag) => self.build_component(map, tag, path),
        None => self.build_map(map, path),
      },
      Value::List(items) => self.build_list(items, path),
      Value::String(s) if s.contains(SIGIL) => self.build_string(s, path),
      simple => {
        tracing::debug!(path = %path, value = %simple, "instantiating as a simple value");
        Ok(Arc::new(Instance::Value(simple.clone())))
      }
    }
  }

  fn build_component(&self, map: &Mapping, tag: &Value, path: &str) -> Result<Shared> {
    let name = tag.as_str().ok_or_else(|| Error::InvalidComponentName {
      path: path.to_owned(),
      found: tag.kind(),
    })?;
    let plugin = self.registry.plugin(name).ok_or_else(|| Error::UnknownPlugin {
      name: name.to_owned(),
      path: path.to_owned(),
    })?;

    let mut args = Args::new(path);
    for (key, child) in map.iter().filter(|(key, _)| *key != COMPONENT_KEY) {
      args.insert(key, self.build_node(child, &join_path(path, key))?);
    }

    tracing::info!(path = %path, plugin = name, "instantiating component");
    let object = plugin.call(args).map_err(|source| Error::Instantiation {
      path: path.to_owned(),
      plugin: name.to_owned(),
      source,
    })?;
    Ok(Arc::new(Instance::Object(object)))
  }

  fn build_map(&self, map: &Mapping, path: &str) -> Result<Shared> {
    tracing::debug!(path = %path, "instantiating as a map");
    let entries = map
      .iter()
      .map(|(key, child)| Ok((key.to_owned(), self.build_node(child, &join_path(path, key))?)))
      .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(Instance::Map(entries)))
  }

  fn build_list(&self, items: &[Value], path: &str) -> Result<Shared> {
    tracing::debug!(path = %path, "instantiating as a list");
    let items = items
      .iter()
      .enumerate()
      .map(|(index, child)| self.build_node(child, &join_path(path, &index.to_string())))
      .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(Instance::List(items)))
  }

  fn build_string(&self, s: &str, path: &str) -> Result<Shared> {
    let alias = as_alias(s);
    if let Some(target) = alias {
      if let Some(instance) = self.resolve_alias(target, path)? {
        return Ok(instance);
      }
    }

    let mut missing: Vec<String> = Vec::new();
    let text = interpolate(s, |name| {
      let found = self.variable_text(name);
      if found.is_none() {
        missing.push(name.to_owned());
      }
      found
    });

    if !missing.is_empty() {
      let target = alias.map(str::to_owned).unwrap_or_else(|| missing.remove(0));
      if self.options.strict {
        return Err(Error::UnresolvedReference {
          path: path.to_owned(),
          target,
        });
      }
      tracing::warn!(path = %path, reference = %target, "unresolved reference kept as a literal string");
    } else {
      tracing::debug!(path = %path, value = %text, "interpolated string");
    }
    Ok(Arc::new(Instance::Value(Value::String(text))))
  }

  fn resolve_alias(&self, target: &str, path: &str) -> Result<Option<Shared>> {
    if let Some(instance) = self.variable_instances.get(target) {
      tracing::info!(path = %path, reference = target, "resolved from variables");
      return Ok(Some(instance.clone()));
    }
    if let Some(instance) = self.registry.instance(target) {
      tracing::info!(path = %path, reference = target, "resolved from the registry");
      return Ok(Some(instance));
    }
    if let Some(instance) = self.build_key(target)? {
      tracing::info!(path = %path, reference = target, "resolved from experiment objects");
      return Ok(Some(instance));
    }
    if let Some(text) = self.environment(target) {
      tracing::info!(path = %path, reference = target, "resolved from the process environment");
      return Ok(Some(Arc::new(Instance::Value(Value::String(text)))));
    }
    Ok(None)
  }

  fn environment(&self, name: &str) -> Option<String> {
    if self.options.process_env {
      env::var(name).ok()
    } else {
      None
    }
  }

  fn variable_text(&self, name: &str) -> Option<String> {
    self
      .variables
      .get(name)
      .map(ToString::to_string)
      .or_else(|| self.environment(name))
  }
}
