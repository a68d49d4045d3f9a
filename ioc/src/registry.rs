//! The plugin `Registry` and the `Plugin` handle.

use crate::args::Args;
use crate::error::{Error, PluginError, Result};
use crate::instance::{Instance, Object, Shared};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Factory = dyn Fn(&mut Args) -> Result<Object, PluginError> + Send + Sync;

/// A named factory turning built arguments into an object.
///
/// Cloning a `Plugin` is cheap; clones share the factory.
#[derive(Clone)]
pub struct Plugin {
  name: Arc<str>,
  factory: Arc<Factory>,
}

impl Plugin {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Calls the factory with keyword semantics: every argument must be consumed, and
  /// leftovers are reported as unexpected.
  pub fn call(&self, mut args: Args) -> Result<Object, PluginError> {
    let arguments = args.entries().to_vec();
    let object = (self.factory)(&mut args)?;
    args.finish()?;
    Ok(object.with_arguments(arguments))
  }
}

impl fmt::Debug for Plugin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Plugin").field(&self.name).finish()
  }
}

// Each entry keeps the instance `$name` resolves to, built once at registration so every
// alias receives the same `Shared`.
enum RegistryEntry {
  Plugin { plugin: Plugin, instance: Shared },
  Value(Shared),
}

impl RegistryEntry {
  fn plugin(plugin: Plugin) -> Self {
    let instance = Arc::new(Instance::Plugin(plugin.clone()));
    RegistryEntry::Plugin { plugin, instance }
  }
}

/// A thread-safe registry of plugins and named values.
///
/// Components in a document name their plugin through `_name`; `$Name` strings resolve
/// to registry entries directly. Names are unique: the first registration wins and a
/// second one is an error.
#[derive(Default)]
pub struct Registry {
  entries: DashMap<String, RegistryEntry>,
}

impl Registry {
  /// Creates a new, empty `Registry`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn insert_internal(&self, name: &str, entry: RegistryEntry) -> Result<()> {
    match self.entries.entry(name.to_owned()) {
      Entry::Occupied(_) => Err(Error::AlreadyRegistered {
        name: name.to_owned(),
      }),
      Entry::Vacant(vacant) => {
        vacant.insert(entry);
        tracing::debug!(name, "registered plugin entry");
        Ok(())
      }
    }
  }

  fn plugin_internal(
    &self,
    name: &str,
    factory: impl Fn(&mut Args) -> Result<Object, PluginError> + Send + Sync + 'static,
  ) -> Result<()> {
    let plugin = Plugin {
      name: Arc::from(name),
      factory: Arc::new(factory),
    };
    self.insert_internal(name, RegistryEntry::plugin(plugin))
  }

  // --- PUBLIC API ---

  // --- Plugin Registration ---
  pub fn register<T, F>(&self, name: &str, factory: F) -> Result<()>
  where
    T: Any + Send + Sync,
    F: Fn(&mut Args) -> Result<T, PluginError> + Send + Sync + 'static,
  {
    let plugin_name = name.to_owned();
    self.plugin_internal(name, move |args| {
      factory(args).map(|value| Object::new(&plugin_name, value))
    })
  }

  /// Registers a factory whose objects are resolved as the trait object `I`.
  pub fn register_trait<I, F>(&self, name: &str, factory: F) -> Result<()>
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&mut Args) -> Result<Arc<I>, PluginError> + Send + Sync + 'static,
  {
    let plugin_name = name.to_owned();
    self.plugin_internal(name, move |args| {
      factory(args).map(|value| Object::from_arc(&plugin_name, value))
    })
  }

  // --- Value Registration ---
  /// Registers a ready-made value, reachable from documents as `$name`.
  pub fn register_value<T: Any + Send + Sync>(&self, name: &str, value: T) -> Result<()> {
    let instance = Arc::new(Instance::Object(Object::new(name, value)));
    self.insert_internal(name, RegistryEntry::Value(instance))
  }

  // --- Lookup ---
  pub fn plugin(&self, name: &str) -> Option<Plugin> {
    match self.entries.get(name)?.value() {
      RegistryEntry::Plugin { plugin, .. } => Some(plugin.clone()),
      RegistryEntry::Value(_) => None,
    }
  }

  /// The entry named `name` as an instance: a plugin handle or a registered value.
  /// Repeated calls return the same `Shared`.
  pub fn instance(&self, name: &str) -> Option<Shared> {
    let entry = self.entries.get(name)?;
    Some(match entry.value() {
      RegistryEntry::Plugin { instance, .. } | RegistryEntry::Value(instance) => instance.clone(),
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
