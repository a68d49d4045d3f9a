//! The resolved, read-only `Experiment` and its `ExperimentBuilder`.

use crate::builder::{Options, Session};
use crate::error::Result;
use crate::global;
use crate::instance::Shared;
use crate::registry::Registry;

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use trellis_config::{Document, Format, Mapping, Value};

/// Configures how a document is turned into an [`Experiment`].
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{ExperimentBuilder, Registry};
/// use trellis_config::Format;
///
/// struct Adam { lr: f64 }
///
/// let registry = Arc::new(Registry::new());
/// registry.register("Adam", |args| Ok(Adam { lr: args.f64("lr")? })).unwrap();
///
/// let experiment = ExperimentBuilder::new()
///   .registry(registry)
///   .variable("LR", 0.01)
///   .parse(r#"{"optimizer": {"_name": "Adam", "lr": "$LR"}}"#, Format::Json)
///   .unwrap();
///
/// assert_eq!(experiment.object::<Adam>("optimizer").unwrap().lr, 0.01);
/// ```
#[derive(Default)]
pub struct ExperimentBuilder {
  registry: Option<Arc<Registry>>,
  variables: Mapping,
  options: Options,
}

impl ExperimentBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Plugins to build with. Defaults to the global registry.
  pub fn registry(mut self, registry: Arc<Registry>) -> Self {
    self.registry = Some(registry);
    self
  }

  /// A substitution variable, reachable as `$name` and interpolated into strings.
  /// Generally spelled in capitals (`HOME`, `DATA_DIR`).
  pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.variables.insert(name, value);
    self
  }

  pub fn variables<I, K, V>(mut self, variables: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
  {
    for (name, value) in variables {
      self.variables.insert(name, value);
    }
    self
  }

  /// When set, an alias or variable that resolves to nothing is an error instead of a
  /// literal string.
  pub fn strict(mut self, strict: bool) -> Self {
    self.options.strict = strict;
    self
  }

  /// Whether the process environment is consulted after variables, the registry and
  /// the document itself. On by default.
  pub fn process_env(mut self, enabled: bool) -> Self {
    self.options.process_env = enabled;
    self
  }

  pub fn build(self, document: Document) -> Result<Experiment> {
    let registry = self.registry.unwrap_or_else(global::shared);
    let objects = Session::new(&document, &registry, &self.variables, self.options).build_all()?;
    tracing::info!(
      objects = objects.len(),
      source = ?document.source(),
      "experiment built"
    );
    Ok(Experiment { document, objects })
  }

  pub fn load(self, path: impl AsRef<Path>) -> Result<Experiment> {
    let document = Document::load(path)?;
    self.build(document)
  }

  pub fn parse(self, text: &str, format: Format) -> Result<Experiment> {
    let document = Document::parse(text, format)?;
    self.build(document)
  }
}

/// A fully built experiment: every top-level node of its document, instantiated.
///
/// It behaves like a read-only map from top-level keys to instances, in document order.
/// Nothing inserts or replaces an entry once built.
pub struct Experiment {
  document: Document,
  objects: Vec<(String, Shared)>,
}

impl Experiment {
  pub fn builder() -> ExperimentBuilder {
    ExperimentBuilder::new()
  }

  /// Loads and builds a document with the global registry and default options.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    ExperimentBuilder::new().load(path)
  }

  /// The document this experiment was built from.
  pub fn document(&self) -> &Document {
    &self.document
  }

  pub fn get(&self, key: &str) -> Option<&Shared> {
    self.objects.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  /// Nested access by dotted path. Objects are entered through the arguments they were
  /// built with, so `trainer.optimizer` is the optimizer the trainer received.
  pub fn lookup(&self, path: &str) -> Option<&Shared> {
    let mut segments = path.split('.');
    let first = self.get(segments.next()?)?;
    segments.try_fold(first, |node, segment| node.child(segment))
  }

  /// The object of type `T` at `path` (a top-level key or a dotted path).
  pub fn object<T: ?Sized + Any + Send + Sync>(&self, path: &str) -> Option<Arc<T>> {
    self.lookup(path)?.object::<T>()
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
    self.objects.iter().map(|(k, _)| k.as_str())
  }

  pub fn values(&self) -> impl Iterator<Item = &Shared> + '_ {
    self.objects.iter().map(|(_, v)| v)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Shared)> + '_ {
    self.objects.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }
}
