use thiserror::Error;
use trellis_config::ValueKind;

/// The main error type for the `trellis_ioc` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Config(#[from] trellis_config::Error),

  #[error("'{name}' is already registered. Please select another name")]
  AlreadyRegistered { name: String },

  #[error("Plugin '{name}' needed by \"{path}\" is not registered")]
  UnknownPlugin { name: String, path: String },

  #[error("`_name` at \"{path}\" must be a string, found {found}")]
  InvalidComponentName { path: String, found: ValueKind },

  #[error("Loop in config: {}", .chain.join(" -> "))]
  CyclicReference { chain: Vec<String> },

  #[error("Unresolved reference '${target}' at \"{path}\"")]
  UnresolvedReference { path: String, target: String },

  #[error("Error happened while instantiating \"{path}\", calling {plugin}: {source}")]
  Instantiation {
    path: String,
    plugin: String,
    #[source]
    source: PluginError,
  },
}

/// Failures raised by a plugin factory or by the arguments handed to it.
#[derive(Debug, Error)]
pub enum PluginError {
  #[error("missing required argument '{0}'")]
  MissingArgument(String),

  #[error("unexpected argument(s): {}", .0.join(", "))]
  UnexpectedArguments(Vec<String>),

  #[error("argument '{name}' should be {expected}, found {found}")]
  ArgumentType {
    name: String,
    expected: String,
    found: String,
  },

  #[error("{0}")]
  Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl PluginError {
  /// Wraps any error (or message) raised inside a factory.
  pub fn custom(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    PluginError::Custom(error.into())
  }
}

/// A specialized `Result` type for `trellis_ioc` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
