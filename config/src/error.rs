use crate::document::Format;
use crate::value::ValueKind;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the `trellis_config` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Failed to read configuration file {path:?}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write configuration file {path:?}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Unsupported configuration file {path:?}: only json, yaml and toml documents are supported")]
  UnsupportedFormat { path: PathBuf },

  #[error("Failed to parse {format} configuration: {message}")]
  Parse { format: Format, message: String },

  #[error("Failed to serialize configuration as {format}: {message}")]
  Serialize { format: Format, message: String },

  #[error("Configuration root must be a mapping, found {found}")]
  NotAMapping { found: ValueKind },
}

/// A specialized `Result` type for `trellis_config` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
