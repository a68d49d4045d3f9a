//! Loading and saving whole configuration documents.

use crate::error::{Error, Result};
use crate::reference::{self, AliasSite};
use crate::value::{join_path, Mapping, Value};

use std::{
  env, fmt, fs,
  path::{Path, PathBuf},
  str::FromStr,
};

/// On-disk syntax of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
  Yaml,
  Json,
  Toml,
}

impl Format {
  pub fn from_extension(extension: &str) -> Option<Self> {
    match extension.to_ascii_lowercase().as_str() {
      "yaml" | "yml" => Some(Format::Yaml),
      "json" => Some(Format::Json),
      "toml" => Some(Format::Toml),
      _ => None,
    }
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .and_then(Format::from_extension)
      .ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_path_buf(),
      })
  }

  pub fn extension(self) -> &'static str {
    match self {
      Format::Yaml => "yaml",
      Format::Json => "json",
      Format::Toml => "toml",
    }
  }
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

impl FromStr for Format {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Format::from_extension(s).ok_or_else(|| format!("unknown format '{}', expected yaml, json or toml", s))
  }
}

/// A `_name`-tagged node and where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub path: String,
  pub name: String,
}

/// A parsed configuration document. The root is always a mapping.
#[derive(Debug, Clone, Default)]
pub struct Document {
  root: Mapping,
  source: Option<PathBuf>,
}

impl PartialEq for Document {
  /// Documents compare by content; where they were loaded from does not matter.
  fn eq(&self, other: &Self) -> bool {
    self.root == other.root
  }
}

impl Document {
  pub fn from_mapping(root: Mapping) -> Self {
    Self { root, source: None }
  }

  pub fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Map(root) => Ok(Self::from_mapping(root)),
      other => Err(Error::NotAMapping {
        found: other.kind(),
      }),
    }
  }

  pub fn parse(text: &str, format: Format) -> Result<Self> {
    let parse_error = |message: String| Error::Parse { format, message };
    let value: Value = match format {
      Format::Yaml => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
      Format::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
      Format::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
    };
    Self::from_value(value)
  }

  /// Reads a document, picking the format from the file extension. A leading `~` is
  /// expanded from `HOME`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = expand_home(path.as_ref());
    let format = Format::from_path(&path)?;
    tracing::debug!(path = %path.display(), %format, "loading configuration document");

    let text = fs::read_to_string(&path).map_err(|source| Error::Read {
      path: path.clone(),
      source,
    })?;
    let mut document = Self::parse(&text, format)?;
    document.source = Some(path);
    Ok(document)
  }

  pub fn render(&self, format: Format) -> Result<String> {
    let serialize_error = |message: String| Error::Serialize { format, message };
    match format {
      Format::Yaml => serde_yaml::to_string(&self.root).map_err(|e| serialize_error(e.to_string())),
      Format::Json => serde_json::to_string_pretty(&self.root)
        .map(|mut text| {
          text.push('\n');
          text
        })
        .map_err(|e| serialize_error(e.to_string())),
      Format::Toml => toml::to_string_pretty(&self.root).map_err(|e| serialize_error(e.to_string())),
    }
  }

  /// Writes the document, picking the format from the file extension.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = expand_home(path.as_ref());
    let format = Format::from_path(&path)?;
    let text = self.render(format)?;
    tracing::debug!(path = %path.display(), %format, "saving configuration document");
    fs::write(&path, text).map_err(|source| Error::Write { path, source })
  }

  // --- Accessors ---

  pub fn root(&self) -> &Mapping {
    &self.root
  }

  pub fn into_root(self) -> Mapping {
    self.root
  }

  /// The file this document was loaded from, if any.
  pub fn source(&self) -> Option<&Path> {
    self.source.as_deref()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.root.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.root.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
    self.root.keys()
  }

  /// Nested access by dotted path, e.g. `optimizer.params.model`.
  pub fn lookup(&self, path: &str) -> Option<&Value> {
    let (head, rest) = match path.split_once('.') {
      Some((head, rest)) => (head, rest),
      None => (path, ""),
    };
    self.root.get(head)?.lookup(rest)
  }

  /// Every `_name`-tagged node, in document order.
  pub fn components(&self) -> Vec<Component> {
    let mut found = Vec::new();
    for (key, value) in self.root.iter() {
      value.walk(&join_path("", key), &mut |path, node| {
        if let Some(name) = node.component_name() {
          found.push(Component {
            path: path.to_string(),
            name: name.to_string(),
          });
        }
      });
    }
    found
  }

  /// Every whole-string `$key` alias, in document order.
  pub fn references(&self) -> Vec<AliasSite> {
    reference::aliases_in(&self.root)
  }

  /// A copy with `$VAR` tokens in every string substituted through `lookup`. Tokens
  /// `lookup` does not know, aliases to other nodes among them, are kept as written.
  pub fn interpolated<F>(&self, mut lookup: F) -> Document
  where
    F: FnMut(&str) -> Option<String>,
  {
    Document {
      root: interpolate_mapping(&self.root, &mut lookup),
      source: self.source.clone(),
    }
  }
}

fn interpolate_mapping(map: &Mapping, lookup: &mut dyn FnMut(&str) -> Option<String>) -> Mapping {
  map
    .iter()
    .map(|(key, value)| (key.to_owned(), interpolate_value(value, lookup)))
    .collect()
}

fn interpolate_value(value: &Value, lookup: &mut dyn FnMut(&str) -> Option<String>) -> Value {
  match value {
    Value::String(s) if s.contains(reference::SIGIL) => {
      Value::String(reference::interpolate(s, &mut *lookup))
    }
    Value::List(items) => Value::List(items.iter().map(|item| interpolate_value(item, lookup)).collect()),
    Value::Map(map) => Value::Map(interpolate_mapping(map, lookup)),
    other => other.clone(),
  }
}

impl From<Mapping> for Document {
  fn from(root: Mapping) -> Self {
    Self::from_mapping(root)
  }
}

fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
