//! The `trellis` subcommands. Each writes its report to `out` so it can be exercised
//! without a terminal.

use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::Path;
use trellis_config::{Document, Format, Schema, Value};

fn load(path: &Path) -> Result<Document> {
  Document::load(path).with_context(|| format!("cannot read document {}", path.display()))
}

/// Structural checks plus the experiment layout. Returns whether the document passed.
///
/// Aliases may name a `--var` variable and, with `use_env`, a set environment variable,
/// the same fallbacks an experiment build uses.
pub fn check(
  path: &Path,
  variables: &[(String, Value)],
  use_env: bool,
  out: &mut impl Write,
) -> Result<bool> {
  let document = load(path)?;
  let from_env: Vec<String> = if use_env {
    document
      .references()
      .into_iter()
      .map(|site| site.target)
      .filter(|target| env::var_os(target).is_some())
      .collect()
  } else {
    Vec::new()
  };
  let known = variables
    .iter()
    .map(|(name, _)| name.as_str())
    .chain(from_env.iter().map(String::as_str));
  let mut report = document.validate_with(known);
  report.extend(Schema::experiment().check(&document));

  if report.is_ok() {
    tracing::info!(path = %path.display(), "document passed all checks");
    writeln!(out, "{}: ok", path.display())?;
    return Ok(true);
  }

  for issue in &report.issues {
    writeln!(out, "{}: {}", path.display(), issue)?;
  }
  writeln!(out, "{} issue(s) found", report.issues.len())?;
  Ok(false)
}

/// Re-serialises a document, in `to` or its own format.
pub fn show(
  path: &Path,
  to: Option<Format>,
  interpolate: bool,
  variables: &[(String, Value)],
  out: &mut impl Write,
) -> Result<()> {
  let document = load(path)?;
  let format = match to {
    Some(format) => format,
    None => Format::from_path(path)?,
  };
  let document = if interpolate {
    document.interpolated(|name| lookup_variable(variables, name))
  } else {
    document
  };

  let text = document
    .render(format)
    .with_context(|| format!("cannot render {} as {}", path.display(), format))?;
  out.write_all(text.as_bytes())?;
  Ok(())
}

pub fn refs(path: &Path, out: &mut impl Write) -> Result<()> {
  let document = load(path)?;
  for site in document.references() {
    writeln!(out, "{}\t${}", site.path, site.target)?;
  }
  Ok(())
}

pub fn components(path: &Path, out: &mut impl Write) -> Result<()> {
  let document = load(path)?;
  for component in document.components() {
    writeln!(out, "{}\t{}", component.path, component.name)?;
  }
  Ok(())
}

// `--var` values first, then the process environment.
fn lookup_variable(variables: &[(String, Value)], name: &str) -> Option<String> {
  variables
    .iter()
    .rev()
    .find(|(candidate, _)| candidate == name)
    .map(|(_, value)| value.to_string())
    .or_else(|| env::var(name).ok())
}
