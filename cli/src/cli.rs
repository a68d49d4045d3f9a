//! Command line surface of the `trellis` binary.

use crate::commands;
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use trellis_config::{Format, Value};

#[derive(Parser, Debug)]
#[command(
  name = "trellis",
  version,
  about = "Check, normalise and inspect experiment configuration documents."
)]
pub struct Cli {
  /// More log output (-v info, -vv debug). `RUST_LOG` overrides this.
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Check references, cycles and the experiment layout of a document
  Check(CheckArgs),

  /// Print a document, optionally in another format
  Show(ShowArgs),

  /// List every `$key` reference with the path it sits at
  Refs(FileArg),

  /// List every component (`_name` node) with its path
  Components(FileArg),
}

#[derive(Args, Debug)]
pub struct FileArg {
  /// Document to read (.yaml, .yml, .json or .toml)
  pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
  #[command(flatten)]
  pub input: FileArg,

  /// Substitution variable, `NAME=VALUE`. Repeatable.
  #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
  pub variables: Vec<(String, Value)>,

  /// Do not accept `$NAME` aliases that only the process environment defines
  #[arg(long)]
  pub no_env: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
  #[command(flatten)]
  pub input: FileArg,

  /// Output format. Defaults to the input's format.
  #[arg(long, value_enum)]
  pub to: Option<OutputFormat>,

  /// Substitute `$VAR` tokens from `--var` and the process environment
  #[arg(long)]
  pub interpolate: bool,

  /// Substitution variable, `NAME=VALUE`. Repeatable.
  #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
  pub variables: Vec<(String, Value)>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
  Yaml,
  Json,
  Toml,
}

impl From<OutputFormat> for Format {
  fn from(format: OutputFormat) -> Self {
    match format {
      OutputFormat::Yaml => Format::Yaml,
      OutputFormat::Json => Format::Json,
      OutputFormat::Toml => Format::Toml,
    }
  }
}

impl Cli {
  /// Runs the selected command against stdout. `Ok(false)` means the command ran but
  /// found problems.
  pub fn run(self) -> Result<bool> {
    let mut out = io::stdout().lock();
    match self.command {
      Commands::Check(args) => {
        commands::check(&args.input.file, &args.variables, !args.no_env, &mut out)
      }
      Commands::Show(args) => {
        commands::show(
          &args.input.file,
          args.to.map(Format::from),
          args.interpolate,
          &args.variables,
          &mut out,
        )?;
        Ok(true)
      }
      Commands::Refs(args) => {
        commands::refs(&args.file, &mut out)?;
        Ok(true)
      }
      Commands::Components(args) => {
        commands::components(&args.file, &mut out)?;
        Ok(true)
      }
    }
  }
}

/// `NAME=VALUE`, where the value reads as an integer, a float or a bool when it can and
/// as a string otherwise.
pub fn parse_variable(raw: &str) -> Result<(String, Value)> {
  let (name, value) = raw
    .split_once('=')
    .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{}`", raw))?;
  if name.is_empty() {
    return Err(anyhow!("variable name is empty in `{}`", raw));
  }
  let value = if let Ok(i) = value.parse::<i64>() {
    Value::Integer(i)
  } else if let Ok(f) = value.parse::<f64>() {
    Value::Float(f)
  } else if let Ok(b) = value.parse::<bool>() {
    Value::Bool(b)
  } else {
    Value::String(value.to_string())
  };
  Ok((name.to_string(), value))
}
