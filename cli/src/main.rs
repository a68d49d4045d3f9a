mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match cli.run() {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(err) => {
      eprintln!("error: {:#}", err);
      ExitCode::FAILURE
    }
  }
}

/// `RUST_LOG` wins when set; otherwise `-v` and `-vv` raise the trellis crates to
/// `info` and `debug`.
fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    _ => Level::DEBUG,
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(format!(
      "warn,trellis_config={level},trellis_ioc={level},trellis_cli={level}",
      level = level.as_str().to_lowercase()
    ))
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(verbose > 1)
    .with_writer(std::io::stderr)
    .init();
}
