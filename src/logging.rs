//! Tracing subscriber setup for the command line tool.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter directive for a run.
pub fn default_directive(verbose: bool) -> &'static str {
  if verbose { "debug" } else { "info" }
}

/// Install the global subscriber.
///
/// Events go to stderr, and additionally to `log_file` without colour codes when a path is
/// given. `RUST_LOG` overrides the verbosity chosen on the command line.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

  let file_layer = match log_file {
    Some(path) => {
      let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
      Some(
        fmt::layer()
          .with_ansi(false)
          .with_target(false)
          .with_writer(Mutex::new(file)),
      )
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(
      fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr),
    )
    .with(file_layer)
    .try_init()
    .context("failed to install tracing subscriber")
}
