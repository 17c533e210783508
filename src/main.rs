//! `mlt-collector`: archive an MLT project together with every file it references.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mlt_collector::install::create_dir_idempotent;
use mlt_collector::{CollectorConfig, ProjectCollector, logging};

#[derive(Parser)]
#[command(
  name = "mlt-collector",
  about = "Collect an MLT project and all of its assets into one portable folder",
  version
)]
struct Cli {
  /// Project file to collect
  input: String,

  /// Directory receiving the rewritten project and its assets
  output: String,

  /// JSON configuration overriding the output layout
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,

  /// Do not write a log file into the output directory
  #[arg(long)]
  no_log_file: bool,
}

fn main() -> Result<()> {
  run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
  let input = PathBuf::from(unquote(&cli.input));
  let output = PathBuf::from(trim_trailing_separator(unquote(&cli.output)));

  let config = match &cli.config {
    Some(path) => CollectorConfig::from_path(path)?,
    None => CollectorConfig::discover(input.parent().unwrap_or_else(|| Path::new("."))),
  };
  let log_path = (!cli.no_log_file).then(|| output.join(&config.log_file));
  let collector = ProjectCollector::new(config.into_layout(), &input, &output);
  collector.validate()?;

  create_dir_idempotent(&output)
    .with_context(|| format!("failed to create {}", output.display()))?;
  logging::init(cli.verbose, log_path.as_deref())?;
  info!("collecting {} into {}", input.display(), output.display());

  let summary = collector
    .collect()
    .with_context(|| format!("failed to collect {}", input.display()))?;

  info!("project file {} generated", summary.project_file.display());
  if !summary.report.failed.is_empty() {
    info!(
      "{} referenced files could not be collected; see the log for details",
      summary.report.failed.len()
    );
  }
  Ok(())
}

/// Strip one pair of surrounding single quotes.
fn unquote(value: &str) -> &str {
  value
    .strip_prefix('\'')
    .and_then(|rest| rest.strip_suffix('\''))
    .unwrap_or(value)
}

fn trim_trailing_separator(value: &str) -> &str {
  match value.trim_end_matches('/') {
    "" => value,
    trimmed => trimmed,
  }
}
