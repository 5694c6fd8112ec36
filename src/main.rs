mod cli;
mod config;
mod logging;

use clap::Parser;
use color_eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = cli::Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let log_file = args.log_file.clone().or_else(|| config.logging.file.clone());
  let _log_guard = logging::init(log_file.as_deref())?;

  cli::run(args, config).await
}
