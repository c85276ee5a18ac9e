use std::process;

use anyhow::Result;
use clap::Parser;
use eks_versions::{Cli, filter::FilterError};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.debug {
    LevelFilter::DEBUG
  } else {
    cli.verbose.log_level_filter().as_trace()
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .init();

  if let Err(err) = eks_versions::audit(&cli).await {
    if let Some(err) = err.downcast_ref::<FilterError>() {
      eprintln!("Error: {err}");
      process::exit(2);
    }
    return Err(err);
  }

  Ok(())
}
