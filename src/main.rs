//! The `jamflow` binary: parse arguments, install logging, run, report.

use clap::Parser;
use jamflow::cli::{Cli, run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  if let Err(error) = run(cli).await {
    eprintln!("Error: {error}");
    std::process::exit(1);
  }
}
