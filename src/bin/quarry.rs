//! Quarry CLI binary.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quarry::cli::{QuarryArgs, execute_command};

fn main() -> anyhow::Result<()> {
    let args = QuarryArgs::parse();

    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    execute_command(&args).context("command failed")
}
