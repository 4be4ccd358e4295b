//! `harvest` binary entry point.

use anyhow::Context;
use clap::Parser;
use harvest_report::{init_tracing, run, Cli, ReportConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config first: it decides how logging is set up.
    let config =
        ReportConfig::load(cli.config.clone()).context("Failed to load report configuration")?;
    init_tracing(&config.logging);

    info!(input = %cli.input.display(), "Starting Harvest report");

    let output = run(&cli, &config, harvest_core::today())
        .with_context(|| format!("Failed to build report from {}", cli.input.display()))?;
    println!("{output}");

    Ok(())
}
