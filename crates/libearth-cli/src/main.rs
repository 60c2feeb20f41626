//! earth
//!
//! Command-line interface for libearth.

use anyhow::Result;
use clap::Parser;
use libearth_cli::{Cli, EarthConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins, then -v, then the configured level
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        EarthConfig::load(cli.config.as_deref())
            .map(|config| config.log_level)
            .unwrap_or_else(|_| EarthConfig::default().log_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = libearth_core::VERSION, "starting earth");
    let stdout = std::io::stdout();
    libearth_cli::run(cli, &mut stdout.lock())?;
    Ok(())
}
