//! `leafgate` - verify a signed submission and print its log leaf.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands};
use crate::config::Config;

mod cli;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);

    let config = match &app.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    match app.cmd {
        Commands::Verify(arg) => arg.run(&config).await,
    }
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
