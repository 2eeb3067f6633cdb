//! Sinew Runtime
//!
//! Command line driver for the skin cache and the reference tracer.

mod cli;
mod skin;
mod trace;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CliArgs, Command};
use sinew_services::Settings;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = CliArgs::parse();
    tracing::info!("Sinew v{}", sinew_core::VERSION);

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match args.command {
        Command::Skin(skin_args) => skin::run(&settings, &skin_args),
        Command::Trace(trace_args) => trace::run(&settings, &trace_args),
    }
}
