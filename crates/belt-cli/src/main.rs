use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the summary and artifact paths.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Info { belt, config } => commands::info::run(&belt, config.as_deref()),
        Commands::PrintSettings { json } => commands::print_settings::run(json),
    }
}
