//! Book locator - shelf positions for library call numbers.

mod callnumber;
mod cli;
mod config;
mod index;
mod locate;
mod logger;
mod source;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::LocatorConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.command.common().verbose);

    let config = LocatorConfig::load(&cli)?;

    match &cli.command {
        Commands::Index {
            force, locations, ..
        } => cli::index::run_index(&config, *force, locations),
        Commands::Locate { query, cache, .. } => cli::locate::run_locate(&config, query, *cache),
        Commands::Normalize { query, .. } => cli::locate::run_normalize(&config, query),
        Commands::Serve { .. } => cli::serve::serve(&config),
    }
}
