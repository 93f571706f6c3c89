//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Book locator: shelf positions for call numbers
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: locator.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "locator.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build range indexes from the configured sources
    #[command(visible_alias = "i")]
    Index {
        /// Rebuild even when no sheet changed since the last build
        #[arg(short, long)]
        force: bool,

        /// Only index these locations (the build time is not recorded)
        #[arg(value_name = "LOCATION")]
        locations: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Find the shelf position of a call number
    #[command(visible_alias = "l")]
    Locate {
        #[command(flatten)]
        query: QueryArgs,

        /// Load every location into memory first, as the server does
        #[arg(long)]
        cache: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the canonical form of a call number
    #[command(visible_alias = "n")]
    Normalize {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Serve lookups over HTTP
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// A call number and the location to look it up in.
#[derive(clap::Args, Debug, Clone)]
pub struct QueryArgs {
    /// Call number, e.g. "PS3568.U812 R57x 1994"
    #[arg(value_name = "CALL_NUMBER")]
    pub call_number: String,

    /// Location code, e.g. rock
    #[arg(short, long)]
    pub location: String,
}

impl Commands {
    pub const fn common(&self) -> &CommonArgs {
        match self {
            Self::Index { common, .. }
            | Self::Locate { common, .. }
            | Self::Normalize { common, .. }
            | Self::Serve { common, .. } => common,
        }
    }
}
