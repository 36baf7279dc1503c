//! Core CLI definitions

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::names::NamesCommand;

#[derive(Parser)]
#[command(name = "rolemap")]
#[command(about = "Role discovery over renamed host runtimes", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run discovery against a host snapshot and print the mapping
    #[command(visible_alias = "d")]
    Discover {
        /// Snapshot file (JSON, or YAML by extension)
        snapshot: PathBuf,

        /// Extra name table, tried before the built-in epochs
        #[arg(short, long)]
        names: Option<PathBuf>,

        /// Only resolve these roles (comma separated) and what they need
        #[arg(short, long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List application singleton candidates of a snapshot
    Candidates {
        /// Snapshot file
        snapshot: PathBuf,
    },

    /// Name table operations (dump, merge)
    #[command(visible_alias = "n")]
    Names {
        #[command(subcommand)]
        command: NamesCommand,
    },

    /// Evaluate one resolved role against the live snapshot
    Probe {
        /// Snapshot file
        snapshot: PathBuf,

        /// Role name (e.g. LocalPlayer, EntityPositionX)
        role: String,

        /// Extra name table
        #[arg(short, long)]
        names: Option<PathBuf>,
    },

    /// Sample the game state and print it as JSON
    State {
        /// Snapshot file
        snapshot: PathBuf,

        /// Maximum number of entities
        #[arg(short, long, default_value_t = rolemap::access::DEFAULT_ENTITY_LIMIT)]
        limit: usize,

        /// Extra name table
        #[arg(short, long)]
        names: Option<PathBuf>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Instance field count a singleton candidate must exceed
        #[arg(long)]
        threshold: Option<usize>,

        /// Discovery attempts before giving up
        #[arg(long)]
        attempts: Option<u32>,

        /// Default log level (error, warn, info, debug, trace)
        #[arg(long)]
        log_level: Option<String>,
    },
}
