//! Name table subcommands

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum NamesCommand {
    /// Print the effective name table as YAML
    Dump {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge YAML tables onto the built-in table and print the result
    Merge {
        /// Tables to merge, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Put new epochs before the built-in ones
        #[arg(long)]
        prepend: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
