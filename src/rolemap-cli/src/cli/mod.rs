//! CLI argument definitions for rolemap
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod names;

pub use core::{Cli, Commands};
pub use names::NamesCommand;
