//! Name table command handlers

use crate::config::{read_table, Config};
use anyhow::{Context, Result};
use rolemap::{EpochTable, Placement};
use std::fs;
use std::path::{Path, PathBuf};

/// Print the effective table: built-in plus configured tables
pub fn dump(output: Option<&Path>) -> Result<()> {
    let table = Config::load()?.name_table(None)?;
    write_table(&table, output)
}

/// Merge tables onto the built-in table
pub fn merge(files: &[PathBuf], prepend: bool, output: Option<&Path>) -> Result<()> {
    let table = merged(files, prepend)?;
    write_table(&table, output)
}

fn merged(files: &[PathBuf], prepend: bool) -> Result<EpochTable> {
    let placement = if prepend {
        Placement::Prepend
    } else {
        Placement::Append
    };
    let mut table = EpochTable::builtin();
    for file in files {
        table.merge(read_table(file)?, placement);
    }
    Ok(table)
}

fn write_table(table: &EpochTable, output: Option<&Path>) -> Result<()> {
    let yaml = table.to_yaml().context("Failed to serialize name table")?;
    match output {
        Some(path) => {
            fs::write(path, yaml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} epochs to {}",
                table.epochs.len(),
                path.display()
            );
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
