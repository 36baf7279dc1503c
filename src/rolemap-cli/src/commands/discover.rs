//! Discover command handler

use super::{attach, parse_roles};
use anyhow::{Context, Result};
use std::path::Path;

/// Run discovery on a snapshot and print the mapping summary
pub fn handle(snapshot: &Path, names: Option<&Path>, roles: &[String], json: bool) -> Result<()> {
    let session = attach(snapshot, names, parse_roles(roles)?)?;
    let summary = session
        .publisher
        .summary()
        .context("No mapping was published")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }

    session.worker.shutdown();
    Ok(())
}
