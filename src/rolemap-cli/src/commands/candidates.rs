//! Candidates command handler
//!
//! Lists every type with the application-singleton shape, best first, so a
//! wrong root pick can be diagnosed without running a full pass.

use super::open_snapshot;
use crate::config::Config;
use anyhow::Result;
use rolemap::Engine;
use std::path::Path;

pub fn handle(snapshot: &Path) -> Result<()> {
    let config = Config::load()?;
    let host = open_snapshot(snapshot)?;
    let engine = Engine::new(config.engine_config(None), config.name_table(None)?);

    let (universe, candidates) = engine.candidates(&host)?;
    println!(
        "Scanned {} types ({} accepted, {} rejected, {} failed)",
        universe.scanned,
        universe.len(),
        universe.rejected,
        universe.failed
    );

    if candidates.is_empty() {
        println!(
            "No type holds a self-typed static with more than {} instance fields",
            engine.config().singleton_threshold
        );
        return Ok(());
    }

    println!("{:<4} {:<48} {:>7}  {:<20} {}", "#", "Type", "Fields", "Instance", "Known");
    for (i, c) in candidates.iter().enumerate() {
        let known = c
            .name_rank
            .map(|r| format!("rank {}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<48} {:>7}  {:<20} {}",
            i + 1,
            c.name,
            c.instance_fields,
            c.instance_field,
            known
        );
    }
    Ok(())
}
