//! State command handler

use super::attach;
use anyhow::{Context, Result};
use rolemap::{game_state, GameState};
use std::path::Path;

/// Sample the game state on the worker and print it as JSON
pub fn handle(snapshot: &Path, limit: usize, names: Option<&Path>) -> Result<()> {
    let session = attach(snapshot, names, None)?;

    let state = session
        .worker
        .run(move |host, registry| {
            registry
                .map(|r| game_state(host, r, limit))
                .unwrap_or_default()
        })?
        .recv()
        .context("Discovery worker stopped unexpectedly")?;
    print_state(&state)?;

    session.worker.shutdown();
    Ok(())
}

fn print_state(state: &GameState) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
