//! Probe command handler
//!
//! Evaluates one resolved role on the discovery worker and prints where it
//! was found and what it currently holds.

use super::attach;
use anyhow::{bail, Context, Result};
use rolemap::{evaluate_role, Role};
use std::path::Path;

pub fn handle(snapshot: &Path, role: &str, names: Option<&Path>) -> Result<()> {
    let role: Role = role.parse().map_err(anyhow::Error::msg)?;
    let session = attach(snapshot, names, Some(vec![role]))?;

    let registry = session
        .publisher
        .current()
        .context("No mapping was published")?;
    let Some(resolved) = registry.resolved(role) else {
        let reason = registry
            .absence(role)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "not requested".to_string());
        bail!("{} is not resolved: {}", role, reason);
    };

    println!("Role:     {}", role);
    println!("Member:   {}::{}", resolved.owner.name, resolved.member);
    println!("Declared: {}", resolved.declared);
    println!("Origin:   {}", resolved.origin);

    let value = session
        .worker
        .run(move |host, registry| registry.and_then(|r| evaluate_role(host, r, role)))?
        .recv()
        .context("Discovery worker stopped unexpectedly")?;
    match value {
        Some(value) => println!("Value:    {}", value),
        None => println!("Value:    <unavailable>"),
    }

    session.worker.shutdown();
    Ok(())
}
