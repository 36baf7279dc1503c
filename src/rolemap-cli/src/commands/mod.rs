//! Command handlers for rolemap CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod candidates;
pub mod configure;
pub mod discover;
pub mod names;
pub mod probe;
pub mod state;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use rolemap::{
    DiscoveryWorker, Engine, RegistryEvent, RegistryPublisher, Role, SnapshotHost,
};
use std::path::Path;
use std::sync::Arc;

/// A worker attached to a snapshot host with its first mapping published
pub struct Session {
    pub worker: DiscoveryWorker,
    pub publisher: Arc<RegistryPublisher>,
}

pub fn open_snapshot(path: &Path) -> Result<SnapshotHost> {
    SnapshotHost::open(path).with_context(|| format!("Failed to open snapshot {}", path.display()))
}

/// Parse role names given on the command line
pub fn parse_roles(names: &[String]) -> Result<Option<Vec<Role>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let roles = names
        .iter()
        .map(|n| n.parse::<Role>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(roles))
}

/// Spawn the discovery worker on a snapshot and wait for the first pass
pub fn attach(
    snapshot: &Path,
    names: Option<&Path>,
    requested: Option<Vec<Role>>,
) -> Result<Session> {
    let config = Config::load()?;
    let host = Arc::new(open_snapshot(snapshot)?);
    let engine = Engine::new(config.engine_config(requested), config.name_table(names)?);

    let publisher = Arc::new(RegistryPublisher::new());
    let events = publisher.subscribe();
    let worker = DiscoveryWorker::spawn(host, publisher.clone(), engine, config.worker_config())
        .context("Failed to start discovery worker")?;
    worker.attach()?;

    match events.recv().context("Discovery worker stopped unexpectedly")? {
        RegistryEvent::Published(_) => Ok(Session { worker, publisher }),
        RegistryEvent::Failed(reason) => bail!("Discovery failed: {}", reason),
        RegistryEvent::Invalidated(version) => bail!("Mapping {} was invalidated", version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!(parse_roles(&[]).unwrap(), None);
        assert_eq!(
            parse_roles(&["localplayer".into(), "ActiveWorld".into()]).unwrap(),
            Some(vec![Role::LocalPlayer, Role::ActiveWorld])
        );
        assert!(parse_roles(&["Nope".into()]).is_err());
    }
}
