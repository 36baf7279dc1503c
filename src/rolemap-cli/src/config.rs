//! Configuration management for rolemap CLI

use anyhow::{Context, Result};
use rolemap::{EngineConfig, EpochTable, Placement, Role, WorkerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Default log level when RUST_LOG is unset
    pub log_level: Option<String>,
    pub singleton_threshold: Option<usize>,
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    /// Additional namespace prefixes to reject
    pub extra_prefixes: Vec<String>,
    /// Name tables merged before the built-in epochs
    pub name_tables: Vec<PathBuf>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("rolemap");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    pub fn engine_config(&self, requested: Option<Vec<Role>>) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            singleton_threshold: self
                .singleton_threshold
                .unwrap_or(defaults.singleton_threshold),
            extra_prefixes: self.extra_prefixes.clone(),
            requested,
            ..defaults
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        let defaults = WorkerConfig::default();
        WorkerConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
        }
    }

    /// Built-in table with configured tables and `extra` placed in front
    ///
    /// `extra` ends up first, so its epochs win over everything else.
    pub fn name_table(&self, extra: Option<&Path>) -> Result<EpochTable> {
        let mut table = EpochTable::builtin();
        for path in self.name_tables.iter().map(PathBuf::as_path).chain(extra) {
            table.merge(read_table(path)?, Placement::Prepend);
        }
        Ok(table)
    }
}

/// Load a YAML name table
pub fn read_table(path: &Path) -> Result<EpochTable> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read name table {}", path.display()))?;
    EpochTable::from_yaml(&yaml)
        .with_context(|| format!("Invalid name table {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            log_level: Some("debug".into()),
            singleton_threshold: Some(20),
            max_attempts: Some(5),
            extra_prefixes: vec!["net.fabricmc.".into()],
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_engine_and_worker_defaults() {
        let config = Config {
            singleton_threshold: Some(30),
            initial_backoff_ms: Some(10),
            ..Default::default()
        };
        let engine = config.engine_config(Some(vec![Role::LocalPlayer]));
        assert_eq!(engine.singleton_threshold, 30);
        assert_eq!(engine.max_hierarchy_depth, 10);
        assert_eq!(engine.requested, Some(vec![Role::LocalPlayer]));

        let worker = config.worker_config();
        assert_eq!(worker.max_attempts, 3);
        assert_eq!(worker.initial_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_extra_table_goes_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.yaml");
        fs::write(
            &path,
            "epochs:\n  - name: snapshot-24w\n    names:\n      LocalPlayer: [playerRef]\n",
        )
        .unwrap();

        let table = Config::default().name_table(Some(&path)).unwrap();
        assert_eq!(table.epoch_names().next(), Some("snapshot-24w"));
        assert_eq!(table.candidates(Role::LocalPlayer)[0].name, "playerRef");

        fs::write(&path, "epochs:\n  - name: ''\n").unwrap();
        assert!(Config::default().name_table(Some(&path)).is_err());
    }
}
