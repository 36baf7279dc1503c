//! Epoch Name Table
//!
//! Historical naming schemes of the host, ordered most-likely-current
//! first. Each epoch maps roles to the names a type or member had under
//! that scheme, plus per-role behaviour method names used by the
//! structural matcher.
//!
//! Tables are plain YAML:
//!
//! ```yaml
//! epochs:
//!   - name: mcp
//!     names:
//!       RootType: [net.minecraft.client.Minecraft]
//!       LocalPlayer: [thePlayer]
//!     behaviour:
//!       ActiveScreen: [drawScreen]
//! ```

mod builtin;

use crate::error::NamesError;
use crate::role::Role;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One historical naming scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub name: String,
    #[serde(default)]
    pub names: BTreeMap<Role, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub behaviour: BTreeMap<Role, Vec<String>>,
}

impl Epoch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: BTreeMap::new(),
            behaviour: BTreeMap::new(),
        }
    }

    pub fn with(mut self, role: Role, names: &[&str]) -> Self {
        self.names
            .entry(role)
            .or_default()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_behaviour(mut self, role: Role, names: &[&str]) -> Self {
        self.behaviour
            .entry(role)
            .or_default()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    fn absorb(&mut self, other: Epoch) {
        for (role, names) in other.names {
            let list = self.names.entry(role).or_default();
            for name in names {
                if !list.contains(&name) {
                    list.push(name);
                }
            }
        }
        for (role, names) in other.behaviour {
            let list = self.behaviour.entry(role).or_default();
            for name in names {
                if !list.contains(&name) {
                    list.push(name);
                }
            }
        }
    }
}

/// A candidate name and the epoch it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub epoch: &'a str,
}

/// Where merged epochs go relative to the existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Merged epochs are tried first
    Prepend,
    #[default]
    Append,
}

/// Ordered list of naming epochs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTable {
    pub epochs: Vec<Epoch>,
}

impl EpochTable {
    /// The table shipped with the engine
    pub fn builtin() -> Self {
        builtin::table()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, NamesError> {
        let table: EpochTable = serde_yaml::from_str(yaml)?;
        if let Some(pos) = table.epochs.iter().position(|e| e.name.trim().is_empty()) {
            return Err(NamesError::UnnamedEpoch(pos));
        }
        Ok(table)
    }

    pub fn to_yaml(&self) -> Result<String, NamesError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Merge another table into this one
    ///
    /// Epochs sharing a name are combined (new names appended to each list);
    /// the rest are placed before or after the existing epochs.
    pub fn merge(&mut self, other: EpochTable, placement: Placement) {
        let mut fresh = Vec::new();
        for epoch in other.epochs {
            match self.epochs.iter_mut().find(|e| e.name == epoch.name) {
                Some(existing) => existing.absorb(epoch),
                None => fresh.push(epoch),
            }
        }
        match placement {
            Placement::Append => self.epochs.extend(fresh),
            Placement::Prepend => {
                fresh.append(&mut self.epochs);
                self.epochs = fresh;
            }
        }
    }

    /// Candidate names for a role, epochs in order, duplicates removed
    pub fn candidates(&self, role: Role) -> Vec<Candidate<'_>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for epoch in &self.epochs {
            for name in epoch.names.get(&role).into_iter().flatten() {
                if seen.insert(name.as_str()) {
                    out.push(Candidate {
                        name,
                        epoch: &epoch.name,
                    });
                }
            }
        }
        out
    }

    /// Behaviour method names for a role across all epochs
    pub fn behaviour(&self, role: Role) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.epochs
            .iter()
            .flat_map(|e| e.behaviour.get(&role).into_iter().flatten())
            .map(String::as_str)
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Position of `name` among the role's candidates
    pub fn rank_of(&self, role: Role, name: &str) -> Option<usize> {
        self.candidates(role).iter().position(|c| c.name == name)
    }

    /// Epoch that first lists `name` for the role
    pub fn epoch_of(&self, role: Role, name: &str) -> Option<&str> {
        self.epochs
            .iter()
            .find(|e| e.names.get(&role).is_some_and(|l| l.iter().any(|n| n == name)))
            .map(|e| e.name.as_str())
    }

    pub fn epoch_names(&self) -> impl Iterator<Item = &str> {
        self.epochs.iter().map(|e| e.name.as_str())
    }
}
