//! Application singleton discovery via the self-referential pattern
//!
//! The application root type holds its own instance in a static field of
//! its own type, and carries far more instance state than any helper
//! class. Both properties survive renaming.

use super::enumerate::TypeUniverse;
use crate::error::DiscoveryError;
use crate::model::{FieldDescriptor, TypeDescriptor, TypeHandle};
use crate::names::EpochTable;
use crate::role::Role;

use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info};

/// A type with the singleton shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingletonCandidate {
    pub name: String,
    pub handle: TypeHandle,
    pub instance_fields: usize,
    /// First self-typed static field in declaration order
    pub instance_field: String,
    /// Position among the known root type names, if listed
    pub name_rank: Option<usize>,
}

/// Chosen root type and the static field holding its instance
#[derive(Debug, Clone)]
pub struct RootMatch {
    pub ty: Arc<TypeDescriptor>,
    pub instance: FieldDescriptor,
    pub candidates: Vec<SingletonCandidate>,
}

/// All types with the singleton shape, best first
///
/// Known names win (earlier position first), then larger instance field
/// count, then the lexicographically smaller name.
pub fn find_candidates(
    universe: &TypeUniverse,
    table: &EpochTable,
    threshold: usize,
) -> Vec<SingletonCandidate> {
    let mut candidates: Vec<SingletonCandidate> = universe
        .iter()
        .filter_map(|ty| {
            let instance_field = ty.self_typed_statics().next()?;
            let instance_fields = ty.instance_field_count();
            if instance_fields <= threshold {
                return None;
            }
            debug!(
                "Singleton candidate {} ({} instance fields, static {})",
                ty.name, instance_fields, instance_field.name
            );
            Some(SingletonCandidate {
                name: ty.name.clone(),
                handle: ty.handle,
                instance_fields,
                instance_field: instance_field.name.clone(),
                name_rank: table.rank_of(Role::RootType, &ty.name),
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        let key = |c: &SingletonCandidate| {
            (
                c.name_rank.unwrap_or(usize::MAX),
                Reverse(c.instance_fields),
            )
        };
        key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

/// Locate the application root type
pub fn locate_root(
    universe: &TypeUniverse,
    table: &EpochTable,
    threshold: usize,
) -> Result<RootMatch, DiscoveryError> {
    let candidates = find_candidates(universe, table, threshold);

    let best = candidates
        .first()
        .ok_or(DiscoveryError::SingletonNotFound {
            scanned: universe.len(),
        })?;
    let ty = universe
        .by_handle(best.handle)
        .cloned()
        .ok_or(DiscoveryError::SingletonNotFound {
            scanned: universe.len(),
        })?;
    let instance = ty
        .self_typed_statics()
        .next()
        .cloned()
        .ok_or(DiscoveryError::SingletonNotFound {
            scanned: universe.len(),
        })?;

    info!(
        "Root type {} ({} instance fields, {} candidates)",
        ty.name,
        best.instance_fields,
        candidates.len()
    );

    Ok(RootMatch {
        ty,
        instance,
        candidates,
    })
}
