//! Role Registry
//!
//! The single owned cache of resolved handles. A discovery pass fills a
//! `RegistryBuilder`; the resulting `RoleRegistry` is immutable and shared
//! through the `RegistryPublisher`, which consumers read without ever
//! waiting on discovery.

use crate::error::SessionError;
use crate::model::{FieldHandle, MethodHandle, TypeDescriptor, TypeHandle, TypeRef};
use crate::role::Role;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directly usable handle for a resolved role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessor {
    Type(TypeHandle),
    StaticField(FieldHandle),
    Field(FieldHandle),
    StaticMethod(MethodHandle),
    Method(MethodHandle),
}

impl Accessor {
    pub fn field(&self) -> Option<FieldHandle> {
        match self {
            Self::StaticField(f) | Self::Field(f) => Some(*f),
            _ => None,
        }
    }
}

/// How a role was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    ByName { epoch: String },
    ByStructure,
    BySampledValidation,
}

impl Origin {
    /// Strength of the evidence; higher wins
    pub fn rank(&self) -> u8 {
        match self {
            Self::ByStructure => 0,
            Self::ByName { .. } => 1,
            Self::BySampledValidation => 2,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName { epoch } => write!(f, "name ({})", epoch),
            Self::ByStructure => f.write_str("structure"),
            Self::BySampledValidation => f.write_str("sampled"),
        }
    }
}

/// A role bound to a concrete host type or member
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    pub role: Role,
    pub accessor: Accessor,
    pub origin: Origin,
    /// Declaring type (the type itself for type roles)
    pub owner: Arc<TypeDescriptor>,
    /// Member name (qualified type name for type roles)
    pub member: String,
    /// Declared type (the type itself for type roles)
    pub declared: TypeRef,
}

/// Why a requested role has no binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Absence {
    NotFound,
    /// Every container candidate was empty or unreadable; retry later
    Deferred,
    DependencyMissing(Role),
    /// Needs the live root instance, which is not initialized
    RootUnavailable,
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Deferred => f.write_str("deferred (no live sample yet)"),
            Self::DependencyMissing(role) => write!(f, "depends on missing {}", role),
            Self::RootUnavailable => f.write_str("root instance unavailable"),
        }
    }
}

/// Identity of a registry: session plus re-discovery generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RegistryVersion {
    pub session: u64,
    pub generation: u64,
}

impl fmt::Display for RegistryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}.g{}", self.session, self.generation)
    }
}

/// Immutable mapping produced by one discovery pass
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    version: RegistryVersion,
    resolved: BTreeMap<Role, ResolvedRole>,
    absent: BTreeMap<Role, Absence>,
    requested: BTreeSet<Role>,
    fingerprint: String,
}

impl RoleRegistry {
    pub fn version(&self) -> RegistryVersion {
        self.version
    }

    /// Copy of the handle bound to `role`
    pub fn resolve(&self, role: Role) -> Option<Accessor> {
        self.resolved.get(&role).map(|r| r.accessor)
    }

    pub fn resolved(&self, role: Role) -> Option<&ResolvedRole> {
        self.resolved.get(&role)
    }

    pub fn absence(&self, role: Role) -> Option<Absence> {
        self.absent.get(&role).copied()
    }

    pub fn requested(&self) -> &BTreeSet<Role> {
        &self.requested
    }

    /// SHA-256 over the accepted type names of the pass
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn is_fully_mapped(&self) -> bool {
        self.absent.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedRole> {
        self.resolved.values()
    }

    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            version: self.version,
            fully_mapped: self.is_fully_mapped(),
            fingerprint: self.fingerprint.clone(),
            resolved: self
                .resolved
                .values()
                .map(|r| SummaryEntry {
                    role: r.role,
                    owner: r.owner.name.clone(),
                    member: r.member.clone(),
                    declared: r.declared.to_string(),
                    origin: r.origin.clone(),
                })
                .collect(),
            missing: self.absent.iter().map(|(r, a)| (*r, *a)).collect(),
        }
    }
}

/// One resolved role in a `MappingSummary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub role: Role,
    pub owner: String,
    pub member: String,
    pub declared: String,
    pub origin: Origin,
}

/// Human- and machine-readable report of a registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSummary {
    pub version: RegistryVersion,
    pub fully_mapped: bool,
    pub fingerprint: String,
    pub resolved: Vec<SummaryEntry>,
    pub missing: Vec<(Role, Absence)>,
}

impl fmt::Display for MappingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mapping {} ({})",
            self.version,
            if self.fully_mapped {
                "fully mapped"
            } else {
                "partially mapped"
            }
        )?;
        for entry in &self.resolved {
            writeln!(
                f,
                "  {:<18} {}::{} : {} [{}]",
                entry.role, entry.owner, entry.member, entry.declared, entry.origin
            )?;
        }
        for (role, absence) in &self.missing {
            writeln!(f, "  {:<18} MISSING: {}", role, absence)?;
        }
        Ok(())
    }
}

/// Accumulates bindings during a pass
pub struct RegistryBuilder {
    version: RegistryVersion,
    resolved: BTreeMap<Role, ResolvedRole>,
    absent: BTreeMap<Role, Absence>,
    requested: BTreeSet<Role>,
    fingerprint: String,
}

impl RegistryBuilder {
    pub fn new(version: RegistryVersion) -> Self {
        Self {
            version,
            resolved: BTreeMap::new(),
            absent: BTreeMap::new(),
            requested: BTreeSet::new(),
            fingerprint: String::new(),
        }
    }

    /// Start from the sampled-validation bindings of an earlier version
    pub fn seeded(version: RegistryVersion, previous: &RoleRegistry) -> Self {
        let mut builder = Self::new(version);
        for (role, resolved) in &previous.resolved {
            if resolved.origin == Origin::BySampledValidation {
                builder.resolved.insert(*role, resolved.clone());
            }
        }
        builder
    }

    pub fn version(&self) -> RegistryVersion {
        self.version
    }

    pub fn set_requested(&mut self, requested: BTreeSet<Role>) {
        self.requested = requested;
    }

    pub fn set_fingerprint(&mut self, fingerprint: String) {
        self.fingerprint = fingerprint;
    }

    /// Bind a role unless an equal or stronger binding already exists
    pub fn bind(&mut self, resolved: ResolvedRole) -> bool {
        if let Some(existing) = self.resolved.get(&resolved.role) {
            if existing.origin.rank() >= resolved.origin.rank() {
                debug!(
                    "Keeping {} binding {} over {} ({})",
                    resolved.role, existing.member, resolved.member, resolved.origin
                );
                return false;
            }
        }
        self.absent.remove(&resolved.role);
        self.resolved.insert(resolved.role, resolved);
        true
    }

    /// Record why a role is missing; ignored when the role is bound
    pub fn mark_absent(&mut self, role: Role, absence: Absence) {
        if !self.resolved.contains_key(&role) {
            self.absent.insert(role, absence);
        }
    }

    pub fn is_bound(&self, role: Role) -> bool {
        self.resolved.contains_key(&role)
    }

    pub fn is_settled(&self, role: Role) -> bool {
        self.resolved.contains_key(&role) || self.absent.contains_key(&role)
    }

    pub fn get(&self, role: Role) -> Option<&ResolvedRole> {
        self.resolved.get(&role)
    }

    /// Qualified name a type role resolved to
    pub fn type_name(&self, role: Role) -> Option<&str> {
        self.resolved.get(&role).map(|r| r.owner.name.as_str())
    }

    /// Fields bound to any role so far
    pub fn claimed_fields(&self) -> HashSet<FieldHandle> {
        self.resolved
            .values()
            .filter_map(|r| r.accessor.field())
            .collect()
    }

    pub fn build(mut self) -> RoleRegistry {
        let requested = self.requested.clone();
        if !requested.is_empty() {
            self.resolved.retain(|role, _| requested.contains(role));
            self.absent.retain(|role, _| requested.contains(role));
        }
        RoleRegistry {
            version: self.version,
            resolved: self.resolved,
            absent: self.absent,
            requested: self.requested,
            fingerprint: self.fingerprint,
        }
    }
}

/// Lifecycle of the mapping for the current host session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Unresolved,
    Resolving,
    PartiallyMapped,
    FullyMapped,
    Invalidated,
}

impl SessionState {
    pub fn can_transition(self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Unresolved, Resolving)
                | (Resolving, PartiallyMapped)
                | (Resolving, FullyMapped)
                | (Resolving, Unresolved)
                | (PartiallyMapped, Resolving)
                | (PartiallyMapped, Invalidated)
                | (FullyMapped, Resolving)
                | (FullyMapped, Invalidated)
                | (Invalidated, Resolving)
        )
    }
}

/// Notification sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    Published(MappingSummary),
    Invalidated(RegistryVersion),
    Failed(String),
}

struct Published {
    current: Option<Arc<RoleRegistry>>,
    state: SessionState,
    session: u64,
    generation: u64,
    /// Session whose mapping was invalidated while a pass was running
    retired: Option<u64>,
}

/// Holds the current registry and session state
///
/// Readers copy out under a short read lock. Only the discovery worker
/// writes.
pub struct RegistryPublisher {
    inner: RwLock<Published>,
    subscribers: Mutex<Vec<Sender<RegistryEvent>>>,
}

impl Default for RegistryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryPublisher {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Published {
                current: None,
                state: SessionState::Unresolved,
                session: 0,
                generation: 0,
                retired: None,
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Handle bound to `role` in the current registry
    pub fn resolve(&self, role: Role) -> Option<Accessor> {
        self.inner.read().current.as_ref()?.resolve(role)
    }

    pub fn current(&self) -> Option<Arc<RoleRegistry>> {
        self.inner.read().current.clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    pub fn summary(&self) -> Option<MappingSummary> {
        self.current().map(|r| r.summary())
    }

    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Allocate the version for the next pass
    ///
    /// A new session starts at generation 0; otherwise the generation of
    /// the current session is bumped. A retired session always moves on
    /// to a new one.
    pub fn next_version(&self, new_session: bool) -> RegistryVersion {
        let mut inner = self.inner.write();
        let retired = inner.retired == Some(inner.session);
        if new_session || retired || inner.session == 0 {
            inner.session += 1;
            inner.generation = 0;
        } else {
            inner.generation += 1;
        }
        RegistryVersion {
            session: inner.session,
            generation: inner.generation,
        }
    }

    pub fn begin_resolving(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.write();
        Self::transition(&mut inner, SessionState::Resolving)
    }

    /// Publish the registry of a finished pass
    ///
    /// Returns `Ok(false)` when the pass belongs to a session invalidated
    /// while it was running. The registry is discarded and the state
    /// returns to `Unresolved`; the caller should start a new session.
    pub fn publish(&self, registry: RoleRegistry) -> Result<bool, SessionError> {
        let summary = registry.summary();
        {
            let mut inner = self.inner.write();
            if inner.retired == Some(registry.version().session) {
                Self::transition(&mut inner, SessionState::Unresolved)?;
                drop(inner);
                warn!("Discarded mapping {} of an invalidated session", summary.version);
                return Ok(false);
            }
            let to = if registry.is_fully_mapped() {
                SessionState::FullyMapped
            } else {
                SessionState::PartiallyMapped
            };
            Self::transition(&mut inner, to)?;
            inner.current = Some(Arc::new(registry));
        }
        info!(
            "Published mapping {} ({} resolved, {} missing)",
            summary.version,
            summary.resolved.len(),
            summary.missing.len()
        );
        self.notify(RegistryEvent::Published(summary));
        Ok(true)
    }

    /// Abandon the running pass
    ///
    /// Falls back to the state of the registry still held, if any.
    pub fn fail(&self, reason: &str) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.write();
            let to = match &inner.current {
                Some(r) if r.is_fully_mapped() => SessionState::FullyMapped,
                Some(_) => SessionState::PartiallyMapped,
                None => SessionState::Unresolved,
            };
            Self::transition(&mut inner, to)?;
        }
        self.notify(RegistryEvent::Failed(reason.to_string()));
        Ok(())
    }

    /// Drop the current registry if it still has `version`
    ///
    /// Returns false when `version` is stale (already replaced or dropped).
    /// While a pass is resolving, the state stays `Resolving` and the
    /// session is retired so the running pass cannot publish into it.
    pub fn invalidate(&self, version: RegistryVersion) -> bool {
        {
            let mut inner = self.inner.write();
            match &inner.current {
                Some(current) if current.version() == version => {}
                _ => return false,
            }
            if inner.state == SessionState::Resolving {
                inner.retired = Some(version.session);
            } else if Self::transition(&mut inner, SessionState::Invalidated).is_err() {
                return false;
            }
            inner.current = None;
        }
        info!("Invalidated mapping {}", version);
        self.notify(RegistryEvent::Invalidated(version));
        true
    }

    fn transition(inner: &mut Published, to: SessionState) -> Result<(), SessionError> {
        if !inner.state.can_transition(to) {
            return Err(SessionError {
                from: inner.state,
                to,
            });
        }
        inner.state = to;
        Ok(())
    }

    fn notify(&self, event: RegistryEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
