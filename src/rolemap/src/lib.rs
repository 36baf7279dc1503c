//! # rolemap
//!
//! Live object-graph discovery and role resolution for hosts whose internal
//! names change between builds.
//!
//! This library provides functionality to:
//! - Enumerate the types loaded in a host runtime and filter foreign namespaces
//! - Locate the application singleton by shape, not by name
//! - Resolve abstract roles (player, world, entity lists, positions) through
//!   historical name tables, falling back to structural and live-sample checks
//! - Publish a versioned registry of resolved handles from a dedicated worker
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rolemap::{DiscoveryWorker, Engine, EngineConfig, EpochTable, RegistryEvent,
//!     RegistryPublisher, Role, SnapshotHost, WorkerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = Arc::new(SnapshotHost::open("client.json")?);
//! let publisher = Arc::new(RegistryPublisher::new());
//! let events = publisher.subscribe();
//!
//! let engine = Engine::new(EngineConfig::default(), EpochTable::builtin());
//! let worker = DiscoveryWorker::spawn(host, publisher.clone(), engine, WorkerConfig::default())?;
//! worker.attach()?;
//!
//! if let RegistryEvent::Published(summary) = events.recv()? {
//!     println!("{}", summary);
//! }
//! println!("Entity list: {:?}", publisher.resolve(Role::ActiveEntityList));
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod discovery;
pub mod error;
pub mod host;
pub mod model;
pub mod names;
pub mod registry;
pub mod role;
pub mod worker;

#[cfg(test)]
mod fixtures;

// Re-export commonly used items
#[doc(inline)]
pub use access::{evaluate_role, game_state, guarded, root_instance, EntitySample, GameState};
#[doc(inline)]
pub use discovery::{Engine, EngineConfig, MissLog, NamespaceFilter, SingletonCandidate};
#[doc(inline)]
pub use error::{
    DiscoveryError, HostError, HostResult, NamesError, SessionError, SnapshotError,
    WorkerStopped,
};
#[doc(inline)]
pub use host::{HostRuntime, Snapshot, SnapshotHost};
#[doc(inline)]
pub use model::{ObjectRef, TypeDescriptor, TypeHandle, TypeRef, Value};
#[doc(inline)]
pub use names::{Epoch, EpochTable, Placement};
#[doc(inline)]
pub use registry::{
    Absence, Accessor, MappingSummary, Origin, RegistryEvent, RegistryPublisher,
    RegistryVersion, RoleRegistry, SessionState,
};
#[doc(inline)]
pub use role::Role;
#[doc(inline)]
pub use worker::{DiscoveryWorker, WorkerConfig};
