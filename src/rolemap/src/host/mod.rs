//! Host Runtime Abstraction
//!
//! Core abstractions for introspecting the managed runtime:
//! - The `HostRuntime` trait every host adapter implements
//! - Snapshot files via `SnapshotHost` (JSON or YAML)
//! - Mock hosts for testing

mod snapshot;
mod traits;

#[cfg(test)]
mod mock;

pub use snapshot::{FieldEntry, MethodEntry, ObjectEntry, Snapshot, SnapshotHost, TypeEntry};
pub use traits::{ContextId, HostRuntime};
