//! Error types
//!
//! None of these cross the registry boundary. Readers of a published
//! registry only ever see present or absent roles.

use crate::model::{FieldHandle, MethodHandle, ObjectRef, TypeHandle};
use crate::registry::SessionState;
use thiserror::Error;

/// Result of a single call into the host runtime
pub type HostResult<T> = Result<T, HostError>;

/// Failure of a call into the host runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host has not finished loading (type list incomplete, VM starting up)
    #[error("Host runtime not ready: {0}")]
    NotReady(String),

    /// The foreign call raised an exception inside the host
    #[error("Foreign exception: {0}")]
    Exception(String),

    #[error("Unknown type handle {0:?}")]
    UnknownType(TypeHandle),

    #[error("Unknown field handle {0:?}")]
    UnknownField(FieldHandle),

    #[error("Unknown method handle {0:?}")]
    UnknownMethod(MethodHandle),

    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectRef),

    #[error("Object {0:?} is not a collection")]
    NotACollection(ObjectRef),

    #[error("Index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

/// Failure of a whole discovery pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// Type enumeration returned nothing usable; retry the whole pass later
    #[error("Type enumeration incomplete: {0}")]
    EnumerationNotReady(String),

    /// No type has the application-singleton shape; fatal for the session
    #[error("No application singleton among {scanned} host types")]
    SingletonNotFound { scanned: usize },

    /// Discovery was invoked on the host's frame-callback context
    #[error("Discovery must not run on the host frame-callback context")]
    FrameContext,
}

impl DiscoveryError {
    /// Whether the caller should retry the pass on its next attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EnumerationNotReady(_) | Self::SingletonNotFound { .. }
        )
    }
}

/// Failure loading or serializing an epoch name table
#[derive(Error, Debug)]
pub enum NamesError {
    #[error("Failed to parse name table YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Epoch at position {0} has an empty name")]
    UnnamedEpoch(usize),
}

/// Failure loading a host snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to process snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to process snapshot YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate type '{0}' in snapshot")]
    DuplicateType(String),

    #[error("Duplicate object id {0} in snapshot")]
    DuplicateObject(u32),

    #[error("Object {id} has unknown class '{class}'")]
    UnknownClass { id: u32, class: String },
}

/// Illegal session state transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid session transition {from:?} -> {to:?}")]
pub struct SessionError {
    pub from: SessionState,
    pub to: SessionState,
}

/// The discovery worker is no longer accepting commands
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Discovery worker has stopped")]
pub struct WorkerStopped;
