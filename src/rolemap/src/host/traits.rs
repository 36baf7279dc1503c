//! Host Runtime Trait
//!
//! Core abstraction over the live managed runtime the engine introspects.

use crate::error::HostResult;
use crate::model::{FieldHandle, MethodHandle, ObjectRef, TypeDescriptor, TypeHandle, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of an execution context (an OS thread attached to the host)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_CONTEXT: u64 = NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed);
}

impl ContextId {
    /// Context of the calling thread
    pub fn current() -> Self {
        CURRENT_CONTEXT.with(|id| ContextId(*id))
    }
}

/// Trait for introspecting a live host runtime (attached VM, snapshot, mock)
///
/// Every method may fail with a foreign exception. Callers inside the engine
/// catch and clear those at the call site; see `access::guarded`.
pub trait HostRuntime: Send + Sync {
    /// All currently loaded types. May be partial while the host is loading.
    fn loaded_types(&self) -> HostResult<Vec<TypeHandle>>;

    /// Declared fields, methods and superclass link of a type
    fn describe(&self, ty: TypeHandle) -> HostResult<TypeDescriptor>;

    /// Read a static field
    fn read_static(&self, field: FieldHandle) -> HostResult<Value>;

    /// Read an instance field of a live object
    fn read_field(&self, target: ObjectRef, field: FieldHandle) -> HostResult<Value>;

    /// Invoke a method; `target` is `None` for static methods
    fn invoke(
        &self,
        target: Option<ObjectRef>,
        method: MethodHandle,
        args: &[Value],
    ) -> HostResult<Value>;

    /// Runtime class of a live object
    fn class_of(&self, target: ObjectRef) -> HostResult<TypeHandle>;

    /// Run-time "is this instance of that family" test
    fn is_instance_of(&self, target: ObjectRef, family: &str) -> HostResult<bool>;

    /// Whether a value of type `from` is assignable to `to`
    fn is_assignable(&self, from: &str, to: &str) -> HostResult<bool>;

    /// Number of elements in a live collection (values for maps)
    fn collection_len(&self, target: ObjectRef) -> HostResult<usize>;

    /// Element at `index` of a live collection (values for maps)
    fn collection_element(&self, target: ObjectRef, index: usize) -> HostResult<Value>;

    /// Context that drives the host's rendering/frame callback, if known
    fn frame_context(&self) -> Option<ContextId> {
        None
    }

    /// Context of the caller
    fn current_context(&self) -> ContextId {
        ContextId::current()
    }

    /// Describe the runtime class of a live object
    fn describe_class_of(&self, target: ObjectRef) -> HostResult<TypeDescriptor> {
        let ty = self.class_of(target)?;
        self.describe(ty)
    }

    /// Whether the caller is on the frame-callback context
    fn on_frame_context(&self) -> bool {
        self.frame_context() == Some(self.current_context())
    }
}
