//! Mock Host
//!
//! Wraps a `SnapshotHost` and injects the failure modes of a live host:
//! enumeration while still loading, throwing descriptions, a bound
//! frame-callback context. Records which contexts made calls.

use super::{ContextId, HostRuntime, SnapshotHost};
use crate::error::{HostError, HostResult};
use crate::model::{FieldHandle, MethodHandle, ObjectRef, TypeDescriptor, TypeHandle, Value};

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock host for testing discovery against a misbehaving runtime
pub struct MockHost {
    pub inner: SnapshotHost,
    /// Remaining `loaded_types` calls that fail with `NotReady`
    not_ready: AtomicUsize,
    /// Remaining `loaded_types` calls that return an empty list
    empty: AtomicUsize,
    /// Types whose `describe` raises a foreign exception
    throwing_types: Mutex<HashSet<TypeHandle>>,
    frame: Mutex<Option<ContextId>>,
    contexts: Mutex<HashSet<ContextId>>,
    enumerations: AtomicUsize,
    calls: AtomicUsize,
}

impl MockHost {
    pub fn new(inner: SnapshotHost) -> Self {
        Self {
            inner,
            not_ready: AtomicUsize::new(0),
            empty: AtomicUsize::new(0),
            throwing_types: Mutex::new(HashSet::new()),
            frame: Mutex::new(None),
            contexts: Mutex::new(HashSet::new()),
            enumerations: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` enumerations with `NotReady`
    pub fn not_ready_for(self, n: usize) -> Self {
        self.not_ready.store(n, Ordering::SeqCst);
        self
    }

    /// Return an empty type list for the next `n` enumerations
    pub fn empty_for(self, n: usize) -> Self {
        self.empty.store(n, Ordering::SeqCst);
        self
    }

    /// Make `describe` throw for the named type
    pub fn throw_on_describe(self, name: &str) -> Self {
        if let Some(handle) = self.inner.type_handle(name) {
            self.throwing_types.lock().insert(handle);
        }
        self
    }

    /// Bind the frame-callback context to the calling thread
    pub fn bind_frame_context_here(&self) {
        *self.frame.lock() = Some(ContextId::current());
    }

    /// Distinct contexts that have called into the host
    pub fn calling_contexts(&self) -> HashSet<ContextId> {
        self.contexts.lock().clone()
    }

    /// Number of `loaded_types` calls so far
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Total number of host calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().insert(ContextId::current());
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl HostRuntime for MockHost {
    fn loaded_types(&self) -> HostResult<Vec<TypeHandle>> {
        self.record();
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.not_ready) {
            return Err(HostError::NotReady("class loading in progress".into()));
        }
        if Self::take(&self.empty) {
            return Ok(Vec::new());
        }
        self.inner.loaded_types()
    }

    fn describe(&self, ty: TypeHandle) -> HostResult<TypeDescriptor> {
        self.record();
        if self.throwing_types.lock().contains(&ty) {
            return Err(HostError::Exception("NoClassDefFoundError".into()));
        }
        self.inner.describe(ty)
    }

    fn read_static(&self, field: FieldHandle) -> HostResult<Value> {
        self.record();
        self.inner.read_static(field)
    }

    fn read_field(&self, target: ObjectRef, field: FieldHandle) -> HostResult<Value> {
        self.record();
        self.inner.read_field(target, field)
    }

    fn invoke(
        &self,
        target: Option<ObjectRef>,
        method: MethodHandle,
        args: &[Value],
    ) -> HostResult<Value> {
        self.record();
        self.inner.invoke(target, method, args)
    }

    fn class_of(&self, target: ObjectRef) -> HostResult<TypeHandle> {
        self.record();
        self.inner.class_of(target)
    }

    fn is_instance_of(&self, target: ObjectRef, family: &str) -> HostResult<bool> {
        self.record();
        self.inner.is_instance_of(target, family)
    }

    fn is_assignable(&self, from: &str, to: &str) -> HostResult<bool> {
        self.record();
        self.inner.is_assignable(from, to)
    }

    fn collection_len(&self, target: ObjectRef) -> HostResult<usize> {
        self.record();
        self.inner.collection_len(target)
    }

    fn collection_element(&self, target: ObjectRef, index: usize) -> HostResult<Value> {
        self.record();
        self.inner.collection_element(target, index)
    }

    fn frame_context(&self) -> Option<ContextId> {
        *self.frame.lock()
    }
}
