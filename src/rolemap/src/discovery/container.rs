//! Validated container discovery
//!
//! A collection field is only trusted after one of its live elements has
//! been checked against the expected element family. Declared generic
//! types are erased in the host, so the declared type alone says nothing.

use super::PassContext;
use crate::model::{FieldDescriptor, FieldHandle, ObjectRef, TypeDescriptor, Value};
use crate::role::Role;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Elements inspected when looking for a non-null sample
pub const SAMPLE_LIMIT: usize = 4;

pub(crate) enum Sample {
    /// No elements, or only nulls among the sampled ones
    Empty,
    Unreadable,
    Element(ObjectRef),
}

/// First non-null element among the leading `SAMPLE_LIMIT`
pub(crate) fn sample(ctx: &PassContext<'_>, collection: ObjectRef) -> Sample {
    let Some(len) = ctx.collection_len(collection) else {
        return Sample::Unreadable;
    };
    (0..len.min(SAMPLE_LIMIT))
        .find_map(|i| ctx.collection_element(collection, i)?.as_object())
        .map_or(Sample::Empty, Sample::Element)
}

pub(crate) enum ContainerOutcome {
    Validated {
        field: FieldDescriptor,
        declaring: Arc<TypeDescriptor>,
    },
    /// At least one candidate was empty; nothing validated
    Deferred,
    NotFound,
}

/// Find the field of `receiver` holding a collection of `element` instances
pub(crate) fn locate_container(
    ctx: &PassContext<'_>,
    role: Role,
    interface: &str,
    element: &str,
    receiver: ObjectRef,
    claimed: &HashSet<FieldHandle>,
) -> ContainerOutcome {
    let Some(runtime) = ctx.runtime_type(receiver) else {
        return ContainerOutcome::NotFound;
    };
    let chain = ctx.hierarchy(&runtime);

    let mut candidates: Vec<(&FieldDescriptor, &Arc<TypeDescriptor>)> = Vec::new();
    let mut seen = HashSet::new();
    for candidate in ctx.table.candidates(role) {
        for ty in &chain {
            if let Some(field) = ty
                .fields
                .iter()
                .find(|f| !f.is_static && f.name == candidate.name)
            {
                if seen.insert(field.handle) {
                    candidates.push((field, ty));
                }
            }
        }
    }
    for ty in &chain {
        for field in ty.fields.iter().filter(|f| !f.is_static) {
            if field.ty.object_name().is_some() && seen.insert(field.handle) {
                candidates.push((field, ty));
            }
        }
    }

    let mut deferred = false;
    for (field, declaring) in candidates {
        if claimed.contains(&field.handle) {
            continue;
        }
        let assignable = field
            .ty
            .object_name()
            .is_some_and(|name| name == interface || ctx.is_assignable(name, interface));
        if !assignable {
            continue;
        }
        let Some(Value::Object(collection)) = ctx.read_field(receiver, field.handle) else {
            continue;
        };
        match sample(ctx, collection) {
            Sample::Unreadable => continue,
            Sample::Empty => {
                debug!("{}: {}::{} is empty, deferring", role, declaring.name, field.name);
                deferred = true;
            }
            Sample::Element(sampled) => {
                if ctx.is_instance_of(sampled, element) {
                    debug!(
                        "{} = {}::{} (sample is {})",
                        role, declaring.name, field.name, element
                    );
                    return ContainerOutcome::Validated {
                        field: field.clone(),
                        declaring: declaring.clone(),
                    };
                }
                debug!(
                    "{}: rejected {}::{}, sample is not {}",
                    role, declaring.name, field.name, element
                );
            }
        }
    }

    if deferred {
        ContainerOutcome::Deferred
    } else {
        ContainerOutcome::NotFound
    }
}
