//! Structural and behavioral matching
//!
//! Fallback rules for when no known name matches. Each rule looks only at
//! shapes that survive renaming: declared types, field counts by kind,
//! method signatures, and what live values turn out to be.

use super::container::{sample, Sample};
use super::{declared_matches, PassContext};
use crate::model::{FieldDescriptor, FieldHandle, Member, ObjectRef, TypeDescriptor, Value};
use crate::registry::{Absence, RegistryBuilder};
use crate::role::{MemberSpec, Role, Structural};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const COLLECTION: &str = "java.util.Collection";

pub(crate) enum StructuralOutcome {
    Matched {
        member: Member,
        declaring: Arc<TypeDescriptor>,
    },
    NoMatch,
    /// The rule inspects the live root instance, which is unavailable
    NeedsRoot,
}

/// Inputs shared by the member rules
pub(crate) struct MemberQuery<'q> {
    pub role: Role,
    pub spec: &'q MemberSpec,
    pub owner: &'q Arc<TypeDescriptor>,
    pub root: Option<ObjectRef>,
    pub claimed: &'q HashSet<FieldHandle>,
}

/// Apply one rule to a member role
pub(crate) fn match_member(
    ctx: &PassContext<'_>,
    builder: &RegistryBuilder,
    query: &MemberQuery<'_>,
    rule: Structural,
) -> StructuralOutcome {
    let matches: Vec<(Member, Arc<TypeDescriptor>)> = match rule {
        Structural::FieldOfFamily { ordinal } => query
            .owner
            .fields
            .iter()
            .filter(|f| {
                f.is_static == query.spec.is_static
                    && declared_matches(ctx, builder, query.spec.family, &f.ty, false)
            })
            .nth(ordinal)
            .map(|f| (Member::Field(f.clone()), query.owner.clone()))
            .into_iter()
            .collect(),

        Structural::MethodShape { walk } => {
            let search = if walk {
                ctx.hierarchy(query.owner)
            } else {
                vec![query.owner.clone()]
            };
            search
                .iter()
                .flat_map(|ty| {
                    ty.methods
                        .iter()
                        .filter(move |m| {
                            m.is_static == query.spec.is_static
                                && m.params.len() == query.spec.params.len()
                                && m.params.iter().zip(query.spec.params).all(|(p, family)| {
                                    declared_matches(ctx, builder, *family, p, false)
                                })
                                && declared_matches(ctx, builder, query.spec.family, &m.ret, false)
                        })
                        .map(move |m| (Member::Method(m.clone()), ty.clone()))
                })
                .collect()
        }

        Structural::FieldWithLiveShape { primitive, min } => {
            let Some(root) = query.root else {
                return StructuralOutcome::NeedsRoot;
            };
            reference_fields(query)
                .filter(|f| {
                    live_type(ctx, root, f)
                        .is_some_and(|ty| ty.instance_fields_of(primitive) >= min)
                })
                .map(|f| (Member::Field(f.clone()), query.owner.clone()))
                .collect()
        }

        Structural::FieldWithBehavior => {
            let behaviour = ctx.table.behaviour(query.role);
            if behaviour.is_empty() {
                return StructuralOutcome::NoMatch;
            }
            reference_fields(query)
                .filter(|f| {
                    let Some(ty) = f.ty.object_name().and_then(|n| ctx.universe.get(n)) else {
                        return false;
                    };
                    ctx.hierarchy(ty)
                        .iter()
                        .any(|t| t.methods.iter().any(|m| behaviour.contains(&m.name.as_str())))
                })
                .map(|f| (Member::Field(f.clone()), query.owner.clone()))
                .collect()
        }

        Structural::FieldWithLiveContainer { element } => {
            let Some(root) = query.root else {
                return StructuralOutcome::NeedsRoot;
            };
            let Some(element) = builder.type_name(element) else {
                return StructuralOutcome::NoMatch;
            };
            reference_fields(query)
                .filter(|f| holds_collection_of(ctx, root, f, element))
                .map(|f| (Member::Field(f.clone()), query.owner.clone()))
                .collect()
        }

        Structural::DefinedBy(_) | Structural::AncestorWithShape { .. } => Vec::new(),
    };

    if matches.len() > 1 {
        debug!(
            "{}: {:?} matched {} members, taking {}",
            query.role,
            rule,
            matches.len(),
            matches[0].0.name()
        );
    }
    match matches.into_iter().next() {
        Some((member, declaring)) => StructuralOutcome::Matched { member, declaring },
        None => StructuralOutcome::NoMatch,
    }
}

/// Apply a type rule
pub(crate) fn match_type(
    ctx: &PassContext<'_>,
    builder: &RegistryBuilder,
    rule: Structural,
) -> Result<Option<Arc<TypeDescriptor>>, Absence> {
    match rule {
        Structural::AncestorWithShape { of, primitive, min } => {
            let start = builder
                .get(of)
                .map(|r| r.owner.clone())
                .ok_or(Absence::DependencyMissing(of))?;
            if start.instance_fields_of(primitive) < min {
                return Ok(None);
            }
            Ok(ctx
                .hierarchy(&start)
                .into_iter()
                .filter(|t| t.instance_fields_of(primitive) >= min)
                .last())
        }
        _ => Ok(None),
    }
}

/// Unclaimed non-static reference fields of the owner
fn reference_fields<'q>(query: &'q MemberQuery<'_>) -> impl Iterator<Item = &'q FieldDescriptor> {
    query.owner.fields.iter().filter(|f| {
        !f.is_static && f.ty.object_name().is_some() && !query.claimed.contains(&f.handle)
    })
}

fn live_type(
    ctx: &PassContext<'_>,
    root: ObjectRef,
    field: &FieldDescriptor,
) -> Option<Arc<TypeDescriptor>> {
    let value = ctx.read_field(root, field.handle)?.as_object()?;
    ctx.runtime_type(value)
}

fn holds_collection_of(
    ctx: &PassContext<'_>,
    root: ObjectRef,
    field: &FieldDescriptor,
    element: &str,
) -> bool {
    let Some(holder) = ctx.read_field(root, field.handle).and_then(|v| v.as_object()) else {
        return false;
    };
    let Some(runtime) = ctx.runtime_type(holder) else {
        return false;
    };
    ctx.hierarchy(&runtime).iter().any(|ty| {
        ty.fields.iter().filter(|f| !f.is_static).any(|f| {
            let is_collection = f
                .ty
                .object_name()
                .is_some_and(|n| ctx.is_assignable(n, COLLECTION));
            if !is_collection {
                return false;
            }
            match ctx.read_field(holder, f.handle) {
                Some(Value::Object(collection)) => matches!(
                    sample(ctx, collection),
                    Sample::Element(e) if ctx.is_instance_of(e, element)
                ),
                _ => false,
            }
        })
    })
}
