//! Resolution by historical names

use super::{declared_matches, PassContext};
use crate::model::{Member, TypeDescriptor};
use crate::registry::RegistryBuilder;
use crate::role::{MemberKind, MemberSpec, Role};

use std::sync::Arc;
use tracing::debug;

pub(crate) struct NamedMatch {
    pub member: Member,
    pub declaring: Arc<TypeDescriptor>,
    pub epoch: String,
}

/// First accepted type listed for `role`
pub(crate) fn type_by_name(ctx: &PassContext<'_>, role: Role) -> Option<(Arc<TypeDescriptor>, String)> {
    ctx.table.candidates(role).into_iter().find_map(|candidate| {
        let ty = ctx.universe.get(candidate.name)?;
        debug!("{} = {} ({})", role, ty.name, candidate.epoch);
        Some((ty.clone(), candidate.epoch.to_string()))
    })
}

/// First member listed for `role` that exists on the owner (or, for
/// inherited roles, its ancestors) with the expected kind and type
pub(crate) fn member_by_name(
    ctx: &PassContext<'_>,
    builder: &RegistryBuilder,
    role: Role,
    spec: &MemberSpec,
    owner: &Arc<TypeDescriptor>,
) -> Option<NamedMatch> {
    let search = if spec.inherited {
        ctx.hierarchy(owner)
    } else {
        vec![owner.clone()]
    };

    for candidate in ctx.table.candidates(role) {
        for ty in &search {
            if let Some(member) = member_on(ctx, builder, spec, ty, candidate.name) {
                debug!(
                    "{} = {}::{} ({})",
                    role, ty.name, candidate.name, candidate.epoch
                );
                return Some(NamedMatch {
                    member,
                    declaring: ty.clone(),
                    epoch: candidate.epoch.to_string(),
                });
            }
        }
    }
    None
}

fn member_on(
    ctx: &PassContext<'_>,
    builder: &RegistryBuilder,
    spec: &MemberSpec,
    ty: &TypeDescriptor,
    name: &str,
) -> Option<Member> {
    match spec.kind {
        MemberKind::Field | MemberKind::Container => ty
            .fields
            .iter()
            .find(|f| {
                f.name == name
                    && f.is_static == spec.is_static
                    && declared_matches(ctx, builder, spec.family, &f.ty, true)
            })
            .cloned()
            .map(Member::Field),
        MemberKind::Method => ty
            .methods_named(name)
            .find(|m| {
                m.is_static == spec.is_static
                    && m.params.len() == spec.params.len()
                    && m.params
                        .iter()
                        .zip(spec.params)
                        .all(|(p, family)| declared_matches(ctx, builder, *family, p, true))
                    && declared_matches(ctx, builder, spec.family, &m.ret, true)
            })
            .cloned()
            .map(Member::Method),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::enumerate::{enumerate_types, NamespaceFilter};
    use crate::host::{Snapshot, SnapshotHost, TypeEntry};
    use crate::names::{Epoch, EpochTable};
    use crate::role::RoleSpec;

    fn spec(role: Role) -> MemberSpec {
        match role.spec() {
            RoleSpec::Member(spec) => spec,
            RoleSpec::Type { .. } => panic!("{} is a type role", role),
        }
    }

    #[test]
    fn test_kind_and_type_must_match() {
        let host = SnapshotHost::from_snapshot(
            Snapshot::default()
                .with_type(TypeEntry::new("g.Base").field("posX", "double"))
                .with_type(
                    TypeEntry::new("g.Entity")
                        .extends("g.Base")
                        .field("posX", "float")
                        .method("getHealth", &["int"], "float")
                        .method("getHealth", &[], "float"),
                ),
        )
        .unwrap();
        let universe = enumerate_types(&host, &NamespaceFilter::default()).unwrap();
        let table = EpochTable {
            epochs: vec![Epoch::new("t")
                .with(Role::EntityPositionX, &["posX"])
                .with(Role::EntityHealth, &["getHealth"])],
        };
        let ctx = PassContext::new(&host, &universe, &table, 10);
        let builder = RegistryBuilder::new(Default::default());
        let entity = universe.get("g.Entity").unwrap().clone();

        // float posX on the subclass is skipped in favour of the inherited double
        let pos = member_by_name(&ctx, &builder, Role::EntityPositionX, &spec(Role::EntityPositionX), &entity)
            .unwrap();
        assert_eq!(pos.declaring.name, "g.Base");
        assert_eq!(pos.epoch, "t");

        // The overload taking an argument does not match the ()F shape
        let health =
            member_by_name(&ctx, &builder, Role::EntityHealth, &spec(Role::EntityHealth), &entity)
                .unwrap();
        match health.member {
            Member::Method(m) => assert!(m.params.is_empty()),
            Member::Field(_) => panic!("expected a method"),
        }
    }

    #[test]
    fn test_names_take_priority_over_hierarchy_depth() {
        let host = SnapshotHost::from_snapshot(
            Snapshot::default()
                .with_type(TypeEntry::new("g.Base").field("posX", "double"))
                .with_type(
                    TypeEntry::new("g.Entity")
                        .extends("g.Base")
                        .field("s", "double"),
                ),
        )
        .unwrap();
        let universe = enumerate_types(&host, &NamespaceFilter::default()).unwrap();
        let table = EpochTable {
            epochs: vec![
                Epoch::new("new").with(Role::EntityPositionX, &["posX"]),
                Epoch::new("old").with(Role::EntityPositionX, &["s"]),
            ],
        };
        let ctx = PassContext::new(&host, &universe, &table, 10);
        let builder = RegistryBuilder::new(Default::default());
        let entity = universe.get("g.Entity").unwrap().clone();

        let found = member_by_name(&ctx, &builder, Role::EntityPositionX, &spec(Role::EntityPositionX), &entity)
            .unwrap();
        assert_eq!(found.member.name(), "posX");
        assert_eq!(found.epoch, "new");
    }

    #[test]
    fn test_type_by_name_skips_unloaded() {
        let host = SnapshotHost::from_snapshot(
            Snapshot::default().with_type(TypeEntry::new("bew")),
        )
        .unwrap();
        let universe = enumerate_types(&host, &NamespaceFilter::default()).unwrap();
        let table = EpochTable::builtin();
        let ctx = PassContext::new(&host, &universe, &table, 10);
        let (ty, epoch) = type_by_name(&ctx, Role::PlayerType).unwrap();
        assert_eq!(ty.name, "bew");
        assert_eq!(epoch, "notch-1.8.9");
        assert!(type_by_name(&ctx, Role::WorldType).is_none());
    }
}
