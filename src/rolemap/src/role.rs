//! Role catalogue
//!
//! A role is an abstract name for something a consumer wants to reach inside
//! the host ("the application singleton", "the local player's X position").
//! Each role carries a static description of how to find it: where it lives,
//! what its declared type must look like, and which structural rule applies
//! when no known name matches.

use crate::model::Primitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Abstract role resolved against the host
///
/// Declaration order is the resolution order: every role comes after the
/// roles it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    RootType,
    RootInstance,
    RootGetter,
    ScreenType,
    ActiveScreen,
    PlayerType,
    LocalPlayer,
    PlayerBaseType,
    EntityType,
    WorldType,
    ActiveWorld,
    EntityPositionX,
    EntityPositionY,
    EntityPositionZ,
    EntityHealth,
    EntityYaw,
    ActivePlayerList,
    ActiveEntityList,
}

/// Declared-type expectation for a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Primitive(Primitive),
    /// A fixed host type, e.g. `java.util.List`
    Exact(&'static str),
    /// Whatever type the given type role resolved to
    Role(Role),
}

/// Where a member role lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Declared on the root type
    Root,
    /// Declared on a resolved type role or its ancestors
    Type(Role),
    /// Declared on the runtime class of the value held by a member role
    ValueOf(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    /// A collection field validated by sampling its elements
    Container,
}

/// Fallback rule applied when no candidate name matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structural {
    /// The n-th declared field (matching the static flag) of the expected family
    FieldOfFamily { ordinal: usize },
    /// A method with exactly the expected parameters and return type
    MethodShape { walk: bool },
    /// A reference field whose live value's class declares at least `min`
    /// instance fields of `primitive`
    FieldWithLiveShape { primitive: Primitive, min: usize },
    /// A reference field whose type hierarchy declares a known behaviour method
    FieldWithBehavior,
    /// A reference field whose live value holds a non-empty collection of
    /// `element` instances
    FieldWithLiveContainer { element: Role },
    /// The declared type of the given member role
    DefinedBy(Role),
    /// The topmost ancestor of a resolved type that keeps its primitive shape
    AncestorWithShape {
        of: Role,
        primitive: Primitive,
        min: usize,
    },
}

/// How to locate a member role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSpec {
    pub owner: Owner,
    pub kind: MemberKind,
    pub is_static: bool,
    /// Field type, method return type, or collection interface
    pub family: Family,
    pub params: &'static [Family],
    /// Element family of a container
    pub element: Option<Family>,
    /// Search the owner's superclass chain as well
    pub inherited: bool,
    pub structural: &'static [Structural],
    /// Type role bound to this member's declared type when not found by name
    pub defines: Option<Role>,
}

/// Static description of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSpec {
    Type { structural: Option<Structural> },
    Member(MemberSpec),
}

const LIST: &str = "java.util.List";

const fn root_field(family: Family, structural: &'static [Structural], defines: Role) -> MemberSpec {
    MemberSpec {
        owner: Owner::Root,
        kind: MemberKind::Field,
        is_static: false,
        family,
        params: &[],
        element: None,
        inherited: false,
        structural,
        defines: Some(defines),
    }
}

const fn position(ordinal: usize) -> MemberSpec {
    MemberSpec {
        owner: Owner::Type(Role::EntityType),
        kind: MemberKind::Field,
        is_static: false,
        family: Family::Primitive(Primitive::Double),
        params: &[],
        element: None,
        inherited: true,
        structural: match ordinal {
            0 => &[Structural::FieldOfFamily { ordinal: 0 }],
            1 => &[Structural::FieldOfFamily { ordinal: 1 }],
            _ => &[Structural::FieldOfFamily { ordinal: 2 }],
        },
        defines: None,
    }
}

const fn player_float_getter(structural: &'static [Structural]) -> MemberSpec {
    MemberSpec {
        owner: Owner::Type(Role::PlayerType),
        kind: MemberKind::Method,
        is_static: false,
        family: Family::Primitive(Primitive::Float),
        params: &[],
        element: None,
        inherited: true,
        structural,
        defines: None,
    }
}

const fn world_list(element: Role) -> MemberSpec {
    MemberSpec {
        owner: Owner::ValueOf(Role::ActiveWorld),
        kind: MemberKind::Container,
        is_static: false,
        family: Family::Exact(LIST),
        params: &[],
        element: Some(Family::Role(element)),
        inherited: true,
        structural: &[],
        defines: None,
    }
}

impl Role {
    /// Every role in resolution order
    pub const ALL: [Role; 18] = [
        Role::RootType,
        Role::RootInstance,
        Role::RootGetter,
        Role::ScreenType,
        Role::ActiveScreen,
        Role::PlayerType,
        Role::LocalPlayer,
        Role::PlayerBaseType,
        Role::EntityType,
        Role::WorldType,
        Role::ActiveWorld,
        Role::EntityPositionX,
        Role::EntityPositionY,
        Role::EntityPositionZ,
        Role::EntityHealth,
        Role::EntityYaw,
        Role::ActivePlayerList,
        Role::ActiveEntityList,
    ];

    pub fn spec(self) -> RoleSpec {
        use Structural::*;
        match self {
            Role::RootType | Role::PlayerBaseType => RoleSpec::Type { structural: None },
            Role::ScreenType => RoleSpec::Type {
                structural: Some(DefinedBy(Role::ActiveScreen)),
            },
            Role::PlayerType => RoleSpec::Type {
                structural: Some(DefinedBy(Role::LocalPlayer)),
            },
            Role::WorldType => RoleSpec::Type {
                structural: Some(DefinedBy(Role::ActiveWorld)),
            },
            Role::EntityType => RoleSpec::Type {
                structural: Some(AncestorWithShape {
                    of: Role::PlayerType,
                    primitive: Primitive::Double,
                    min: 3,
                }),
            },
            Role::RootInstance => RoleSpec::Member(MemberSpec {
                owner: Owner::Root,
                kind: MemberKind::Field,
                is_static: true,
                family: Family::Role(Role::RootType),
                params: &[],
                element: None,
                inherited: false,
                structural: &[FieldOfFamily { ordinal: 0 }],
                defines: None,
            }),
            Role::RootGetter => RoleSpec::Member(MemberSpec {
                owner: Owner::Root,
                kind: MemberKind::Method,
                is_static: true,
                family: Family::Role(Role::RootType),
                params: &[],
                element: None,
                inherited: false,
                structural: &[MethodShape { walk: false }],
                defines: None,
            }),
            Role::ActiveScreen => RoleSpec::Member(root_field(
                Family::Role(Role::ScreenType),
                &[FieldOfFamily { ordinal: 0 }, FieldWithBehavior],
                Role::ScreenType,
            )),
            Role::LocalPlayer => RoleSpec::Member(root_field(
                Family::Role(Role::PlayerType),
                &[
                    FieldOfFamily { ordinal: 0 },
                    FieldWithLiveShape {
                        primitive: Primitive::Double,
                        min: 3,
                    },
                ],
                Role::PlayerType,
            )),
            Role::ActiveWorld => RoleSpec::Member(root_field(
                Family::Role(Role::WorldType),
                &[
                    FieldOfFamily { ordinal: 0 },
                    FieldWithLiveContainer {
                        element: Role::EntityType,
                    },
                ],
                Role::WorldType,
            )),
            Role::EntityPositionX => RoleSpec::Member(position(0)),
            Role::EntityPositionY => RoleSpec::Member(position(1)),
            Role::EntityPositionZ => RoleSpec::Member(position(2)),
            Role::EntityHealth => {
                RoleSpec::Member(player_float_getter(&[MethodShape { walk: true }]))
            }
            Role::EntityYaw => RoleSpec::Member(player_float_getter(&[])),
            Role::ActivePlayerList => RoleSpec::Member(world_list(Role::PlayerBaseType)),
            Role::ActiveEntityList => RoleSpec::Member(world_list(Role::EntityType)),
        }
    }

    pub fn is_type_role(self) -> bool {
        matches!(self.spec(), RoleSpec::Type { .. })
    }

    /// Every role this one may consult while resolving
    pub fn dependencies(self) -> Vec<Role> {
        let mut deps = Vec::new();
        match self.spec() {
            RoleSpec::Type { structural } => match structural {
                Some(Structural::DefinedBy(member)) => deps.push(member),
                Some(Structural::AncestorWithShape { of, .. }) => deps.push(of),
                _ => {}
            },
            RoleSpec::Member(spec) => {
                match spec.owner {
                    Owner::Root => {
                        deps.push(Role::RootType);
                        if self != Role::RootInstance {
                            deps.push(Role::RootInstance);
                        }
                    }
                    Owner::Type(ty) => deps.push(ty),
                    Owner::ValueOf(member) => deps.push(member),
                }
                let families = std::iter::once(spec.family)
                    .chain(spec.params.iter().copied())
                    .chain(spec.element);
                for family in families {
                    if let Family::Role(ty) = family {
                        deps.push(ty);
                    }
                }
                for rule in spec.structural {
                    if let Structural::FieldWithLiveContainer { element } = rule {
                        deps.push(*element);
                    }
                }
            }
        }
        deps.retain(|d| *d != self);
        deps.dedup();
        deps
    }

    /// Roles that must be resolved before this one can be attempted at all
    pub fn hard_dependencies(self) -> Vec<Role> {
        let RoleSpec::Member(spec) = self.spec() else {
            return Vec::new();
        };
        let mut deps = match spec.owner {
            Owner::Root => vec![Role::RootType],
            Owner::Type(ty) => vec![ty],
            Owner::ValueOf(member) => vec![member],
        };
        if let Some(Family::Role(ty)) = spec.element {
            deps.push(ty);
        }
        deps
    }

    /// `roles` plus everything they transitively depend on
    pub fn closure(roles: impl IntoIterator<Item = Role>) -> BTreeSet<Role> {
        let mut out = BTreeSet::new();
        let mut stack: Vec<Role> = roles.into_iter().collect();
        while let Some(role) = stack.pop() {
            if out.insert(role) {
                stack.extend(role.dependencies());
            }
        }
        // The singleton is always located
        out.insert(Role::RootType);
        out
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::RootType => "RootType",
            Role::RootInstance => "RootInstance",
            Role::RootGetter => "RootGetter",
            Role::ScreenType => "ScreenType",
            Role::ActiveScreen => "ActiveScreen",
            Role::PlayerType => "PlayerType",
            Role::LocalPlayer => "LocalPlayer",
            Role::PlayerBaseType => "PlayerBaseType",
            Role::EntityType => "EntityType",
            Role::WorldType => "WorldType",
            Role::ActiveWorld => "ActiveWorld",
            Role::EntityPositionX => "EntityPositionX",
            Role::EntityPositionY => "EntityPositionY",
            Role::EntityPositionZ => "EntityPositionZ",
            Role::EntityHealth => "EntityHealth",
            Role::EntityYaw => "EntityYaw",
            Role::ActivePlayerList => "ActivePlayerList",
            Role::ActiveEntityList => "ActiveEntityList",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_declaration_order() {
        let mut sorted = Role::ALL;
        sorted.sort();
        assert_eq!(sorted, Role::ALL);
    }

    #[test]
    fn test_hard_dependencies_resolve_first() {
        for role in Role::ALL {
            for dep in role.hard_dependencies() {
                assert!(dep < role, "{} must come after {}", role, dep);
            }
        }
    }

    #[test]
    fn test_closure_pulls_in_owners() {
        let closure = Role::closure([Role::EntityPositionX]);
        assert!(closure.contains(&Role::EntityType));
        assert!(closure.contains(&Role::PlayerType));
        assert!(closure.contains(&Role::LocalPlayer));
        assert!(closure.contains(&Role::RootInstance));
        assert!(!closure.contains(&Role::ActiveScreen));
        assert!(!closure.contains(&Role::ActiveEntityList));
    }

    #[test]
    fn test_parse_role_names() {
        assert_eq!("activeentitylist".parse::<Role>().unwrap(), Role::ActiveEntityList);
        assert_eq!(" RootType ".parse::<Role>().unwrap(), Role::RootType);
        assert!("Nonsense".parse::<Role>().is_err());
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_containers_have_element_families() {
        for role in Role::ALL {
            if let RoleSpec::Member(spec) = role.spec() {
                assert_eq!(
                    spec.kind == MemberKind::Container,
                    spec.element.is_some(),
                    "{}",
                    role
                );
            }
        }
    }
}
