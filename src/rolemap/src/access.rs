//! Accessor evaluation
//!
//! Reads live values through a published registry. Every host call goes
//! through [`guarded`], so a foreign exception becomes an absent value at
//! the call site and never reaches the caller. Nothing here calls into the
//! host from its frame-callback context.

use crate::error::{HostError, HostResult};
use crate::host::HostRuntime;
use crate::model::{ObjectRef, Value};
use crate::registry::{Accessor, RoleRegistry};
use crate::role::{Owner, Role, RoleSpec};

use serde::Serialize;
use tracing::{debug, trace};

/// Default number of entities sampled by [`game_state`]
pub const DEFAULT_ENTITY_LIMIT: usize = 50;

/// Run one host call, clearing any error it raises
pub fn guarded<T>(what: &str, call: impl FnOnce() -> HostResult<T>) -> Option<T> {
    match call() {
        Ok(value) => Some(value),
        Err(HostError::Exception(message)) => {
            debug!("{} raised: {}", what, message);
            None
        }
        Err(e) => {
            trace!("{} failed: {}", what, e);
            None
        }
    }
}

/// Whether the caller is on the host's frame-callback context
fn refused(host: &dyn HostRuntime, what: &str) -> bool {
    let refused = host.on_frame_context();
    if refused {
        debug!("Refusing {} on the frame-callback context", what);
    }
    refused
}

/// The live application singleton
///
/// Reads the `RootInstance` field; falls back to the `RootGetter` when the
/// field is unresolved or still null.
pub fn root_instance(host: &dyn HostRuntime, registry: &RoleRegistry) -> Option<ObjectRef> {
    if refused(host, "root_instance") {
        return None;
    }
    let from_field = match registry.resolve(Role::RootInstance) {
        Some(Accessor::StaticField(field)) => {
            guarded("read_static", || host.read_static(field)).and_then(|v| v.as_object())
        }
        _ => None,
    };
    from_field.or_else(|| match registry.resolve(Role::RootGetter) {
        Some(Accessor::StaticMethod(getter)) => {
            guarded("invoke", || host.invoke(None, getter, &[])).and_then(|v| v.as_object())
        }
        _ => None,
    })
}

/// Read a member accessor against an explicit receiver
pub fn read_member(host: &dyn HostRuntime, accessor: Accessor, receiver: Option<ObjectRef>) -> Option<Value> {
    if refused(host, "read_member") {
        return None;
    }
    match (accessor, receiver) {
        (Accessor::Type(_), _) => None,
        (Accessor::StaticField(field), _) => guarded("read_static", || host.read_static(field)),
        (Accessor::StaticMethod(method), _) => {
            guarded("invoke", || host.invoke(None, method, &[]))
        }
        (Accessor::Field(field), Some(target)) => {
            guarded("read_field", || host.read_field(target, field))
        }
        (Accessor::Method(method), Some(target)) => {
            guarded("invoke", || host.invoke(Some(target), method, &[]))
        }
        (Accessor::Field(_) | Accessor::Method(_), None) => None,
    }
}

/// Live object a member of `owner` is read from
fn receiver(host: &dyn HostRuntime, registry: &RoleRegistry, owner: Owner) -> Option<ObjectRef> {
    let source = match owner {
        Owner::Root | Owner::Type(Role::RootType) => return root_instance(host, registry),
        Owner::Type(Role::ScreenType) => Role::ActiveScreen,
        Owner::Type(Role::WorldType) => Role::ActiveWorld,
        Owner::Type(_) => Role::LocalPlayer,
        Owner::ValueOf(role) => role,
    };
    evaluate_role(host, registry, source)?.as_object()
}

/// Evaluate a resolved member role against its natural receiver
///
/// Type roles and unresolved roles evaluate to `None`.
pub fn evaluate_role(host: &dyn HostRuntime, registry: &RoleRegistry, role: Role) -> Option<Value> {
    if refused(host, "evaluate_role") {
        return None;
    }
    let accessor = registry.resolve(role)?;
    let RoleSpec::Member(spec) = role.spec() else {
        return None;
    };
    let target = match accessor {
        Accessor::Field(_) | Accessor::Method(_) => Some(receiver(host, registry, spec.owner)?),
        _ => None,
    };
    read_member(host, accessor, target)
}

/// Non-null objects of a live collection, at most `limit`
pub fn collection_values(host: &dyn HostRuntime, collection: ObjectRef, limit: usize) -> Vec<ObjectRef> {
    collection_objects(host, collection).take(limit).collect()
}

/// Lazily read the non-null objects of a live collection
///
/// Each element is fetched only when the iterator is advanced.
fn collection_objects<'a>(
    host: &'a dyn HostRuntime,
    collection: ObjectRef,
) -> impl Iterator<Item = ObjectRef> + 'a {
    let len = if refused(host, "collection_values") {
        0
    } else {
        guarded("collection_len", || host.collection_len(collection)).unwrap_or(0)
    };
    (0..len).filter_map(move |i| {
        guarded("collection_element", || host.collection_element(collection, i))?.as_object()
    })
}

/// One entity of the active entity list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
}

/// Sampled consumer-facing state of the host
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameState {
    pub mapped: bool,
    pub gui_open: bool,
    /// Simple name of the open screen's runtime class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    pub entities: Vec<EntitySample>,
}

const POSITION: [Role; 3] = [
    Role::EntityPositionX,
    Role::EntityPositionY,
    Role::EntityPositionZ,
];

fn position_of(host: &dyn HostRuntime, registry: &RoleRegistry, target: ObjectRef) -> Option<[f64; 3]> {
    let mut pos = [0.0; 3];
    for (slot, role) in pos.iter_mut().zip(POSITION) {
        *slot = read_member(host, registry.resolve(role)?, Some(target))?.as_f64()?;
    }
    Some(pos)
}

fn health_of(host: &dyn HostRuntime, registry: &RoleRegistry, target: ObjectRef) -> Option<f32> {
    let value = read_member(host, registry.resolve(Role::EntityHealth)?, Some(target))?;
    value.as_f64().map(|h| h as f32)
}

/// Sample the game state through the registry
///
/// Roles that are missing leave their fields empty. Entities skip the local
/// player, null elements, and elements whose position cannot be read.
pub fn game_state(host: &dyn HostRuntime, registry: &RoleRegistry, limit: usize) -> GameState {
    let mut state = GameState {
        mapped: registry.is_fully_mapped(),
        ..Default::default()
    };
    if refused(host, "game_state") {
        return state;
    }

    if let Some(screen) = evaluate_role(host, registry, Role::ActiveScreen).and_then(|v| v.as_object()) {
        state.gui_open = true;
        state.screen = guarded("describe_class_of", || host.describe_class_of(screen))
            .map(|ty| ty.simple_name().to_string());
    }

    let player = evaluate_role(host, registry, Role::LocalPlayer).and_then(|v| v.as_object());
    if let Some(player) = player {
        state.health = health_of(host, registry, player);
        state.position = position_of(host, registry, player);
    }

    let Some(list) = evaluate_role(host, registry, Role::ActiveEntityList).and_then(|v| v.as_object())
    else {
        return state;
    };
    for entity in collection_objects(host, list) {
        if state.entities.len() >= limit {
            break;
        }
        if Some(entity) == player {
            continue;
        }
        let Some([x, y, z]) = position_of(host, registry, entity) else {
            continue;
        };
        state.entities.push(EntitySample {
            x,
            y,
            z,
            health: health_of(host, registry, entity),
        });
    }
    state
}
