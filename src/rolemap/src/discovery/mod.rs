//! Discovery Pass
//!
//! One pass turns a live host into a `RoleRegistry`:
//! - Enumerate loaded types and drop foreign namespaces
//! - Locate the application singleton
//! - Resolve each requested role by name, then by structure, validating
//!   containers against live samples
//!
//! Passes hold no state between runs apart from the previous registry the
//! caller hands back in for a same-session re-discovery.

mod container;
pub mod enumerate;
mod named;
pub mod singleton;
mod structural;

pub use container::SAMPLE_LIMIT;
pub use enumerate::{enumerate_types, NamespaceFilter, TypeUniverse};
pub use singleton::{find_candidates, locate_root, RootMatch, SingletonCandidate};

use crate::access::guarded;
use crate::error::DiscoveryError;
use crate::host::HostRuntime;
use crate::model::{
    FieldHandle, Member, MethodHandle, ObjectRef, TypeDescriptor, TypeHandle, TypeRef, Value,
};
use crate::names::EpochTable;
use crate::registry::{
    Absence, Accessor, Origin, RegistryBuilder, RegistryVersion, ResolvedRole, RoleRegistry,
};
use crate::role::{Family, MemberKind, MemberSpec, Owner, Role, RoleSpec, Structural};

use container::ContainerOutcome;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use structural::{MemberQuery, StructuralOutcome};
use tracing::{debug, info, warn};

/// Tunables of a discovery pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instance field count a singleton candidate must exceed
    pub singleton_threshold: usize,
    /// Maximum number of types visited in a superclass walk
    pub max_hierarchy_depth: usize,
    /// Additional rejected namespace prefixes
    pub extra_prefixes: Vec<String>,
    /// Namespaces of the engine's own injected code
    pub self_prefixes: Vec<String>,
    /// Roles consumers asked for; `None` means all
    pub requested: Option<Vec<Role>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            singleton_threshold: 15,
            max_hierarchy_depth: 10,
            extra_prefixes: Vec::new(),
            self_prefixes: Vec::new(),
            requested: None,
        }
    }
}

/// Logs each missing role once per session
#[derive(Debug, Default)]
pub struct MissLog {
    session: u64,
    logged: HashSet<Role>,
}

impl MissLog {
    /// Returns true when this is the first report for the session
    pub fn record(&mut self, session: u64, role: Role, absence: Absence) -> bool {
        if session != self.session {
            self.session = session;
            self.logged.clear();
        }
        if !self.logged.insert(role) {
            return false;
        }
        warn!("Role {} unresolved: {}", role, absence);
        true
    }
}

/// Per-pass view of the host with descriptor caching
pub(crate) struct PassContext<'a> {
    pub host: &'a dyn HostRuntime,
    pub universe: &'a TypeUniverse,
    pub table: &'a EpochTable,
    pub max_depth: usize,
    cache: RefCell<HashMap<TypeHandle, Option<Arc<TypeDescriptor>>>>,
}

impl<'a> PassContext<'a> {
    pub fn new(
        host: &'a dyn HostRuntime,
        universe: &'a TypeUniverse,
        table: &'a EpochTable,
        max_depth: usize,
    ) -> Self {
        Self {
            host,
            universe,
            table,
            max_depth,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Descriptor of any type, accepted or not
    pub fn describe(&self, handle: TypeHandle) -> Option<Arc<TypeDescriptor>> {
        if let Some(ty) = self.universe.by_handle(handle) {
            return Some(ty.clone());
        }
        if let Some(cached) = self.cache.borrow().get(&handle) {
            return cached.clone();
        }
        let desc = guarded("describe", || self.host.describe(handle)).map(Arc::new);
        self.cache.borrow_mut().insert(handle, desc.clone());
        desc
    }

    pub fn runtime_type(&self, target: ObjectRef) -> Option<Arc<TypeDescriptor>> {
        let handle = guarded("class_of", || self.host.class_of(target))?;
        self.describe(handle)
    }

    /// The type and its ancestors, nearest first, bounded by `max_depth`
    ///
    /// Stops early on a cycle or an ancestor that cannot be described.
    pub fn hierarchy(&self, start: &Arc<TypeDescriptor>) -> Vec<Arc<TypeDescriptor>> {
        let mut chain = vec![start.clone()];
        let mut seen: HashSet<TypeHandle> = [start.handle].into_iter().collect();
        let mut next = start.superclass;
        while let Some(handle) = next {
            if chain.len() >= self.max_depth {
                debug!("Hierarchy of {} exceeds {} types", start.name, self.max_depth);
                break;
            }
            if !seen.insert(handle) {
                debug!("Hierarchy of {} is cyclic", start.name);
                break;
            }
            let Some(ty) = self.describe(handle) else {
                break;
            };
            next = ty.superclass;
            chain.push(ty);
        }
        chain
    }

    pub fn read_static(&self, field: FieldHandle) -> Option<Value> {
        guarded("read_static", || self.host.read_static(field))
    }

    pub fn read_field(&self, target: ObjectRef, field: FieldHandle) -> Option<Value> {
        guarded("read_field", || self.host.read_field(target, field))
    }

    pub fn invoke_static(&self, method: MethodHandle) -> Option<Value> {
        guarded("invoke", || self.host.invoke(None, method, &[]))
    }

    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        guarded("is_assignable", || self.host.is_assignable(from, to)).unwrap_or(false)
    }

    pub fn is_instance_of(&self, target: ObjectRef, family: &str) -> bool {
        guarded("is_instance_of", || self.host.is_instance_of(target, family)).unwrap_or(false)
    }

    pub fn collection_len(&self, target: ObjectRef) -> Option<usize> {
        guarded("collection_len", || self.host.collection_len(target))
    }

    pub fn collection_element(&self, target: ObjectRef, index: usize) -> Option<Value> {
        guarded("collection_element", || {
            self.host.collection_element(target, index)
        })
    }
}

/// Qualified name a family currently stands for
pub(crate) fn family_name<'b>(family: Family, builder: &'b RegistryBuilder) -> Option<&'b str> {
    match family {
        Family::Primitive(_) => None,
        Family::Exact(name) => Some(name),
        Family::Role(role) => builder.type_name(role),
    }
}

/// Whether a declared type satisfies a family
///
/// A type role that is not resolved yet only constrains the declared type
/// to some accepted host type when `weak` is set, and matches nothing
/// otherwise.
pub(crate) fn declared_matches(
    ctx: &PassContext<'_>,
    builder: &RegistryBuilder,
    family: Family,
    declared: &TypeRef,
    weak: bool,
) -> bool {
    match family {
        Family::Primitive(p) => declared.is_primitive(p),
        Family::Exact(name) => declared.object_name() == Some(name),
        Family::Role(role) => match builder.type_name(role) {
            Some(name) => declared.object_name() == Some(name),
            None => weak && declared.object_name().is_some_and(|n| ctx.universe.contains(n)),
        },
    }
}

fn type_binding(role: Role, ty: Arc<TypeDescriptor>, origin: Origin) -> ResolvedRole {
    ResolvedRole {
        role,
        accessor: Accessor::Type(ty.handle),
        origin,
        member: ty.name.clone(),
        declared: TypeRef::object(ty.name.clone()),
        owner: ty,
    }
}

fn member_binding(
    role: Role,
    member: Member,
    declaring: Arc<TypeDescriptor>,
    origin: Origin,
) -> ResolvedRole {
    let accessor = match &member {
        Member::Field(f) if f.is_static => Accessor::StaticField(f.handle),
        Member::Field(f) => Accessor::Field(f.handle),
        Member::Method(m) if m.is_static => Accessor::StaticMethod(m.handle),
        Member::Method(m) => Accessor::Method(m.handle),
    };
    ResolvedRole {
        role,
        accessor,
        origin,
        member: member.name().to_string(),
        declared: member.declared().clone(),
        owner: declaring,
    }
}

/// The discovery engine: configuration plus the name table
pub struct Engine {
    config: EngineConfig,
    table: EpochTable,
    filter: NamespaceFilter,
}

impl Engine {
    pub fn new(config: EngineConfig, table: EpochTable) -> Self {
        let filter = NamespaceFilter::new(&config.extra_prefixes, &config.self_prefixes);
        Self {
            config,
            table,
            filter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn table(&self) -> &EpochTable {
        &self.table
    }

    /// Requested roles plus everything they depend on
    pub fn requested_roles(&self) -> BTreeSet<Role> {
        match &self.config.requested {
            Some(roles) => Role::closure(roles.iter().copied()),
            None => Role::ALL.into_iter().collect(),
        }
    }

    /// Singleton candidates of the host, best first
    pub fn candidates(
        &self,
        host: &dyn HostRuntime,
    ) -> Result<(TypeUniverse, Vec<SingletonCandidate>), DiscoveryError> {
        let universe = enumerate_types(host, &self.filter)?;
        let candidates = find_candidates(&universe, &self.table, self.config.singleton_threshold);
        Ok((universe, candidates))
    }

    /// Run one discovery pass
    ///
    /// `previous` seeds validated containers when it belongs to the same
    /// session as `version`. Must not be called from the host's frame
    /// callback context.
    pub fn run_pass(
        &self,
        host: &dyn HostRuntime,
        version: RegistryVersion,
        previous: Option<&RoleRegistry>,
        misses: &mut MissLog,
    ) -> Result<RoleRegistry, DiscoveryError> {
        if host.on_frame_context() {
            return Err(DiscoveryError::FrameContext);
        }

        let universe = enumerate_types(host, &self.filter)?;
        let root = locate_root(&universe, &self.table, self.config.singleton_threshold)?;
        let ctx = PassContext::new(host, &universe, &self.table, self.config.max_hierarchy_depth);
        let requested = self.requested_roles();

        let mut builder = match previous {
            Some(prev) if prev.version().session == version.session => {
                RegistryBuilder::seeded(version, prev)
            }
            _ => RegistryBuilder::new(version),
        };
        builder.set_requested(requested.clone());
        builder.set_fingerprint(universe.fingerprint());

        let origin = match self.table.epoch_of(Role::RootType, &root.ty.name) {
            Some(epoch) => Origin::ByName {
                epoch: epoch.to_string(),
            },
            None => Origin::ByStructure,
        };
        builder.bind(type_binding(Role::RootType, root.ty.clone(), origin));

        let mut pass = Pass {
            ctx: &ctx,
            root: &root,
            requested: &requested,
            builder,
            root_value: None,
        };
        for role in Role::ALL {
            if role != Role::RootType && requested.contains(&role) {
                pass.resolve(role);
            }
        }

        let mut builder = pass.builder;
        for role in &requested {
            if !builder.is_settled(*role) {
                builder.mark_absent(*role, Absence::NotFound);
            }
        }

        let registry = builder.build();
        for role in &requested {
            if let Some(absence) = registry.absence(*role) {
                misses.record(version.session, *role, absence);
            }
        }
        info!(
            "Pass {}: {}/{} roles resolved over {} types",
            version,
            registry.iter().count(),
            requested.len(),
            universe.len()
        );
        Ok(registry)
    }
}

/// Mutable state of one pass
struct Pass<'p, 'a> {
    ctx: &'p PassContext<'a>,
    root: &'p RootMatch,
    requested: &'p BTreeSet<Role>,
    builder: RegistryBuilder,
    root_value: Option<Option<ObjectRef>>,
}

impl Pass<'_, '_> {
    fn resolve(&mut self, role: Role) {
        match role.spec() {
            RoleSpec::Type { structural } => self.resolve_type(role, structural),
            RoleSpec::Member(spec) => {
                if spec.kind == MemberKind::Container {
                    self.resolve_container(role, &spec);
                } else {
                    self.resolve_member(role, &spec);
                }
                if let Some(defined) = spec.defines {
                    self.settle_defined(defined, role);
                }
            }
        }
    }

    /// Live root instance: the resolved static field, else the getter
    fn root_value(&mut self) -> Option<ObjectRef> {
        if let Some(value) = self.root_value {
            return value;
        }
        let field = self
            .builder
            .get(Role::RootInstance)
            .and_then(|r| r.accessor.field())
            .unwrap_or(self.root.instance.handle);
        let mut value = self.ctx.read_static(field).and_then(|v| v.as_object());
        if value.is_none() {
            if let Some(Accessor::StaticMethod(getter)) = self.builder.get(Role::RootGetter).map(|r| r.accessor) {
                value = self.ctx.invoke_static(getter).and_then(|v| v.as_object());
            }
        }
        if value.is_none() {
            debug!("Root instance of {} is not initialized", self.root.ty.name);
        }
        self.root_value = Some(value);
        value
    }

    fn missing_dependency(&self, role: Role) -> Option<Role> {
        role.hard_dependencies()
            .into_iter()
            .find(|dep| !self.builder.is_bound(*dep))
    }

    fn resolve_type(&mut self, role: Role, structural: Option<Structural>) {
        if self.builder.is_bound(role) {
            return;
        }
        if let Some((ty, epoch)) = named::type_by_name(self.ctx, role) {
            self.builder.bind(type_binding(role, ty, Origin::ByName { epoch }));
            return;
        }
        match structural {
            // Settled once the defining member has been resolved
            Some(Structural::DefinedBy(_)) => {}
            Some(rule) => match structural::match_type(self.ctx, &self.builder, rule) {
                Ok(Some(ty)) => {
                    debug!("{} = {} (structure)", role, ty.name);
                    self.builder.bind(type_binding(role, ty, Origin::ByStructure));
                }
                Ok(None) => self.builder.mark_absent(role, Absence::NotFound),
                Err(absence) => self.builder.mark_absent(role, absence),
            },
            None => self.builder.mark_absent(role, Absence::NotFound),
        }
    }

    fn settle_defined(&mut self, ty_role: Role, member: Role) {
        if !self.requested.contains(&ty_role) || self.builder.is_bound(ty_role) {
            return;
        }
        let declared = match self.builder.get(member) {
            Some(resolved) => resolved.declared.object_name().map(str::to_string),
            None => {
                self.builder
                    .mark_absent(ty_role, Absence::DependencyMissing(member));
                return;
            }
        };
        match declared.and_then(|name| self.ctx.universe.get(&name).cloned()) {
            Some(ty) => {
                debug!("{} = {} (declared by {})", ty_role, ty.name, member);
                self.builder
                    .bind(type_binding(ty_role, ty, Origin::ByStructure));
            }
            None => self.builder.mark_absent(ty_role, Absence::NotFound),
        }
    }

    fn owner_type(&self, spec: &MemberSpec) -> Option<Arc<TypeDescriptor>> {
        match spec.owner {
            Owner::Root => Some(self.root.ty.clone()),
            Owner::Type(ty) => self.builder.get(ty).map(|r| r.owner.clone()),
            Owner::ValueOf(_) => None,
        }
    }

    fn resolve_member(&mut self, role: Role, spec: &MemberSpec) {
        if let Some(dep) = self.missing_dependency(role) {
            self.builder
                .mark_absent(role, Absence::DependencyMissing(dep));
            return;
        }
        let Some(owner) = self.owner_type(spec) else {
            self.builder.mark_absent(role, Absence::NotFound);
            return;
        };

        if let Some(found) = named::member_by_name(self.ctx, &self.builder, role, spec, &owner) {
            self.builder.bind(member_binding(
                role,
                found.member,
                found.declaring,
                Origin::ByName { epoch: found.epoch },
            ));
            return;
        }

        let needs_live_root = spec.structural.iter().any(|rule| {
            matches!(
                rule,
                Structural::FieldWithLiveShape { .. } | Structural::FieldWithLiveContainer { .. }
            )
        });
        let root = if needs_live_root {
            self.root_value()
        } else {
            None
        };
        let claimed = self.builder.claimed_fields();
        let query = MemberQuery {
            role,
            spec,
            owner: &owner,
            root,
            claimed: &claimed,
        };

        let mut root_unavailable = false;
        for rule in spec.structural {
            match structural::match_member(self.ctx, &self.builder, &query, *rule) {
                StructuralOutcome::Matched { member, declaring } => {
                    debug!("{} = {}::{} (structure)", role, declaring.name, member.name());
                    self.builder
                        .bind(member_binding(role, member, declaring, Origin::ByStructure));
                    return;
                }
                StructuralOutcome::NeedsRoot => root_unavailable = true,
                StructuralOutcome::NoMatch => {}
            }
        }

        let absence = if root_unavailable {
            Absence::RootUnavailable
        } else {
            Absence::NotFound
        };
        self.builder.mark_absent(role, absence);
    }

    fn resolve_container(&mut self, role: Role, spec: &MemberSpec) {
        if let Some(dep) = self.missing_dependency(role) {
            self.builder
                .mark_absent(role, Absence::DependencyMissing(dep));
            return;
        }
        let Owner::ValueOf(holder) = spec.owner else {
            self.builder.mark_absent(role, Absence::NotFound);
            return;
        };
        let (Some(interface), Some(element)) = (
            family_name(spec.family, &self.builder).map(str::to_string),
            spec.element
                .and_then(|e| family_name(e, &self.builder))
                .map(str::to_string),
        ) else {
            self.builder.mark_absent(role, Absence::NotFound);
            return;
        };

        let Some(root) = self.root_value() else {
            self.builder.mark_absent(role, Absence::RootUnavailable);
            return;
        };
        let receiver = match self.builder.get(holder).map(|r| r.accessor) {
            Some(Accessor::Field(field)) => self.ctx.read_field(root, field),
            Some(Accessor::StaticField(field)) => self.ctx.read_static(field),
            _ => None,
        };
        let Some(receiver) = receiver.and_then(|v| v.as_object()) else {
            // Holder not populated yet (e.g. no world loaded)
            self.builder.mark_absent(role, Absence::Deferred);
            return;
        };

        let mut claimed = self.builder.claimed_fields();
        if let Some(own) = self.builder.get(role).and_then(|r| r.accessor.field()) {
            claimed.remove(&own);
        }

        match container::locate_container(self.ctx, role, &interface, &element, receiver, &claimed) {
            ContainerOutcome::Validated { field, declaring } => {
                self.builder.bind(member_binding(
                    role,
                    Member::Field(field),
                    declaring,
                    Origin::BySampledValidation,
                ));
            }
            ContainerOutcome::Deferred => self.builder.mark_absent(role, Absence::Deferred),
            ContainerOutcome::NotFound => self.builder.mark_absent(role, Absence::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, game_host, Naming};
    use crate::host::tests::MockHost;
    use crate::host::{Snapshot, SnapshotHost, TypeEntry};

    fn engine() -> Engine {
        Engine::new(EngineConfig::default(), EpochTable::builtin())
    }

    fn version(session: u64, generation: u64) -> RegistryVersion {
        RegistryVersion {
            session,
            generation,
        }
    }

    fn pass(host: &dyn HostRuntime) -> RoleRegistry {
        engine()
            .run_pass(host, version(1, 0), None, &mut MissLog::default())
            .unwrap()
    }

    #[test]
    fn test_mcp_names_fully_map() {
        let registry = pass(&game_host(&Naming::mcp()));
        assert!(registry.is_fully_mapped(), "{}", registry.summary());
        for role in Role::ALL {
            let resolved = registry.resolved(role).unwrap();
            match role {
                Role::ActivePlayerList | Role::ActiveEntityList => {
                    assert_eq!(resolved.origin, Origin::BySampledValidation)
                }
                _ => assert!(matches!(resolved.origin, Origin::ByName { .. }), "{}", role),
            }
        }
        assert_eq!(registry.resolved(Role::ActiveEntityList).unwrap().member, "loadedEntityList");
        assert_eq!(registry.resolved(Role::EntityHealth).unwrap().owner.name, "net.minecraft.entity.EntityLivingBase");
    }

    #[test]
    fn test_disjoint_schemes_resolve_identically() {
        let mcp = pass(&game_host(&Naming::mcp()));
        let notch = pass(&game_host(&Naming::notch()));
        assert!(notch.is_fully_mapped(), "{}", notch.summary());
        for role in Role::ALL {
            assert_eq!(mcp.resolve(role), notch.resolve(role), "{}", role);
        }
        assert_eq!(
            notch.resolved(Role::LocalPlayer).unwrap().origin,
            Origin::ByName {
                epoch: "notch-1.8.9".into()
            }
        );
    }

    #[test]
    fn test_unknown_names_fall_back_to_structure() {
        let mcp = pass(&game_host(&Naming::mcp()));
        let unknown = pass(&game_host(&Naming::unknown()));

        let structural = [
            Role::RootType,
            Role::RootInstance,
            Role::RootGetter,
            Role::ScreenType,
            Role::ActiveScreen,
            Role::PlayerType,
            Role::LocalPlayer,
            Role::EntityType,
            Role::WorldType,
            Role::ActiveWorld,
            Role::EntityPositionX,
            Role::EntityPositionY,
            Role::EntityPositionZ,
            Role::EntityHealth,
        ];
        for role in structural {
            let resolved = unknown.resolved(role).unwrap_or_else(|| panic!("{} missing", role));
            assert_eq!(resolved.origin, Origin::ByStructure, "{}", role);
            assert_eq!(unknown.resolve(role), mcp.resolve(role), "{}", role);
        }
        assert_eq!(
            unknown.resolved(Role::ActiveEntityList).unwrap().origin,
            Origin::BySampledValidation
        );
        assert_eq!(unknown.resolve(Role::ActiveEntityList), mcp.resolve(Role::ActiveEntityList));

        assert_eq!(unknown.absence(Role::PlayerBaseType), Some(Absence::NotFound));
        assert_eq!(unknown.absence(Role::EntityYaw), Some(Absence::NotFound));
        assert_eq!(
            unknown.absence(Role::ActivePlayerList),
            Some(Absence::DependencyMissing(Role::PlayerBaseType))
        );
        assert!(!unknown.is_fully_mapped());
    }

    #[test]
    fn test_rerun_yields_identical_handles() {
        let host = game_host(&Naming::unknown());
        let first = pass(&host);
        let second = pass(&host);
        for role in Role::ALL {
            assert_eq!(first.resolve(role), second.resolve(role));
        }
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_requested_roles_limit_the_pass() {
        let engine = Engine::new(
            EngineConfig {
                requested: Some(vec![Role::EntityPositionY]),
                ..Default::default()
            },
            EpochTable::builtin(),
        );
        let registry = engine
            .run_pass(&game_host(&Naming::mcp()), version(1, 0), None, &mut MissLog::default())
            .unwrap();
        assert!(registry.resolve(Role::EntityPositionY).is_some());
        assert!(registry.resolve(Role::EntityType).is_some());
        assert!(registry.resolve(Role::ActiveEntityList).is_none());
        assert!(registry.resolve(Role::ActiveScreen).is_none());
        assert!(!registry.requested().contains(&Role::ActiveScreen));
        assert!(registry.is_fully_mapped());
    }

    #[test]
    fn test_empty_lists_deferred_then_accepted() {
        let host = game_host(&Naming::mcp());
        host.set_elements(fixtures::ENTITY_LIST, vec![]);
        host.set_elements(fixtures::PLAYER_LIST, vec![]);

        let engine = engine();
        let mut misses = MissLog::default();
        let first = engine.run_pass(&host, version(1, 0), None, &mut misses).unwrap();
        assert_eq!(first.absence(Role::ActiveEntityList), Some(Absence::Deferred));
        assert_eq!(first.absence(Role::ActivePlayerList), Some(Absence::Deferred));

        host.set_elements(fixtures::ENTITY_LIST, vec![Value::Object(fixtures::ZOMBIE)]);
        host.set_elements(fixtures::PLAYER_LIST, vec![Value::Object(fixtures::LOCAL_PLAYER)]);
        let second = engine
            .run_pass(&host, version(1, 1), Some(&first), &mut misses)
            .unwrap();
        assert!(second.is_fully_mapped());
        assert_eq!(
            second.resolved(Role::ActiveEntityList).unwrap().origin,
            Origin::BySampledValidation
        );
    }

    #[test]
    fn test_validated_container_survives_same_session_rediscovery() {
        let host = game_host(&Naming::mcp());
        let engine = engine();
        let mut misses = MissLog::default();
        let first = engine.run_pass(&host, version(1, 0), None, &mut misses).unwrap();
        let validated = first.resolve(Role::ActiveEntityList);

        host.set_elements(fixtures::ENTITY_LIST, vec![]);
        let same = engine
            .run_pass(&host, version(1, 1), Some(&first), &mut misses)
            .unwrap();
        assert_eq!(same.resolve(Role::ActiveEntityList), validated);
        assert_eq!(
            same.resolved(Role::ActiveEntityList).unwrap().origin,
            Origin::BySampledValidation
        );

        // A new session starts from scratch
        let fresh = engine
            .run_pass(&host, version(2, 0), Some(&first), &mut misses)
            .unwrap();
        assert_eq!(fresh.absence(Role::ActiveEntityList), Some(Absence::Deferred));
    }

    #[test]
    fn test_null_root_leaves_live_roles_unavailable() {
        let host = game_host(&Naming::unknown());
        let names = Naming::unknown();
        host.set_static(names.minecraft, names.instance, Value::Null);

        let registry = pass(&host);
        assert!(registry.resolve(Role::RootInstance).is_some());
        assert!(registry.resolve(Role::ActiveScreen).is_some());
        assert_eq!(registry.absence(Role::LocalPlayer), Some(Absence::RootUnavailable));
        assert_eq!(
            registry.absence(Role::PlayerType),
            Some(Absence::DependencyMissing(Role::LocalPlayer))
        );
        assert_eq!(
            registry.absence(Role::EntityPositionX),
            Some(Absence::DependencyMissing(Role::EntityType))
        );
    }

    #[test]
    fn test_null_root_field_falls_back_to_getter() {
        let host = game_host(&Naming::mcp());
        let names = Naming::mcp();
        host.set_static(names.minecraft, names.instance, Value::Null);
        let registry = pass(&host);
        assert!(registry.resolve(Role::ActiveEntityList).is_none());

        // Getter returning the instance restores the live roles
        let mut snapshot = fixtures::game(&names);
        for entry in &mut snapshot.types {
            if entry.name == names.minecraft {
                if let Some(getter) = entry.methods.iter_mut().find(|m| m.name == names.getter) {
                    getter.returns = Some(Value::Object(fixtures::ROOT));
                }
            }
        }
        snapshot.statics.clear();
        let registry = pass(&SnapshotHost::from_snapshot(snapshot).unwrap());
        assert!(registry.is_fully_mapped(), "{}", registry.summary());
    }

    #[test]
    fn test_singleton_missing_is_an_error() {
        let host = SnapshotHost::from_snapshot(
            Snapshot::default().with_type(TypeEntry::new("g.Small").filler_fields("f", 3)),
        )
        .unwrap();
        let err = engine()
            .run_pass(&host, version(1, 0), None, &mut MissLog::default())
            .unwrap_err();
        assert_eq!(err, DiscoveryError::SingletonNotFound { scanned: 1 });
    }

    #[test]
    fn test_refuses_frame_context() {
        let host = MockHost::new(game_host(&Naming::mcp()));
        host.bind_frame_context_here();
        let err = engine()
            .run_pass(&host, version(1, 0), None, &mut MissLog::default())
            .unwrap_err();
        assert_eq!(err, DiscoveryError::FrameContext);
        assert!(!err.is_retryable());
        assert_eq!(host.enumerations(), 0);
    }

    #[test]
    fn test_miss_log_reports_once_per_session() {
        let mut misses = MissLog::default();
        assert!(misses.record(1, Role::EntityYaw, Absence::NotFound));
        assert!(!misses.record(1, Role::EntityYaw, Absence::NotFound));
        assert!(misses.record(1, Role::ActiveWorld, Absence::Deferred));
        assert!(misses.record(2, Role::EntityYaw, Absence::NotFound));
    }

    #[test]
    fn test_cyclic_and_deep_hierarchies_terminate() {
        let mut snapshot = Snapshot::default()
            .with_type(TypeEntry::new("c.A").extends("c.B"))
            .with_type(TypeEntry::new("c.B").extends("c.A"));
        for i in 0..15 {
            let mut entry = TypeEntry::new(format!("d.T{}", i));
            if i > 0 {
                entry = entry.extends(format!("d.T{}", i - 1));
            }
            snapshot = snapshot.with_type(entry);
        }
        let host = SnapshotHost::from_snapshot(snapshot).unwrap();
        let universe = enumerate_types(&host, &NamespaceFilter::default()).unwrap();
        let table = EpochTable::default();
        let ctx = PassContext::new(&host, &universe, &table, 10);

        let cyclic = ctx.hierarchy(universe.get("c.A").unwrap());
        let names: Vec<_> = cyclic.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c.A", "c.B"]);

        let deep = ctx.hierarchy(universe.get("d.T14").unwrap());
        assert_eq!(deep.len(), 10);
        assert_eq!(deep.last().unwrap().name, "d.T5");
    }
}
