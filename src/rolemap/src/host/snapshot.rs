//! Snapshot Host
//!
//! Host implementation backed by a serialized type universe and object graph
//! (JSON or YAML). Used by the CLI to replay a captured host, and by tests to
//! build synthetic universes.

use super::HostRuntime;
use crate::error::{HostError, HostResult, SnapshotError};
use crate::model::{
    FieldDescriptor, FieldHandle, MethodDescriptor, MethodHandle, ObjectRef, Primitive,
    TypeDescriptor, TypeHandle, TypeRef, Value,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_yaml::with::singleton_map_recursive;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Serialized host state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    /// Static field values keyed by `Owner::field`
    #[serde(default)]
    pub statics: BTreeMap<String, Value>,
}

/// A type in the snapshot universe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default = "TypeRef::void")]
    pub ret: TypeRef,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Recorded result when no per-object result exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Value>,
    /// Invoking this method raises a foreign exception
    #[serde(default)]
    pub throws: bool,
}

/// A live object in the snapshot graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub id: u32,
    pub class: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// Present for collections (list elements, map values)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Value>>,
    /// Per-object method results keyed by method name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub returns: BTreeMap<String, Value>,
}

fn lenient_type(spelling: &str) -> TypeRef {
    spelling
        .parse()
        .unwrap_or_else(|_| TypeRef::object(spelling))
}

impl TypeEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldEntry {
            name: name.to_string(),
            ty: lenient_type(ty),
            is_static: false,
        });
        self
    }

    pub fn static_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldEntry {
            name: name.to_string(),
            ty: lenient_type(ty),
            is_static: true,
        });
        self
    }

    /// Add `count` filler instance fields of type int
    pub fn filler_fields(mut self, prefix: &str, count: usize) -> Self {
        for i in 0..count {
            self = self.field(&format!("{}{}", prefix, i), "int");
        }
        self
    }

    pub fn method(mut self, name: &str, params: &[&str], ret: &str) -> Self {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            params: params.iter().map(|p| lenient_type(p)).collect(),
            ret: lenient_type(ret),
            is_static: false,
            returns: None,
            throws: false,
        });
        self
    }

    pub fn static_method(mut self, name: &str, params: &[&str], ret: &str) -> Self {
        self = self.method(name, params, ret);
        if let Some(m) = self.methods.last_mut() {
            m.is_static = true;
        }
        self
    }

    /// Mark the most recently added method as throwing when invoked
    pub fn throwing(mut self) -> Self {
        if let Some(m) = self.methods.last_mut() {
            m.throws = true;
        }
        self
    }
}

impl ObjectEntry {
    pub fn new(id: u32, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            fields: BTreeMap::new(),
            elements: None,
            returns: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn elements(mut self, elements: Vec<Value>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn returning(mut self, method: &str, value: Value) -> Self {
        self.returns.insert(method.to_string(), value);
        self
    }
}

impl Snapshot {
    pub fn with_type(mut self, entry: TypeEntry) -> Self {
        self.types.push(entry);
        self
    }

    pub fn with_object(mut self, entry: ObjectEntry) -> Self {
        self.objects.push(entry);
        self
    }

    pub fn with_static(mut self, owner: &str, field: &str, value: Value) -> Self {
        self.statics.insert(format!("{}::{}", owner, field), value);
        self
    }

    /// Parse JSON or YAML depending on the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        if is_yaml(path) {
            let de = serde_yaml::Deserializer::from_str(&contents);
            Ok(singleton_map_recursive::deserialize(de)?)
        } else {
            Ok(serde_json::from_str(&contents)?)
        }
    }

    /// Write JSON or YAML depending on the file extension
    ///
    /// YAML values use the same `{ long: 42 }` map form as JSON, so a saved
    /// file loads back through [`Snapshot::load`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let mut out = Vec::new();
        if is_yaml(path) {
            let mut ser = serde_yaml::Serializer::new(&mut out);
            singleton_map_recursive::serialize(self, &mut ser)?;
        } else {
            serde_json::to_writer_pretty(&mut out, self)?;
        }
        std::fs::write(path, out)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

struct LiveObject {
    class: TypeHandle,
    fields: BTreeMap<String, Value>,
    elements: Option<Vec<Value>>,
    returns: BTreeMap<String, Value>,
}

#[derive(Default)]
struct LiveState {
    objects: HashMap<ObjectRef, LiveObject>,
    statics: HashMap<FieldHandle, Value>,
}

struct MethodSlot {
    ty: TypeHandle,
    index: usize,
    returns: Option<Value>,
    throws: bool,
}

/// Host backed by a `Snapshot`
///
/// The type universe is fixed at construction. Live object state can be
/// mutated afterwards to simulate the host moving on (collections filling
/// up, fields changing on a server switch).
pub struct SnapshotHost {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeHandle>,
    supertypes: Vec<Vec<String>>,
    fields: Vec<(TypeHandle, usize)>,
    methods: Vec<MethodSlot>,
    live: RwLock<LiveState>,
    /// File the snapshot was loaded from
    pub path: Option<PathBuf>,
}

fn default_value(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Primitive(Primitive::Boolean) => Value::Bool(false),
        TypeRef::Primitive(Primitive::Long) => Value::Long(0),
        TypeRef::Primitive(Primitive::Float) => Value::Float(0.0),
        TypeRef::Primitive(Primitive::Double) => Value::Double(0.0),
        TypeRef::Primitive(Primitive::Void) => Value::Null,
        TypeRef::Primitive(_) => Value::Int(0),
        TypeRef::Object(_) | TypeRef::Array(_) => Value::Null,
    }
}

impl SnapshotHost {
    /// Open a snapshot file (JSON, or YAML by extension)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Snapshot::load(&path)?;
        let mut host = Self::from_snapshot(snapshot)?;
        debug!(
            "Opened snapshot {:?} ({} types)",
            path,
            host.types.len()
        );
        host.path = Some(path);
        Ok(host)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut by_name = HashMap::new();
        for (i, entry) in snapshot.types.iter().enumerate() {
            if by_name
                .insert(entry.name.clone(), TypeHandle(i as u32))
                .is_some()
            {
                return Err(SnapshotError::DuplicateType(entry.name.clone()));
            }
        }

        let mut types = Vec::with_capacity(snapshot.types.len());
        let mut supertypes = Vec::with_capacity(snapshot.types.len());
        let mut fields = Vec::new();
        let mut methods = Vec::new();

        for (i, entry) in snapshot.types.iter().enumerate() {
            let handle = TypeHandle(i as u32);

            let field_descs = entry
                .fields
                .iter()
                .enumerate()
                .map(|(index, f)| {
                    let id = FieldHandle(fields.len() as u32);
                    fields.push((handle, index));
                    FieldDescriptor {
                        owner: entry.name.clone(),
                        name: f.name.clone(),
                        ty: f.ty.clone(),
                        is_static: f.is_static,
                        handle: id,
                    }
                })
                .collect();

            let method_descs = entry
                .methods
                .iter()
                .enumerate()
                .map(|(index, m)| {
                    let id = MethodHandle(methods.len() as u32);
                    methods.push(MethodSlot {
                        ty: handle,
                        index,
                        returns: m.returns,
                        throws: m.throws,
                    });
                    MethodDescriptor {
                        owner: entry.name.clone(),
                        name: m.name.clone(),
                        params: m.params.clone(),
                        ret: m.ret.clone(),
                        is_static: m.is_static,
                        handle: id,
                    }
                })
                .collect();

            let mut supers: Vec<String> = entry.superclass.iter().cloned().collect();
            supers.extend(entry.interfaces.iter().cloned());
            supertypes.push(supers);

            types.push(TypeDescriptor {
                handle,
                name: entry.name.clone(),
                superclass: entry
                    .superclass
                    .as_ref()
                    .and_then(|s| by_name.get(s).copied()),
                fields: field_descs,
                methods: method_descs,
            });
        }

        let host = Self {
            types,
            by_name,
            supertypes,
            fields,
            methods,
            live: RwLock::new(LiveState::default()),
            path: None,
        };

        let mut seen = HashSet::new();
        for entry in snapshot.objects {
            if !seen.insert(entry.id) {
                return Err(SnapshotError::DuplicateObject(entry.id));
            }
            host.insert_object(entry)?;
        }

        for (key, value) in snapshot.statics {
            match host.static_handle(&key) {
                Some(handle) => {
                    host.live.write().statics.insert(handle, value);
                }
                None => warn!("Snapshot static '{}' does not name a static field", key),
            }
        }

        Ok(host)
    }

    fn static_handle(&self, key: &str) -> Option<FieldHandle> {
        let (owner, field) = key.rsplit_once("::")?;
        let ty = self.types.get(self.by_name.get(owner)?.0 as usize)?;
        ty.fields
            .iter()
            .find(|f| f.is_static && f.name == field)
            .map(|f| f.handle)
    }

    /// Handle of a type by qualified name
    pub fn type_handle(&self, name: &str) -> Option<TypeHandle> {
        self.by_name.get(name).copied()
    }

    /// Add (or replace) a live object
    pub fn insert_object(&self, entry: ObjectEntry) -> Result<(), SnapshotError> {
        let class = self
            .type_handle(&entry.class)
            .ok_or_else(|| SnapshotError::UnknownClass {
                id: entry.id,
                class: entry.class.clone(),
            })?;
        self.live.write().objects.insert(
            ObjectRef(entry.id),
            LiveObject {
                class,
                fields: entry.fields,
                elements: entry.elements,
                returns: entry.returns,
            },
        );
        Ok(())
    }

    /// Set an instance field by name; returns false for unknown objects
    pub fn set_field(&self, target: ObjectRef, field: &str, value: Value) -> bool {
        match self.live.write().objects.get_mut(&target) {
            Some(obj) => {
                obj.fields.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Replace the contents of a live collection
    pub fn set_elements(&self, target: ObjectRef, elements: Vec<Value>) -> bool {
        match self.live.write().objects.get_mut(&target) {
            Some(obj) => {
                obj.elements = Some(elements);
                true
            }
            None => false,
        }
    }

    /// Set a static field by owner and name
    pub fn set_static(&self, owner: &str, field: &str, value: Value) -> bool {
        match self.static_handle(&format!("{}::{}", owner, field)) {
            Some(handle) => {
                self.live.write().statics.insert(handle, value);
                true
            }
            None => false,
        }
    }

    fn field_desc(&self, field: FieldHandle) -> HostResult<&FieldDescriptor> {
        let (ty, index) = self
            .fields
            .get(field.0 as usize)
            .ok_or(HostError::UnknownField(field))?;
        Ok(&self.types[ty.0 as usize].fields[*index])
    }

    fn assignable(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from.to_string()];
        let mut seen = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == to {
                return true;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(handle) = self.by_name.get(&name) {
                stack.extend(self.supertypes[handle.0 as usize].iter().cloned());
            }
        }
        false
    }
}

impl HostRuntime for SnapshotHost {
    fn loaded_types(&self) -> HostResult<Vec<TypeHandle>> {
        Ok(self.types.iter().map(|t| t.handle).collect())
    }

    fn describe(&self, ty: TypeHandle) -> HostResult<TypeDescriptor> {
        self.types
            .get(ty.0 as usize)
            .cloned()
            .ok_or(HostError::UnknownType(ty))
    }

    fn read_static(&self, field: FieldHandle) -> HostResult<Value> {
        let desc = self.field_desc(field)?;
        if !desc.is_static {
            return Err(HostError::TypeMismatch(format!(
                "{}::{} is not static",
                desc.owner, desc.name
            )));
        }
        Ok(self
            .live
            .read()
            .statics
            .get(&field)
            .copied()
            .unwrap_or_else(|| default_value(&desc.ty)))
    }

    fn read_field(&self, target: ObjectRef, field: FieldHandle) -> HostResult<Value> {
        let desc = self.field_desc(field)?;
        if desc.is_static {
            return Err(HostError::TypeMismatch(format!(
                "{}::{} is static",
                desc.owner, desc.name
            )));
        }
        let live = self.live.read();
        let obj = live
            .objects
            .get(&target)
            .ok_or(HostError::UnknownObject(target))?;
        let class = &self.types[obj.class.0 as usize].name;
        if !self.assignable(class, &desc.owner) {
            return Err(HostError::Exception(format!(
                "IllegalArgumentException: {} has no field {}::{}",
                class, desc.owner, desc.name
            )));
        }
        Ok(obj
            .fields
            .get(&desc.name)
            .copied()
            .unwrap_or_else(|| default_value(&desc.ty)))
    }

    fn invoke(
        &self,
        target: Option<ObjectRef>,
        method: MethodHandle,
        args: &[Value],
    ) -> HostResult<Value> {
        let slot = self
            .methods
            .get(method.0 as usize)
            .ok_or(HostError::UnknownMethod(method))?;
        let desc = &self.types[slot.ty.0 as usize].methods[slot.index];

        if slot.throws {
            return Err(HostError::Exception(format!(
                "{}::{} threw",
                desc.owner, desc.name
            )));
        }
        if desc.is_static != target.is_none() {
            return Err(HostError::TypeMismatch(format!(
                "{}::{} invoked with wrong receiver",
                desc.owner, desc.name
            )));
        }
        if args.len() != desc.params.len() {
            return Err(HostError::TypeMismatch(format!(
                "{}::{} takes {} arguments, got {}",
                desc.owner,
                desc.name,
                desc.params.len(),
                args.len()
            )));
        }

        if let Some(target) = target {
            let live = self.live.read();
            let obj = live
                .objects
                .get(&target)
                .ok_or(HostError::UnknownObject(target))?;
            if let Some(value) = obj.returns.get(&desc.name) {
                return Ok(*value);
            }
        }

        Ok(slot.returns.unwrap_or_else(|| default_value(&desc.ret)))
    }

    fn class_of(&self, target: ObjectRef) -> HostResult<TypeHandle> {
        self.live
            .read()
            .objects
            .get(&target)
            .map(|o| o.class)
            .ok_or(HostError::UnknownObject(target))
    }

    fn is_instance_of(&self, target: ObjectRef, family: &str) -> HostResult<bool> {
        let class = self.class_of(target)?;
        Ok(self.assignable(&self.types[class.0 as usize].name, family))
    }

    fn is_assignable(&self, from: &str, to: &str) -> HostResult<bool> {
        Ok(self.assignable(from, to))
    }

    fn collection_len(&self, target: ObjectRef) -> HostResult<usize> {
        let live = self.live.read();
        let obj = live
            .objects
            .get(&target)
            .ok_or(HostError::UnknownObject(target))?;
        obj.elements
            .as_ref()
            .map(Vec::len)
            .ok_or(HostError::NotACollection(target))
    }

    fn collection_element(&self, target: ObjectRef, index: usize) -> HostResult<Value> {
        let live = self.live.read();
        let obj = live
            .objects
            .get(&target)
            .ok_or(HostError::UnknownObject(target))?;
        let elements = obj
            .elements
            .as_ref()
            .ok_or(HostError::NotACollection(target))?;
        elements
            .get(index)
            .copied()
            .ok_or(HostError::IndexOutOfBounds {
                index,
                len: elements.len(),
            })
    }
}
