//! Host type model
//!
//! Descriptors fetched from the host during a discovery pass:
//! - Opaque handles for types, fields, methods and live objects
//! - Declared types (`TypeRef`) and primitive kinds
//! - Type, field and method descriptors
//! - Live values read back from the host
//!
//! Descriptors carry no resolution confidence. Confidence belongs to a
//! resolved role, see `registry::ResolvedRole`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque handle to a loaded host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHandle(pub u32);

/// Opaque handle to a field on a concrete host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldHandle(pub u32);

/// Opaque handle to a method on a concrete host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodHandle(pub u32);

/// Reference to a live host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(pub u32);

/// Primitive value kinds of the managed runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "void" => Self::Void,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

/// Declared type of a field, parameter or return value
///
/// Serialized as the source-level spelling: `double`, `int[]`,
/// `net.minecraft.client.Minecraft`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive(Primitive),
    Object(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    pub fn void() -> Self {
        Self::Primitive(Primitive::Void)
    }

    /// Qualified name when this is a (non-array) reference type
    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_primitive(&self, primitive: Primitive) -> bool {
        matches!(self, Self::Primitive(p) if *p == primitive)
    }
}

impl FromStr for TypeRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty type name".to_string());
        }
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(Self::Array(Box::new(inner.parse()?)));
        }
        if let Some(p) = Primitive::from_name(s) {
            return Ok(Self::Primitive(p));
        }
        if s.contains(char::is_whitespace) {
            return Err(format!("invalid type name '{}'", s));
        }
        Ok(Self::Object(s.to_string()))
    }
}

impl TryFrom<String> for TypeRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Object(name) => f.write_str(name),
            Self::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// A field declared on a host type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Qualified name of the declaring type
    pub owner: String,
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub handle: FieldHandle,
}

/// A method declared on a host type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Qualified name of the declaring type
    pub owner: String,
    pub name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    pub is_static: bool,
    pub handle: MethodHandle,
}

/// A loaded host type with its declared members
///
/// Immutable once fetched. Discovery passes re-fetch descriptors rather
/// than keeping them across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub handle: TypeHandle,
    /// Qualified name, the type's identity
    pub name: String,
    pub superclass: Option<TypeHandle>,
    /// Declared fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    /// Number of non-static declared fields
    pub fn instance_field_count(&self) -> usize {
        self.fields.iter().filter(|f| !f.is_static).count()
    }

    /// Number of non-static declared fields of the given primitive kind
    pub fn instance_fields_of(&self, primitive: Primitive) -> usize {
        self.fields
            .iter()
            .filter(|f| !f.is_static && f.ty.is_primitive(primitive))
            .count()
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_static)
    }

    /// Static fields whose declared type is this type itself
    pub fn self_typed_statics(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(move |f| f.is_static && f.ty.object_name() == Some(self.name.as_str()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Last path segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A member bound during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Field(FieldDescriptor),
    Method(MethodDescriptor),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Method(m) => &m.name,
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            Self::Field(f) => &f.owner,
            Self::Method(m) => &m.owner,
        }
    }

    /// Declared field type, or the method's return type
    pub fn declared(&self) -> &TypeRef {
        match self {
            Self::Field(f) => &f.ty,
            Self::Method(m) => &m.ret,
        }
    }
}

/// A live value read from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(ObjectRef),
}

impl Value {
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(o) => Some(*o),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Widen numeric values to f64
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Long(v) => Some(v as f64),
            Self::Float(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}L", v),
            Self::Float(v) => write!(f, "{}f", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Object(o) => write!(f, "object#{}", o.0),
        }
    }
}
