//! Static field tables that model types hand to the engine.
//!
//! A model type implements [`Mapped`] by listing its fields once in
//! [`Mapped::fields`]. The registry turns that list into a validated
//! [`TypeDescriptor`](crate::TypeDescriptor) the first time the type is used.

use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;

use crate::builder::{GraphBuilder, build_erased};
use crate::encode::ToWire;
use crate::error::MappingResult;
use crate::path::FieldPath;
use crate::record::Record;

/// A type the engine can build from a JSON object and encode back into one.
pub trait Mapped: ToWire + Any + Sized {
    /// Name used in diagnostics.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Declared fields in wire order.
    fn fields() -> Vec<FieldDescriptor>;

    /// Assembles the instance from the values collected for its fields.
    fn from_record(record: &mut Record) -> MappingResult<Self>;

    /// Current value of the field declared with `ident`, for encoding.
    /// Returning `None` leaves the field out of the encoded object.
    fn field_value(&self, ident: &str) -> Option<&dyn ToWire>;

    /// Listing types receive the normalized connection envelope instead of
    /// the raw wire value.
    fn is_connection() -> bool {
        false
    }
}

/// Enumeration whose constants travel as strings on the wire.
pub trait WireEnum: Sized {
    const CONSTANTS: &'static [&'static str];

    fn from_wire(value: &str) -> Option<Self>;

    fn as_wire(&self) -> &'static str;
}

/// What to do with a wire string that matches none of an enumeration's constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPolicy {
    Strict,
    Fallback(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumSpec {
    pub constants: &'static [&'static str],
    pub policy: EnumPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Text,
    Timestamp,
    Enum(EnumSpec),
    /// Opaque JSON kept as-is.
    Json,
}

impl ScalarKind {
    pub fn enumeration<E: WireEnum>() -> Self {
        Self::Enum(EnumSpec {
            constants: E::CONSTANTS,
            policy: EnumPolicy::Strict,
        })
    }

    /// Enumeration that maps unknown wire strings to `fallback`.
    pub fn enumeration_or<E: WireEnum>(fallback: &'static str) -> Self {
        Self::Enum(EnumSpec {
            constants: E::CONSTANTS,
            policy: EnumPolicy::Fallback(fallback),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Enum(_) => "enum",
            Self::Json => "json",
        }
    }
}

type BuildFn =
    fn(&GraphBuilder<'_>, &Value, &mut FieldPath) -> MappingResult<Box<dyn Any>>;

/// Type-erased handle on a [`Mapped`] type, used where a field declares a
/// nested object or a list of objects.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: fn() -> TypeId,
    name: fn() -> &'static str,
    fields: fn() -> Vec<FieldDescriptor>,
    connection: fn() -> bool,
    build: BuildFn,
}

impl TypeRef {
    pub fn of<T: Mapped>() -> Self {
        Self {
            id: TypeId::of::<T>,
            name: T::type_name,
            fields: T::fields,
            connection: T::is_connection,
            build: build_erased::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        (self.id)()
    }

    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    pub fn is_connection(&self) -> bool {
        (self.connection)()
    }

    pub(crate) fn declared_fields(&self) -> Vec<FieldDescriptor> {
        (self.fields)()
    }

    pub(crate) fn build(
        &self,
        builder: &GraphBuilder<'_>,
        value: &Value,
        path: &mut FieldPath,
    ) -> MappingResult<Box<dyn Any>> {
        (self.build)(builder, value, path)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Object(TypeRef),
    ScalarList(ScalarKind),
    ObjectList(TypeRef),
    /// Sink for every wire attribute no other field claims.
    CatchAll,
}

impl FieldKind {
    pub fn element_type(&self) -> Option<TypeRef> {
        match self {
            Self::Object(ty) | Self::ObjectList(ty) => Some(*ty),
            Self::Scalar(_) | Self::ScalarList(_) | Self::CatchAll => None,
        }
    }
}

/// One declared field: its identifier, optional wire-name override, kind and
/// deprecation flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    ident: &'static str,
    wire_name: Option<&'static str>,
    kind: FieldKind,
    deprecated: bool,
}

impl FieldDescriptor {
    const fn new(ident: &'static str, kind: FieldKind) -> Self {
        Self {
            ident,
            wire_name: None,
            kind,
            deprecated: false,
        }
    }

    pub const fn scalar(ident: &'static str, kind: ScalarKind) -> Self {
        Self::new(ident, FieldKind::Scalar(kind))
    }

    pub fn object<T: Mapped>(ident: &'static str) -> Self {
        Self::new(ident, FieldKind::Object(TypeRef::of::<T>()))
    }

    pub const fn scalar_list(ident: &'static str, kind: ScalarKind) -> Self {
        Self::new(ident, FieldKind::ScalarList(kind))
    }

    pub fn object_list<T: Mapped>(ident: &'static str) -> Self {
        Self::new(ident, FieldKind::ObjectList(TypeRef::of::<T>()))
    }

    pub const fn catch_all(ident: &'static str) -> Self {
        Self::new(ident, FieldKind::CatchAll)
    }

    /// Overrides the wire name, which otherwise is the identifier verbatim.
    pub const fn wire(mut self, name: &'static str) -> Self {
        self.wire_name = Some(name);
        self
    }

    pub const fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn wire_name(&self) -> &'static str {
        self.wire_name.unwrap_or(self.ident)
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self.kind, FieldKind::CatchAll)
    }
}
