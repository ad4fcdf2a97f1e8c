use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;

use crate::descriptor::{Mapped, WireEnum};
use crate::error::{MappingError, MappingResult};
use crate::scalar::{FromScalar, Scalar};

/// Value collected for one field while its owner is being built.
pub(crate) enum Slot {
    Scalar(Scalar),
    Object(Box<dyn Any>),
    Scalars(Vec<Scalar>),
    Objects(Vec<Box<dyn Any>>),
    Unmapped(Map<String, Value>),
}

impl Slot {
    fn describe(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.kind_name(),
            Self::Object(_) => "object",
            Self::Scalars(_) => "scalar list",
            Self::Objects(_) => "object list",
            Self::Unmapped(_) => "unmapped attributes",
        }
    }
}

/// Field values collected for one instance, keyed by field identifier.
///
/// [`Mapped::from_record`] takes each value out with the accessor matching the
/// field's declared kind. A field absent from the payload reads as `None`.
/// Reading a field with an accessor that does not match its declared kind is a
/// configuration error of the model type.
pub struct Record {
    type_name: &'static str,
    slots: HashMap<&'static str, Slot>,
}

impl Record {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            slots: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, ident: &'static str, slot: Slot) {
        self.slots.insert(ident, slot);
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn contains(&self, ident: &str) -> bool {
        self.slots.contains_key(ident)
    }

    pub fn take<T: FromScalar>(&mut self, ident: &str) -> MappingResult<Option<T>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Scalar(scalar)) => {
                let found = scalar.kind_name();
                T::from_scalar(scalar)
                    .map(Some)
                    .map_err(|_| self.misread(ident, T::KIND.name(), found))
            }
            Some(other) => Err(self.misread(ident, T::KIND.name(), other.describe())),
        }
    }

    pub fn take_enum<E: WireEnum>(&mut self, ident: &str) -> MappingResult<Option<E>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Scalar(Scalar::Enum(constant))) => {
                self.enum_constant(ident, constant).map(Some)
            }
            Some(other) => Err(self.misread(ident, "enum", other.describe())),
        }
    }

    pub fn take_object<T: Mapped>(&mut self, ident: &str) -> MappingResult<Option<T>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Object(object)) => self.downcast(ident, object).map(Some),
            Some(other) => Err(self.misread(ident, T::type_name(), other.describe())),
        }
    }

    pub fn take_list<T: FromScalar>(&mut self, ident: &str) -> MappingResult<Option<Vec<T>>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Scalars(items)) => items
                .into_iter()
                .map(|scalar| {
                    let found = scalar.kind_name();
                    T::from_scalar(scalar).map_err(|_| self.misread(ident, T::KIND.name(), found))
                })
                .collect::<MappingResult<Vec<T>>>()
                .map(Some),
            Some(other) => Err(self.misread(ident, "scalar list", other.describe())),
        }
    }

    pub fn take_enum_list<E: WireEnum>(&mut self, ident: &str) -> MappingResult<Option<Vec<E>>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Scalars(items)) => items
                .into_iter()
                .map(|scalar| match scalar {
                    Scalar::Enum(constant) => self.enum_constant(ident, constant),
                    other => Err(self.misread(ident, "enum", other.kind_name())),
                })
                .collect::<MappingResult<Vec<E>>>()
                .map(Some),
            Some(other) => Err(self.misread(ident, "enum list", other.describe())),
        }
    }

    pub fn take_objects<T: Mapped>(&mut self, ident: &str) -> MappingResult<Option<Vec<T>>> {
        match self.slots.remove(ident) {
            None => Ok(None),
            Some(Slot::Objects(items)) => items
                .into_iter()
                .map(|object| self.downcast(ident, object))
                .collect::<MappingResult<Vec<T>>>()
                .map(Some),
            Some(other) => Err(self.misread(ident, "object list", other.describe())),
        }
    }

    /// Attributes captured by the catch-all field; empty when nothing was left over.
    pub fn take_unmapped(&mut self, ident: &str) -> MappingResult<Unmapped> {
        match self.slots.remove(ident) {
            None => Ok(Unmapped::default()),
            Some(Slot::Unmapped(map)) => Ok(Unmapped(map)),
            Some(other) => Err(self.misread(ident, "unmapped attributes", other.describe())),
        }
    }

    fn enum_constant<E: WireEnum>(&self, ident: &str, constant: &str) -> MappingResult<E> {
        E::from_wire(constant).ok_or_else(|| {
            MappingError::configuration(
                self.type_name,
                format!("field {ident}: enum constant {constant} has no matching variant"),
            )
        })
    }

    fn downcast<T: Mapped>(&self, ident: &str, object: Box<dyn Any>) -> MappingResult<T> {
        object.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            MappingError::configuration(
                self.type_name,
                format!("field {ident} was not declared as {}", T::type_name()),
            )
        })
    }

    fn misread(&self, ident: &str, wanted: &str, found: &str) -> MappingError {
        MappingError::configuration(
            self.type_name,
            format!("field {ident} read as {wanted} but holds {found}"),
        )
    }
}

/// Wire attributes a type does not model, keyed by their original wire name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unmapped(Map<String, Value>);

impl Unmapped {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    pub fn get(&self, wire_name: &str) -> Option<&Value> {
        self.0.get(wire_name)
    }

    pub fn contains(&self, wire_name: &str) -> bool {
        self.0.contains_key(wire_name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
