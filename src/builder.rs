//! Object Graph Builder.
//!
//! Walks a type's descriptor set against a JSON object, dispatching each
//! present field on its declared kind and collecting the results into a
//! [`Record`] that the type then assembles itself from. Fields never read each
//! other's values during the walk, so the order is free.

use serde_json::{Map, Value};
use std::any::Any;

use crate::config::MapperConfig;
use crate::connection;
use crate::descriptor::{FieldDescriptor, FieldKind, Mapped, TypeRef};
use crate::error::{MappingError, MappingResult};
use crate::list;
use crate::path::FieldPath;
use crate::record::{Record, Slot};
use crate::registry::{DescriptorRegistry, TypeDescriptor};
use crate::scalar;

pub(crate) struct GraphBuilder<'m> {
    pub(crate) config: &'m MapperConfig,
    pub(crate) registry: &'m DescriptorRegistry,
}

impl<'m> GraphBuilder<'m> {
    pub(crate) fn new(config: &'m MapperConfig, registry: &'m DescriptorRegistry) -> Self {
        Self { config, registry }
    }

    pub(crate) fn build<T: Mapped>(&self, value: &Value, path: &mut FieldPath) -> MappingResult<T> {
        let mut record = self.collect(&TypeRef::of::<T>(), value, path)?;
        T::from_record(&mut record)
    }

    fn collect(&self, ty: &TypeRef, value: &Value, path: &mut FieldPath) -> MappingResult<Record> {
        let descriptor = self.registry.describe_ref(ty)?;

        let normalized;
        let value = if ty.is_connection() {
            normalized = connection::resolve(value, &self.config.connection_keys).into_value();
            &normalized
        } else {
            value
        };

        let Value::Object(object) = value else {
            return Err(MappingError::structure(path, "object", value));
        };

        let mut record = Record::new(descriptor.type_name());
        for field in descriptor.fields() {
            if field.is_catch_all() {
                continue;
            }
            let Some(raw) = object.get(field.wire_name()) else {
                continue;
            };
            path.push_field(field.wire_name());
            let slot = self.map_field(field, raw, path);
            path.pop();
            if let Some(slot) = slot? {
                record.insert(field.ident(), slot);
            }
        }

        self.capture_unmapped(&descriptor, object, &mut record);
        Ok(record)
    }

    fn map_field(
        &self,
        field: &FieldDescriptor,
        raw: &Value,
        path: &mut FieldPath,
    ) -> MappingResult<Option<Slot>> {
        if raw.is_null() {
            return Ok(None);
        }
        if field.is_deprecated() {
            log::debug!("reading deprecated field at {path}");
        }

        match field.kind() {
            FieldKind::Scalar(kind) => {
                Ok(scalar::coerce(raw, kind, self.config, path)?.map(Slot::Scalar))
            }
            FieldKind::Object(ty) => self.build_nested(ty, raw, path),
            FieldKind::ScalarList(kind) => {
                list::map_scalars(self, raw, kind, path).map(|items| Some(Slot::Scalars(items)))
            }
            FieldKind::ObjectList(ty) => {
                list::map_objects(self, raw, ty, path).map(|items| Some(Slot::Objects(items)))
            }
            FieldKind::CatchAll => Ok(None),
        }
    }

    fn build_nested(
        &self,
        ty: &TypeRef,
        raw: &Value,
        path: &mut FieldPath,
    ) -> MappingResult<Option<Slot>> {
        // The API sends `[]` where it means an empty object.
        if !ty.is_connection() && matches!(raw, Value::Array(items) if items.is_empty()) {
            log::debug!("empty array for {} at {path}, leaving unset", ty.name());
            return Ok(None);
        }
        ty.build(self, raw, path).map(|object| Some(Slot::Object(object)))
    }

    fn capture_unmapped(
        &self,
        descriptor: &TypeDescriptor,
        object: &Map<String, Value>,
        record: &mut Record,
    ) {
        let unmapped: Map<String, Value> = object
            .iter()
            .filter(|(wire, _)| !descriptor.is_known(wire))
            .map(|(wire, value)| (wire.clone(), value.clone()))
            .collect();

        match descriptor.catch_all() {
            Some(sink) => {
                if !unmapped.is_empty() {
                    log::debug!(
                        "captured {} unmapped attribute(s) on {}",
                        unmapped.len(),
                        descriptor.type_name()
                    );
                }
                record.insert(sink.ident(), Slot::Unmapped(unmapped));
            }
            None if !unmapped.is_empty() => {
                let names: Vec<&str> = unmapped.keys().map(String::as_str).collect();
                log::debug!(
                    "ignoring unmapped attribute(s) [{}] on {}",
                    names.join(", "),
                    descriptor.type_name()
                );
            }
            None => {}
        }
    }
}

pub(crate) fn build_erased<T: Mapped>(
    builder: &GraphBuilder<'_>,
    value: &Value,
    path: &mut FieldPath,
) -> MappingResult<Box<dyn Any>> {
    builder
        .build::<T>(value, path)
        .map(|object| Box::new(object) as Box<dyn Any>)
}
