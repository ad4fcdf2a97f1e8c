//! Reverse Encoder: typed values back into JSON.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::MapperConfig;
use crate::descriptor::{Mapped, WireEnum};
use crate::error::EncodingError;
use crate::path::FieldPath;
use crate::record::Unmapped;
use crate::registry::DescriptorRegistry;

/// Wire format used when encoding timestamps; the coercer reads it back.
/// Fractional seconds are written only when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// A value that can be encoded into its JSON wire form.
pub trait ToWire {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError>;
}

/// Implements [`ToWire`] for [`Mapped`](crate::Mapped) model types
/// (`object:`) or [`WireEnum`](crate::WireEnum) enumerations (`enumeration:`).
#[macro_export]
macro_rules! impl_to_wire {
    (object: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ToWire for $ty {
                fn to_wire(
                    &self,
                    encoder: &mut $crate::Encoder<'_>,
                ) -> ::std::result::Result<$crate::Value, $crate::EncodingError> {
                    encoder.encode_object(self)
                }
            }
        )+
    };
    (enumeration: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ToWire for $ty {
                fn to_wire(
                    &self,
                    encoder: &mut $crate::Encoder<'_>,
                ) -> ::std::result::Result<$crate::Value, $crate::EncodingError> {
                    encoder.encode_enum(self)
                }
            }
        )+
    };
}

/// Walks a value graph producing JSON. Tracks the objects currently being
/// encoded so a back-reference is reported instead of recursing forever.
pub struct Encoder<'m> {
    config: &'m MapperConfig,
    registry: &'m DescriptorRegistry,
    path: FieldPath,
    active: HashSet<(TypeId, usize)>,
}

impl<'m> Encoder<'m> {
    pub(crate) fn new(config: &'m MapperConfig, registry: &'m DescriptorRegistry) -> Self {
        Self {
            config,
            registry,
            path: FieldPath::root(),
            active: HashSet::new(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn encode_object<T: Mapped>(&mut self, value: &T) -> Result<Value, EncodingError> {
        let key = (TypeId::of::<T>(), value as *const T as usize);
        if !self.active.insert(key) {
            return Err(EncodingError::Cycle {
                type_name: T::type_name(),
                path: self.path.clone(),
            });
        }
        let encoded = self.encode_fields(value);
        self.active.remove(&key);
        encoded
    }

    fn encode_fields<T: Mapped>(&mut self, value: &T) -> Result<Value, EncodingError> {
        let descriptor = self
            .registry
            .describe::<T>()
            .map_err(|err| EncodingError::Descriptor {
                type_name: T::type_name(),
                reason: err.to_string(),
            })?;

        let mut out = Map::new();
        let mut leftovers = None;
        for field in descriptor.fields() {
            let Some(field_value) = value.field_value(field.ident()) else {
                continue;
            };
            self.path.push_field(field.wire_name());
            let encoded = field_value.to_wire(self);
            self.path.pop();
            let encoded = encoded?;

            if field.is_catch_all() {
                leftovers = Some(encoded);
            } else if !(encoded.is_null() && self.config.skip_null_fields) {
                out.insert(field.wire_name().to_string(), encoded);
            }
        }

        // Catch-all attributes go back under their wire names; declared fields win.
        if let Some(Value::Object(extra)) = leftovers {
            for (wire, attr) in extra {
                if !descriptor.is_known(&wire) && !out.contains_key(&wire) {
                    out.insert(wire, attr);
                }
            }
        }
        Ok(Value::Object(out))
    }

    pub fn encode_enum<E: WireEnum>(&mut self, value: &E) -> Result<Value, EncodingError> {
        Ok(Value::String(value.as_wire().to_string()))
    }

    fn encode_seq<'a, V, I>(&mut self, items: I) -> Result<Value, EncodingError>
    where
        V: ToWire + ?Sized + 'a,
        I: IntoIterator<Item = &'a V>,
    {
        let mut out = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            self.path.push_index(index);
            let encoded = item.to_wire(self);
            self.path.pop();
            out.push(encoded?);
        }
        Ok(Value::Array(out))
    }

    fn encode_entries<'a, V, I>(&mut self, entries: I) -> Result<Value, EncodingError>
    where
        V: ToWire + ?Sized + 'a,
        I: IntoIterator<Item = (&'a String, &'a V)>,
    {
        let mut out = Map::new();
        for (key, item) in entries {
            self.path.push_field(key);
            let encoded = item.to_wire(self);
            self.path.pop();
            out.insert(key.clone(), encoded?);
        }
        Ok(Value::Object(out))
    }
}

impl ToWire for bool {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(Value::Bool(*self))
    }
}

macro_rules! integer_to_wire {
    ($($ty:ty),+) => {
        $(
            impl ToWire for $ty {
                fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
                    Ok(Value::from(*self))
                }
            }
        )+
    };
}

integer_to_wire!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToWire for f64 {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        if !self.is_finite() {
            return Err(EncodingError::unencodable(
                encoder.path(),
                format!("non-finite number {self}"),
            ));
        }
        Ok(Value::from(*self))
    }
}

impl ToWire for f32 {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        // Go through the shortest decimal form so 0.1f32 encodes as 0.1.
        let wide = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        wide.to_wire(encoder)
    }
}

impl ToWire for str {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToWire for String {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(Value::String(self.clone()))
    }
}

impl ToWire for Value {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(self.clone())
    }
}

impl ToWire for DateTime<Utc> {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(Value::String(self.format(TIMESTAMP_FORMAT).to_string()))
    }
}

impl ToWire for Unmapped {
    fn to_wire(&self, _encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        Ok(Value::Object(self.as_map().clone()))
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        match self {
            Some(value) => value.to_wire(encoder),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_seq(self.iter())
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_seq(self.iter())
    }
}

impl<T: ToWire> ToWire for VecDeque<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_seq(self.iter())
    }
}

impl<T: ToWire> ToWire for BTreeMap<String, T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_entries(self.iter())
    }
}

impl<T: ToWire, S: BuildHasher> ToWire for HashMap<String, T, S> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_entries(self.iter())
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        (**self).to_wire(encoder)
    }
}

impl<T: ToWire + ?Sized> ToWire for Box<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        (**self).to_wire(encoder)
    }
}

impl<T: ToWire + ?Sized> ToWire for Rc<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        (**self).to_wire(encoder)
    }
}

impl<T: ToWire + ?Sized> ToWire for Arc<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        (**self).to_wire(encoder)
    }
}

impl<T: ToWire> ToWire for RefCell<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        let value = self
            .try_borrow()
            .map_err(|_| EncodingError::unencodable(encoder.path(), "value is mutably borrowed"))?;
        value.to_wire(encoder)
    }
}
