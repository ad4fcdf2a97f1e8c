//! Connection Envelope Resolver.
//!
//! The API serializes one logical listing in several shapes: a bare array, an
//! object holding only an aggregate count, or an object with an item array and
//! aggregates. [`resolve`] absorbs all of them into one [`Envelope`] so the
//! rest of the engine never has to care which one arrived.

use serde_json::{Map, Value};

use crate::config::ConnectionKeys;
use crate::descriptor::{FieldDescriptor, Mapped, ScalarKind};
use crate::encode::{Encoder, ToWire};
use crate::error::{EncodingError, MappingResult};
use crate::record::Record;
use crate::scalar;

const ITEMS: &str = "data";
const COUNT: &str = "count";
const PAGING: &str = "paging";
const SUMMARY: &str = "summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[]` or `[x, ...]`: items taken directly, no count.
    BareArray,
    /// `{"count": 3}`: aggregates only, no item array.
    AggregateOnly,
    /// `{"data": [...], "count": 1}`.
    WithItems,
    /// Anything else. Resolves to an empty envelope.
    Degraded,
}

/// Normalized listing. `items` is never absent; `total_count` is set only when
/// the wire value carried an explicit count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub items: Vec<Value>,
    pub total_count: Option<u64>,
    pub paging: Option<Value>,
    pub summary: Option<Value>,
}

impl Envelope {
    /// Canonical object form consumed by [`Connection`]'s descriptor.
    pub fn into_value(self) -> Value {
        let mut out = Map::new();
        out.insert(ITEMS.to_string(), Value::Array(self.items));
        if let Some(count) = self.total_count {
            out.insert(COUNT.to_string(), Value::from(count));
        }
        if let Some(paging) = self.paging {
            out.insert(PAGING.to_string(), paging);
        }
        if let Some(summary) = self.summary {
            out.insert(SUMMARY.to_string(), summary);
        }
        Value::Object(out)
    }
}

pub fn classify(value: &Value, keys: &ConnectionKeys) -> Shape {
    match value {
        Value::Array(_) => Shape::BareArray,
        Value::Object(map) => match map.get(&keys.items) {
            Some(Value::Array(_)) => Shape::WithItems,
            Some(_) => Shape::Degraded,
            None => Shape::AggregateOnly,
        },
        _ => Shape::Degraded,
    }
}

pub fn resolve(value: &Value, keys: &ConnectionKeys) -> Envelope {
    let shape = classify(value, keys);
    log::debug!("connection shape {shape:?}");

    match (shape, value) {
        (Shape::BareArray, Value::Array(items)) => Envelope {
            items: items.clone(),
            ..Envelope::default()
        },
        (Shape::WithItems | Shape::AggregateOnly, Value::Object(map)) => {
            let items = match map.get(&keys.items) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            let summary = map.get(&keys.summary).filter(|v| !v.is_null()).cloned();
            Envelope {
                items,
                total_count: aggregate_count(map, keys).or_else(|| {
                    summary
                        .as_ref()
                        .and_then(Value::as_object)
                        .and_then(|s| aggregate_count(s, keys))
                }),
                paging: map.get(&keys.paging).filter(|v| !v.is_null()).cloned(),
                summary,
            }
        }
        _ => {
            log::debug!("degraded connection value treated as empty: {value}");
            Envelope::default()
        }
    }
}

fn aggregate_count(map: &Map<String, Value>, keys: &ConnectionKeys) -> Option<u64> {
    keys.counts.iter().find_map(|key| {
        let value = map.get(key)?;
        let count = match value {
            Value::Number(n) => scalar::integral_u64(n),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        if count.is_none() && !value.is_null() {
            log::debug!("ignoring unusable connection count {key}: {value}");
        }
        count
    })
}

/// A typed listing of related resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection<T> {
    data: Vec<T>,
    total_count: Option<u64>,
    paging: Option<Value>,
    summary: Option<Value>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total_count: None,
            paging: None,
            summary: None,
        }
    }
}

impl<T> Connection<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Aggregate count, 0 when the wire value carried none.
    pub fn total_count(&self) -> u64 {
        self.total_count.unwrap_or(0)
    }

    pub fn explicit_total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn paging(&self) -> Option<&Value> {
        self.paging.as_ref()
    }

    pub fn summary(&self) -> Option<&Value> {
        self.summary.as_ref()
    }
}

impl<'a, T> IntoIterator for &'a Connection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: Mapped> Mapped for Connection<T> {
    fn type_name() -> &'static str {
        "Connection"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::object_list::<T>("data").wire(ITEMS),
            FieldDescriptor::scalar("total_count", ScalarKind::U64).wire(COUNT),
            FieldDescriptor::scalar("paging", ScalarKind::Json).wire(PAGING),
            FieldDescriptor::scalar("summary", ScalarKind::Json).wire(SUMMARY),
        ]
    }

    fn from_record(record: &mut Record) -> MappingResult<Self> {
        Ok(Self {
            data: record.take_objects("data")?.unwrap_or_default(),
            total_count: record.take("total_count")?,
            paging: record.take("paging")?,
            summary: record.take("summary")?,
        })
    }

    fn field_value(&self, ident: &str) -> Option<&dyn ToWire> {
        match ident {
            "data" => Some(&self.data),
            "total_count" => Some(&self.total_count),
            "paging" => Some(&self.paging),
            "summary" => Some(&self.summary),
            _ => None,
        }
    }

    fn is_connection() -> bool {
        true
    }
}

impl<T: Mapped> ToWire for Connection<T> {
    fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
        encoder.encode_object(self)
    }
}
