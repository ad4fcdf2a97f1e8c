//! Field Descriptor Registry: validated, cached descriptor sets per type.

use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{EnumPolicy, FieldDescriptor, FieldKind, Mapped, ScalarKind, TypeRef};
use crate::error::{MappingError, MappingResult};

/// The validated field set of one type. Immutable once built.
#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    by_wire: HashMap<&'static str, usize>,
    catch_all: Option<usize>,
}

impl TypeDescriptor {
    fn compute(ty: &TypeRef) -> MappingResult<Self> {
        let type_name = ty.name();
        let fields = ty.declared_fields();
        let fail = |message: String| MappingError::configuration(type_name, message);

        let mut by_wire = HashMap::with_capacity(fields.len());
        let mut idents = HashMap::with_capacity(fields.len());
        let mut catch_all = None;

        for (index, field) in fields.iter().enumerate() {
            if field.ident().trim().is_empty() {
                return Err(fail(format!("field #{index} has a blank identifier")));
            }
            if let Some(previous) = idents.insert(field.ident(), index) {
                return Err(fail(format!(
                    "identifier {} declared twice (fields #{previous} and #{index})",
                    field.ident()
                )));
            }

            if field.is_catch_all() {
                if let Some(previous) = catch_all.replace(index) {
                    return Err(fail(format!(
                        "more than one catch-all field ({} and {})",
                        fields[previous].ident(),
                        field.ident()
                    )));
                }
                continue;
            }

            let wire = field.wire_name();
            if wire.trim().is_empty() {
                return Err(fail(format!("field {} has a blank wire name", field.ident())));
            }
            if let Some(previous) = by_wire.insert(wire, index) {
                return Err(fail(format!(
                    "wire name {wire} is claimed by both {} and {}",
                    fields[previous].ident(),
                    field.ident()
                )));
            }
            check_enum_fallback(field).map_err(fail)?;
        }

        Ok(Self {
            type_name,
            fields,
            by_wire,
            catch_all,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order, catch-all included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_by_wire(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.by_wire.get(wire_name).map(|index| &self.fields[*index])
    }

    pub fn field_by_ident(&self, ident: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.ident() == ident)
    }

    /// Whether some non-catch-all field claims `wire_name`.
    pub fn is_known(&self, wire_name: &str) -> bool {
        self.by_wire.contains_key(wire_name)
    }

    pub fn catch_all(&self) -> Option<&FieldDescriptor> {
        self.catch_all.map(|index| &self.fields[index])
    }
}

fn check_enum_fallback(field: &FieldDescriptor) -> Result<(), String> {
    let spec = match field.kind() {
        FieldKind::Scalar(ScalarKind::Enum(spec))
        | FieldKind::ScalarList(ScalarKind::Enum(spec)) => spec,
        _ => return Ok(()),
    };
    match spec.policy {
        EnumPolicy::Fallback(fallback) if !spec.constants.contains(&fallback) => Err(format!(
            "field {}: fallback {fallback} is not one of {}",
            field.ident(),
            spec.constants.join("|")
        )),
        _ => Ok(()),
    }
}

/// Read-through cache of [`TypeDescriptor`]s keyed by type identity.
///
/// Descriptors are computed outside the map's locks. When two threads race on
/// the same type, both compute and the first insert wins; the loser's copy is
/// dropped. Failed computations are not cached, so a misdeclared type fails
/// on every use.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    cache: DashMap<TypeId, Arc<TypeDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe<T: Mapped>(&self) -> MappingResult<Arc<TypeDescriptor>> {
        self.describe_ref(&TypeRef::of::<T>())
    }

    pub fn describe_ref(&self, ty: &TypeRef) -> MappingResult<Arc<TypeDescriptor>> {
        let id = ty.id();
        if let Some(hit) = self.cache.get(&id) {
            return Ok(Arc::clone(hit.value()));
        }

        let computed = Arc::new(TypeDescriptor::compute(ty)?);
        let entry = self.cache.entry(id).or_insert_with(|| {
            log::debug!(
                "described {} ({} fields)",
                computed.type_name(),
                computed.fields().len()
            );
            Arc::clone(&computed)
        });
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{Encoder, ToWire};
    use crate::error::EncodingError;
    use crate::record::Record;
    use serde_json::Value;
    use std::thread;

    macro_rules! table_type {
        ($name:ident, [$($field:expr),* $(,)?]) => {
            struct $name;

            impl Mapped for $name {
                fn fields() -> Vec<FieldDescriptor> {
                    vec![$($field),*]
                }

                fn from_record(_record: &mut Record) -> MappingResult<Self> {
                    Ok($name)
                }

                fn field_value(&self, _ident: &str) -> Option<&dyn ToWire> {
                    None
                }
            }

            impl ToWire for $name {
                fn to_wire(&self, encoder: &mut Encoder<'_>) -> Result<Value, EncodingError> {
                    encoder.encode_object(self)
                }
            }
        };
    }

    enum Color {}

    impl crate::descriptor::WireEnum for Color {
        const CONSTANTS: &'static [&'static str] = &["RED", "GREEN"];

        fn from_wire(_value: &str) -> Option<Self> {
            None
        }

        fn as_wire(&self) -> &'static str {
            match *self {}
        }
    }

    table_type!(Page, [
        FieldDescriptor::scalar("id", ScalarKind::Text),
        FieldDescriptor::scalar("fan_count", ScalarKind::I64).wire("likes"),
        FieldDescriptor::catch_all("extra"),
    ]);
    table_type!(Ambiguous, [
        FieldDescriptor::scalar("name", ScalarKind::Text),
        FieldDescriptor::scalar("title", ScalarKind::Text).wire("name"),
    ]);
    table_type!(TwoSinks, [
        FieldDescriptor::catch_all("rest"),
        FieldDescriptor::catch_all("more"),
    ]);
    table_type!(BadFallback, [
        FieldDescriptor::scalar("color", ScalarKind::enumeration_or::<Color>("BLUE")),
    ]);

    #[test]
    fn indexes_fields_by_wire_name() {
        let registry = DescriptorRegistry::new();
        let page = registry.describe::<Page>().unwrap();

        assert_eq!(page.fields().len(), 3);
        assert_eq!(page.field_by_wire("likes").map(|f| f.ident()), Some("fan_count"));
        assert!(page.field_by_wire("fan_count").is_none());
        assert!(page.is_known("id"));
        assert!(!page.is_known("extra"));
        assert_eq!(page.catch_all().map(|f| f.ident()), Some("extra"));
    }

    #[test]
    fn caches_one_descriptor_per_type() {
        let registry = DescriptorRegistry::new();
        let first = registry.describe::<Page>().unwrap();
        let second = registry.describe::<Page>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_first_use_converges() {
        let registry = Arc::new(DescriptorRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.describe::<Page>().map(|d| Arc::as_ptr(&d) as usize))
            })
            .collect();

        let pointers: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(pointers.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_ambiguous_wire_names() {
        let registry = DescriptorRegistry::new();
        let err = registry.describe::<Ambiguous>().unwrap_err();
        assert!(matches!(err, MappingError::Configuration { .. }));
        assert!(err.to_string().contains("wire name name is claimed by both name and title"));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_second_catch_all() {
        let err = DescriptorRegistry::new().describe::<TwoSinks>().unwrap_err();
        assert!(err.to_string().contains("more than one catch-all"));
    }

    #[test]
    fn rejects_fallback_outside_constants() {
        let err = DescriptorRegistry::new().describe::<BadFallback>().unwrap_err();
        assert!(err.to_string().contains("fallback BLUE is not one of RED|GREEN"));
    }
}
