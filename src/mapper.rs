use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

use crate::builder::GraphBuilder;
use crate::config::MapperConfig;
use crate::connection::{self, Envelope};
use crate::descriptor::Mapped;
use crate::encode::{Encoder, ToWire};
use crate::error::{EncodingError, MappingError, MappingResult};
use crate::list;
use crate::path::FieldPath;
use crate::registry::{DescriptorRegistry, TypeDescriptor};
use crate::scalar::{self, FromScalar};

static GLOBAL: Lazy<JsonMapper> = Lazy::new(JsonMapper::new);

/// Entry point of the engine: parses JSON into mapped types and encodes
/// values back into JSON text.
///
/// A mapper owns its configuration and a descriptor registry. Mappers are
/// `Sync`; share one across threads or give several mappers the same registry
/// with [`JsonMapper::with_registry`].
#[derive(Debug, Default)]
pub struct JsonMapper {
    config: MapperConfig,
    registry: Arc<DescriptorRegistry>,
}

impl JsonMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            registry: Arc::default(),
        }
    }

    pub fn with_registry(config: MapperConfig, registry: Arc<DescriptorRegistry>) -> Self {
        Self { config, registry }
    }

    /// Process-wide mapper with default configuration.
    pub fn global() -> &'static JsonMapper {
        &GLOBAL
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    pub fn describe<T: Mapped>(&self) -> MappingResult<Arc<TypeDescriptor>> {
        self.registry.describe::<T>()
    }

    pub fn parse(&self, json: &str) -> MappingResult<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json<T: Mapped>(&self, json: &str) -> MappingResult<T> {
        self.from_value(&self.parse(json)?)
    }

    pub fn from_value<T: Mapped>(&self, value: &Value) -> MappingResult<T> {
        self.builder().build(value, &mut FieldPath::root())
    }

    pub fn list_from_json<T: Mapped>(&self, json: &str) -> MappingResult<Vec<T>> {
        self.list_from_value(&self.parse(json)?)
    }

    pub fn list_from_value<T: Mapped>(&self, value: &Value) -> MappingResult<Vec<T>> {
        list::map_list(&self.builder(), value, &mut FieldPath::root())
    }

    pub fn scalar_from_value<T: FromScalar>(&self, value: &Value) -> MappingResult<Option<T>> {
        let path = FieldPath::root();
        match scalar::coerce(value, &T::KIND, &self.config, &path)? {
            None => Ok(None),
            Some(scalar) => T::from_scalar(scalar)
                .map(Some)
                .map_err(|_| MappingError::coercion(&path, value, T::KIND.name())),
        }
    }

    pub fn scalars_from_json<T: FromScalar>(&self, json: &str) -> MappingResult<Vec<T>> {
        self.scalars_from_value(&self.parse(json)?)
    }

    pub fn scalars_from_value<T: FromScalar>(&self, value: &Value) -> MappingResult<Vec<T>> {
        let mut path = FieldPath::root();
        list::map_scalars(&self.builder(), value, &T::KIND, &mut path)?
            .into_iter()
            .map(|scalar| {
                T::from_scalar(scalar)
                    .map_err(|s| MappingError::configuration(s.kind_name(), "scalar kind mismatch"))
            })
            .collect()
    }

    pub fn resolve_connection(&self, value: &Value) -> Envelope {
        connection::resolve(value, &self.config.connection_keys)
    }

    pub fn to_value<V: ToWire + ?Sized>(&self, value: &V) -> Result<Value, EncodingError> {
        value.to_wire(&mut Encoder::new(&self.config, &self.registry))
    }

    /// Encodes `value` as JSON text. `nested` is false only for the outermost
    /// call, where a string that already holds a JSON object or array is kept
    /// verbatim if `raw_json_passthrough` is enabled.
    pub fn to_json<V: ToWire + ?Sized>(
        &self,
        value: &V,
        nested: bool,
    ) -> Result<String, EncodingError> {
        Ok(self.render(self.to_value(value)?, nested))
    }

    pub(crate) fn render(&self, encoded: Value, nested: bool) -> String {
        if !nested && self.config.raw_json_passthrough {
            if let Value::String(text) = &encoded {
                if looks_like_json(text) {
                    log::debug!("passing pre-encoded JSON through verbatim");
                    return text.clone();
                }
            }
        }
        encoded.to_string()
    }

    fn builder(&self) -> GraphBuilder<'_> {
        GraphBuilder::new(&self.config, &self.registry)
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    matches!(
        serde_json::from_str::<Value>(text),
        Ok(Value::Object(_) | Value::Array(_))
    )
}
