//! Error taxonomy for the mapping engine.
//!
//! Inbound failures are [`MappingError`], outbound failures are
//! [`EncodingError`], and [`ParameterError`] covers argument validation when a
//! request parameter is constructed.

use serde_json::Value;
use thiserror::Error;

use crate::path::FieldPath;

pub type MappingResult<T> = Result<T, MappingError>;

#[derive(Error, Debug)]
pub enum MappingError {
    /// A model type's descriptor table is ambiguous or unusable. Raised on
    /// first use of the type and on every use after that.
    #[error("mapping configuration error for {subject}: {message}")]
    Configuration { subject: String, message: String },

    #[error("cannot coerce {raw} to {target} at {path}")]
    Coercion {
        path: FieldPath,
        raw: Value,
        target: &'static str,
        reason: Option<String>,
    },

    #[error("expected {expected} at {path}, found {found}")]
    Structure {
        path: FieldPath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl MappingError {
    pub fn configuration(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn coercion(path: &FieldPath, raw: &Value, target: &'static str) -> Self {
        Self::Coercion {
            path: path.clone(),
            raw: raw.clone(),
            target,
            reason: None,
        }
    }

    pub fn coercion_with_reason(
        path: &FieldPath,
        raw: &Value,
        target: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Coercion {
            path: path.clone(),
            raw: raw.clone(),
            target,
            reason: Some(reason.into()),
        }
    }

    pub fn structure(path: &FieldPath, expected: &'static str, found: &Value) -> Self {
        Self::Structure {
            path: path.clone(),
            expected,
            found: json_kind(found),
        }
    }

    /// Path of the offending value, when the error concerns one.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Coercion { path, .. } | Self::Structure { path, .. } => Some(path),
            Self::Configuration { .. } | Self::Syntax(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("cyclic reference to {type_name} at {path}")]
    Cycle {
        type_name: &'static str,
        path: FieldPath,
    },

    #[error("cannot encode value at {path}: {reason}")]
    Unencodable { path: FieldPath, reason: String },

    #[error("no usable field descriptors for {type_name}: {reason}")]
    Descriptor {
        type_name: &'static str,
        reason: String,
    },
}

impl EncodingError {
    pub fn unencodable(path: &FieldPath, reason: impl Into<String>) -> Self {
        Self::Unencodable {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("parameter name must not be blank")]
    BlankName,

    #[error("parameter '{name}' must have a non-null value")]
    NullValue { name: String },

    #[error("cannot encode parameter '{name}': {source}")]
    Encoding {
        name: String,
        #[source]
        source: EncodingError,
    },
}

/// Short name of a JSON value's shape, used in structural error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_message_names_field_and_target() {
        let mut path = FieldPath::root();
        path.push_field("interval");
        let err = MappingError::coercion(&path, &json!("soon"), "i32");
        assert_eq!(err.to_string(), "cannot coerce \"soon\" to i32 at $.interval");
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("$.interval"));
    }

    #[test]
    fn structure_message_names_found_shape() {
        let err = MappingError::structure(&FieldPath::root(), "object", &json!([1]));
        assert_eq!(err.to_string(), "expected object at $, found array");
    }
}
