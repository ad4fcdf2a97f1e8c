use std::fmt;

use crate::encode::ToWire;
use crate::error::ParameterError;
use crate::mapper::JsonMapper;

/// A validated request parameter: a trimmed, non-blank name and a value that is
/// always JSON text, so plain strings arrive quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    value: String,
}

impl Parameter {
    /// Encodes `value` with the process-wide mapper.
    pub fn with<V: ToWire + ?Sized>(name: &str, value: &V) -> Result<Self, ParameterError> {
        Self::with_mapper(name, value, JsonMapper::global())
    }

    pub fn with_mapper<V: ToWire + ?Sized>(
        name: &str,
        value: &V,
        mapper: &JsonMapper,
    ) -> Result<Self, ParameterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParameterError::BlankName);
        }

        let encoded = mapper
            .to_value(value)
            .map_err(|source| ParameterError::Encoding {
                name: name.to_string(),
                source,
            })?;
        if encoded.is_null() {
            return Err(ParameterError::NullValue {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            value: mapper.render(encoded, false),
        })
    }

    /// Comma-separated list of fields to fetch.
    pub fn with_fields(fields: &str) -> Result<Self, ParameterError> {
        Self::with("fields", fields)
    }

    pub fn with_metadata() -> Result<Self, ParameterError> {
        Self::with("metadata", "1")
    }

    /// `language` is the bare language code, e.g. `de`.
    pub fn with_locale(language: &str) -> Result<Self, ParameterError> {
        Self::with("locale", language)
    }

    pub fn with_limit(limit: u32) -> Result<Self, ParameterError> {
        Self::with("limit", &limit)
    }

    pub fn with_message<V: ToWire + ?Sized>(message: &V) -> Result<Self, ParameterError> {
        Self::with("message", message)
    }

    pub fn with_query(query: &str) -> Result<Self, ParameterError> {
        Self::with("q", query)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// JSON text of the value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_pair(self) -> (String, String) {
        (self.name, self.value)
    }

    /// Renders parameters as an `application/x-www-form-urlencoded` body.
    pub fn to_form(parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(|p| {
                format!(
                    "{}={}",
                    urlencoding::encode(&p.name),
                    urlencoding::encode(&p.value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter[{}={}]", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    #[test]
    fn strings_are_json_encoded() {
        let param = Parameter::with("message", "hello").unwrap();
        assert_eq!(param.value(), r#""hello""#);
        assert_eq!(param.to_string(), r#"Parameter[message="hello"]"#);
    }

    #[test]
    fn names_are_trimmed() {
        let param = Parameter::with("  limit ", &5).unwrap();
        assert_eq!(param.into_pair(), ("limit".to_string(), "5".to_string()));
    }

    #[test]
    fn blank_names_are_rejected() {
        for name in ["", "   ", "\t"] {
            assert!(matches!(
                Parameter::with(name, "x"),
                Err(ParameterError::BlankName)
            ));
        }
    }

    #[test]
    fn null_values_are_rejected() {
        let err = Parameter::with("message", &None::<String>).unwrap_err();
        assert!(matches!(err, ParameterError::NullValue { ref name } if name == "message"));
        assert!(Parameter::with("message", &Value::Null).is_err());
    }

    #[test]
    fn unencodable_values_are_rejected() {
        let err = Parameter::with("ratio", &f64::INFINITY).unwrap_err();
        assert!(matches!(err, ParameterError::Encoding { .. }));
    }

    #[test]
    fn collections_become_json_text() {
        let mut attachment = BTreeMap::new();
        attachment.insert("name".to_string(), json!("photo"));
        attachment.insert("tags".to_string(), json!(["a", "b"]));
        let param = Parameter::with("attachment", &attachment).unwrap();
        assert_eq!(param.value(), r#"{"name":"photo","tags":["a","b"]}"#);
    }

    #[test]
    fn convenience_factories() {
        assert_eq!(Parameter::with_fields("id,name").unwrap().value(), r#""id,name""#);
        assert_eq!(Parameter::with_limit(25).unwrap().value(), "25");
        assert_eq!(Parameter::with_metadata().unwrap().value(), r#""1""#);
        assert_eq!(Parameter::with_query("coffee").unwrap().name(), "q");
        assert_eq!(Parameter::with_locale("de").unwrap().name(), "locale");
        assert_eq!(
            Parameter::with_message("hi").unwrap(),
            Parameter::with("message", "hi").unwrap()
        );
    }

    #[test]
    fn custom_mapper_can_pass_json_strings_through() {
        let mapper = JsonMapper::with_config(MapperConfig {
            raw_json_passthrough: true,
            ..MapperConfig::default()
        });
        let param = Parameter::with_mapper("targeting", r#"{"geo":"DE"}"#, &mapper).unwrap();
        assert_eq!(param.value(), r#"{"geo":"DE"}"#);
    }

    #[test]
    fn form_encoding_escapes_json() {
        let params = [
            Parameter::with_limit(10).unwrap(),
            Parameter::with_fields("id,name").unwrap(),
        ];
        assert_eq!(
            Parameter::to_form(&params),
            "limit=10&fields=%22id%2Cname%22"
        );
    }
}
