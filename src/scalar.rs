//! Scalar coercion: raw JSON scalars into the primitive a field declares.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use crate::config::MapperConfig;
use crate::descriptor::{EnumPolicy, EnumSpec, ScalarKind};
use crate::error::{MappingError, MappingResult};
use crate::path::FieldPath;

/// A coerced scalar, tagged with the kind it was coerced to.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Enum(&'static str),
    Json(Value),
}

impl Scalar {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Enum(_) => "enum",
            Self::Json(_) => "json",
        }
    }
}

/// Rust types a coerced [`Scalar`] can be read back into.
pub trait FromScalar: Sized {
    /// Kind used when the type is the target of a top-level coercion.
    const KIND: ScalarKind;

    /// Returns the scalar back when it holds an incompatible kind.
    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar>;
}

impl FromScalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for i32 {
    const KIND: ScalarKind = ScalarKind::I32;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::I32(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for i64 {
    const KIND: ScalarKind = ScalarKind::I64;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::I64(v) => Ok(v),
            Scalar::I32(v) => Ok(i64::from(v)),
            Scalar::U32(v) => Ok(i64::from(v)),
            other => Err(other),
        }
    }
}

impl FromScalar for u32 {
    const KIND: ScalarKind = ScalarKind::U32;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::U32(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for u64 {
    const KIND: ScalarKind = ScalarKind::U64;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::U64(v) => Ok(v),
            Scalar::U32(v) => Ok(u64::from(v)),
            other => Err(other),
        }
    }
}

impl FromScalar for f32 {
    const KIND: ScalarKind = ScalarKind::F32;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::F32(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for f64 {
    const KIND: ScalarKind = ScalarKind::F64;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::F64(v) => Ok(v),
            Scalar::F32(v) => Ok(f64::from(v)),
            Scalar::I32(v) => Ok(f64::from(v)),
            Scalar::U32(v) => Ok(f64::from(v)),
            other => Err(other),
        }
    }
}

impl FromScalar for String {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::Text(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::Timestamp;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::Timestamp(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromScalar for Value {
    const KIND: ScalarKind = ScalarKind::Json;

    fn from_scalar(scalar: Scalar) -> Result<Self, Scalar> {
        match scalar {
            Scalar::Json(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Coerces `value` to `kind`.
///
/// JSON `null` always yields `Ok(None)`: an explicit null is "unset", never a
/// zero value. Every other failure is a [`MappingError::Coercion`] carrying
/// `path`, the raw value and the target kind.
pub fn coerce(
    value: &Value,
    kind: &ScalarKind,
    config: &MapperConfig,
    path: &FieldPath,
) -> MappingResult<Option<Scalar>> {
    if value.is_null() {
        return Ok(None);
    }
    let lenient = config.leniency.is_lenient();
    let target = kind.name();

    let scalar = match kind {
        ScalarKind::Bool => Scalar::Bool(
            coerce_bool(value, lenient).ok_or_else(|| MappingError::coercion(path, value, target))?,
        ),
        ScalarKind::I32 => Scalar::I32(coerce_integer(value, lenient, path, target)?),
        ScalarKind::I64 => Scalar::I64(coerce_integer(value, lenient, path, target)?),
        ScalarKind::U32 => Scalar::U32(coerce_integer(value, lenient, path, target)?),
        ScalarKind::U64 => Scalar::U64(coerce_integer(value, lenient, path, target)?),
        ScalarKind::F32 => {
            let wide = coerce_float(value, lenient, path, target)?;
            if wide.abs() > f64::from(f32::MAX) {
                return Err(MappingError::coercion_with_reason(path, value, target, "out of range"));
            }
            Scalar::F32(wide as f32)
        }
        ScalarKind::F64 => Scalar::F64(coerce_float(value, lenient, path, target)?),
        ScalarKind::Text => Scalar::Text(coerce_text(value)),
        ScalarKind::Timestamp => Scalar::Timestamp(coerce_timestamp(value, config, path)?),
        ScalarKind::Enum(spec) => Scalar::Enum(coerce_enum(value, spec, path)?),
        ScalarKind::Json => Scalar::Json(value.clone()),
    };
    Ok(Some(scalar))
}

fn coerce_bool(value: &Value, lenient: bool) -> Option<bool> {
    match value {
        Value::Bool(v) => Some(*v),
        Value::Number(n) if lenient => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) if lenient => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Wide {
    Signed(i64),
    Unsigned(u64),
}

fn number_to_wide(n: &Number) -> Option<Wide> {
    if let Some(v) = n.as_i64() {
        return Some(Wide::Signed(v));
    }
    if let Some(v) = n.as_u64() {
        return Some(Wide::Unsigned(v));
    }
    // Integral floats such as `5.0`.
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Some(Wide::Signed(f as i64));
    }
    None
}

/// Non-negative integer value of `n`, accepting integral floats like `3.0`.
pub(crate) fn integral_u64(n: &Number) -> Option<u64> {
    match number_to_wide(n)? {
        Wide::Signed(v) => u64::try_from(v).ok(),
        Wide::Unsigned(v) => Some(v),
    }
}

fn parse_wide(raw: &str) -> Option<Wide> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(Wide::Signed(v));
    }
    raw.parse::<u64>().ok().map(Wide::Unsigned)
}

fn coerce_integer<T>(
    value: &Value,
    lenient: bool,
    path: &FieldPath,
    target: &'static str,
) -> MappingResult<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let wide = match value {
        Value::Number(n) => number_to_wide(n),
        Value::String(s) if lenient => parse_wide(s.trim()),
        _ => None,
    }
    .ok_or_else(|| MappingError::coercion_with_reason(path, value, target, "not an integer"))?;

    let narrowed = match wide {
        Wide::Signed(v) => T::try_from(v).ok(),
        Wide::Unsigned(v) => T::try_from(v).ok(),
    };
    narrowed.ok_or_else(|| MappingError::coercion_with_reason(path, value, target, "out of range"))
}

fn coerce_float(
    value: &Value,
    lenient: bool,
    path: &FieldPath,
    target: &'static str,
) -> MappingResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if lenient => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(MappingError::coercion_with_reason(path, value, target, "not a finite number")),
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Numbers, booleans and structured values render as compact JSON.
        other => other.to_string(),
    }
}

fn coerce_timestamp(
    value: &Value,
    config: &MapperConfig,
    path: &FieldPath,
) -> MappingResult<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let raw = s.trim();
            config
                .date_formats
                .iter()
                .find_map(|format| format.parse(raw))
                .ok_or_else(|| {
                    MappingError::coercion_with_reason(
                        path,
                        value,
                        "timestamp",
                        "no accepted format matched",
                    )
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| {
                MappingError::coercion_with_reason(path, value, "timestamp", "invalid unix seconds")
            }),
        _ => Err(MappingError::coercion(path, value, "timestamp")),
    }
}

fn coerce_enum(value: &Value, spec: &EnumSpec, path: &FieldPath) -> MappingResult<&'static str> {
    let Value::String(raw) = value else {
        return Err(MappingError::coercion(path, value, "enum"));
    };
    if let Some(constant) = spec.constants.iter().find(|c| **c == raw.as_str()) {
        return Ok(*constant);
    }
    match spec.policy {
        EnumPolicy::Fallback(fallback) => {
            log::debug!("unknown enum constant {raw} at {path}, using {fallback}");
            Ok(fallback)
        }
        EnumPolicy::Strict => Err(MappingError::coercion_with_reason(
            path,
            value,
            "enum",
            format!("expected one of {}", spec.constants.join("|")),
        )),
    }
}
