use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{MappingError, MappingResult};

pub const ENV_LENIENCY: &str = "GRAPHBIND_LENIENCY";
pub const ENV_SKIP_NULLS: &str = "GRAPHBIND_SKIP_NULLS";
pub const ENV_RAW_JSON: &str = "GRAPHBIND_RAW_JSON";

/// Whether scalar coercion accepts the API's compatibility spellings
/// (quoted numbers, `0`/`1` booleans) or only natively typed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leniency {
    #[default]
    Lenient,
    Strict,
}

impl Leniency {
    pub fn parse(value: &str) -> MappingResult<Self> {
        match value {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(MappingError::configuration(
                ENV_LENIENCY,
                format!("invalid leniency {other} (expected: lenient|strict)"),
            )),
        }
    }

    pub fn is_lenient(self) -> bool {
        matches!(self, Self::Lenient)
    }
}

/// One accepted spelling of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Rfc3339,
    /// chrono pattern carrying an explicit offset (`%z`).
    Zoned(&'static str),
    /// chrono pattern with date and time but no offset; read as UTC.
    Naive(&'static str),
    /// chrono pattern with a date only; midnight UTC.
    Date(&'static str),
    /// `2012-06`, first day of the month.
    YearMonth,
    /// `2012`, first day of the year.
    Year,
}

impl DateFormat {
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            Self::Rfc3339 => DateTime::parse_from_rfc3339(raw).ok().map(to_utc),
            Self::Zoned(pattern) => DateTime::parse_from_str(raw, pattern).ok().map(to_utc),
            Self::Naive(pattern) => NaiveDateTime::parse_from_str(raw, pattern)
                .ok()
                .map(|dt| dt.and_utc()),
            Self::Date(pattern) => NaiveDate::parse_from_str(raw, pattern)
                .ok()
                .and_then(start_of_day),
            Self::YearMonth => {
                if raw.len() != 7 {
                    return None;
                }
                NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
                    .ok()
                    .and_then(start_of_day)
            }
            Self::Year => {
                if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let year = raw.parse::<i32>().ok()?;
                NaiveDate::from_ymd_opt(year, 1, 1).and_then(start_of_day)
            }
        }
    }
}

fn to_utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

pub fn default_date_formats() -> Vec<DateFormat> {
    vec![
        DateFormat::Rfc3339,
        DateFormat::Zoned("%Y-%m-%dT%H:%M:%S%.f%z"),
        DateFormat::Naive("%Y-%m-%dT%H:%M:%S"),
        DateFormat::Naive("%Y-%m-%dT%H:%M"),
        DateFormat::Naive("%m/%d/%Y %H:%M:%S"),
        DateFormat::Date("%m/%d/%Y"),
        DateFormat::Date("%Y-%m-%d"),
        DateFormat::YearMonth,
        DateFormat::Year,
    ]
}

/// Conventional keys of the API's listing envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionKeys {
    pub items: String,
    pub counts: Vec<String>,
    pub summary: String,
    pub paging: String,
}

impl Default for ConnectionKeys {
    fn default() -> Self {
        Self {
            items: "data".to_string(),
            counts: vec!["count".to_string(), "total_count".to_string()],
            summary: "summary".to_string(),
            paging: "paging".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub leniency: Leniency,
    #[serde(skip, default = "default_date_formats")]
    pub date_formats: Vec<DateFormat>,
    pub connection_keys: ConnectionKeys,
    pub skip_null_fields: bool,
    pub raw_json_passthrough: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            leniency: Leniency::default(),
            date_formats: default_date_formats(),
            connection_keys: ConnectionKeys::default(),
            skip_null_fields: true,
            raw_json_passthrough: false,
        }
    }
}

impl MapperConfig {
    pub fn from_env() -> MappingResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns
    /// for the `GRAPHBIND_*` keys.
    pub fn from_lookup<F>(lookup: F) -> MappingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let leniency = lookup(ENV_LENIENCY)
            .map(|v| Leniency::parse(v.trim()))
            .transpose()?
            .unwrap_or(defaults.leniency);

        let skip_null_fields = lookup(ENV_SKIP_NULLS)
            .map(|v| parse_flag(ENV_SKIP_NULLS, &v))
            .transpose()?
            .unwrap_or(defaults.skip_null_fields);

        let raw_json_passthrough = lookup(ENV_RAW_JSON)
            .map(|v| parse_flag(ENV_RAW_JSON, &v))
            .transpose()?
            .unwrap_or(defaults.raw_json_passthrough);

        Ok(Self {
            leniency,
            skip_null_fields,
            raw_json_passthrough,
            ..defaults
        })
    }
}

fn parse_flag(key: &str, value: &str) -> MappingResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(MappingError::configuration(
            key,
            format!("invalid flag {other} (expected: true|false)"),
        )),
    }
}
