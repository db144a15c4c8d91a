use crate::date::parse_timestamp;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// The validated top-level shape of a processing request.
///
/// Only the envelope is checked here. The per-ISIN series stay as raw JSON and
/// are validated when each instrument is computed, so a broken series is a
/// computation failure rather than a format error.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioRequest {
    /// ISIN -> array of return records, in the order the caller sent them.
    #[serde(rename = "registrosPorISIN")]
    pub records_by_isin: IndexMap<String, Value>,

    /// Normally ISIN -> portfolio weight. Echoed back untouched whatever its
    /// shape; only an absent or `null` value is replaced by `{}`.
    #[serde(rename = "pesosCartera", default = "empty_weights", deserialize_with = "null_as_empty")]
    pub weights: Value,

    /// Optional inclusive window applied to every series before computing.
    #[serde(rename = "dateRange", default)]
    pub date_range: Option<DateRange>,
}

impl PortfolioRequest {
    /// Parses and validates a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected request body.");
            CoreError::InvalidFormat
        })
    }

    /// Validates an already-parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| {
            tracing::debug!(error = %e, "Rejected request document.");
            CoreError::InvalidFormat
        })
    }
}

/// An inclusive `[start, end]` window. Either bound may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct DateRange {
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| *ts >= start) && self.end.is_none_or(|end| *ts <= end)
    }
}

fn empty_weights() -> Value {
    Value::Object(Map::new())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => empty_weights(),
        other => other,
    })
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}
