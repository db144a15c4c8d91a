use crate::date::parse_timestamp;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DATE_FIELD: &str = "date";
pub const VALUE_FIELD: &str = "valueNumerico";

/// A single periodic return observation for one instrument.
///
/// Only `date` and `valueNumerico` carry meaning here. The record is stored as
/// the raw JSON object it arrived as, so every other field (display strings,
/// the instrument id, ...) is echoed back byte-for-byte in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnRecord {
    fields: Map<String, Value>,
}

impl ReturnRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The observation timestamp, normalised to UTC.
    pub fn timestamp(&self, isin: &str) -> Result<DateTime<Utc>, CoreError> {
        match self.fields.get(DATE_FIELD) {
            Some(Value::String(raw)) => {
                parse_timestamp(raw).map_err(|e| CoreError::malformed(isin, e.to_string()))
            }
            Some(other) => Err(CoreError::malformed(
                isin,
                format!("'{DATE_FIELD}' must be a string, got {other}"),
            )),
            None => Err(CoreError::malformed(
                isin,
                format!("missing '{DATE_FIELD}' field"),
            )),
        }
    }

    /// The percentage return of this observation (`1.5` means +1.5%).
    pub fn value(&self, isin: &str) -> Result<f64, CoreError> {
        match self.fields.get(VALUE_FIELD) {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                CoreError::malformed(isin, format!("'{VALUE_FIELD}' is not representable as f64"))
            }),
            Some(other) => Err(CoreError::malformed(
                isin,
                format!("'{VALUE_FIELD}' must be a number, got {other}"),
            )),
            None => Err(CoreError::malformed(
                isin,
                format!("missing '{VALUE_FIELD}' field"),
            )),
        }
    }
}

/// Converts the raw JSON series of one ISIN into records.
///
/// `null` counts as an empty series. Anything other than an array of objects
/// is a malformed series.
pub fn parse_series(isin: &str, raw: &Value) -> Result<Vec<ReturnRecord>, CoreError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(fields) => Ok(ReturnRecord::new(fields.clone())),
                other => Err(CoreError::malformed(
                    isin,
                    format!("record #{idx} is not an object: {other}"),
                )),
            })
            .collect(),
        other => Err(CoreError::malformed(
            isin,
            format!("series must be an array of records, got {other}"),
        )),
    }
}
