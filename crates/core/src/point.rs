use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag set of a series. Ordered so encodings are deterministic.
pub type Tags = BTreeMap<String, String>;

/// Convert fractional simulator seconds to nanoseconds.
pub fn seconds_to_nanos(seconds: f64) -> i64 {
    (seconds * 1e9).round() as i64
}

/// Field values written to the store. Trace metrics are always `Float`;
/// alert write-backs also carry text fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One time-series record. `timestamp` is always nanoseconds since the epoch
/// (simulation time for trace records).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub measurement: String,
    pub tags: Tags,
    pub timestamp: i64,
    pub fields: BTreeMap<String, FieldValue>,
}

impl MetricPoint {
    pub fn new(measurement: impl Into<String>, timestamp: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Tags::new(),
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: &Tags) -> Self {
        self.tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Shorthand for the single `value` field used by trace metrics.
    pub fn value(&self) -> Option<f64> {
        self.fields.get("value").and_then(FieldValue::as_f64)
    }
}

/// Latest value of one series (measurement + distinct tag set) as returned
/// by a last-value query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesValue {
    pub measurement: String,
    pub tags: Tags,
    pub value: f64,
}

impl SeriesValue {
    /// Identity of the series used to key per-series state.
    pub fn series_key(&self) -> String {
        let mut key = self.measurement.clone();
        for (k, v) in &self.tags {
            key.push(',');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key
    }
}
