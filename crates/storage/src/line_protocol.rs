//! InfluxDB line protocol encoding.

use simwatch_core::{FieldValue, MetricPoint};

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn encode_field_value(v: &FieldValue) -> Option<String> {
    match v {
        FieldValue::Float(f) if f.is_finite() => Some(format!("{f:?}")),
        FieldValue::Float(_) => None,
        FieldValue::Text(s) => Some(format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))),
    }
}

/// Encode one point as a line-protocol record.
///
/// Empty tag values and non-finite floats are not representable and are
/// dropped. Returns `None` when no field survives.
pub fn encode_line(point: &MetricPoint) -> Option<String> {
    let fields: Vec<String> = point
        .fields
        .iter()
        .filter_map(|(k, v)| encode_field_value(v).map(|ev| format!("{}={}", escape_key(k), ev)))
        .collect();
    if fields.is_empty() {
        return None;
    }

    let mut line = escape_measurement(&point.measurement);
    for (k, v) in point.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        line.push_str(&escape_key(k));
        line.push('=');
        line.push_str(&escape_key(v));
    }
    line.push(' ');
    line.push_str(&fields.join(","));
    line.push(' ');
    line.push_str(&point.timestamp.to_string());
    Some(line)
}
