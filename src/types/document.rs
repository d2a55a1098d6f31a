//! Field-typed documents
//!
//! The backend wraps every value as `{integerValue|doubleValue|stringValue|
//! arrayValue|mapValue: ...}`. The readers here never fail: missing or
//! malformed fields read as zero, an empty list or an empty map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const MONTHS_PER_YEAR: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl FieldDocument {
    pub fn from_value(value: Value) -> Self {
        match value.get("fields").and_then(Value::as_object) {
            Some(fields) => Self { fields: fields.clone() },
            None => Self::default(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn int(&self, name: &str) -> i64 {
        get_int(self.field(name))
    }

    pub fn map(&self, name: &str) -> BTreeMap<String, f64> {
        get_map(self.field(name))
    }

    pub fn array(&self, name: &str) -> Vec<f64> {
        get_array(self.field(name))
    }

    pub fn string(&self, name: &str) -> String {
        get_string(self.field(name))
    }
}

/// Numeric value of a field: `integerValue` (string or number),
/// `doubleValue`, or a plain number/numeric string.
pub fn field_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(obj) => obj
            .get("integerValue")
            .or_else(|| obj.get("doubleValue"))
            .and_then(field_number),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

pub fn get_int(field: Option<&Value>) -> i64 {
    field
        .and_then(field_number)
        .map(|v| v.trunc() as i64)
        .unwrap_or(0)
}

/// Map field as either a nested `mapValue` or a JSON-encoded `stringValue`
pub fn get_map(field: Option<&Value>) -> BTreeMap<String, f64> {
    let Some(obj) = field.and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    if let Some(fields) = obj
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(Value::as_object)
    {
        return numeric_entries(fields);
    }

    if let Some(encoded) = obj.get("stringValue").and_then(Value::as_str) {
        if let Ok(Value::Object(decoded)) = serde_json::from_str::<Value>(encoded) {
            return numeric_entries(&decoded);
        }
    }

    BTreeMap::new()
}

pub fn get_array(field: Option<&Value>) -> Vec<f64> {
    let values = match field {
        Some(Value::Array(values)) => Some(values),
        Some(Value::Object(obj)) => obj
            .get("arrayValue")
            .and_then(|a| a.get("values"))
            .and_then(Value::as_array),
        _ => None,
    };

    values
        .map(|vals| vals.iter().map(|v| field_number(v).unwrap_or(0.0)).collect())
        .unwrap_or_default()
}

pub fn get_string(field: Option<&Value>) -> String {
    match field {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("stringValue")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| obj.get("integerValue").and_then(field_number).map(|n| n.to_string()))
            .or_else(|| obj.get("doubleValue").and_then(field_number).map(|n| n.to_string()))
            .unwrap_or_default(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Pads with zeros or truncates so the series has one entry per month
pub fn normalize_monthly(values: &[f64]) -> [f64; MONTHS_PER_YEAR] {
    let mut months = [0.0; MONTHS_PER_YEAR];
    for (slot, value) in months.iter_mut().zip(values.iter()) {
        *slot = *value;
    }
    months
}

fn numeric_entries(obj: &Map<String, Value>) -> BTreeMap<String, f64> {
    obj.iter()
        .map(|(k, v)| (k.clone(), field_number(v).unwrap_or(0.0)))
        .collect()
}
