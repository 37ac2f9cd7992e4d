use serde_json::{Map, Value};

use crate::input::InputError;
use crate::input::coerce::{float_from_str, int_from_str, truncate_to_i64};
use crate::model::features::{
    DocumentType, FEATURE_COLUMNS, FeatureVector, IDX_AGE_VALID, IDX_DOCUMENT_TYPE, IDX_LIVENESS,
    IDX_OCR_MATCH, IDX_SIMILARITY,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationRecord {
    pub similarity_score: f64,
    pub liveness: i64,
    pub document_type: DocumentType,
    pub ocr_match: i64,
    pub age_valid: i64,
}

impl VerificationRecord {
    /// Record scored when the caller supplies none.
    pub fn example() -> Self {
        Self {
            similarity_score: 92.1,
            liveness: 1,
            document_type: DocumentType::Dui,
            ocr_match: 1,
            age_valid: 1,
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, InputError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_json_value(&value)
    }

    /// Missing or null fields take their defaults: 0, or `DESCONOCIDO` for
    /// the document type.
    pub fn from_json_value(value: &Value) -> Result<Self, InputError> {
        let Value::Object(obj) = value else {
            return Err(InputError::NotAnObject);
        };
        Ok(Self {
            similarity_score: float_field(obj, FEATURE_COLUMNS[IDX_SIMILARITY])?.unwrap_or(0.0),
            liveness: int_field(obj, FEATURE_COLUMNS[IDX_LIVENESS])?.unwrap_or(0),
            document_type: document_field(obj.get(FEATURE_COLUMNS[IDX_DOCUMENT_TYPE])),
            ocr_match: int_field(obj, FEATURE_COLUMNS[IDX_OCR_MATCH])?.unwrap_or(0),
            age_valid: int_field(obj, FEATURE_COLUMNS[IDX_AGE_VALID])?.unwrap_or(0),
        })
    }

    pub fn to_features(&self) -> FeatureVector {
        let mut v = [0.0; FEATURE_COLUMNS.len()];
        v[IDX_SIMILARITY] = self.similarity_score;
        v[IDX_LIVENESS] = self.liveness as f64;
        v[IDX_DOCUMENT_TYPE] = self.document_type.code() as f64;
        v[IDX_OCR_MATCH] = self.ocr_match as f64;
        v[IDX_AGE_VALID] = self.age_valid as f64;
        v
    }
}

/// Feature columns absent (or null) in the payload, in column order.
pub fn missing_fields(value: &Value) -> Vec<&'static str> {
    let Value::Object(obj) = value else {
        return FEATURE_COLUMNS.to_vec();
    };
    FEATURE_COLUMNS
        .iter()
        .copied()
        .filter(|name| obj.get(*name).is_none_or(Value::is_null))
        .collect()
}

fn document_field(value: Option<&Value>) -> DocumentType {
    match value {
        Some(Value::String(s)) => DocumentType::from_label(s),
        _ => DocumentType::Desconocido,
    }
}

fn float_field(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, InputError> {
    let Some(value) = obj.get(field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => float_from_str(s),
        Value::Array(_) | Value::Object(_) => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(field, value))
}

fn int_field(obj: &Map<String, Value>, field: &'static str) -> Result<Option<i64>, InputError> {
    let Some(value) = obj.get(field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_to_i64)),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => int_from_str(s),
        Value::Array(_) | Value::Object(_) => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(field, value))
}

fn invalid(field: &'static str, value: &Value) -> InputError {
    InputError::InvalidField {
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/record.rs"]
mod tests;
