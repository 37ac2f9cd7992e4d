use std::path::Path;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::ScoreError;
use crate::model::features::{FEATURE_COLUMNS, FeatureVector};
use crate::pipeline::stage2_model::TrainingSummary;
use crate::pipeline::stage3_score::ScoringResult;

#[derive(Debug, Serialize)]
struct ScorePayload<'a> {
    prediccion: &'static str,
    probabilidad: f64,
    shap: Attribution<'a>,
}

/// Serializes as an object keyed by feature name, in column order.
#[derive(Debug)]
struct Attribution<'a>(&'a FeatureVector);

impl Serialize for Attribution<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COLUMNS.len()))?;
        for (name, value) in FEATURE_COLUMNS.iter().zip(self.0.iter()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: String,
}

#[derive(Debug, Serialize)]
struct TrainingPayload {
    modelo: String,
    arboles: usize,
    muestras_entrenamiento: usize,
    muestras_validacion: usize,
    exactitud_validacion: Option<f64>,
}

pub fn render_scoring_json(result: &ScoringResult) -> Result<String, ScoreError> {
    let payload = ScorePayload {
        prediccion: result.decision.wire_label(),
        probabilidad: result.probability,
        shap: Attribution(&result.attribution),
    };
    serde_json::to_string(&payload).map_err(|e| ScoreError::InternalScoringError(e.to_string()))
}

pub fn render_training_json(
    model_path: &Path,
    summary: &TrainingSummary,
) -> Result<String, ScoreError> {
    let payload = TrainingPayload {
        modelo: model_path.display().to_string(),
        arboles: summary.n_trees,
        muestras_entrenamiento: summary.n_train,
        muestras_validacion: summary.n_validation,
        exactitud_validacion: summary.validation_accuracy,
    };
    serde_json::to_string(&payload).map_err(|e| ScoreError::InternalScoringError(e.to_string()))
}

/// Never fails; the boundary must always emit something parseable.
pub fn render_error_json(err: &ScoreError) -> String {
    let payload = ErrorPayload {
        error: err.to_string(),
    };
    serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"error\":\"internal scoring error: failed to render error\"}".to_string()
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/json.rs"]
mod tests;
