use crate::error::ScoreError;
use crate::input::record::VerificationRecord;
use crate::model::features::FeatureVector;
use crate::pipeline::stage2_model::ScorerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }

    pub fn wire_label(self) -> &'static str {
        match self {
            Decision::Approved => "APROBADO",
            Decision::Rejected => "RECHAZADO",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    pub decision: Decision,
    /// Probability mass on the predicted class.
    pub probability: f64,
    /// Attribution toward APPROVED, in feature column order.
    pub attribution: FeatureVector,
}

pub fn score(ctx: &ScorerContext, record: &VerificationRecord) -> Result<ScoringResult, ScoreError> {
    let features = record.to_features();
    let label = ctx.model().predict(&features);
    let proba = ctx.model().predict_proba(&features);
    let probability = proba[label as usize];
    if !probability.is_finite() {
        return Err(ScoreError::InternalScoringError(
            "model produced a non-finite probability".to_string(),
        ));
    }

    let attribution = ctx.explainer().shap_values(&features);
    if attribution.iter().any(|v| !v.is_finite()) {
        return Err(ScoreError::InternalScoringError(
            "attribution produced a non-finite value".to_string(),
        ));
    }

    let decision = Decision::from_label(label);
    tracing::debug!(
        ?decision,
        probability,
        base_value = ctx.explainer().expected_value(),
        "scored verification record"
    );
    Ok(ScoringResult {
        decision,
        probability,
        attribution,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_score.rs"]
mod tests;
