use thiserror::Error;

use crate::input::InputError;
use crate::model::ModelError;

/// Failures surfaced at the process boundary as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("no training data: {0}")]
    NoTrainingData(String),
    #[error("internal scoring error: {0}")]
    InternalScoringError(String),
}

impl From<InputError> for ScoreError {
    fn from(value: InputError) -> Self {
        let message = value.to_string();
        match value {
            InputError::Json(_) | InputError::NotAnObject | InputError::InvalidField { .. } => {
                ScoreError::MalformedInput(message)
            }
            InputError::MissingInput(_) | InputError::EmptyCorpus(_) => {
                ScoreError::NoTrainingData(message)
            }
            InputError::Io(_) | InputError::Parse(_) => ScoreError::InternalScoringError(message),
        }
    }
}

impl From<ModelError> for ScoreError {
    fn from(value: ModelError) -> Self {
        let message = value.to_string();
        match value {
            ModelError::EmptyTrainingSet => ScoreError::NoTrainingData(message),
            ModelError::MissingBlob(_) | ModelError::InvalidBlob(_) => {
                ScoreError::ModelUnavailable(message)
            }
            ModelError::Io(_)
            | ModelError::InvalidTrainingData(_)
            | ModelError::Serialization(_) => ScoreError::InternalScoringError(message),
        }
    }
}
