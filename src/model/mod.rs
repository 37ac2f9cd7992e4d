pub mod blob;
pub mod features;
pub mod forest;
pub mod shap;
pub mod text_confidence;
pub mod tree;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("invalid training data: {0}")]
    InvalidTrainingData(String),
    #[error("model blob not found at {0}")]
    MissingBlob(String),
    #[error("invalid model blob: {0}")]
    InvalidBlob(String),
    #[error("model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
