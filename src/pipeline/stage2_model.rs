use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::ScorerConfig;
use crate::error::ScoreError;
use crate::input::corpus::{Corpus, load_corpus};
use crate::model::ModelError;
use crate::model::blob::{read_model_blob, write_model_blob};
use crate::model::features::FeatureVector;
use crate::model::forest::{ForestParams, RandomForest};
use crate::model::shap::TreeExplainer;
use crate::report::format_f64_6;

/// Model handle plus the attribution routine bound to it. Built once per
/// process and only read while scoring.
#[derive(Debug, Clone)]
pub struct ScorerContext {
    model: Arc<RandomForest>,
    explainer: TreeExplainer,
}

impl ScorerContext {
    pub fn new(model: RandomForest) -> Self {
        let model = Arc::new(model);
        let explainer = TreeExplainer::new(Arc::clone(&model));
        Self { model, explainer }
    }

    pub fn model(&self) -> &RandomForest {
        &self.model
    }

    pub fn explainer(&self) -> &TreeExplainer {
        &self.explainer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub n_trees: usize,
    pub n_train: usize,
    pub n_validation: usize,
    pub validation_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValidationSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Loads the persisted model; trains and persists one when it is missing or
/// unreadable and a corpus exists.
pub fn load_or_train(config: &ScorerConfig) -> Result<ScorerContext, ScoreError> {
    match read_model_blob(&config.model_path) {
        Ok(model) => {
            tracing::info!(
                path = %config.model_path.display(),
                trees = model.trees.len(),
                "loaded persisted model"
            );
            return Ok(ScorerContext::new(model));
        }
        Err(ModelError::MissingBlob(_)) => {
            tracing::info!(
                path = %config.model_path.display(),
                "model not found; training a new model"
            );
        }
        Err(ModelError::InvalidBlob(reason)) => {
            tracing::warn!(
                path = %config.model_path.display(),
                %reason,
                "persisted model is unusable; retraining"
            );
        }
        Err(err) => return Err(err.into()),
    }

    if !config.corpus_path.exists() {
        return Err(ScoreError::ModelUnavailable(format!(
            "no usable model at {} and no training corpus at {}",
            config.model_path.display(),
            config.corpus_path.display()
        )));
    }

    let (ctx, _summary) = train_and_persist(config)?;
    Ok(ctx)
}

/// Trains from the configured corpus and writes the blob, replacing any
/// previous one.
pub fn train_and_persist(
    config: &ScorerConfig,
) -> Result<(ScorerContext, TrainingSummary), ScoreError> {
    let corpus = load_corpus(&config.corpus_path)?;
    tracing::info!(
        path = %config.corpus_path.display(),
        rows = corpus.len(),
        positives = corpus.positives(),
        "loaded training corpus"
    );

    let (model, summary) = train(&corpus, config)?;
    write_model_blob(&config.model_path, &model)?;
    tracing::info!(
        path = %config.model_path.display(),
        trees = summary.n_trees,
        "persisted trained model"
    );
    Ok((ScorerContext::new(model), summary))
}

/// Fits on the training partition and scores the held-out partition.
pub fn train(
    corpus: &Corpus,
    config: &ScorerConfig,
) -> Result<(RandomForest, TrainingSummary), ScoreError> {
    if corpus.is_empty() {
        return Err(ScoreError::NoTrainingData(
            "training corpus has no rows".to_string(),
        ));
    }

    let split = split_train_validation(corpus.len(), config.validation_fraction, config.seed);
    let x_train: Vec<FeatureVector> = split.train.iter().map(|&i| corpus.rows[i]).collect();
    let y_train: Vec<u8> = split.train.iter().map(|&i| corpus.labels[i]).collect();

    let model = RandomForest::fit(&x_train, &y_train, &ForestParams::from_config(config))?;

    let validation_accuracy = if split.validation.is_empty() {
        None
    } else {
        let correct = split
            .validation
            .iter()
            .filter(|&&i| model.predict(&corpus.rows[i]) == corpus.labels[i])
            .count();
        Some(correct as f64 / split.validation.len() as f64)
    };
    match validation_accuracy {
        Some(acc) => tracing::info!(
            train = split.train.len(),
            validation = split.validation.len(),
            accuracy = %format_f64_6(acc),
            "trained random forest"
        ),
        None => tracing::info!(
            train = split.train.len(),
            "trained random forest; validation partition is empty"
        ),
    }

    let summary = TrainingSummary {
        n_trees: model.trees.len(),
        n_train: split.train.len(),
        n_validation: split.validation.len(),
        validation_accuracy,
    };
    Ok((model, summary))
}

/// Seeded shuffle; the validation share is `ceil(fraction * n)`, capped so
/// at least one training row remains.
pub fn split_train_validation(n: usize, fraction: f64, seed: u64) -> TrainValidationSplit {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut n_validation = (fraction.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    if n_validation >= n {
        n_validation = n.saturating_sub(1);
    }
    let validation = indices.split_off(n - n_validation);
    TrainValidationSplit {
        train: indices,
        validation,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_model.rs"]
mod tests;
