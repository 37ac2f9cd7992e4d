use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ScorerConfig;
use crate::model::ModelError;
use crate::model::features::{FeatureVector, N_FEATURES};
use crate::model::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_features: Option<usize>,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

impl ForestParams {
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            seed: config.seed,
            max_features: config.max_features,
            min_samples_split: config.min_samples_split,
            max_depth: config.max_depth,
        }
    }

    fn tree_params(&self) -> TreeParams {
        let sqrt_features = ((N_FEATURES as f64).sqrt() as usize).max(1);
        TreeParams {
            max_features: self
                .max_features
                .unwrap_or(sqrt_features)
                .clamp(1, N_FEATURES),
            min_samples_split: self.min_samples_split.max(2),
            max_depth: self.max_depth,
        }
    }
}

/// Bagged ensemble of CART trees; class probabilities are per-tree means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub seed: u64,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(x: &[FeatureVector], y: &[u8], params: &ForestParams) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::InvalidTrainingData(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(ModelError::InvalidTrainingData(format!(
                "label {} is not binary",
                bad
            )));
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidTrainingData(
                "feature matrix contains non-finite values".to_string(),
            ));
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidTrainingData(
                "ensemble size must be at least 1".to_string(),
            ));
        }

        let tree_params = params.tree_params();
        let n = x.len();
        let mut seeder = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(seeder.next_u64());
            let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(x, y, &mut sample, &tree_params, &mut rng));
        }

        Ok(Self {
            n_features: N_FEATURES,
            seed: params.seed,
            trees,
        })
    }

    /// `[P(class 0), P(class 1)]`.
    pub fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        if self.trees.is_empty() {
            return [1.0, 0.0];
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_value(x)).sum();
        let p1 = (sum / self.trees.len() as f64).clamp(0.0, 1.0);
        [1.0 - p1, p1]
    }

    /// Argmax over `predict_proba`; ties resolve to class 0.
    pub fn predict(&self, x: &FeatureVector) -> u8 {
        let proba = self.predict_proba(x);
        if proba[1] > proba[0] { 1 } else { 0 }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_features != N_FEATURES {
            return Err(ModelError::InvalidBlob(format!(
                "model expects {} features, scorer provides {}",
                self.n_features, N_FEATURES
            )));
        }
        if self.trees.is_empty() {
            return Err(ModelError::InvalidBlob("model has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|reason| ModelError::InvalidBlob(format!("tree {}: {}", idx, reason)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/forest.rs"]
mod tests;
