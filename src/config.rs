use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "random_forest_model.bin";
pub const DEFAULT_CORPUS_PATH: &str = "verificaciones.csv";

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub model_path: PathBuf,
    pub corpus_path: PathBuf,
    pub n_estimators: usize,
    pub seed: u64,
    pub validation_fraction: f64,
    pub max_features: Option<usize>,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

impl ScorerConfig {
    /// 100 trees, seed 42, 80/20 split, sqrt feature sampling.
    pub fn default_v1() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            n_estimators: 100,
            seed: 42,
            validation_fraction: 0.2,
            max_features: None,
            min_samples_split: 2,
            max_depth: None,
        }
    }

    pub fn with_paths(mut self, model: Option<PathBuf>, corpus: Option<PathBuf>) -> Self {
        if let Some(path) = model {
            self.model_path = path;
        }
        if let Some(path) = corpus {
            self.corpus_path = path;
        }
        self
    }
}
