use std::fs;
use std::path::Path;

use super::*;
use crate::testutil::{make_temp_dir, synthetic_csv};

fn test_config(dir: &Path) -> ScorerConfig {
    ScorerConfig {
        n_estimators: 12,
        ..ScorerConfig::default_v1().with_paths(
            Some(dir.join("model.bin")),
            Some(dir.join("verificaciones.csv")),
        )
    }
}

#[test]
fn test_split_is_seeded_and_disjoint() {
    let a = split_train_validation(10, 0.2, 42);
    let b = split_train_validation(10, 0.2, 42);
    assert_eq!(a, b);
    assert_eq!(a.train.len(), 8);
    assert_eq!(a.validation.len(), 2);

    let mut all: Vec<usize> = a.train.iter().chain(&a.validation).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..10).collect::<Vec<_>>());

    assert_eq!(split_train_validation(11, 0.2, 42).validation.len(), 3);
    let single = split_train_validation(1, 0.2, 42);
    assert_eq!(single.train, vec![0]);
    assert!(single.validation.is_empty());
}

#[test]
fn test_no_model_and_no_corpus_is_unavailable() {
    let dir = make_temp_dir("stage2");
    match load_or_train(&test_config(&dir)) {
        Err(ScoreError::ModelUnavailable(_)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_train_without_corpus_is_no_training_data() {
    let dir = make_temp_dir("stage2");
    match train_and_persist(&test_config(&dir)) {
        Err(ScoreError::NoTrainingData(_)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_header_only_corpus_is_no_training_data() {
    let dir = make_temp_dir("stage2");
    let config = test_config(&dir);
    fs::write(&config.corpus_path, synthetic_csv(0)).unwrap();
    match load_or_train(&config) {
        Err(ScoreError::NoTrainingData(_)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert!(!config.model_path.exists());
}

#[test]
fn test_train_persists_and_reload_uses_blob() {
    let dir = make_temp_dir("stage2");
    let config = test_config(&dir);
    fs::write(&config.corpus_path, synthetic_csv(100)).unwrap();

    let (trained, summary) = train_and_persist(&config).unwrap();
    assert!(config.model_path.exists());
    assert_eq!(summary.n_trees, 12);
    assert_eq!(summary.n_train, 80);
    assert_eq!(summary.n_validation, 20);
    let accuracy = summary.validation_accuracy.unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    // corpus gone: the second load must come from the blob alone
    fs::remove_file(&config.corpus_path).unwrap();
    let loaded = load_or_train(&config).unwrap();
    assert_eq!(loaded.model(), trained.model());
    assert_eq!(
        loaded.explainer().expected_value(),
        trained.explainer().expected_value()
    );
}

#[test]
fn test_corrupt_blob_triggers_retraining() {
    let dir = make_temp_dir("stage2");
    let config = test_config(&dir);
    fs::write(&config.corpus_path, synthetic_csv(60)).unwrap();
    fs::write(&config.model_path, b"not a model blob at all, just text").unwrap();

    let ctx = load_or_train(&config).unwrap();
    assert_eq!(ctx.model().trees.len(), 12);
    let reread = read_model_blob(&config.model_path).unwrap();
    assert_eq!(&reread, ctx.model());
}

#[test]
fn test_training_is_reproducible() {
    let (x, y) = crate::testutil::synthetic_dataset(70);
    let corpus = Corpus { rows: x, labels: y };
    let config = ScorerConfig {
        n_estimators: 8,
        ..ScorerConfig::default_v1()
    };
    let (a, sa) = train(&corpus, &config).unwrap();
    let (b, sb) = train(&corpus, &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(sa, sb);

    assert!(matches!(
        train(&Corpus::default(), &config),
        Err(ScoreError::NoTrainingData(_))
    ));
}
