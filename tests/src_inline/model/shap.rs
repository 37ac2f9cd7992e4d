use super::*;
use crate::model::forest::ForestParams;
use crate::testutil::synthetic_dataset;

fn leaf(value: f64, cover: f64) -> Node {
    Node::Leaf { value, cover }
}

fn split(feature: usize, threshold: f64, left: usize, right: usize, cover: f64) -> Node {
    Node::Split {
        feature,
        threshold,
        left,
        right,
        cover,
    }
}

/// Splits on feature 0 twice along one branch so unwinding is exercised.
fn hand_tree() -> DecisionTree {
    DecisionTree {
        nodes: vec![
            split(0, 50.0, 1, 4, 10.0),
            split(1, 0.5, 2, 3, 6.0),
            leaf(0.0, 2.0),
            leaf(0.5, 4.0),
            split(0, 80.0, 5, 8, 4.0),
            split(3, 0.5, 6, 7, 3.0),
            leaf(0.2, 1.0),
            leaf(0.9, 2.0),
            leaf(1.0, 1.0),
        ],
    }
}

/// Tree output with only the features in `known` observed; unknown splits
/// follow both children weighted by cover.
fn cond_expectation(nodes: &[Node], idx: usize, x: &FeatureVector, known: u32) -> f64 {
    match &nodes[idx] {
        Node::Leaf { value, .. } => *value,
        Node::Split {
            feature,
            threshold,
            left,
            right,
            cover,
        } => {
            if known & (1u32 << *feature) != 0 {
                let next = if x[*feature] <= *threshold { *left } else { *right };
                cond_expectation(nodes, next, x, known)
            } else {
                let l = cond_expectation(nodes, *left, x, known);
                let r = cond_expectation(nodes, *right, x, known);
                (nodes[*left].cover() * l + nodes[*right].cover() * r) / cover
            }
        }
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

fn brute_force_shap(tree: &DecisionTree, x: &FeatureVector) -> FeatureVector {
    let n = N_FEATURES;
    let mut phi = [0.0; N_FEATURES];
    for (i, slot) in phi.iter_mut().enumerate() {
        for mask in 0u32..(1u32 << n) {
            if mask & (1u32 << i) != 0 {
                continue;
            }
            let s = mask.count_ones() as usize;
            let weight = factorial(s) * factorial(n - s - 1) / factorial(n);
            let with = cond_expectation(tree.nodes(), 0, x, mask | (1u32 << i));
            let without = cond_expectation(tree.nodes(), 0, x, mask);
            *slot += weight * (with - without);
        }
    }
    phi
}

#[test]
fn test_tree_shap_matches_brute_force_shapley() {
    let tree = hand_tree();
    let inputs = [
        [60.0, 1.0, 0.0, 1.0, 0.0],
        [40.0, 0.0, 2.0, 0.0, 1.0],
        [90.0, 1.0, 1.0, 1.0, 1.0],
        [50.0, 1.0, 0.0, 0.0, 0.0],
        [75.0, 0.0, 2.0, 0.0, 1.0],
    ];
    for x in &inputs {
        let mut phi = [0.0; N_FEATURES];
        tree_shap(&tree, x, &mut phi);
        let expected = brute_force_shap(&tree, x);
        for f in 0..N_FEATURES {
            assert!(
                (phi[f] - expected[f]).abs() < 1e-10,
                "feature {} for {:?}: {} vs {}",
                f,
                x,
                phi[f],
                expected[f]
            );
        }
    }
}

#[test]
fn test_unused_features_get_zero_attribution() {
    let tree = hand_tree();
    let mut phi = [0.0; N_FEATURES];
    tree_shap(&tree, &[60.0, 1.0, 1.0, 1.0, 1.0], &mut phi);
    assert_eq!(phi[2], 0.0);
    assert_eq!(phi[4], 0.0);
}

#[test]
fn test_single_leaf_tree_has_no_attribution() {
    let forest = RandomForest {
        n_features: N_FEATURES,
        seed: 0,
        trees: vec![DecisionTree {
            nodes: vec![leaf(0.3, 5.0)],
        }],
    };
    let explainer = TreeExplainer::new(Arc::new(forest));
    assert!((explainer.expected_value() - 0.3).abs() < 1e-12);
    assert_eq!(explainer.shap_values(&[1.0; N_FEATURES]), [0.0; N_FEATURES]);
}

#[test]
fn test_forest_attribution_is_locally_accurate() {
    let (x, y) = synthetic_dataset(150);
    let params = ForestParams {
        n_estimators: 15,
        seed: 42,
        max_features: None,
        min_samples_split: 2,
        max_depth: None,
    };
    let forest = Arc::new(RandomForest::fit(&x, &y, &params).unwrap());
    let explainer = TreeExplainer::new(Arc::clone(&forest));

    let extra = [[92.1, 1.0, 0.0, 1.0, 1.0], [0.0, 0.0, 2.0, 0.0, 0.0]];
    for row in x.iter().step_by(7).chain(extra.iter()) {
        let phi = explainer.shap_values(row);
        let total: f64 = phi.iter().sum();
        let p1 = forest.predict_proba(row)[1];
        assert!(
            (explainer.expected_value() + total - p1).abs() < 1e-9,
            "base {} + {} != {}",
            explainer.expected_value(),
            total,
            p1
        );
    }
}

#[test]
fn test_attribution_is_deterministic() {
    let (x, y) = synthetic_dataset(80);
    let params = ForestParams {
        n_estimators: 10,
        seed: 7,
        max_features: None,
        min_samples_split: 2,
        max_depth: None,
    };
    let forest = Arc::new(RandomForest::fit(&x, &y, &params).unwrap());
    let explainer = TreeExplainer::new(forest);
    let row = [70.0, 1.0, 1.0, 1.0, 0.0];
    assert_eq!(explainer.shap_values(&row), explainer.shap_values(&row));
}
