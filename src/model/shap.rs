//! Exact path-dependent TreeSHAP over the forest's class-1 probability.
//!
//! Each tree is explained against its own training covers. Forest values are
//! the per-tree means, so local accuracy carries over:
//! `expected_value + sum(phi) == predict_proba(x)[1]`.

use std::sync::Arc;

use crate::model::features::{FeatureVector, N_FEATURES};
use crate::model::forest::RandomForest;
use crate::model::tree::{DecisionTree, Node};

#[derive(Debug, Clone)]
pub struct TreeExplainer {
    model: Arc<RandomForest>,
    expected_value: f64,
}

impl TreeExplainer {
    pub fn new(model: Arc<RandomForest>) -> Self {
        let expected_value = if model.trees.is_empty() {
            0.0
        } else {
            model.trees.iter().map(DecisionTree::expected_value).sum::<f64>()
                / model.trees.len() as f64
        };
        Self {
            model,
            expected_value,
        }
    }

    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    pub fn shap_values(&self, x: &FeatureVector) -> FeatureVector {
        let mut phi = [0.0; N_FEATURES];
        if self.model.trees.is_empty() {
            return phi;
        }
        for tree in &self.model.trees {
            tree_shap(tree, x, &mut phi);
        }
        let n_trees = self.model.trees.len() as f64;
        for v in &mut phi {
            *v /= n_trees;
        }
        phi
    }
}

/// Adds one tree's attributions into `phi`.
pub fn tree_shap(tree: &DecisionTree, x: &FeatureVector, phi: &mut FeatureVector) {
    let nodes = tree.nodes();
    if nodes.is_empty() {
        return;
    }
    recurse(nodes, 0, x, phi, &[], 1.0, 1.0, None);
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    nodes: &[Node],
    idx: usize,
    x: &FeatureVector,
    phi: &mut FeatureVector,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = parent_path.to_vec();
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    match &nodes[idx] {
        Node::Leaf { value, .. } => {
            let depth = path.len() - 1;
            for i in 1..=depth {
                let weight = unwound_path_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    phi[f] += weight * (el.one_fraction - el.zero_fraction) * value;
                }
            }
        }
        Node::Split {
            feature: split_feature,
            threshold,
            left,
            right,
            cover,
        } => {
            let (hot, cold) = if x[*split_feature] <= *threshold {
                (*left, *right)
            } else {
                (*right, *left)
            };

            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(pos) = path
                .iter()
                .position(|el| el.feature == Some(*split_feature))
            {
                incoming_zero = path[pos].zero_fraction;
                incoming_one = path[pos].one_fraction;
                unwind_path(&mut path, pos);
            }

            let (hot_zero, cold_zero) = if *cover > 0.0 {
                (nodes[hot].cover() / cover, nodes[cold].cover() / cover)
            } else {
                (0.5, 0.5)
            };

            recurse(
                nodes,
                hot,
                x,
                phi,
                &path,
                hot_zero * incoming_zero,
                incoming_one,
                Some(*split_feature),
            );
            recurse(
                nodes,
                cold,
                x,
                phi,
                &path,
                cold_zero * incoming_zero,
                0.0,
                Some(*split_feature),
            );
        }
    }
}

fn extend_path(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f64 / denom;
        path[i].pweight = zero_fraction * path[i].pweight * (depth - i) as f64 / denom;
    }
}

/// Removes `path[index]` and rescales the remaining weights.
fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].pweight = path[i].pweight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with `path[index]` unwound,
/// leaving the path untouched.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (depth - i) as f64 / denom;
        } else if zero_fraction != 0.0 {
            total += (path[i].pweight / zero_fraction) / ((depth - i) as f64 / denom);
        }
    }
    total
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/shap.rs"]
mod tests;
