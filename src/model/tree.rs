use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::features::{FeatureVector, N_FEATURES};

/// Flat arena node. Children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_features: usize,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

/// CART classifier over two classes; leaves hold the class-1 fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    weighted_impurity: f64,
}

impl DecisionTree {
    /// `samples` holds row indices (duplicates allowed for bootstrap draws)
    /// and is reordered in place while partitioning.
    pub fn fit(
        x: &[FeatureVector],
        y: &[u8],
        samples: &mut [usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            params,
            nodes: Vec::new(),
        };
        if samples.is_empty() {
            builder.nodes.push(Node::Leaf {
                value: 0.0,
                cover: 0.0,
            });
        } else {
            builder.build(samples, 0, rng);
        }
        Self {
            nodes: builder.nodes,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn predict_value(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Cover-weighted mean leaf value, i.e. the tree output with no feature known.
    pub fn expected_value(&self) -> f64 {
        let root_cover = self.nodes.first().map(Node::cover).unwrap_or(0.0);
        if root_cover <= 0.0 {
            return self.nodes.first().map(leaf_value).unwrap_or(0.0);
        }
        let mut total = 0.0;
        for node in &self.nodes {
            if let Node::Leaf { value, cover } = node {
                total += value * cover;
            }
        }
        total / root_cover
    }

    /// Checks arena links so a deserialized tree cannot loop or index out of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    cover,
                } => {
                    if *feature >= N_FEATURES {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if !threshold.is_finite() || !cover.is_finite() || *cover <= 0.0 {
                        return Err(format!("node {} has an invalid threshold or cover", idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                Node::Leaf { value, cover } => {
                    let empty_allowed = self.nodes.len() == 1;
                    if !(0.0..=1.0).contains(value)
                        || !cover.is_finite()
                        || *cover < 0.0
                        || (*cover == 0.0 && !empty_allowed)
                    {
                        return Err(format!("leaf {} has an invalid value or cover", idx));
                    }
                }
            }
        }
        Ok(())
    }
}

fn leaf_value(node: &Node) -> f64 {
    match node {
        Node::Leaf { value, .. } => *value,
        Node::Split { .. } => 0.0,
    }
}

struct TreeBuilder<'a> {
    x: &'a [FeatureVector],
    y: &'a [u8],
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, samples: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let cover = n as f64;
        let value = positives as f64 / cover;

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value, cover });

        let pure = positives == 0 || positives == n;
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || n < self.params.min_samples_split || depth_reached {
            return id;
        }

        let Some(split) = self.best_split(samples, positives, rng) else {
            return id;
        };

        let mid = partition(samples, |i| self.x[i][split.feature] <= split.threshold);
        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.build(left_samples, depth + 1, rng);
        let right = self.build(right_samples, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            cover,
        };
        id
    }

    /// Scans a random subset of non-constant features for the lowest
    /// weighted Gini impurity. Constant features do not count toward
    /// `max_features`.
    fn best_split(
        &self,
        samples: &[usize],
        positives: usize,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n = samples.len();
        let mut features: Vec<usize> = (0..N_FEATURES).collect();
        features.shuffle(rng);

        let mut order = samples.to_vec();
        let mut visited = 0usize;
        let mut best: Option<SplitCandidate> = None;

        for &feature in &features {
            if visited >= self.params.max_features {
                break;
            }
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));
            let lo = self.x[order[0]][feature];
            let hi = self.x[order[n - 1]][feature];
            if lo == hi {
                continue;
            }
            visited += 1;

            let mut left_n = 0usize;
            let mut left_pos = 0usize;
            for k in 0..n - 1 {
                let row = order[k];
                left_n += 1;
                left_pos += self.y[row] as usize;
                let current = self.x[row][feature];
                let next = self.x[order[k + 1]][feature];
                if current == next {
                    continue;
                }
                let right_n = n - left_n;
                let right_pos = positives - left_pos;
                let weighted_impurity = left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(right_pos, right_n);
                let better = match best {
                    Some(b) => weighted_impurity < b.weighted_impurity,
                    None => true,
                };
                if better {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(current, next),
                        weighted_impurity,
                    });
                }
            }
        }

        best
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Midpoint that still separates `lo` from `hi` under `<=`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid >= hi || !mid.is_finite() { lo } else { mid }
}

fn partition<F: Fn(usize) -> bool>(samples: &mut [usize], goes_left: F) -> usize {
    let mut mid = 0usize;
    for k in 0..samples.len() {
        if goes_left(samples[k]) {
            samples.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/tree.rs"]
mod tests;
