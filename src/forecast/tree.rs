// src/forecast/tree.rs
use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Node SSE at or below this counts as pure.
const PURITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParameters {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split. `None` means all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParameters {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// CART regression tree using squared error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total SSE reduction credited to each feature.
    impurity_decrease: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl RegressionTree {
    /// Fits on the rows listed in `samples`. Repeated indices act as
    /// bootstrap weights.
    pub fn fit<R: Rng + ?Sized>(
        x: &Array2<f64>,
        y: &[f64],
        samples: Vec<usize>,
        params: &TreeParameters,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.ncols()],
        };
        tree.grow(x, y, samples, 0, params, rng);
        tree
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        samples: Vec<usize>,
        depth: usize,
        params: &TreeParameters,
        rng: &mut R,
    ) -> usize {
        let n = samples.len();
        let mean = samples.iter().map(|&i| y[i]).sum::<f64>() / n.max(1) as f64;
        let sse: f64 = samples.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let depth_reached = params.max_depth.map_or(false, |max| depth >= max);
        let too_small = n < params.min_samples_split.max(2) || n < 2 * params.min_samples_leaf.max(1);
        if depth_reached || too_small || sse <= PURITY_EPSILON {
            return self.push_leaf(mean);
        }

        let split = match best_split(x, y, &samples, sse, params, rng) {
            Some(split) => split,
            None => return self.push_leaf(mean),
        };

        self.impurity_decrease[split.feature] += split.gain;

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });
        let left = self.grow(x, y, split.left, depth + 1, params, rng);
        let right = self.grow(x, y, split.right, depth + 1, params, rng);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Checks a deserialized tree: at least one node, split features within
    /// `n_features`, and every child stored after its parent.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if self.impurity_decrease.len() != n_features {
            return Err(format!(
                "tree tracks importance for {} features, expected {}",
                self.impurity_decrease.len(),
                n_features
            ));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} splits on unknown feature {}", index, feature));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {} points at invalid child {}", index, child));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn impurity_decrease(&self) -> &[f64] {
        &self.impurity_decrease
    }

    /// Per-feature share of this tree's SSE reduction. All zeros for a tree
    /// that never split.
    pub fn normalized_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.impurity_decrease.len()];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Features visited at one node, in shuffled order. Ties keep the first
/// feature seen.
fn candidate_features<R: Rng + ?Sized>(
    n_features: usize,
    params: &TreeParameters,
    rng: &mut R,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    order.shuffle(rng);
    if let Some(k) = params.max_features.filter(|k| *k > 0) {
        order.truncate(k);
    }
    order
}

fn best_split<R: Rng + ?Sized>(
    x: &Array2<f64>,
    y: &[f64],
    samples: &[usize],
    parent_sse: f64,
    params: &TreeParameters,
    rng: &mut R,
) -> Option<BestSplit> {
    let n = samples.len();
    let min_leaf = params.min_samples_leaf.max(1);
    let mut best: Option<(usize, usize, f64, f64)> = None; // (feature, cut, threshold, child_sse)
    let mut best_order: Vec<usize> = Vec::new();

    for feature in candidate_features(x.ncols(), params, rng) {
        let mut order = samples.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for cut in 1..n {
            let prev = order[cut - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            if cut < min_leaf || n - cut < min_leaf {
                continue;
            }
            let lo = x[[prev, feature]];
            let hi = x[[order[cut], feature]];
            if lo >= hi {
                continue;
            }

            let left_n = cut as f64;
            let right_n = (n - cut) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse = (left_sq - left_sum * left_sum / left_n).max(0.0)
                + (right_sq - right_sum * right_sum / right_n).max(0.0);

            if best.map_or(true, |(_, _, _, current)| child_sse < current) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some((feature, cut, threshold, child_sse));
                best_order = order.clone();
            }
        }
    }

    let (feature, cut, threshold, child_sse) = best?;
    let gain = parent_sse - child_sse;
    if gain <= 0.0 {
        return None;
    }
    let right = best_order.split_off(cut);
    Some(BestSplit {
        feature,
        threshold,
        gain,
        left: best_order,
        right,
    })
}
