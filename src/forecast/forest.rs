// src/forecast/forest.rs
use log::{debug, info};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParameters};
use crate::utils::progress_bars::progress_callback::ProgressCallback;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParameters {
    pub n_estimators: usize,
    pub random_seed: u64,
    pub tree: TreeParameters,
}

impl Default for ForestParameters {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_seed: 42,
            tree: TreeParameters::default(),
        }
    }
}

/// Bagged regression trees. Every member is kept so callers can query
/// them one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    members: Vec<RegressionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fits `params.n_estimators` trees (at least one), each on a bootstrap
    /// sample of the rows. Seeded, so identical inputs give identical forests.
    pub fn fit(
        x: &Array2<f64>,
        y: &[f64],
        params: &ForestParameters,
        progress: Option<&ProgressCallback>,
    ) -> Self {
        let n_rows = x.nrows();
        let n_members = params.n_estimators.max(1);
        let mut rng = StdRng::seed_from_u64(params.random_seed);

        info!(
            "Fitting {} regression trees on {} rows x {} features (seed {})",
            n_members,
            n_rows,
            x.ncols(),
            params.random_seed
        );

        let mut members = Vec::with_capacity(n_members);
        for member_index in 0..n_members {
            let samples: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let tree = RegressionTree::fit(x, y, samples, &params.tree, &mut rng);
            debug!(
                "Tree {}: {} nodes, depth {}",
                member_index,
                tree.node_count(),
                tree.depth()
            );
            members.push(tree);
            if let Some(callback) = progress {
                callback(member_index + 1, n_members);
            }
        }

        let feature_importances = aggregate_importances(&members, x.ncols());
        Self {
            members,
            feature_importances,
        }
    }

    /// Mean of all member predictions.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let total: f64 = self.members.iter().map(|tree| tree.predict_row(row)).sum();
        total / self.members.len() as f64
    }

    pub fn members(&self) -> &[RegressionTree] {
        &self.members
    }

    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    /// Checks a deserialized forest against the expected feature count.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.members.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.feature_importances.len() != n_features {
            return Err(format!(
                "forest carries {} importances, expected {}",
                self.feature_importances.len(),
                n_features
            ));
        }
        for (index, tree) in self.members.iter().enumerate() {
            tree.check_structure(n_features)
                .map_err(|reason| format!("tree {}: {}", index, reason))?;
        }
        Ok(())
    }

    /// Non-negative, sums to one. Uniform when no member ever split.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

fn aggregate_importances(members: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut summed = vec![0.0; n_features];
    for tree in members {
        for (acc, value) in summed.iter_mut().zip(tree.normalized_importances()) {
            *acc += value;
        }
    }
    let total: f64 = summed.iter().sum();
    if total <= 0.0 || n_features == 0 {
        debug!("No tree produced a split; falling back to uniform feature importance");
        return vec![1.0 / n_features.max(1) as f64; n_features];
    }
    summed.iter().map(|v| v / total).collect()
}
