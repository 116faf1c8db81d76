// src/features/scaler.rs
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::feature_builder::FeatureTable;

/// Per-column standardization fixed at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Population statistics of each column. Constant columns keep scale 1.
    /// Returns `None` for an empty table.
    pub fn fit(table: &FeatureTable) -> Option<Self> {
        let values = table.values();
        let mean = values.mean_axis(Axis(0))?;
        let std = values.std_axis(Axis(0), 0.0);
        let scale = std
            .iter()
            .map(|s| if *s > f64::EPSILON && s.is_finite() { *s } else { 1.0 })
            .collect();
        Some(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    pub fn transform(&self, table: &FeatureTable) -> Array2<f64> {
        let mut out = table.values().clone();
        for mut row in out.rows_mut() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (*cell - self.mean[j]) / self.scale[j];
            }
        }
        out
    }

    pub fn transform_row(&self, row: &[f64]) -> Array1<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean[j]) / self.scale[j])
            .collect()
    }

    /// Checks a deserialized scaler: `n_features` columns, each with a
    /// finite mean and a finite non-zero scale.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(format!(
                "scaler has {} means and {} scales, expected {}",
                self.mean.len(),
                self.scale.len(),
                n_features
            ));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean is not finite".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err("scaler scale must be finite and non-zero".to_string());
        }
        Ok(())
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}
