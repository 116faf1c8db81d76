// src/utils/forecast_config.rs
use log::{debug, info};
use std::env;

use super::env::env_or;
use crate::forecast::{ConfidenceParameters, ForestParameters, TreeParameters};

/// Model and confidence settings, read from `FORECAST_*` and
/// `CONFIDENCE_*` variables. Unset values keep the reference defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub forest: ForestParameters,
    pub confidence: ConfidenceParameters,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forest: ForestParameters::default(),
            confidence: ConfidenceParameters::default(),
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Self {
        let forest_defaults = ForestParameters::default();
        let tree_defaults = TreeParameters::default();
        let confidence_defaults = ConfidenceParameters::default();

        let forest = ForestParameters {
            n_estimators: env_or("FORECAST_N_ESTIMATORS", forest_defaults.n_estimators),
            random_seed: env_or("FORECAST_RANDOM_SEED", forest_defaults.random_seed),
            tree: TreeParameters {
                max_depth: optional_usize("FORECAST_MAX_DEPTH"),
                min_samples_split: env_or(
                    "FORECAST_MIN_SAMPLES_SPLIT",
                    tree_defaults.min_samples_split,
                ),
                min_samples_leaf: env_or("FORECAST_MIN_SAMPLES_LEAF", tree_defaults.min_samples_leaf),
                max_features: optional_usize("FORECAST_MAX_FEATURES"),
            },
        };

        let confidence = ConfidenceParameters {
            trials: env_or("CONFIDENCE_TRIALS", confidence_defaults.trials),
            members_per_trial: env_or(
                "CONFIDENCE_MEMBERS_PER_TRIAL",
                confidence_defaults.members_per_trial,
            ),
            lower_percentile: env_or(
                "CONFIDENCE_LOWER_PERCENTILE",
                confidence_defaults.lower_percentile,
            ),
            upper_percentile: env_or(
                "CONFIDENCE_UPPER_PERCENTILE",
                confidence_defaults.upper_percentile,
            ),
        };

        let config = Self { forest, confidence };
        debug!("Forecast config: {:?}", config);
        config
    }

    pub fn log_config(&self) {
        info!(
            "🌲 Forest: {} trees, seed {}, max depth {}, min split {}, min leaf {}",
            self.forest.n_estimators,
            self.forest.random_seed,
            self.forest
                .tree
                .max_depth
                .map_or_else(|| "unlimited".to_string(), |d| d.to_string()),
            self.forest.tree.min_samples_split,
            self.forest.tree.min_samples_leaf
        );
        info!(
            "🎯 Confidence: {} trials x {} trees, interval p{}-p{}",
            self.confidence.trials,
            self.confidence.members_per_trial,
            self.confidence.lower_percentile,
            self.confidence.upper_percentile
        );
    }
}

// Unset, empty, "none" and "0" all mean no limit.
fn optional_usize(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    trimmed.parse::<usize>().ok().filter(|v| *v > 0)
}
