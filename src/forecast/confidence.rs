// src/forecast/confidence.rs
//! Structural uncertainty band around a single prediction.
//!
//! Each trial averages a random handful of the forest's trees. The spread of
//! those averages measures how much the trees disagree. The forest was fit on
//! a noiseless synthetic target, so this is not a calibrated confidence
//! interval on real revenue.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::ForecastError;
use super::model::TrainedModel;
use crate::features::MovieRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceParameters {
    /// Number of bootstrap trials.
    pub trials: usize,
    /// Trees averaged per trial. Capped at the number of fitted trees.
    pub members_per_trial: usize,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
}

impl Default for ConfidenceParameters {
    fn default() -> Self {
        Self {
            trials: 100,
            members_per_trial: 50,
            lower_percentile: 5.0,
            upper_percentile: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceResult {
    pub mean_prediction: f64,
    pub std_prediction: f64,
    /// `(low, high)` percentiles of the trial estimates.
    pub interval: (f64, f64),
}

impl ConfidenceResult {
    pub fn width(&self) -> f64 {
        self.interval.1 - self.interval.0
    }
}

/// Uses the thread RNG, so repeated calls jitter slightly.
pub fn estimate_confidence(
    model: &TrainedModel,
    record: &MovieRecord,
) -> Result<ConfidenceResult, ForecastError> {
    estimate_confidence_with(
        model,
        record,
        &ConfidenceParameters::default(),
        &mut rand::thread_rng(),
    )
}

pub fn estimate_confidence_with<R: Rng + ?Sized>(
    model: &TrainedModel,
    record: &MovieRecord,
    params: &ConfidenceParameters,
    rng: &mut R,
) -> Result<ConfidenceResult, ForecastError> {
    validate_parameters(params)?;
    let row = model.scaled_row(record)?;

    let members = model.forest().members();
    let member_predictions: Vec<f64> = members.iter().map(|tree| tree.predict_row(row.view())).collect();
    let pool = member_predictions.len();
    if pool == 0 {
        return Err(ForecastError::MalformedModel("forest has no trees".to_string()));
    }
    let draws = params.members_per_trial.clamp(1, pool);
    if params.members_per_trial > pool {
        debug!(
            "Only {} trees fitted; sampling {} per trial instead of {}",
            pool, draws, params.members_per_trial
        );
    }

    let trials = params.trials.max(1);
    let mut estimates: Vec<f64> = (0..trials)
        .map(|_| {
            let sum: f64 = (0..draws)
                .map(|_| member_predictions[rng.gen_range(0..pool)])
                .sum();
            sum / draws as f64
        })
        .collect();

    let n = estimates.len() as f64;
    let mean_prediction = estimates.iter().sum::<f64>() / n;
    let variance = estimates
        .iter()
        .map(|v| (v - mean_prediction).powi(2))
        .sum::<f64>()
        / n;

    estimates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let low = percentile_sorted(&estimates, params.lower_percentile);
    let high = percentile_sorted(&estimates, params.upper_percentile);

    Ok(ConfidenceResult {
        mean_prediction,
        std_prediction: variance.sqrt(),
        interval: (low, high),
    })
}

fn validate_parameters(params: &ConfidenceParameters) -> Result<(), ForecastError> {
    let in_range = |p: f64| p.is_finite() && (0.0..=100.0).contains(&p);
    if !in_range(params.lower_percentile) || !in_range(params.upper_percentile) {
        return Err(ForecastError::invalid(
            "percentile",
            "percentiles must lie within [0, 100]",
        ));
    }
    if params.lower_percentile > params.upper_percentile {
        return Err(ForecastError::invalid(
            "percentile",
            format!(
                "lower percentile {} exceeds upper percentile {}",
                params.lower_percentile, params.upper_percentile
            ),
        ));
    }
    Ok(())
}

/// Linear interpolation between closest ranks, on ascending input.
pub fn percentile_sorted(sorted: &[f64], percentile: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = (percentile / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::forest::ForestParameters;
    use crate::forecast::model::{predict, train};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn records() -> Vec<MovieRecord> {
        vec![
            MovieRecord::from_parameters(100.0, 0.85, 85, 1200),
            MovieRecord::from_parameters(85.0, 0.75, 70, 800),
            MovieRecord::from_parameters(120.0, 0.92, 90, 1500),
            MovieRecord::from_parameters(60.0, 0.40, 30, 300),
            MovieRecord::from_parameters(45.0, 0.55, 50, 650),
        ]
    }

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&values, 0.0), 1.0);
        assert_eq!(percentile_sorted(&values, 100.0), 5.0);
        assert!((percentile_sorted(&values, 5.0) - 1.2).abs() < 1e-12);
        assert!((percentile_sorted(&values, 95.0) - 4.8).abs() < 1e-12);
        assert_eq!(percentile_sorted(&values, 50.0), 3.0);
        assert_eq!(percentile_sorted(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn test_interval_brackets_mean() {
        let model = train(&records(), &ForestParameters::default()).unwrap();
        for record in records() {
            let result = estimate_confidence(&model, &record).unwrap();
            let (low, high) = result.interval;
            assert!(low <= high);
            assert!(low <= result.mean_prediction + 1e-9);
            assert!(result.mean_prediction <= high + 1e-9);
            assert!(result.std_prediction >= 0.0);
        }
    }

    #[test]
    fn test_seeded_estimate_is_reproducible() {
        let model = train(&records(), &ForestParameters::default()).unwrap();
        let record = &records()[0];
        let params = ConfidenceParameters::default();
        let a = estimate_confidence_with(&model, record, &params, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = estimate_confidence_with(&model, record, &params, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mean_tracks_point_prediction() {
        let model = train(&records(), &ForestParameters::default()).unwrap();
        let record = &records()[2];
        let point = predict(&model, record).unwrap().predicted_revenue;
        let params = ConfidenceParameters {
            trials: 400,
            ..ConfidenceParameters::default()
        };
        let result = estimate_confidence_with(&model, record, &params, &mut StdRng::seed_from_u64(11)).unwrap();
        // Trial means are unbiased estimates of the full-forest mean.
        assert!((result.mean_prediction - point).abs() <= result.std_prediction * 2.0 + 1e-6);
    }

    #[test]
    fn test_small_forest_caps_members_per_trial() {
        let params = ForestParameters {
            n_estimators: 3,
            ..ForestParameters::default()
        };
        let model = train(&records(), &params).unwrap();
        let result = estimate_confidence(&model, &records()[1]).unwrap();
        assert!(result.mean_prediction.is_finite());
        assert!(result.interval.0 <= result.interval.1);
    }

    #[test]
    fn test_model_without_trees_is_an_error() {
        let model = train(&records(), &ForestParameters::default()).unwrap();
        let mut value = serde_json::to_value(&model).unwrap();
        value["forest"]["members"] = serde_json::json!([]);
        let hollow: TrainedModel = serde_json::from_value(value).unwrap();
        let result = estimate_confidence_with(
            &hollow,
            &records()[0],
            &ConfidenceParameters::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(ForecastError::MalformedModel(_))));
    }

    #[test]
    fn test_rejects_inverted_percentiles() {
        let model = train(&records(), &ForestParameters::default()).unwrap();
        let params = ConfidenceParameters {
            lower_percentile: 90.0,
            upper_percentile: 10.0,
            ..ConfidenceParameters::default()
        };
        let result = estimate_confidence_with(&model, &records()[0], &params, &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(ForecastError::InvalidFeature { .. })));
    }
}
