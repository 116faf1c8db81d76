// src/forecast/model.rs
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use super::error::ForecastError;
use super::forest::{ForestParameters, RandomForest};
use crate::features::{
    build_features, FeatureVector, MovieRecord, StandardScaler, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::utils::progress_bars::progress_callback::ProgressCallback;

/// Label the ensemble is fit against. It is a fixed formula over the inputs,
/// so predictions approximate this formula rather than real box-office data.
pub fn synthetic_target(record: &MovieRecord) -> f64 {
    record.budget * (1.0 + record.sentiment_score) * (record.social_buzz_score as f64 / 50.0)
}

/// A fitted scaler plus forest. Never mutated after `train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_id: String,
    pub trained_at: NaiveDateTime,
    pub training_rows: usize,
    scaler: StandardScaler,
    forest: RandomForest,
    parameters: ForestParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_revenue: f64,
    /// Global importance from training, keyed by feature name.
    pub feature_importance: BTreeMap<&'static str, f64>,
}

impl PredictionResult {
    /// `(predicted / budget - 1) * 100`
    pub fn roi_percent(&self, budget: f64) -> f64 {
        (self.predicted_revenue / budget - 1.0) * 100.0
    }

    /// Importance entries in feature order.
    pub fn ordered_importance(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .map(|name| (*name, self.feature_importance.get(name).copied().unwrap_or(0.0)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestPoint {
    pub title: Option<String>,
    pub budget: f64,
    pub predicted_revenue: f64,
    pub synthetic_target: f64,
}

pub fn train(records: &[MovieRecord], params: &ForestParameters) -> Result<TrainedModel, ForecastError> {
    train_with_progress(records, params, None)
}

pub fn train_with_progress(
    records: &[MovieRecord],
    params: &ForestParameters,
    progress: Option<&ProgressCallback>,
) -> Result<TrainedModel, ForecastError> {
    if records.is_empty() {
        return Err(ForecastError::EmptyTrainingSet);
    }
    for record in records {
        record.validate()?;
    }

    let table = build_features(records);
    let scaler = StandardScaler::fit(&table).ok_or(ForecastError::EmptyTrainingSet)?;
    let x = scaler.transform(&table);
    let y: Vec<f64> = records.iter().map(synthetic_target).collect();

    let forest = RandomForest::fit(&x, &y, params, progress);

    let model = TrainedModel {
        model_id: format!("box_office_forest_{}", Uuid::new_v4()),
        trained_at: Utc::now().naive_utc(),
        training_rows: records.len(),
        scaler,
        forest,
        parameters: params.clone(),
    };
    info!(
        "Trained {} on {} movies with {} trees",
        model.model_id,
        model.training_rows,
        model.forest.n_members()
    );
    Ok(model)
}

pub fn predict(model: &TrainedModel, record: &MovieRecord) -> Result<PredictionResult, ForecastError> {
    let row = model.scaled_row(record)?;
    let predicted_revenue = model.forest.predict_row(row.view());
    debug!(
        "Predicted {:.2}M for {} (budget {:.1}M)",
        predicted_revenue,
        record.display_name(),
        record.budget
    );
    Ok(PredictionResult {
        predicted_revenue,
        feature_importance: model.feature_importance(),
    })
}

/// Budget vs prediction for the first `limit` records.
pub fn backtest(
    model: &TrainedModel,
    records: &[MovieRecord],
    limit: usize,
) -> Result<Vec<BacktestPoint>, ForecastError> {
    records
        .iter()
        .take(limit)
        .map(|record| {
            let prediction = predict(model, record)?;
            Ok(BacktestPoint {
                title: record.title.clone(),
                budget: record.budget,
                predicted_revenue: prediction.predicted_revenue,
                synthetic_target: synthetic_target(record),
            })
        })
        .collect()
}

impl TrainedModel {
    /// Validates the record and applies the training-time standardization.
    pub(crate) fn scaled_row(&self, record: &MovieRecord) -> Result<Array1<f64>, ForecastError> {
        record.validate()?;
        if self.forest.n_members() == 0 {
            return Err(ForecastError::MalformedModel("forest has no trees".to_string()));
        }
        self.scaler
            .check_structure(FEATURE_COUNT)
            .map_err(ForecastError::MalformedModel)?;
        let features = FeatureVector::from_record(record).to_array();
        Ok(self.scaler.transform_row(&features))
    }

    /// Structural consistency of the scaler and every tree. Run on every
    /// model read from disk.
    pub fn check_integrity(&self) -> Result<(), ForecastError> {
        self.scaler
            .check_structure(FEATURE_COUNT)
            .and_then(|_| self.forest.check_structure(FEATURE_COUNT))
            .map_err(ForecastError::MalformedModel)
    }

    pub fn feature_importance(&self) -> BTreeMap<&'static str, f64> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.forest.feature_importances().iter().copied())
            .collect()
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn parameters(&self) -> &ForestParameters {
        &self.parameters
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize trained model")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write model to {}", path.as_ref().display()))?;
        info!("💾 Saved model {} to {}", self.model_id, path.as_ref().display());
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read model from {}", path.as_ref().display()))?;
        let model: Self = serde_json::from_str(&json).context("Failed to deserialize trained model")?;
        model
            .check_integrity()
            .with_context(|| format!("Model at {} failed integrity checks", path.as_ref().display()))?;
        info!("📂 Loaded model {} ({} trees)", model.model_id, model.forest.n_members());
        Ok(model)
    }

    /// SHA-256 over the fitted scaler and forest, hex encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&self.scaler).context("Failed to serialize scaler")?);
        hasher.update(serde_json::to_vec(&self.forest).context("Failed to serialize forest")?);
        Ok(hex::encode(hasher.finalize()))
    }
}
