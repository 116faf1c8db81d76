// src/utils/progress_bars/logging.rs - Phase logging helpers for forecast runs
use log::{info, warn};
use std::time::Instant;

use crate::forecast::{ConfidenceResult, PredictionResult, TrainedModel};

#[derive(Clone)]
pub struct ForecastLogger {
    run_name: &'static str,
    run_emoji: &'static str,
    start_time: Instant,
}

impl ForecastLogger {
    pub fn new(run_name: &'static str, run_emoji: &'static str) -> Self {
        Self {
            run_name,
            run_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, catalog_size: usize, source: &str) {
        info!(
            "[{}] {} 🚀 Starting box office forecast on {} movies from {}",
            self.run_name, self.run_emoji, catalog_size, source
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.run_name, self.run_emoji, phase, details, elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.run_name, self.run_emoji, phase, elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_model_trained(&self, model: &TrainedModel) {
        info!(
            "[{}] {} 🌲 Model {} ready: {} trees over {} movies",
            self.run_name,
            self.run_emoji,
            model.model_id,
            model.forest().n_members(),
            model.training_rows
        );
    }

    pub fn log_prediction(&self, prediction: &PredictionResult, budget: f64) {
        info!(
            "[{}] {} 💰 Predicted revenue {:.1}M on a {:.1}M budget (ROI {:.1}%)",
            self.run_name,
            self.run_emoji,
            prediction.predicted_revenue,
            budget,
            prediction.roi_percent(budget)
        );
    }

    pub fn log_confidence(&self, confidence: &ConfidenceResult) {
        info!(
            "[{}] {} 📈 Confidence band {:.1}M - {:.1}M (mean {:.1}M, std {:.2}M)",
            self.run_name,
            self.run_emoji,
            confidence.interval.0,
            confidence.interval.1,
            confidence.mean_prediction,
            confidence.std_prediction
        );
        if confidence.width() > confidence.mean_prediction.abs() {
            warn!(
                "[{}] {} ⚠️  Band is wider than the prediction itself; trees disagree strongly",
                self.run_name, self.run_emoji
            );
        }
    }

    pub fn log_completion(&self) {
        info!(
            "[{}] {} 🎉 COMPLETED in {:.2?}",
            self.run_name,
            self.run_emoji,
            self.start_time.elapsed()
        );
    }
}
