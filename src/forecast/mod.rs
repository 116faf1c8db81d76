// src/forecast/mod.rs
pub mod confidence;
pub mod error;
pub mod forest;
pub mod model;
pub mod tree;

// Re-export main forecasting functions for clean API
pub use confidence::{estimate_confidence, estimate_confidence_with, ConfidenceParameters, ConfidenceResult};
pub use error::ForecastError;
pub use forest::{ForestParameters, RandomForest};
pub use model::{backtest, predict, synthetic_target, train, train_with_progress, BacktestPoint, PredictionResult, TrainedModel};
pub use tree::{RegressionTree, TreeParameters};
