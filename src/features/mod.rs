// src/features/mod.rs
pub mod feature_builder;
pub mod movie_record;
pub mod scaler;

pub use feature_builder::{build_features, FeatureTable, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use movie_record::MovieRecord;
pub use scaler::StandardScaler;
