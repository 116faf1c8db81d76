// src/features/feature_builder.rs
use ndarray::{Array2, ArrayView1};

use super::movie_record::MovieRecord;

/// Column order of every feature table. Importance output is keyed by it.
pub const FEATURE_NAMES: [&str; 5] = [
    "sentiment_score",
    "review_count",
    "positive_ratio",
    "social_buzz_score",
    "budget",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub sentiment_score: f64,
    pub review_count: f64,
    pub positive_ratio: f64,
    pub social_buzz_score: f64,
    pub budget: f64,
}

impl FeatureVector {
    pub fn from_record(record: &MovieRecord) -> Self {
        Self {
            sentiment_score: record.sentiment_score,
            review_count: record.review_count as f64,
            positive_ratio: record.positive_ratio(),
            social_buzz_score: record.social_buzz_score as f64,
            budget: record.budget,
        }
    }

    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.sentiment_score,
            self.review_count,
            self.positive_ratio,
            self.social_buzz_score,
            self.budget,
        ]
    }
}

/// Row-per-record feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    values: Array2<f64>,
}

impl FeatureTable {
    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

/// One row per record, in input order.
pub fn build_features(records: &[MovieRecord]) -> FeatureTable {
    let mut values = Array2::<f64>::zeros((records.len(), FEATURE_COUNT));
    for (mut row, record) in values.rows_mut().into_iter().zip(records) {
        let features = FeatureVector::from_record(record).to_array();
        for (cell, value) in row.iter_mut().zip(features.iter()) {
            *cell = *value;
        }
    }
    FeatureTable { values }
}
