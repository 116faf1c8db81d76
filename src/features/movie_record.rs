// src/features/movie_record.rs
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::forecast::error::ForecastError;

/// A single movie as supplied by the catalog or by the what-if inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Share of positive sentiment, in [0, 1].
    pub sentiment_score: f64,
    pub review_count: u64,
    pub positive_reviews: u64,
    /// Observed range is 0..=100.
    pub social_buzz_score: i64,
    /// Production budget in millions.
    pub budget: f64,
}

impl MovieRecord {
    /// Builds the ad-hoc record the dashboard assembles from its sliders.
    /// Positive reviews are derived as `floor(review_count * sentiment)`.
    pub fn from_parameters(
        budget: f64,
        sentiment_score: f64,
        social_buzz_score: i64,
        review_count: u64,
    ) -> Self {
        let positive_reviews = (review_count as f64 * sentiment_score).floor().max(0.0) as u64;
        Self {
            title: None,
            genre: None,
            release_date: None,
            sentiment_score,
            review_count,
            positive_reviews: positive_reviews.min(review_count),
            social_buzz_score,
            budget,
        }
    }

    /// Parses a loosely typed catalog entry. Missing or non-numeric required
    /// fields are reported by name.
    pub fn from_json(value: &JsonValue) -> Result<Self, ForecastError> {
        let obj = value.as_object().ok_or_else(|| {
            ForecastError::invalid("record", "expected a JSON object")
        })?;

        let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);

        let record = Self {
            title: text("title"),
            genre: text("genre"),
            release_date: text("release_date"),
            sentiment_score: number_field(obj, "sentiment_score")?,
            review_count: count_field(obj, "review_count")?,
            positive_reviews: count_field(obj, "positive_reviews")?,
            social_buzz_score: integer_field(obj, "social_buzz_score")?,
            budget: number_field(obj, "budget")?,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the invariants the feature builder relies on.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !self.sentiment_score.is_finite() || !(0.0..=1.0).contains(&self.sentiment_score) {
            return Err(ForecastError::invalid(
                "sentiment_score",
                format!("must be within [0, 1], got {}", self.sentiment_score),
            ));
        }
        if self.positive_reviews > self.review_count {
            return Err(ForecastError::invalid(
                "positive_reviews",
                format!(
                    "{} exceeds review_count {}",
                    self.positive_reviews, self.review_count
                ),
            ));
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(ForecastError::invalid(
                "budget",
                format!("must be a positive amount, got {}", self.budget),
            ));
        }
        Ok(())
    }

    /// `positive_reviews / (review_count + 1)`. The +1 keeps zero-review
    /// movies defined and is part of the model's feature definition.
    pub fn positive_ratio(&self) -> f64 {
        if self.review_count == 0 {
            debug!(
                "Division guard applied for {}: review_count is 0",
                self.display_name()
            );
        }
        self.positive_reviews as f64 / (self.review_count as f64 + 1.0)
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or("<untitled>")
    }
}

fn number_field(
    obj: &serde_json::Map<String, JsonValue>,
    key: &'static str,
) -> Result<f64, ForecastError> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Err(ForecastError::invalid(key, "field is missing")),
        Some(v) => v
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ForecastError::invalid(key, format!("expected a number, got {}", v))),
    }
}

fn integer_field(
    obj: &serde_json::Map<String, JsonValue>,
    key: &'static str,
) -> Result<i64, ForecastError> {
    let n = number_field(obj, key)?;
    if n.fract() != 0.0 {
        return Err(ForecastError::invalid(
            key,
            format!("expected an integer, got {}", n),
        ));
    }
    Ok(n as i64)
}

fn count_field(
    obj: &serde_json::Map<String, JsonValue>,
    key: &'static str,
) -> Result<u64, ForecastError> {
    let n = integer_field(obj, key)?;
    u64::try_from(n)
        .map_err(|_| ForecastError::invalid(key, format!("must not be negative, got {}", n)))
}
