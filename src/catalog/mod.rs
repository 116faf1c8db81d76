// src/catalog/mod.rs
//! Demo movie catalogs for training and what-if runs.
use anyhow::{Context, Result};
use log::{info, warn};
use rand::Rng;
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::features::MovieRecord;

const GENRES: [&str; 8] = [
    "Sci-Fi", "Romance", "Mystery", "Action", "Comedy", "Drama", "Horror", "Animation",
];

fn movie(
    title: &str,
    genre: &str,
    release_date: &str,
    sentiment_score: f64,
    review_count: u64,
    positive_reviews: u64,
    social_buzz_score: i64,
    budget: f64,
) -> MovieRecord {
    MovieRecord {
        title: Some(title.to_string()),
        genre: Some(genre.to_string()),
        release_date: Some(release_date.to_string()),
        sentiment_score,
        review_count,
        positive_reviews,
        social_buzz_score,
        budget,
    }
}

/// The portal's showcase titles, with budget and buzz taken from its
/// competitor table.
pub fn sample_catalog() -> Vec<MovieRecord> {
    vec![
        movie("The Space Adventure", "Sci-Fi", "2024-06-15", 0.85, 1200, 950, 85, 100.0),
        movie("Love in Paris", "Romance", "2024-07-01", 0.75, 800, 600, 70, 85.0),
        movie("The Last Detective", "Mystery", "2024-05-30", 0.92, 1500, 1380, 90, 120.0),
        movie("Cosmic Journey", "Sci-Fi", "2024-08-09", 0.75, 950, 712, 70, 85.0),
        movie("Star Voyager", "Sci-Fi", "2024-09-20", 0.88, 1400, 1232, 90, 120.0),
    ]
}

/// `count` random movies within the dashboard's slider ranges.
pub fn generate_catalog<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<MovieRecord> {
    (0..count)
        .map(|i| {
            let sentiment_score = (rng.gen_range(0.0..=1.0_f64) * 100.0).round() / 100.0;
            let review_count = rng.gen_range(0..=5000u64);
            let positive_reviews = ((review_count as f64) * sentiment_score).floor() as u64;
            let genre = GENRES[rng.gen_range(0..GENRES.len())];
            MovieRecord {
                title: Some(format!("Generated Feature #{}", i + 1)),
                genre: Some(genre.to_string()),
                release_date: None,
                sentiment_score,
                review_count,
                positive_reviews: positive_reviews.min(review_count),
                social_buzz_score: rng.gen_range(0..=100),
                budget: (rng.gen_range(30.0..=200.0_f64) * 10.0).round() / 10.0,
            }
        })
        .collect()
}

/// Reads a JSON array of movie objects. Entries that fail validation are
/// reported and abort the load.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<MovieRecord>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let value: JsonValue = serde_json::from_str(&raw)
        .with_context(|| format!("Catalog {} is not valid JSON", path.display()))?;

    // Accept either a bare array or the portal's {"movies": [...]} shape.
    let entries = match &value {
        JsonValue::Array(items) => items,
        JsonValue::Object(obj) => obj
            .get("movies")
            .and_then(|m| m.as_array())
            .context("Catalog object has no \"movies\" array")?,
        _ => anyhow::bail!("Catalog {} must be a JSON array", path.display()),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match MovieRecord::from_json(entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("⚠️ Catalog entry {} rejected: {}", index, e);
                return Err(e).with_context(|| format!("Invalid catalog entry {}", index));
            }
        }
    }
    info!("📊 Loaded {} movies from {}", records.len(), path.display());
    Ok(records)
}
