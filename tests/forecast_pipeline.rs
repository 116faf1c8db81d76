// tests/forecast_pipeline.rs
use box_office_lib::catalog::{generate_catalog, sample_catalog};
use box_office_lib::features::{build_features, MovieRecord, FEATURE_NAMES};
use box_office_lib::forecast::{
    estimate_confidence, predict, train, ForecastError, ForestParameters, TrainedModel,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;

fn movie(budget: f64, sentiment: f64, buzz: i64, reviews: u64, positive: u64) -> MovieRecord {
    MovieRecord {
        title: None,
        genre: None,
        release_date: None,
        sentiment_score: sentiment,
        review_count: reviews,
        positive_reviews: positive,
        social_buzz_score: buzz,
        budget,
    }
}

fn trained_on_catalog() -> (TrainedModel, Vec<MovieRecord>) {
    let mut catalog = sample_catalog();
    catalog.extend(generate_catalog(40, &mut StdRng::seed_from_u64(5)));
    let model = train(&catalog, &ForestParameters::default()).expect("training succeeds");
    (model, catalog)
}

#[test]
fn zero_review_count_uses_positive_reviews_as_ratio() {
    let table = build_features(&[movie(50.0, 0.5, 40, 0, 0), movie(50.0, 0.5, 40, 0, 2)]);
    assert_eq!(table.row(0)[2], 0.0);
    assert_eq!(table.row(1)[2], 2.0);
}

#[test]
fn feature_order_is_identical_for_training_and_inference() {
    let (model, catalog) = trained_on_catalog();
    let prediction = predict(&model, &catalog[0]).unwrap();
    let keys: Vec<&str> = prediction.ordered_importance().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, FEATURE_NAMES.to_vec());
    assert_eq!(build_features(&catalog[..1]).column_names(), &FEATURE_NAMES);
}

#[test]
fn repeated_predictions_are_identical() {
    let (model, catalog) = trained_on_catalog();
    let a = predict(&model, &catalog[3]).unwrap();
    let b = predict(&model, &catalog[3]).unwrap();
    assert_eq!(a.predicted_revenue, b.predicted_revenue);
    assert_eq!(a.feature_importance, b.feature_importance);
}

#[test]
fn feature_importance_is_a_distribution() {
    let (model, _) = trained_on_catalog();
    let importance = model.feature_importance();
    assert_eq!(importance.len(), FEATURE_NAMES.len());
    assert!(importance.values().all(|v| *v >= 0.0));
    let sum: f64 = importance.values().sum();
    assert!((sum - 1.0).abs() < 1e-9, "importance sums to {}", sum);
}

#[test]
fn confidence_interval_brackets_mean_across_calls() {
    let (model, catalog) = trained_on_catalog();
    let what_if = MovieRecord::from_parameters(100.0, 0.75, 80, 1000);
    for record in catalog.iter().take(5).chain(std::iter::once(&what_if)) {
        for _ in 0..3 {
            let result = estimate_confidence(&model, record).unwrap();
            let (low, high) = result.interval;
            assert!(low <= high);
            assert!(low <= result.mean_prediction + 1e-9);
            assert!(result.mean_prediction <= high + 1e-9);
        }
    }
}

#[test]
fn two_movie_training_roughly_memorizes() {
    let records = vec![
        movie(100.0, 0.75, 80, 1000, 750),
        movie(85.0, 0.70, 70, 800, 560),
    ];
    let model = train(&records, &ForestParameters::default()).unwrap();
    let predicted = predict(&model, &records[0]).unwrap().predicted_revenue;
    assert!(
        (predicted - 280.0).abs() < (predicted - 202.3).abs(),
        "prediction {} should sit closer to 280 than to 202.3",
        predicted
    );
}

#[test]
fn empty_training_set_is_rejected() {
    let result = train(&[], &ForestParameters::default());
    assert!(matches!(result, Err(ForecastError::EmptyTrainingSet)));
}

#[test]
fn sentiment_boundaries_give_finite_predictions() {
    let (model, _) = trained_on_catalog();
    for sentiment in [0.0, 1.0] {
        let record = MovieRecord::from_parameters(90.0, sentiment, 60, 900);
        let prediction = predict(&model, &record).unwrap();
        assert!(prediction.predicted_revenue.is_finite());
        let confidence = estimate_confidence(&model, &record).unwrap();
        assert!(confidence.mean_prediction.is_finite());
    }

    let boundary_training = vec![
        MovieRecord::from_parameters(50.0, 0.0, 20, 100),
        MovieRecord::from_parameters(150.0, 1.0, 90, 2000),
    ];
    let model = train(&boundary_training, &ForestParameters::default()).unwrap();
    let prediction = predict(&model, &boundary_training[1]).unwrap();
    assert!(prediction.predicted_revenue.is_finite());
}

#[test]
fn training_is_reproducible_for_a_seed() {
    let catalog = sample_catalog();
    let a = train(&catalog, &ForestParameters::default()).unwrap();
    let b = train(&catalog, &ForestParameters::default()).unwrap();
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    for record in &catalog {
        assert_eq!(
            predict(&a, record).unwrap().predicted_revenue,
            predict(&b, record).unwrap().predicted_revenue
        );
    }
}

#[test]
fn saved_model_reloads_identically() {
    let (model, catalog) = trained_on_catalog();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    model.save_json(&path).unwrap();

    let loaded = TrainedModel::load_json(&path).unwrap();
    assert_eq!(loaded.model_id, model.model_id);
    assert_eq!(loaded.fingerprint().unwrap(), model.fingerprint().unwrap());
    for record in catalog.iter().take(5) {
        assert_eq!(
            predict(&loaded, record).unwrap().predicted_revenue,
            predict(&model, record).unwrap().predicted_revenue
        );
    }
}

#[test]
fn json_record_missing_budget_is_invalid() {
    let value = serde_json::json!({
        "title": "The Last Detective",
        "sentiment_score": 0.92,
        "review_count": 1500,
        "positive_reviews": 1380,
        "social_buzz_score": 90
    });
    match MovieRecord::from_json(&value) {
        Err(ForecastError::InvalidFeature { field, .. }) => assert_eq!(field, "budget"),
        other => panic!("expected InvalidFeature, got {:?}", other),
    }
}

#[test]
fn model_is_shareable_across_threads() {
    let (model, catalog) = trained_on_catalog();
    let model = Arc::new(model);
    let expected = predict(&model, &catalog[0]).unwrap().predicted_revenue;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            let record = catalog[0].clone();
            thread::spawn(move || {
                let prediction = predict(&model, &record).unwrap();
                let confidence = estimate_confidence(&model, &record).unwrap();
                (prediction.predicted_revenue, confidence.interval)
            })
        })
        .collect();

    for handle in handles {
        let (revenue, (low, high)) = handle.join().unwrap();
        assert_eq!(revenue, expected);
        assert!(low <= high);
    }
}

#[test]
fn demo_catalog_importance_is_not_single_feature() {
    let catalog = sample_catalog();
    let model = train(&catalog, &ForestParameters::default()).unwrap();
    let credited = model.feature_importance().values().filter(|v| **v > 0.0).count();
    assert!(credited > 1, "importance: {:?}", model.feature_importance());

    let records = vec![
        movie(100.0, 0.75, 80, 1000, 750),
        movie(85.0, 0.70, 70, 800, 560),
    ];
    let model = train(&records, &ForestParameters::default()).unwrap();
    let credited = model.feature_importance().values().filter(|v| **v > 0.0).count();
    assert!(credited > 1, "importance: {:?}", model.feature_importance());
}

fn tampered_model_load(tamper: impl Fn(&mut serde_json::Value)) -> anyhow::Result<TrainedModel> {
    let (model, _) = trained_on_catalog();
    let mut value = serde_json::to_value(&model).unwrap();
    tamper(&mut value);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tampered.json");
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
    TrainedModel::load_json(&path)
}

#[test]
fn model_without_trees_fails_to_load() {
    let err = tampered_model_load(|v| v["forest"]["members"] = serde_json::json!([])).unwrap_err();
    assert!(format!("{:#}", err).contains("no trees"), "{:#}", err);
}

#[test]
fn model_with_short_scaler_fails_to_load() {
    let err = tampered_model_load(|v| {
        v["scaler"]["scale"].as_array_mut().unwrap().pop();
    })
    .unwrap_err();
    assert!(format!("{:#}", err).contains("scaler"), "{:#}", err);
}

#[test]
fn model_with_dangling_child_fails_to_load() {
    let err = tampered_model_load(|v| {
        let nodes = v["forest"]["members"][0]["nodes"].as_array_mut().unwrap();
        let split = nodes
            .iter_mut()
            .find(|n| n.get("Split").is_some())
            .expect("first tree has a split");
        split["Split"]["right"] = serde_json::json!(10_000);
    })
    .unwrap_err();
    assert!(format!("{:#}", err).contains("invalid child"), "{:#}", err);
}

#[test]
fn model_with_wrong_importance_length_fails_to_load() {
    let err = tampered_model_load(|v| v["forest"]["feature_importances"] = serde_json::json!([1.0])).unwrap_err();
    assert!(format!("{:#}", err).contains("importances"), "{:#}", err);
}
