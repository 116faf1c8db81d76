use anyhow::{Context, Result};
use box_office_lib::catalog::{generate_catalog, load_catalog, sample_catalog};
use box_office_lib::features::MovieRecord;
use box_office_lib::forecast::{
    backtest, estimate_confidence_with, predict, train_with_progress, TrainedModel,
};
use box_office_lib::utils::env::load_env;
use box_office_lib::utils::forecast_config::ForecastConfig;
use box_office_lib::utils::progress_bars::logging::ForecastLogger;
use box_office_lib::utils::progress_bars::progress_config::ProgressConfig;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Box office revenue forecast for a what-if movie", long_about = None)]
struct ForecastArgs {
    /// JSON catalog to train on (array or {"movies": [...]}); defaults to the demo catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Extra randomly generated movies appended to the training set
    #[arg(long, default_value_t = 0)]
    generated: usize,

    /// Reuse a previously saved model instead of training
    #[arg(long, conflicts_with_all = ["catalog", "generated"])]
    load_model: Option<PathBuf>,

    /// Write the trained model to this path
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// Production budget ($M)
    #[arg(long, default_value_t = 100.0)]
    budget: f64,

    /// Sentiment score (0.0 - 1.0)
    #[arg(long, default_value_t = 0.75)]
    sentiment: f64,

    /// Social buzz score (0 - 100)
    #[arg(long, default_value_t = 80)]
    buzz: i64,

    /// Expected review count
    #[arg(long, default_value_t = 1000)]
    review_count: u64,

    /// Number of catalog movies in the historical comparison
    #[arg(long, default_value_t = 20)]
    history: usize,

    /// Fix the confidence sampling seed for repeatable bands
    #[arg(long)]
    confidence_seed: Option<u64>,
}

fn format_currency(amount: f64) -> String {
    format!("${:.1}M", amount)
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = ForecastArgs::parse();

    let config = ForecastConfig::from_env();
    config.log_config();
    let progress_config = ProgressConfig::from_env();

    let logger = ForecastLogger::new("FORECAST", "🎬");

    let (model, catalog) = match &args.load_model {
        Some(path) => {
            logger.log_phase("Loading model", Some(path.display().to_string().as_str()));
            let model = TrainedModel::load_json(path)?;
            (model, sample_catalog())
        }
        None => {
            let mut catalog = match &args.catalog {
                Some(path) => load_catalog(path)?,
                None => sample_catalog(),
            };
            if args.generated > 0 {
                let mut rng = StdRng::seed_from_u64(config.forest.random_seed);
                catalog.extend(generate_catalog(args.generated, &mut rng));
            }
            let source = args
                .catalog
                .as_ref()
                .map_or_else(|| "demo catalog".to_string(), |p| p.display().to_string());
            logger.log_start(catalog.len(), &source);

            logger.log_phase("Training", None);
            let multi_progress = progress_config.create_multi_progress();
            let callback = multi_progress
                .as_ref()
                .map(|mp| progress_config.training_callback(mp, config.forest.n_estimators.max(1)));
            let model = train_with_progress(&catalog, &config.forest, callback.as_ref())
                .context("Failed to train revenue model")?;
            (model, catalog)
        }
    };
    logger.log_model_trained(&model);
    info!("Model fingerprint: {}", model.fingerprint()?);

    if let Some(path) = &args.save_model {
        model.save_json(path)?;
    }

    let what_if = MovieRecord::from_parameters(args.budget, args.sentiment, args.buzz, args.review_count);

    logger.log_phase("Prediction", None);
    let prediction = predict(&model, &what_if).context("Failed to predict revenue")?;
    logger.log_prediction(&prediction, args.budget);

    let confidence = match args.confidence_seed {
        Some(seed) => estimate_confidence_with(
            &model,
            &what_if,
            &config.confidence,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => estimate_confidence_with(
            &model,
            &what_if,
            &config.confidence,
            &mut rand::thread_rng(),
        ),
    }
    .context("Failed to estimate prediction confidence")?;
    logger.log_confidence(&confidence);

    let history = backtest(&model, &catalog, args.history).context("Failed to run historical comparison")?;

    println!("Predicted Box Office Revenue: {}", format_currency(prediction.predicted_revenue));
    println!(
        "Predicted ROI: {:.1}% ({} vs budget)",
        prediction.roi_percent(args.budget),
        format_currency(prediction.predicted_revenue - args.budget)
    );
    println!(
        "Confidence band (p{}-p{}): {} - {} (mean {}, std {:.2})",
        config.confidence.lower_percentile,
        config.confidence.upper_percentile,
        format_currency(confidence.interval.0),
        format_currency(confidence.interval.1),
        format_currency(confidence.mean_prediction),
        confidence.std_prediction
    );
    println!();
    println!("Feature importance:");
    for (name, importance) in prediction.ordered_importance() {
        println!("  {:<18} {:>6.3}", name, importance);
    }
    println!();
    println!("Historical performance:");
    for point in &history {
        println!(
            "  {:<24} budget {:>8}  predicted {:>9}  formula {:>9}",
            point.title.as_deref().unwrap_or("<untitled>"),
            format_currency(point.budget),
            format_currency(point.predicted_revenue),
            format_currency(point.synthetic_target)
        );
    }

    logger.log_completion();
    Ok(())
}
