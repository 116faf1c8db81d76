// src/bin/report_feature_importance.rs
use anyhow::{Context, Result};
use box_office_lib::forecast::TrainedModel;
use box_office_lib::utils::env::load_env;
use clap::Parser;
use log::info;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Report feature importance of a saved forecast model", long_about = None)]
struct ReportArgs {
    /// Path written by `box_office --save-model`
    model: PathBuf,

    /// Emit a JSON document instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = ReportArgs::parse();

    let model = TrainedModel::load_json(&args.model)
        .with_context(|| format!("Could not load model from {}", args.model.display()))?;
    let fingerprint = model.fingerprint()?;
    info!("Reporting on model {} ({})", model.model_id, fingerprint);

    let importance = model.feature_importance();
    let trees = model.forest().members();
    let avg_depth = trees.iter().map(|t| t.depth() as f64).sum::<f64>() / trees.len().max(1) as f64;
    let avg_leaves = trees.iter().map(|t| t.leaf_count() as f64).sum::<f64>() / trees.len().max(1) as f64;

    if args.json {
        let report = json!({
            "model_id": model.model_id,
            "fingerprint": fingerprint,
            "trained_at": model.trained_at.to_string(),
            "training_rows": model.training_rows,
            "parameters": model.parameters(),
            "trees": trees.len(),
            "avg_depth": avg_depth,
            "avg_leaves": avg_leaves,
            "feature_importance": importance,
            "scaler": {
                "mean": model.scaler().mean(),
                "scale": model.scaler().scale(),
            },
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to render report")?
        );
        return Ok(());
    }

    println!("Model:        {}", model.model_id);
    println!("Fingerprint:  {}", fingerprint);
    println!("Trained at:   {}", model.trained_at);
    println!("Training set: {} movies", model.training_rows);
    println!(
        "Forest:       {} trees, avg depth {:.1}, avg leaves {:.1}",
        trees.len(),
        avg_depth,
        avg_leaves
    );
    println!();

    let mut ranked: Vec<(&str, f64)> = importance.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    println!("{:<18} {:>10}", "feature", "importance");
    for (name, value) in ranked {
        let bar = "█".repeat((value * 40.0).round() as usize);
        println!("{:<18} {:>10.4}  {}", name, value, bar);
    }
    Ok(())
}
