//! Regret-minimizing ensemble example.
//!
//! Run with: cargo run --example mlewa

use anofox_ensemble::core::ForecastTable;
use anofox_ensemble::ensembles::{ForecastingEnsemble, LossType, MLewa, MixtureConfig};
use chrono::{Duration, TimeZone, Utc};

fn main() {
    println!("=== MLewa Ensemble Example ===\n");

    println!("MLewa learns combination weights online:");
    println!("  - Replays in-sample forecasts row by row");
    println!("  - Tracks each model's regret against the mixture");
    println!("  - Shifts weight toward models it regrets ignoring\n");

    // Two daily series with trend and a weekly cycle
    let n = 60;
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut ids = Vec::new();
    let mut ds = Vec::new();
    let mut y = Vec::new();
    for (series, level) in [("store_1", 100.0), ("store_2", 40.0)] {
        for i in 0..n {
            ids.push(series.to_string());
            ds.push(base + Duration::days(i as i64));
            y.push(level + 0.5 * i as f64 + 5.0 * (i as f64 * 0.9).sin());
        }
    }

    // In-sample forecasts of three models of varying quality
    let naive: Vec<f64> = y
        .iter()
        .enumerate()
        .map(|(i, v)| if i % n == 0 { *v } else { y[i - 1] })
        .collect();
    let trend: Vec<f64> = y.iter().map(|v| v + 1.5).collect();
    let flat: Vec<f64> = y.iter().map(|v| v * 0.8).collect();

    let insample = ForecastTable::builder()
        .unique_id(ids)
        .ds(ds)
        .target(y)
        .model("Naive", naive)
        .model("Trend", trend)
        .model("Flat", flat)
        .build()
        .unwrap();
    println!("Data: {} rows, models {:?}\n", insample.len(), insample.expert_columns());

    // 1. Per-series weights
    println!("--- Per-series Weights ---");
    let config = MixtureConfig::new(LossType::Square, false)
        .with_weight_by_uid(true)
        .with_inferred_frequency(&insample)
        .unwrap();
    println!("Inferred frequency: {}", config.frequency);

    let mut ensemble = MLewa::new(config).unwrap();
    ensemble.fit(&insample).unwrap();
    for id in ["store_1", "store_2"] {
        println!("{id}: {:?}", ensemble.weights(id).unwrap());
    }

    let scores = ensemble.evaluate_base_fcst(&insample, true).unwrap();
    println!("\nWindowed SMAPE of the base models:");
    for (id, row) in scores.iter() {
        println!("  {id}: {row:.3?}");
    }

    // 2. Global weights with trimming
    println!("\n--- Global Weights, trim_ratio = 0.5 ---");
    let config = MixtureConfig::new(LossType::Absolute, true).with_trim_ratio(0.5);
    let mut trimmed = MLewa::new(config).unwrap();
    trimmed.fit(&insample).unwrap();
    println!("Kept models: {}", trimmed.trim().n_models);

    // Out-of-sample forecasts for the next three days
    let h = 3;
    let fcst = ForecastTable::builder()
        .unique_id(vec!["store_1".to_string(); h])
        .model("Naive", vec![130.0; h])
        .model("Trend", vec![131.5, 132.0, 132.5])
        .model("Flat", vec![104.0; h])
        .build()
        .unwrap();

    for (name, model) in [("per-series", &ensemble), ("trimmed", &trimmed)] {
        let combined = model.predict(&fcst).unwrap();
        println!("\n{} forecast ({name}):", combined.name());
        for (i, pred) in combined.values().iter().enumerate() {
            println!("  h={}: {:.4}", i + 1, pred);
        }
    }
}
