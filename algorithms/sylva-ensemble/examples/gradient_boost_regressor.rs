use ndarray::Array1;
use ndarray_rand::rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing_subscriber::EnvFilter;

use sylva::prelude::*;
use sylva_ensemble::{EarlyStopping, GradientBoostingRegressor, LossName, Result};

fn main() -> Result<()> {
    // RUST_LOG=sylva_ensemble=debug shows every fitted stage
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut rng = SmallRng::seed_from_u64(42);
    let (train, valid) = sylva_datasets::generate::make_friedman1(2000, 10, 1.0, &mut rng)
        .split_with_ratio(0.8);

    println!("Training model with gradient boosting ...");
    let mut early_stopping = EarlyStopping::<f64>::new(25);
    let model = GradientBoostingRegressor::params()
        .loss(LossName::Huber)
        .n_estimators(1000)
        .learning_rate(0.05)
        .subsample(0.5)
        .max_depth(Some(4))
        .verbose(1)
        .fit_with_monitor(None, &train, &mut early_stopping)?;

    println!(
        "Stopped after {} stages, best out-of-bag loss at stage {}",
        model.n_stages(),
        early_stopping.best_stage() + 1
    );

    for (stage, prediction) in model.staged_predict(valid.records())?.enumerate() {
        if (stage + 1) % 50 == 0 {
            println!("stage {:>4}: validation mse {:.4}", stage + 1, mse(&prediction, valid.targets()));
        }
    }

    let prediction: Array1<f64> = model.predict(valid.records());
    println!("Final validation mse: {:.4}", mse(&prediction, valid.targets()));
    println!("Feature importance: {:.3}", model.feature_importance()?);

    Ok(())
}

fn mse(prediction: &Array1<f64>, truth: &Array1<f64>) -> f64 {
    (prediction - truth).mapv(|r| r * r).mean().unwrap_or(0.)
}
