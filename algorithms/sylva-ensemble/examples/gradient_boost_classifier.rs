use ndarray::Array1;
use ndarray_rand::rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing_subscriber::EnvFilter;

use sylva::prelude::*;
use sylva_ensemble::{GradientBoostingClassifier, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut rng = SmallRng::seed_from_u64(42);
    let (train, test) = sylva_datasets::generate::make_hastie_10_2(4000, &mut rng)
        .split_with_ratio(0.8);

    println!("Training model with gradient boosting ...");
    let model = GradientBoostingClassifier::params()
        .n_estimators(200)
        .learning_rate(0.5)
        .max_depth(Some(1))
        .verbose(1)
        .fit(&train)?;

    let prediction: Array1<usize> = model.predict(test.records());
    let correct = prediction
        .iter()
        .zip(test.targets().iter())
        .filter(|(p, t)| p == t)
        .count();

    println!(
        "Test accuracy with {} boosted stumps: {:.2}%",
        model.n_stages(),
        100.0 * correct as f64 / test.nsamples() as f64
    );
    println!(
        "Class probabilities of the first test sample: {:.3}",
        model.predict_proba(test.records())?.row(0)
    );

    Ok(())
}
