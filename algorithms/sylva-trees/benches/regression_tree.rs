use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray_rand::rand::SeedableRng;
use rand::rngs::SmallRng;
use sylva::benchmarks::config;
use sylva::prelude::*;
use sylva_trees::{RegressionTree, SplitCriterion};

fn regression_tree_bench(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);

    let training_set_sizes = &[100, 1000, 10000];

    // the shape of the trees grown by a boosting stage
    let hyperparams = RegressionTree::params()
        .criterion(SplitCriterion::FriedmanMse)
        .max_depth(Some(3));

    let mut group = c.benchmark_group("regression_tree");
    config::set_default_benchmark_configs(&mut group);

    for n in training_set_sizes.iter() {
        let dataset = sylva_datasets::generate::make_friedman1(*n, 10, 1.0, &mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(n), &dataset, |b, d| {
            b.iter(|| hyperparams.fit(d))
        });
    }

    group.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = config::get_default_profiling_configs();
    targets = regression_tree_bench
}
#[cfg(target_os = "windows")]
criterion_group!(benches, regression_tree_bench);

criterion_main!(benches);
