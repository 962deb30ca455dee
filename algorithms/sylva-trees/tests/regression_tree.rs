use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Axis};
use ndarray_rand::rand::SeedableRng;
use rand::rngs::SmallRng;
use sylva::prelude::*;
use sylva_trees::{MaxFeatures, RegressionTree, SplitCriterion};

#[test]
fn friedman1_fit_beats_the_mean() {
    let mut rng = SmallRng::seed_from_u64(42);
    let (train, valid) =
        sylva_datasets::generate::make_friedman1(400, 10, 0.5, &mut rng).split_with_ratio(0.8);

    let tree = RegressionTree::params()
        .criterion(SplitCriterion::FriedmanMse)
        .max_depth(Some(6))
        .min_samples_leaf(5)
        .fit(&train)
        .unwrap();

    let prediction: Array1<f64> = tree.predict(&valid);
    let mean = train.targets().mean().unwrap();

    let tree_mse = (&prediction - valid.targets()).mapv(|r| r * r).mean().unwrap();
    let mean_mse = valid.targets().mapv(|y| (y - mean).powi(2)).mean().unwrap();
    assert!(tree_mse < 0.6 * mean_mse, "{} vs {}", tree_mse, mean_mse);

    // only the first five features carry signal
    let importance = tree.feature_importance();
    assert_abs_diff_eq!(importance.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
    assert!(importance[..5].iter().sum::<f64>() > 0.8);
}

#[test]
fn apply_and_predict_agree() {
    let mut rng = SmallRng::seed_from_u64(5);
    let dataset = sylva_datasets::generate::make_friedman1(200, 6, 1.0, &mut rng);

    let tree = RegressionTree::params()
        .max_leaf_nodes(Some(12))
        .max_features(MaxFeatures::Sqrt)
        .random_state(3)
        .fit(&dataset)
        .unwrap();

    let leaves = tree.apply(dataset.records());
    let prediction = tree.predict(dataset.records());
    for (leaf, value) in leaves.iter().zip(prediction.iter()) {
        assert!(tree.nodes()[*leaf].is_leaf());
        assert_eq!(tree.nodes()[*leaf].value(), *value);
    }

    // every training sample lands in a leaf which counted it
    let total: usize = tree
        .leaf_ids()
        .into_iter()
        .map(|leaf| tree.nodes()[leaf].n_samples())
        .sum();
    assert_eq!(total, dataset.nsamples());
    assert_eq!(tree.num_leaves(), 12);
}

#[test]
fn level_order_iteration_visits_every_node_once() {
    let records = array![[0.], [1.], [2.], [3.], [4.], [5.], [6.], [7.]];
    let targets = records.index_axis(Axis(1), 0).mapv(|x| x * x);
    let tree = RegressionTree::params()
        .max_depth(Some(3))
        .fit(&Dataset::new(records, targets))
        .unwrap();

    let depths = tree.iter_nodes().map(|node| node.depth()).collect::<Vec<_>>();
    assert_eq!(depths.len(), tree.nodes().len());
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(tree.max_depth(), 3);
    assert!(tree.num_leaves() <= 8);
}
