//! Weighted regression trees
//!
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use super::NodeIter;
use super::{RegressionTreeValidParams, SplitCriterion};
use sylva::{
    dataset::AsSingleTargets,
    error::{Error, Result},
    traits::*,
    DatasetBase, Float,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Feature values closer than this end up on the same side of a split
const FEATURE_THRESHOLD: f64 = 1e-7;
/// Nodes with an impurity at or below this are not split any further
const MIN_IMPURITY_SPLIT: f64 = 1e-7;

/// Weighted first and second moments of the targets in a node
#[derive(Clone, Copy, Debug)]
struct NodeStats<F> {
    weight: F,
    sum: F,
    sq_sum: F,
}

impl<F: Float> NodeStats<F> {
    fn zero() -> Self {
        NodeStats {
            weight: F::zero(),
            sum: F::zero(),
            sq_sum: F::zero(),
        }
    }

    fn of(samples: &[usize], y: &ArrayView1<F>, weights: &[F]) -> Self {
        let mut stats = Self::zero();
        for &idx in samples {
            stats.add(y[idx], weights[idx]);
        }
        stats
    }

    fn add(&mut self, target: F, weight: F) {
        self.weight += weight;
        self.sum += weight * target;
        self.sq_sum += weight * target * target;
    }

    fn minus(&self, other: &Self) -> Self {
        NodeStats {
            weight: self.weight - other.weight,
            sum: self.sum - other.sum,
            sq_sum: self.sq_sum - other.sq_sum,
        }
    }

    fn mean(&self) -> F {
        self.sum / self.weight
    }

    /// Weighted variance of the targets
    fn impurity(&self) -> F {
        let mean = self.mean();
        (self.sq_sum / self.weight - mean * mean).max(F::zero())
    }
}

/// Best split of a node
#[derive(Clone, Copy, Debug)]
struct Split<F> {
    feature_idx: usize,
    threshold: F,
    /// Weighted impurity decrease, relative to the total weight of the tree
    improvement: F,
}

/// A splittable leaf waiting for expansion in best-first growth
struct Frontier<F> {
    node_id: usize,
    samples: Vec<usize>,
    split: Split<F>,
}

impl<F: Float> PartialEq for Frontier<F> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F: Float> Eq for Frontier<F> {}

impl<F: Float> PartialOrd for Frontier<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: Float> Ord for Frontier<F> {
    /// Larger improvement first, ties go to the older node
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .improvement
            .partial_cmp(&other.split.improvement)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node_id.cmp(&self.node_id))
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
/// A node in the regression tree
///
/// Nodes are stored in a flat arena owned by the tree and refer to their children by index.
pub struct TreeNode<F> {
    feature_idx: usize,
    split_value: F,
    impurity: F,
    impurity_decrease: F,
    value: F,
    n_samples: usize,
    weighted_n_samples: F,
    depth: usize,
    left_child: Option<usize>,
    right_child: Option<usize>,
}

impl<F: Float> TreeNode<F> {
    fn leaf(value: F, impurity: F, n_samples: usize, weighted_n_samples: F, depth: usize) -> Self {
        TreeNode {
            feature_idx: 0,
            split_value: F::zero(),
            impurity,
            impurity_decrease: F::zero(),
            value,
            n_samples,
            weighted_n_samples,
            depth,
            left_child: None,
            right_child: None,
        }
    }

    fn set_split(&mut self, split: &Split<F>, left_child: usize, right_child: usize) {
        self.feature_idx = split.feature_idx;
        self.split_value = split.threshold;
        self.impurity_decrease = split.improvement;
        self.left_child = Some(left_child);
        self.right_child = Some(right_child);
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.left_child.is_none()
    }

    /// Returns the depth of the node in the tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the value predicted by the node, the weighted mean of its training targets
    /// unless overwritten
    pub fn value(&self) -> F {
        self.value
    }

    /// Weighted variance of the training targets reaching the node
    pub fn impurity(&self) -> F {
        self.impurity
    }

    /// Number of training samples with positive weight reaching the node
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Total weight of the training samples reaching the node
    pub fn weighted_n_samples(&self) -> F {
        self.weighted_n_samples
    }

    /// Returns the split (feature index, threshold) of an internal node and `None` for leaves
    pub fn split(&self) -> Option<(usize, F)> {
        if self.is_leaf() {
            None
        } else {
            Some((self.feature_idx, self.split_value))
        }
    }

    /// Returns the indices of both children, first left then right
    pub fn children(&self) -> Option<(usize, usize)> {
        self.left_child.zip(self.right_child)
    }
}

/// A fitted regression tree.
///
/// ### Structure
/// Each internal node holds a feature and a threshold. Samples with `feature <= threshold` are
/// routed to the left child and all others to the right child. Leaves predict the weighted mean of
/// the training targets which reached them.
///
/// Nodes live in a flat arena and are addressed by their index. [`apply`](Self::apply) returns
/// these indices for the leaves reached by a set of samples, and
/// [`leaf_value_mut`](Self::leaf_value_mut) overwrites the prediction of a leaf. Together they
/// allow a boosting driver to replace leaf values by the optimal step of its loss.
///
/// ### Algorithm
///
/// Starting with a single root node, candidate splits are evaluated by an exhaustive sweep over
/// the sorted values of each candidate feature. The split maximising the
/// [criterion](enum.SplitCriterion.html) is applied unless a stopping rule from the
/// [parameters](struct.RegressionTreeParams.html) turns the node into a leaf. Without a limit
/// on the number of leaves the tree grows depth-first, otherwise the leaf with the largest
/// impurity decrease is expanded next.
///
/// Samples with zero weight take no part in fitting.
///
/// ### Example
///
/// ```rust
/// use sylva_trees::RegressionTree;
/// use sylva::prelude::*;
/// use ndarray::array;
///
/// let records = array![[1., 0.], [2., 0.], [3., 1.], [4., 1.]];
/// let dataset = Dataset::new(records.clone(), array![0.5, 0.5, 2., 2.]);
///
/// let tree = RegressionTree::params().fit(&dataset).unwrap();
///
/// assert_eq!(tree.num_leaves(), 2);
/// assert_eq!(tree.predict(&records), array![0.5, 0.5, 2., 2.]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree<F> {
    nodes: Vec<TreeNode<F>>,
    num_features: usize,
}

/// Grows a tree over the samples with positive weight
struct TreeBuilder<'a, 'x, 'y, 'r, F: Float, R: Rng> {
    x: ArrayView2<'x, F>,
    y: ArrayView1<'y, F>,
    weights: Vec<F>,
    params: &'a RegressionTreeValidParams<F>,
    max_features: usize,
    min_weight_leaf: F,
    total_weight: F,
    features: Vec<usize>,
    rng: &'r mut R,
    nodes: Vec<TreeNode<F>>,
}

impl<'a, 'x, 'y, 'r, F: Float, R: Rng> TreeBuilder<'a, 'x, 'y, 'r, F, R> {
    /// Appends a leaf for `samples` and looks for a split if the stopping rules allow one
    fn add_node(&mut self, samples: &[usize], depth: usize) -> (usize, Option<Split<F>>) {
        let stats = NodeStats::of(samples, &self.y, &self.weights);
        let impurity = stats.impurity();

        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::leaf(
            stats.mean(),
            impurity,
            samples.len(),
            stats.weight,
            depth,
        ));

        let n_samples = samples.len();
        let is_leaf = self
            .params
            .max_depth()
            .map(|max_depth| depth >= max_depth)
            .unwrap_or(false)
            || n_samples < self.params.min_samples_split()
            || n_samples < 2 * self.params.min_samples_leaf()
            || stats.weight < self.min_weight_leaf + self.min_weight_leaf
            || impurity <= F::cast(MIN_IMPURITY_SPLIT);

        if is_leaf {
            return (node_id, None);
        }

        let min_impurity_decrease = self.params.min_impurity_decrease();
        let split = self
            .find_split(samples, &stats)
            .filter(|split| split.improvement + F::epsilon() >= min_impurity_decrease);

        (node_id, split)
    }

    fn proxy_improvement(&self, left: &NodeStats<F>, right: &NodeStats<F>) -> F {
        match self.params.criterion() {
            SplitCriterion::Mse => {
                left.sum * left.sum / left.weight + right.sum * right.sum / right.weight
            }
            SplitCriterion::FriedmanMse => {
                let diff = right.weight * left.sum - left.weight * right.sum;
                diff * diff / (left.weight * right.weight)
            }
        }
    }

    fn find_split(&mut self, samples: &[usize], parent: &NodeStats<F>) -> Option<Split<F>> {
        if self.max_features < self.features.len() {
            self.features.shuffle(&mut *self.rng);
        }

        let feature_threshold = F::cast(FEATURE_THRESHOLD);
        let min_samples_leaf = self.params.min_samples_leaf();
        let mut column: Vec<(F, usize)> = Vec::with_capacity(samples.len());
        let mut best: Option<(usize, F, F)> = None;
        let mut visited = 0;

        for pos in 0..self.features.len() {
            if visited >= self.max_features {
                break;
            }
            let feature_idx = self.features[pos];

            column.clear();
            column.extend(samples.iter().map(|&idx| (self.x[(idx, feature_idx)], idx)));
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            // constant features are skipped and do not count as visited
            if column[column.len() - 1].0 <= column[0].0 + feature_threshold {
                continue;
            }
            visited += 1;

            // move the sorted samples one by one from the right to the left child
            let mut left = NodeStats::zero();
            for i in 0..column.len() - 1 {
                let (value, idx) = column[i];
                left.add(self.y[idx], self.weights[idx]);

                let next_value = column[i + 1].0;
                if next_value <= value + feature_threshold {
                    continue;
                }

                let n_left = i + 1;
                if n_left < min_samples_leaf || column.len() - n_left < min_samples_leaf {
                    continue;
                }

                let right = parent.minus(&left);
                if left.weight < self.min_weight_leaf || right.weight < self.min_weight_leaf {
                    continue;
                }

                let proxy = self.proxy_improvement(&left, &right);
                if best.map_or(true, |(_, _, best_proxy)| proxy > best_proxy) {
                    let mut threshold = (value + next_value) / F::cast(2.0);
                    if threshold >= next_value || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some((feature_idx, threshold, proxy));
                }
            }
        }

        let (feature_idx, threshold, _) = best?;

        let (mut left, mut right) = (NodeStats::zero(), NodeStats::zero());
        for &idx in samples {
            if self.x[(idx, feature_idx)] <= threshold {
                left.add(self.y[idx], self.weights[idx]);
            } else {
                right.add(self.y[idx], self.weights[idx]);
            }
        }

        let improvement = (parent.weight / self.total_weight)
            * (parent.impurity()
                - left.weight / parent.weight * left.impurity()
                - right.weight / parent.weight * right.impurity());

        Some(Split {
            feature_idx,
            threshold,
            improvement,
        })
    }

    fn partition(&self, samples: Vec<usize>, split: &Split<F>) -> (Vec<usize>, Vec<usize>) {
        samples
            .into_iter()
            .partition(|&idx| self.x[(idx, split.feature_idx)] <= split.threshold)
    }

    /// Grows the subtree below a new node in preorder and returns the index of that node
    fn grow_depth_first(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let (node_id, split) = self.add_node(&samples, depth);

        if let Some(split) = split {
            let (left, right) = self.partition(samples, &split);
            let left_child = self.grow_depth_first(left, depth + 1);
            let right_child = self.grow_depth_first(right, depth + 1);

            self.nodes[node_id].set_split(&split, left_child, right_child);
        }

        node_id
    }

    /// Expands the leaf with the largest impurity decrease until `max_leaf_nodes` is reached
    fn grow_best_first(&mut self, samples: Vec<usize>, max_leaf_nodes: usize) {
        let mut frontier = BinaryHeap::new();
        let (root, split) = self.add_node(&samples, 0);
        if let Some(split) = split {
            frontier.push(Frontier {
                node_id: root,
                samples,
                split,
            });
        }

        let mut n_leaves = 1;
        while n_leaves < max_leaf_nodes {
            let candidate = match frontier.pop() {
                Some(candidate) => candidate,
                None => break,
            };

            let depth = self.nodes[candidate.node_id].depth + 1;
            let (left, right) = self.partition(candidate.samples, &candidate.split);
            let (left_child, left_split) = self.add_node(&left, depth);
            let (right_child, right_split) = self.add_node(&right, depth);

            self.nodes[candidate.node_id].set_split(&candidate.split, left_child, right_child);
            n_leaves += 1;

            for (node_id, samples, split) in vec![
                (left_child, left, left_split),
                (right_child, right, right_split),
            ] {
                if let Some(split) = split {
                    frontier.push(Frontier {
                        node_id,
                        samples,
                        split,
                    });
                }
            }
        }
    }
}

impl<F: Float> RegressionTreeValidParams<F> {
    /// Fit a tree to the targets `y` of the records `x`, optionally weighting every sample
    ///
    /// Samples with a weight of zero are ignored. The generator `rng` only decides the order in
    /// which candidate features are visited when `max_features` is smaller than the number of
    /// features.
    pub fn fit_weighted<R: Rng>(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
        rng: &mut R,
    ) -> Result<RegressionTree<F>> {
        if x.nrows() != y.len() {
            return Err(Error::MismatchedShapes(x.nrows(), y.len()));
        }

        let weights = match sample_weight {
            Some(weights) if weights.len() != x.nrows() => {
                return Err(Error::MismatchedShapes(x.nrows(), weights.len()));
            }
            Some(weights) => weights.to_vec(),
            None => vec![F::one(); x.nrows()],
        };

        let samples: Vec<usize> = (0..x.nrows())
            .filter(|&idx| weights[idx] > F::zero())
            .collect();
        if samples.is_empty() {
            return Err(Error::NotEnoughSamples);
        }

        let total_weight = samples.iter().map(|&idx| weights[idx]).sum::<F>();
        let num_features = x.ncols();

        let mut builder = TreeBuilder {
            x,
            y,
            weights,
            params: self,
            max_features: self.max_features().resolve(num_features)?,
            min_weight_leaf: self.min_weight_fraction_leaf() * total_weight,
            total_weight,
            features: (0..num_features).collect(),
            rng,
            nodes: Vec::new(),
        };

        match self.max_leaf_nodes() {
            Some(max_leaf_nodes) => builder.grow_best_first(samples, max_leaf_nodes),
            None => {
                builder.grow_depth_first(samples, 0);
            }
        }

        Ok(RegressionTree {
            nodes: builder.nodes,
            num_features,
        })
    }
}

impl<F: Float, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for RegressionTreeValidParams<F>
where
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = RegressionTree<F>;

    /// Fit a regression tree using `hyperparamters` on the dataset consisting of
    /// a matrix of features `x`, an array of targets `y` and optional sample weights.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let weights = dataset
            .weights()
            .map(|weights| weights.iter().map(|&w| F::cast(w)).collect::<Array1<F>>());
        let mut rng = Xoshiro256Plus::seed_from_u64(self.random_state());

        self.fit_weighted(
            dataset.records().view(),
            dataset.as_single_targets(),
            weights.as_ref().map(|weights| weights.view()),
            &mut rng,
        )
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for RegressionTree<F>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = self.nodes[self.leaf_of(&row)].value;
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float> RegressionTree<F> {
    /// Index of the leaf reached by a single sample
    fn leaf_of(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> usize {
        let mut node_id = 0;
        while let Some((left, right)) = self.nodes[node_id].children() {
            node_id = if x[self.nodes[node_id].feature_idx] <= self.nodes[node_id].split_value {
                left
            } else {
                right
            };
        }
        node_id
    }

    /// Return the index of the leaf reached by each row of `x`
    pub fn apply(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<usize> {
        x.rows().into_iter().map(|row| self.leaf_of(&row)).collect()
    }

    /// Create a node iterator in level-order (BFT)
    pub fn iter_nodes(&self) -> NodeIter<F> {
        NodeIter::new(&self.nodes, 0)
    }

    /// Return all nodes of the tree, indexed by node id
    pub fn nodes(&self) -> &[TreeNode<F>] {
        &self.nodes
    }

    /// Return the ids of all leaves in ascending order
    pub fn leaf_ids(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Mutable access to the prediction of a leaf, `None` if `node_id` is not a leaf
    pub fn leaf_value_mut(&mut self, node_id: usize) -> Option<&mut F> {
        self.nodes
            .get_mut(node_id)
            .filter(|node| node.is_leaf())
            .map(|node| &mut node.value)
    }

    /// Return the number of features the tree was fitted on
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Return the total impurity decrease brought by the splits on each feature, normalised to
    /// sum to one
    ///
    /// A tree without any split yields zeros.
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![F::zero(); self.num_features];
        for node in self.nodes.iter().filter(|node| !node.is_leaf()) {
            importance[node.feature_idx] += node.impurity_decrease;
        }

        let total = importance.iter().cloned().sum::<F>();
        if total > F::zero() {
            importance.iter_mut().for_each(|val| *val /= total);
        }

        importance
    }

    /// Return max depth of the tree
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth))
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{MaxFeatures, RegressionTreeParams};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, s, Array, Array2};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand::rngs::SmallRng;
    use sylva::{Dataset, ParamGuard};

    #[test]
    fn node_stats_example() {
        let y = array![1., 2., 4.];
        let stats = NodeStats::of(&[0, 1, 2], &y.view(), &[1., 1., 2.]);

        // weighted mean is (1 + 2 + 8) / 4
        assert_abs_diff_eq!(stats.mean(), 2.75);
        // weighted variance is (1 + 4 + 32) / 4 - 2.75^2
        assert_abs_diff_eq!(stats.impurity(), 9.25 - 2.75 * 2.75, epsilon = 1e-12);
    }

    #[test]
    fn proxies_rank_splits_alike() {
        // both criteria prefer separating the two clusters
        let x = array![[0.], [1.], [2.], [10.], [11.]];
        let y = array![0., 0.1, 0.2, 5., 5.1];

        for criterion in &[SplitCriterion::Mse, SplitCriterion::FriedmanMse] {
            let tree = RegressionTree::params()
                .criterion(*criterion)
                .max_depth(Some(1))
                .check_unwrap()
                .fit_weighted(x.view(), y.view(), None, &mut SmallRng::seed_from_u64(0))
                .unwrap();

            assert_eq!(tree.nodes()[0].split(), Some((0, 6.)));
        }
    }

    #[test]
    /// Single feature test
    ///
    /// Generate a dataset where a single feature perfectly correlates
    /// with the target while the remaining features are random
    /// noise and do not add any information.
    fn single_feature_random_noise() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut data = Array::random_using((50, 10), Uniform::new(-4., 4.), &mut rng);
        data.slice_mut(s![.., 8]).assign(
            &(0..50)
                .map(|x| if x < 25 { 0.0 } else { 1.0 })
                .collect::<Array1<_>>(),
        );

        let targets = (0..50)
            .map(|x| if x < 25 { -1.0 } else { 3.0 })
            .collect::<Array1<f64>>();
        let dataset = Dataset::new(data, targets.clone());

        let model = RegressionTree::params().max_depth(Some(2)).fit(&dataset)?;

        let ground_truth = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for (imp, truth) in model.feature_importance().iter().zip(&ground_truth) {
            assert_abs_diff_eq!(imp, truth, epsilon = 1e-15);
        }

        assert_eq!(model.num_leaves(), 2);
        assert_abs_diff_eq!(model.predict(dataset.records()), targets);

        Ok(())
    }

    #[test]
    /// Check that for random data the max depth is used
    fn check_max_depth() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);

        let data = Array::random_using((50, 50), Uniform::new(-1., 1.), &mut rng);
        let targets = (0..50).map(|x| x as f64).collect::<Array1<_>>();

        let dataset = Dataset::new(data, targets);

        for max_depth in &[1, 3, 5] {
            let model = RegressionTree::params()
                .max_depth(Some(*max_depth))
                .fit(&dataset)?;
            assert_eq!(model.max_depth(), *max_depth);
        }

        Ok(())
    }

    #[test]
    fn unlimited_tree_interpolates_training_data() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let data: Array2<f64> = Array::random_using((30, 3), Uniform::new(0., 1.), &mut rng);
        let targets = Array::random_using(30, Uniform::new(-5., 5.), &mut rng);
        let dataset = Dataset::new(data.clone(), targets.clone());

        let model = RegressionTree::params().fit(&dataset)?;

        assert_eq!(model.num_leaves(), 30);
        assert_abs_diff_eq!(model.predict(&data), targets, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn min_samples_leaf_is_honoured() -> Result<()> {
        let data = Array::linspace(0., 1., 20).into_shape((20, 1)).unwrap();
        let targets = (0..20).map(|x| x as f64).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        let model = RegressionTree::params().min_samples_leaf(4).fit(&dataset)?;

        for node in model.iter_nodes().filter(|node| node.is_leaf()) {
            assert!(node.n_samples() >= 4);
        }

        Ok(())
    }

    #[test]
    fn zero_weight_samples_are_ignored() -> Result<()> {
        let data = array![[0.], [1.], [2.], [3.], [4.]];
        let targets = array![1., 1., 100., 1., 1.];
        let weights = array![1., 1., 0., 1., 1.];

        let model = RegressionTree::params()
            .check_unwrap()
            .fit_weighted(
                data.view(),
                targets.view(),
                Some(weights.view()),
                &mut SmallRng::seed_from_u64(0),
            )?;

        assert_eq!(model.num_leaves(), 1);
        assert_eq!(model.nodes()[0].n_samples(), 4);
        assert_abs_diff_eq!(model.predict(&data), array![1., 1., 1., 1., 1.]);

        Ok(())
    }

    #[test]
    fn leaf_values_are_weighted_means() -> Result<()> {
        let data = array![[0.], [0.], [5.], [5.]];
        let dataset = Dataset::new(data, array![1., 4., 10., 10.])
            .with_weights(Array1::from(vec![2., 1., 1., 1.]));

        let model = RegressionTree::params().fit(&dataset)?;

        let leaves = model.apply(dataset.records());
        assert_eq!(leaves[0], leaves[1]);
        assert_abs_diff_eq!(model.nodes()[leaves[0]].value(), 2.0);
        assert_abs_diff_eq!(model.nodes()[leaves[0]].weighted_n_samples(), 3.0);

        Ok(())
    }

    #[test]
    fn best_first_growth_limits_leaves() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(1);
        let data: Array2<f64> = Array::random_using((100, 4), Uniform::new(0., 1.), &mut rng);
        let targets = data.rows().into_iter().map(|row| row.sum()).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        for max_leaf_nodes in &[2, 5, 17] {
            let model = RegressionTree::params()
                .max_leaf_nodes(Some(*max_leaf_nodes))
                .fit(&dataset)?;
            assert_eq!(model.num_leaves(), *max_leaf_nodes);
            assert_eq!(model.leaf_ids().len(), *max_leaf_nodes);
        }

        Ok(())
    }

    #[test]
    fn overwritten_leaf_values_are_predicted() -> Result<()> {
        let data = array![[0.], [1.], [2.], [3.]];
        let dataset = Dataset::new(data.clone(), array![1., 1., 5., 5.]);
        let mut model = RegressionTree::params().fit(&dataset)?;

        let leaves = model.apply(&data);
        *model.leaf_value_mut(leaves[0]).unwrap() = -2.0;

        assert!(model.leaf_value_mut(0).is_none());
        assert_eq!(model.predict(&data), array![-2., -2., 5., 5.]);

        Ok(())
    }

    #[test]
    fn feature_subsampling_is_seeded() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(3);
        let data: Array2<f64> = Array::random_using((60, 8), Uniform::new(0., 1.), &mut rng);
        let targets = data.column(2).mapv(|v| v * 3.) + data.column(5);
        let dataset = Dataset::new(data, targets);

        let params: RegressionTreeParams<f64> = RegressionTree::params()
            .max_depth(Some(4))
            .max_features(MaxFeatures::Count(2))
            .random_state(11);

        let first = params.fit(&dataset)?;
        let second = params.fit(&dataset)?;
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn rejects_invalid_input() {
        let params = RegressionTree::<f64>::params().check_unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let data = array![[0.], [1.]];

        let mismatch = params.fit_weighted(data.view(), array![1.].view(), None, &mut rng);
        assert!(matches!(mismatch, Err(Error::MismatchedShapes(2, 1))));

        let no_weight = params.fit_weighted(
            data.view(),
            array![1., 2.].view(),
            Some(array![0., 0.].view()),
            &mut rng,
        );
        assert!(matches!(no_weight, Err(Error::NotEnoughSamples)));
    }

    #[test]
    fn fitted_tree_outlives_its_targets_and_generator() {
        let params = RegressionTree::<f64>::params()
            .max_features(MaxFeatures::Count(1))
            .check_unwrap();
        let data = array![[0., 3.], [1., 2.], [2., 1.], [3., 0.]];
        let mut rng = SmallRng::seed_from_u64(2);

        // targets built per round and dropped while the trees and the generator live on
        let mut trees = Vec::new();
        for shift in 0..3 {
            let targets = data.column(0).mapv(|x| x + shift as f64);
            trees.push(
                params
                    .fit_weighted(data.view(), targets.view(), None, &mut rng)
                    .unwrap(),
            );
        }

        for (shift, tree) in trees.iter().enumerate() {
            let prediction: Array1<f64> = tree.predict(&data);
            assert_abs_diff_eq!(
                prediction,
                data.column(0).mapv(|x| x + shift as f64),
                epsilon = 1e-12
            );
        }
    }
}
