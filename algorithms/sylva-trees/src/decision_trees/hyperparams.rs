use sylva::{
    error::{Error, Result},
    Float, ParamGuard,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::RegressionTree;

/// The metric used to rank candidate splits of a node
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Weighted mean squared error of the two children. The best split maximises
    /// `sum_left^2 / w_left + sum_right^2 / w_right`, which is equivalent to minimising the
    /// weighted variance of the children.
    Mse,
    /// Friedman's improvement score, `w_left * w_right / (w_left + w_right) * (mean_left - mean_right)^2`.
    /// Prefers splits which separate the means of the children, and is the usual choice for
    /// the trees of a boosted ensemble.
    FriedmanMse,
}

/// Number of features considered when looking for the best split of a node
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
    /// `max(1, floor(log2(n_features)))`
    Log2,
    /// A fixed number of features, at most `n_features`
    Count(usize),
    /// `max(1, floor(fraction * n_features))` with the fraction in `(0, 1]`
    Fraction(f32),
}

impl MaxFeatures {
    /// Resolve the number of features to visit for a feature matrix with `n_features` columns
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        let resolved = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::Log2 => ((n_features as f64).log2() as usize).max(1),
            MaxFeatures::Count(count) if count > n_features => {
                return Err(Error::Parameters(format!(
                    "max_features must be in (0, n_features = {}], but was {}",
                    n_features, count
                )))
            }
            MaxFeatures::Count(count) => count,
            MaxFeatures::Fraction(fraction) => {
                ((fraction as f64 * n_features as f64) as usize).max(1)
            }
        };

        Ok(resolved.min(n_features))
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [regression tree](struct.RegressionTree.html).
///
/// ### Example
///
/// ```rust
/// use sylva_trees::{RegressionTree, SplitCriterion};
/// use sylva::prelude::*;
/// use ndarray::array;
///
/// let records = array![[0.], [1.], [2.], [3.]];
/// let dataset = Dataset::new(records.clone(), array![1., 1., 5., 5.]);
///
/// let tree = RegressionTree::params()
///     .criterion(SplitCriterion::FriedmanMse)
///     .max_depth(Some(1))
///     .fit(&dataset)
///     .unwrap();
///
/// assert_eq!(tree.predict(&records), array![1., 1., 5., 5.]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegressionTreeValidParams<F> {
    criterion: SplitCriterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    min_weight_fraction_leaf: F,
    min_impurity_decrease: F,
    max_features: MaxFeatures,
    max_leaf_nodes: Option<usize>,
    random_state: u64,
}

impl<F: Float> RegressionTreeValidParams<F> {
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn min_weight_fraction_leaf(&self) -> F {
        self.min_weight_fraction_leaf
    }

    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn max_leaf_nodes(&self) -> Option<usize> {
        self.max_leaf_nodes
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegressionTreeParams<F>(RegressionTreeValidParams<F>);

impl<F: Float> RegressionTreeParams<F> {
    pub fn new() -> Self {
        Self(RegressionTreeValidParams {
            criterion: SplitCriterion::Mse,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_weight_fraction_leaf: F::zero(),
            min_impurity_decrease: F::zero(),
            max_features: MaxFeatures::All,
            max_leaf_nodes: None,
            random_state: 0,
        })
    }

    /// Sets the metric used to rank candidate splits
    pub fn criterion(mut self, criterion: SplitCriterion) -> Self {
        self.0.criterion = criterion;
        self
    }

    /// Sets the optional limit to the depth of the tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples a node needs before it is split
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples each child of a split has to receive
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the minimum fraction of the total sample weight each child of a split has to receive
    pub fn min_weight_fraction_leaf(mut self, min_weight_fraction_leaf: F) -> Self {
        self.0.min_weight_fraction_leaf = min_weight_fraction_leaf;
        self
    }

    /// Sets the minimum weighted impurity decrease a split has to bring in order to be applied
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Sets the number of features visited when looking for the best split
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Grow the tree best-first with at most `max_leaf_nodes` leaves
    ///
    /// With `None` the tree is grown depth-first and the number of leaves is unlimited.
    pub fn max_leaf_nodes(mut self, max_leaf_nodes: Option<usize>) -> Self {
        self.0.max_leaf_nodes = max_leaf_nodes;
        self
    }

    /// Sets the seed of the generator that picks the candidate features of each node
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = random_state;
        self
    }
}

impl<F: Float> Default for RegressionTreeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> RegressionTree<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `criterion = SplitCriterion::Mse`
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `min_weight_fraction_leaf = 0.0`
    /// * `min_impurity_decrease = 0.0`
    /// * `max_features = MaxFeatures::All`
    /// * `max_leaf_nodes = None`
    /// * `random_state = 0`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RegressionTreeParams<F> {
        RegressionTreeParams::new()
    }
}

impl<F: Float> ParamGuard for RegressionTreeParams<F> {
    type Checked = RegressionTreeValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;

        if params.max_depth == Some(0) {
            return Err(Error::Parameters(
                "max_depth should be greater than zero, but was 0".to_string(),
            ));
        }
        if params.min_samples_split < 2 {
            return Err(Error::Parameters(format!(
                "min_samples_split should be at least 2, but was {}",
                params.min_samples_split
            )));
        }
        if params.min_samples_leaf < 1 {
            return Err(Error::Parameters(format!(
                "min_samples_leaf should be at least 1, but was {}",
                params.min_samples_leaf
            )));
        }
        if !(params.min_weight_fraction_leaf >= F::zero()
            && params.min_weight_fraction_leaf <= F::cast(0.5))
        {
            return Err(Error::Parameters(format!(
                "min_weight_fraction_leaf should be in [0, 0.5], but was {}",
                params.min_weight_fraction_leaf
            )));
        }
        if !(params.min_impurity_decrease >= F::zero() && params.min_impurity_decrease.is_finite())
        {
            return Err(Error::Parameters(format!(
                "min_impurity_decrease should be a non-negative number, but was {}",
                params.min_impurity_decrease
            )));
        }
        match params.max_features {
            MaxFeatures::Count(0) => {
                return Err(Error::Parameters(
                    "max_features should be at least 1, but was 0".to_string(),
                ))
            }
            MaxFeatures::Fraction(fraction) if !(fraction > 0.0 && fraction <= 1.0) => {
                return Err(Error::Parameters(format!(
                    "max_features fraction should be in (0, 1], but was {}",
                    fraction
                )))
            }
            _ => {}
        }
        if let Some(max_leaf_nodes) = params.max_leaf_nodes {
            if max_leaf_nodes < 2 {
                return Err(Error::Parameters(format!(
                    "max_leaf_nodes should be at least 2, but was {}",
                    max_leaf_nodes
                )));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
