use std::marker::PhantomData;

use num_traits::ToPrimitive;
use sylva::{Float, ParamGuard};
use sylva_trees::{MaxFeatures, RegressionTree, RegressionTreeParams, SplitCriterion};

use super::{
    BaselineEstimator, GradientBoostError, GradientBoostingClassifier, GradientBoostingRegressor,
    LossName, Result,
};

/// The kind of problem an ensemble is fitted for, deciding which losses are accepted
pub trait Task {
    const NAME: &'static str;
    const DEFAULT_LOSS: LossName;

    fn supports(loss: LossName) -> bool;
}

/// Regression on real-valued targets with `ls`, `lad`, `huber` or `quantile` loss
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Regression;

impl Task for Regression {
    const NAME: &'static str = "regression";
    const DEFAULT_LOSS: LossName = LossName::LeastSquares;

    fn supports(loss: LossName) -> bool {
        matches!(
            loss,
            LossName::LeastSquares
                | LossName::LeastAbsoluteDeviation
                | LossName::Huber
                | LossName::Quantile
        )
    }
}

/// Classification of labels `0..K` with the `deviance` loss or one of its aliases
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification;

impl Task for Classification {
    const NAME: &'static str = "classification";
    const DEFAULT_LOSS: LossName = LossName::Deviance;

    fn supports(loss: LossName) -> bool {
        matches!(
            loss,
            LossName::Deviance | LossName::BinomialDeviance | LossName::MultinomialDeviance
        )
    }
}

/// The set of hyperparameters that can be specified for fitting a gradient boosted ensemble
///
/// See [`GradientBoostingRegressor::params`] and [`GradientBoostingClassifier::params`] for the
/// defaults.
#[derive(Clone, Debug)]
pub struct GradientBoostingValidParams<F: Float, M> {
    loss: LossName,
    learning_rate: F,
    n_estimators: usize,
    subsample: F,
    alpha: F,
    init: Option<Box<dyn BaselineEstimator<F>>>,
    warm_start: bool,
    verbose: usize,
    seed: u64,
    tree: RegressionTreeParams<F>,
    task: PhantomData<M>,
}

impl<F: Float, M> GradientBoostingValidParams<F, M> {
    pub fn loss(&self) -> LossName {
        self.loss
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn subsample(&self) -> F {
        self.subsample
    }

    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// The baseline estimator, `None` selects the default of the loss
    pub fn init(&self) -> Option<&Box<dyn BaselineEstimator<F>>> {
        self.init.as_ref()
    }

    pub fn warm_start(&self) -> bool {
        self.warm_start
    }

    pub fn verbose(&self) -> usize {
        self.verbose
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Settings of the tree fitted for every stage and output
    pub fn tree_params(&self) -> &RegressionTreeParams<F> {
        &self.tree
    }
}

#[derive(Clone, Debug)]
pub struct GradientBoostingParams<F: Float, M>(GradientBoostingValidParams<F, M>);

impl<F: Float, M: Task> GradientBoostingParams<F, M> {
    pub fn new() -> Self {
        Self(GradientBoostingValidParams {
            loss: M::DEFAULT_LOSS,
            learning_rate: F::cast(0.1),
            n_estimators: 100,
            subsample: F::one(),
            alpha: F::cast(0.9),
            init: None,
            warm_start: false,
            verbose: 0,
            seed: 42,
            tree: RegressionTree::params()
                .criterion(SplitCriterion::FriedmanMse)
                .max_depth(Some(3)),
            task: PhantomData,
        })
    }
}

impl<F: Float, M: Task> Default for GradientBoostingParams<F, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, M> GradientBoostingParams<F, M> {
    /// Sets the loss minimised by the ensemble
    pub fn loss(mut self, loss: LossName) -> Self {
        self.0.loss = loss;
        self
    }

    /// Sets the factor shrinking the contribution of every stage
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Sets the number of boosting stages
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Sets the fraction of samples drawn without replacement for every stage
    ///
    /// Values below one enable the out-of-bag loss history.
    pub fn subsample(mut self, subsample: F) -> Self {
        self.0.subsample = subsample;
        self
    }

    /// Sets the quantile of the `huber` and `quantile` losses
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Sets the estimator of the initial prediction, `None` uses the default of the loss
    pub fn init(mut self, init: Option<Box<dyn BaselineEstimator<F>>>) -> Self {
        self.0.init = init;
        self
    }

    /// Continue fitting the model passed to `fit_with` instead of starting over
    pub fn warm_start(mut self, warm_start: bool) -> Self {
        self.0.warm_start = warm_start;
        self
    }

    /// Log a progress table while fitting, see [`VerboseReporter`](crate::VerboseReporter)
    pub fn verbose(mut self, verbose: usize) -> Self {
        self.0.verbose = verbose;
        self
    }

    /// Sets the seed of the generator drawing subsamples and candidate features
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.tree = self.0.tree.max_depth(max_depth);
        self
    }

    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.tree = self.0.tree.min_samples_split(min_samples_split);
        self
    }

    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.tree = self.0.tree.min_samples_leaf(min_samples_leaf);
        self
    }

    pub fn min_weight_fraction_leaf(mut self, min_weight_fraction_leaf: F) -> Self {
        self.0.tree = self.0.tree.min_weight_fraction_leaf(min_weight_fraction_leaf);
        self
    }

    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.tree = self.0.tree.min_impurity_decrease(min_impurity_decrease);
        self
    }

    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.tree = self.0.tree.max_features(max_features);
        self
    }

    pub fn max_leaf_nodes(mut self, max_leaf_nodes: Option<usize>) -> Self {
        self.0.tree = self.0.tree.max_leaf_nodes(max_leaf_nodes);
        self
    }

    pub fn criterion(mut self, criterion: SplitCriterion) -> Self {
        self.0.tree = self.0.tree.criterion(criterion);
        self
    }

    /// Replace all tree settings at once
    pub fn tree_params(mut self, tree: RegressionTreeParams<F>) -> Self {
        self.0.tree = tree;
        self
    }
}

impl<F: Float> GradientBoostingRegressor<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `loss = LossName::LeastSquares`
    /// * `learning_rate = 0.1`
    /// * `n_estimators = 100`
    /// * `subsample = 1.0`
    /// * `alpha = 0.9`
    /// * `init = None`
    /// * `warm_start = false`
    /// * `verbose = 0`
    /// * `seed = 42`
    /// * trees with `max_depth = Some(3)` and `SplitCriterion::FriedmanMse`, otherwise the
    ///   defaults of [`RegressionTree::params`]
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> GradientBoostingParams<F, Regression> {
        GradientBoostingParams::new()
    }
}

impl<F: Float> GradientBoostingClassifier<F> {
    /// Same defaults as [`GradientBoostingRegressor::params`] except for
    /// `loss = LossName::Deviance`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> GradientBoostingParams<F, Classification> {
        GradientBoostingParams::new()
    }
}

fn as_f64<F: Float>(value: F) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

impl<F: Float, M: Task> ParamGuard for GradientBoostingParams<F, M> {
    type Checked = GradientBoostingValidParams<F, M>;
    type Error = GradientBoostError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;

        if params.n_estimators == 0 {
            return Err(GradientBoostError::InvalidNEstimators(params.n_estimators));
        }
        if !(params.learning_rate > F::zero() && params.learning_rate.is_finite()) {
            return Err(GradientBoostError::InvalidLearningRate(as_f64(
                params.learning_rate,
            )));
        }
        if !M::supports(params.loss) {
            return Err(GradientBoostError::UnsupportedLoss {
                loss: params.loss,
                task: M::NAME,
            });
        }
        if !(params.subsample > F::zero() && params.subsample <= F::one()) {
            return Err(GradientBoostError::InvalidSubsample(as_f64(params.subsample)));
        }
        if params.loss.uses_alpha() && !(params.alpha > F::zero() && params.alpha < F::one()) {
            return Err(GradientBoostError::InvalidAlpha {
                loss: params.loss,
                alpha: as_f64(params.alpha),
            });
        }
        params
            .tree
            .check_ref()
            .map_err(GradientBoostError::TreeParams)?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
