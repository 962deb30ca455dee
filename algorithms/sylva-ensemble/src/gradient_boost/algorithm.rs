use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use sylva::{Float, ParamGuard};
use sylva_trees::RegressionTreeValidParams;
use tracing::{debug, warn};

use super::{
    init::baseline_prediction, BaselineEstimator, FitObserver, GradientBoostError,
    GradientBoostingValidParams, History, Loss, Monitor, Result, Stage, StageBuffer, Task,
    VerboseReporter,
};

/// An additive ensemble of regression trees fitted stage by stage
///
/// The state shared by [`GradientBoostingRegressor`](crate::GradientBoostingRegressor) and
/// [`GradientBoostingClassifier`](crate::GradientBoostingClassifier): the fitted baseline
/// estimator, one [`Stage`] per boosting iteration with a tree for each of the `K` outputs, the
/// fitted loss and the score history. Raw scores have one column per output, `K = 1` for
/// regression and binary classification.
///
/// The default value is an unfitted ensemble.
#[derive(Clone, Debug)]
pub struct GradientBoosting<F: Float> {
    stages: StageBuffer<Stage<F>>,
    history: History<F>,
    loss: Option<Loss<F>>,
    init: Option<Box<dyn BaselineEstimator<F>>>,
    n_features: usize,
}

impl<F: Float> Default for GradientBoosting<F> {
    fn default() -> Self {
        GradientBoosting {
            stages: StageBuffer::default(),
            history: History::default(),
            loss: None,
            init: None,
            n_features: 0,
        }
    }
}

impl<F: Float> GradientBoosting<F> {
    /// Number of fitted stages
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage<F>] {
        self.stages.as_slice()
    }

    pub fn history(&self) -> &History<F> {
        &self.history
    }

    /// Loss of every stage on its in-bag samples
    pub fn train_score(&self) -> &[F] {
        self.history.train_score()
    }

    /// Loss of every stage on its out-of-bag samples, `None` without subsampling
    pub fn oob_score(&self) -> Option<&[F]> {
        self.history.oob_score()
    }

    /// Decrease of the out-of-bag loss brought by every stage, `None` without subsampling
    pub fn oob_improvement(&self) -> Option<&[F]> {
        self.history.oob_improvement()
    }

    /// The fitted loss, including the state it keeps between stages
    pub fn loss(&self) -> Option<&Loss<F>> {
        self.loss.as_ref()
    }

    pub fn init(&self) -> Option<&dyn BaselineEstimator<F>> {
        self.init.as_deref()
    }

    /// Number of trees per stage, zero before fitting
    pub fn n_outputs(&self) -> usize {
        self.loss.as_ref().map_or(0, Loss::n_outputs)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_predict<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        operation: &'static str,
    ) -> Result<&dyn BaselineEstimator<F>> {
        let init = match self.init.as_deref() {
            Some(init) if self.is_fitted() => init,
            _ => return Err(GradientBoostError::NotFitted(operation)),
        };
        if x.ncols() != self.n_features {
            return Err(GradientBoostError::FeatureMismatch {
                expected: self.n_features,
                found: x.ncols(),
            });
        }
        if x.iter().any(|value| !value.is_finite()) {
            return Err(GradientBoostError::InvalidInput(
                "records contain NaN or infinite values".to_string(),
            ));
        }

        Ok(init)
    }

    /// Raw scores of the ensemble with shape `(n_samples, K)`
    ///
    /// The baseline prediction plus the contribution of every stage, scaled by the learning rate
    /// it was fitted with, accumulated in stage order.
    pub fn decision_function(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let init = self.check_predict(x, "decision_function")?;

        let mut score = baseline_prediction(init, x.view(), self.n_outputs())?;
        for stage in self.stages() {
            stage.add_to(x, &mut score);
        }
        Ok(score)
    }

    /// Raw scores after each stage, in stage order
    ///
    /// The iterator is lazy and yields [`n_stages`](Self::n_stages) arrays. Clone it (or call
    /// this method again) to start over.
    pub fn staged_decision_function<'a>(
        &'a self,
        x: &'a ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<StagedDecisionFunction<'a, F>> {
        let init = self.check_predict(x, "staged_decision_function")?;
        let score = baseline_prediction(init, x.view(), self.n_outputs())?;

        Ok(StagedDecisionFunction {
            x: x.view(),
            stages: self.stages().iter(),
            score,
        })
    }

    /// Importance of every feature, the mean over stages of the mean over the trees of a stage
    pub fn feature_importance(&self) -> Result<Array1<F>> {
        if !self.is_fitted() {
            return Err(GradientBoostError::NotFitted("feature_importance"));
        }

        let total = self
            .stages()
            .iter()
            .fold(Array1::zeros(self.n_features), |total, stage| {
                total + stage.feature_importance(self.n_features)
            });
        Ok(total / F::cast(self.n_stages()))
    }

    /// Fit the stages of the ensemble to the records `x` and the targets `y`
    ///
    /// Classification targets are the labels `0..n_classes` as floats, regression passes
    /// `n_classes = 1`. Records and targets have been validated by the caller. Returns the number
    /// of fitted stages.
    pub(crate) fn fit_stages<M: Task>(
        &mut self,
        params: &GradientBoostingValidParams<F, M>,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        n_classes: usize,
        monitor: &mut dyn Monitor<F>,
        observer: &mut dyn FitObserver<F>,
    ) -> Result<usize> {
        let mut loss = Loss::from_name(params.loss(), n_classes, params.alpha())?;
        let tree_params = params
            .tree_params()
            .check()
            .map_err(GradientBoostError::TreeParams)?;
        if params.loss().is_deprecated() {
            warn!(
                loss = %params.loss(),
                "deprecated loss alias, use 'deviance' instead"
            );
        }

        let n_estimators = params.n_estimators();
        let track_oob = params.subsample() < F::one();

        if !params.warm_start() {
            *self = GradientBoosting::default();
        }

        let mut pred = if self.is_fitted() {
            self.resume(&loss, x, n_estimators, track_oob)?
        } else {
            let mut init = match params.init() {
                Some(init) => init.clone(),
                None => loss.init_estimator(),
            };
            init.fit(x, y)?;
            let pred = baseline_prediction(&*init, x, loss.n_outputs())?;

            *self = GradientBoosting {
                stages: StageBuffer::with_planned(n_estimators),
                history: History::new(n_estimators, track_oob),
                loss: None,
                init: Some(init),
                n_features: x.ncols(),
            };
            pred
        };
        self.loss = Some(loss.clone());

        let n_samples = y.len();
        let n_inbag = (params.subsample() * F::cast(n_samples))
            .to_usize()
            .unwrap_or(n_samples)
            .max(1);
        let begin_at_stage = self.n_stages();
        let mut rng = Xoshiro256Plus::seed_from_u64(params.seed());
        let mut reporter = match params.verbose() {
            0 => None,
            verbose => Some(VerboseReporter::new(verbose)),
        };

        observer.fit_started(self, begin_at_stage, n_estimators);
        if let Some(reporter) = reporter.as_mut() {
            reporter.fit_started(self, begin_at_stage, n_estimators);
        }

        for stage in begin_at_stage..n_estimators {
            observer.stage_started(stage);

            let sample_mask = if track_oob {
                Some(random_sample_mask(n_samples, n_inbag, &mut rng))
            } else {
                None
            };
            let old_oob_score = sample_mask
                .as_deref()
                .map(|mask| masked_loss(&loss, y, &pred, mask, false));

            let (fitted, next_pred) = fit_stage(
                &mut loss,
                &tree_params,
                params.learning_rate(),
                x,
                y,
                sample_mask.as_deref(),
                pred,
                &mut rng,
            )?;
            pred = next_pred;

            let (train_score, oob) = match (sample_mask.as_deref(), old_oob_score) {
                (Some(mask), Some(old_oob_score)) => {
                    let oob_score = masked_loss(&loss, y, &pred, mask, false);
                    (
                        masked_loss(&loss, y, &pred, mask, true),
                        Some((oob_score, old_oob_score - oob_score)),
                    )
                }
                _ => (loss.loss(y, pred.view()), None),
            };

            self.stages.push(fitted);
            self.history.record(train_score, oob);
            self.loss = Some(loss.clone());
            debug!(stage, train_score = %train_score, "fitted boosting stage");

            observer.stage_completed(stage, self);
            if let Some(reporter) = reporter.as_mut() {
                FitObserver::<F>::stage_completed(reporter, stage, self);
            }
            if monitor.should_stop(stage, self) {
                debug!(stage, "monitor stopped fitting");
                break;
            }
        }

        self.stages.finalize();
        self.history.finalize();

        Ok(self.n_stages())
    }

    /// Check a warm start against the fitted ensemble and grow its buffers
    ///
    /// Returns the current raw scores of the training records.
    fn resume(
        &mut self,
        loss: &Loss<F>,
        x: ArrayView2<F>,
        n_estimators: usize,
        track_oob: bool,
    ) -> Result<Array2<F>> {
        if let Some(fitted) = self.loss.as_ref() {
            if fitted.kind() != loss.kind() {
                return Err(GradientBoostError::WarmStartLoss {
                    fitted: fitted.kind(),
                    requested: loss.kind(),
                });
            }
        }
        if self.n_outputs() != loss.n_outputs() {
            return Err(GradientBoostError::WarmStartOutputs {
                fitted: self.n_outputs(),
                requested: loss.n_outputs(),
            });
        }
        if x.ncols() != self.n_features {
            return Err(GradientBoostError::FeatureMismatch {
                expected: self.n_features,
                found: x.ncols(),
            });
        }
        if n_estimators < self.n_stages() {
            return Err(GradientBoostError::ShrinkingWarmStart {
                requested: n_estimators,
                fitted: self.n_stages(),
            });
        }

        let pred = self.decision_function(&x)?;
        self.stages.grow_to(n_estimators)?;
        self.history.grow_to(n_estimators, track_oob)?;

        Ok(pred)
    }
}

/// Fit one tree per output against the negative gradient of `loss`
///
/// The raw scores `pred` are updated output by output, so later outputs see the contribution of
/// earlier ones. Returns the stage and the updated scores.
#[allow(clippy::too_many_arguments)]
fn fit_stage<F: Float, R: Rng>(
    loss: &mut Loss<F>,
    tree_params: &RegressionTreeValidParams<F>,
    learning_rate: F,
    x: ArrayView2<F>,
    y: ArrayView1<F>,
    sample_mask: Option<&[bool]>,
    mut pred: Array2<F>,
    rng: &mut R,
) -> Result<(Stage<F>, Array2<F>)> {
    let sample_weight = sample_mask.map(|mask| {
        mask.iter()
            .map(|&in_bag| if in_bag { F::one() } else { F::zero() })
            .collect::<Array1<F>>()
    });

    let mut trees = Vec::with_capacity(loss.n_outputs());
    for k in 0..loss.n_outputs() {
        let residual = loss.negative_gradient(y, pred.view(), k);
        let mut tree = tree_params.fit_weighted(
            x,
            residual.view(),
            sample_weight.as_ref().map(|weights| weights.view()),
            &mut *rng,
        )?;

        let leaves = tree.apply(&x);
        loss.refine_leaves(
            &mut tree,
            &leaves,
            sample_mask,
            y,
            residual.view(),
            pred.view(),
            k,
        );

        let nodes = tree.nodes();
        pred.column_mut(k)
            .iter_mut()
            .zip(leaves.iter())
            .for_each(|(score, &leaf)| *score += learning_rate * nodes[leaf].value());

        trees.push(tree);
    }

    Ok((Stage::new(trees, learning_rate), pred))
}

/// Loss restricted to the samples whose mask entry equals `in_bag`
fn masked_loss<F: Float>(
    loss: &Loss<F>,
    y: ArrayView1<F>,
    pred: &Array2<F>,
    mask: &[bool],
    in_bag: bool,
) -> F {
    let selected = mask
        .iter()
        .enumerate()
        .filter(|(_, &sampled)| sampled == in_bag)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    loss.loss(
        y.select(Axis(0), &selected).view(),
        pred.select(Axis(0), &selected).view(),
    )
}

/// Draw exactly `n_inbag` of `n_samples` indices without replacement, by selection sampling
pub(crate) fn random_sample_mask<R: Rng>(n_samples: usize, n_inbag: usize, rng: &mut R) -> Vec<bool> {
    let mut mask = vec![false; n_samples];
    let mut n_bagged = 0;

    for (idx, in_bag) in mask.iter_mut().enumerate() {
        let u: f64 = rng.gen();
        if u * ((n_samples - idx) as f64) < (n_inbag - n_bagged) as f64 {
            *in_bag = true;
            n_bagged += 1;
        }
    }

    mask
}

/// Iterator over the raw scores of an ensemble after each stage
///
/// Created by [`GradientBoosting::staged_decision_function`].
#[derive(Clone, Debug)]
pub struct StagedDecisionFunction<'a, F: Float> {
    x: ArrayView2<'a, F>,
    stages: std::slice::Iter<'a, Stage<F>>,
    score: Array2<F>,
}

impl<'a, F: Float> Iterator for StagedDecisionFunction<'a, F> {
    type Item = Array2<F>;

    fn next(&mut self) -> Option<Self::Item> {
        let stage = self.stages.next()?;
        stage.add_to(&self.x, &mut self.score);
        Some(self.score.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stages.size_hint()
    }
}

impl<'a, F: Float> ExactSizeIterator for StagedDecisionFunction<'a, F> {}
