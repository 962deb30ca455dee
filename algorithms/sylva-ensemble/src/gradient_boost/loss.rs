//! Loss functions driving the boosting stages
//!
//! Every loss supplies four things to the driver: the scalar loss of a prediction, its negative
//! gradient (the pseudo-residual a stage is fitted against), a closed-form refinement of the leaf
//! values of a freshly fitted tree and the baseline estimator it starts from.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};
use num_traits::ToPrimitive;
use sylva::Float;
use sylva_trees::RegressionTree;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::{
    BaselineEstimator, GradientBoostError, LogOddsEstimator, MeanEstimator,
    PriorProbabilityEstimator, QuantileEstimator, Result,
};

/// Name of a loss function as selected in the hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LossName {
    /// `ls`
    LeastSquares,
    /// `lad`
    LeastAbsoluteDeviation,
    /// `huber`
    Huber,
    /// `quantile`
    Quantile,
    /// `deviance`, binomial for two classes and multinomial otherwise
    Deviance,
    /// `bdeviance`, deprecated alias of `deviance` for two classes
    BinomialDeviance,
    /// `mdeviance`, deprecated alias of `deviance` for three or more classes
    MultinomialDeviance,
}

impl LossName {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossName::LeastSquares => "ls",
            LossName::LeastAbsoluteDeviation => "lad",
            LossName::Huber => "huber",
            LossName::Quantile => "quantile",
            LossName::Deviance => "deviance",
            LossName::BinomialDeviance => "bdeviance",
            LossName::MultinomialDeviance => "mdeviance",
        }
    }

    /// Whether the name is a deprecated alias of `deviance`
    pub fn is_deprecated(&self) -> bool {
        matches!(
            self,
            LossName::BinomialDeviance | LossName::MultinomialDeviance
        )
    }

    /// Whether the loss needs the `alpha` parameter
    pub fn uses_alpha(&self) -> bool {
        matches!(self, LossName::Huber | LossName::Quantile)
    }
}

impl fmt::Display for LossName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossName {
    type Err = GradientBoostError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "ls" => Ok(LossName::LeastSquares),
            "lad" => Ok(LossName::LeastAbsoluteDeviation),
            "huber" => Ok(LossName::Huber),
            "quantile" => Ok(LossName::Quantile),
            "deviance" => Ok(LossName::Deviance),
            "bdeviance" => Ok(LossName::BinomialDeviance),
            "mdeviance" => Ok(LossName::MultinomialDeviance),
            other => Err(GradientBoostError::UnknownLoss(other.to_string())),
        }
    }
}

/// A fitted loss function
///
/// Classification losses receive the labels as floats `0.0, 1.0, ..`. Predictions are always
/// passed as a `(n_samples, n_outputs)` matrix of raw scores.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub enum Loss<F> {
    LeastSquares,
    LeastAbsoluteDeviation,
    /// Squared loss for residuals up to `gamma` and absolute loss beyond. `gamma` is the
    /// `alpha`-quantile of the absolute residuals, updated whenever the negative gradient is
    /// computed.
    Huber {
        alpha: F,
        gamma: Option<F>,
    },
    Quantile {
        alpha: F,
    },
    BinomialDeviance,
    MultinomialDeviance {
        n_classes: usize,
    },
}

impl<F: Float> Loss<F> {
    /// Resolve a loss name for a task with `n_classes` classes (`1` for regression)
    pub fn from_name(name: LossName, n_classes: usize, alpha: F) -> Result<Self> {
        let loss = match name {
            LossName::LeastSquares => Loss::LeastSquares,
            LossName::LeastAbsoluteDeviation => Loss::LeastAbsoluteDeviation,
            LossName::Huber => Loss::Huber { alpha, gamma: None },
            LossName::Quantile => Loss::Quantile { alpha },
            LossName::Deviance if n_classes == 2 => Loss::BinomialDeviance,
            LossName::Deviance if n_classes > 2 => Loss::MultinomialDeviance { n_classes },
            LossName::BinomialDeviance if n_classes == 2 => Loss::BinomialDeviance,
            LossName::MultinomialDeviance if n_classes > 2 => {
                Loss::MultinomialDeviance { n_classes }
            }
            LossName::Deviance | LossName::BinomialDeviance | LossName::MultinomialDeviance => {
                let expected = match name {
                    LossName::BinomialDeviance => "exactly 2",
                    LossName::MultinomialDeviance => "at least 3",
                    _ => "at least 2",
                };
                return Err(GradientBoostError::ClassCount {
                    loss: name,
                    expected,
                    found: n_classes,
                });
            }
        };

        Ok(loss)
    }

    /// The resolved name of the loss, `deviance` resolves to its binomial or multinomial form
    pub fn kind(&self) -> LossName {
        match self {
            Loss::LeastSquares => LossName::LeastSquares,
            Loss::LeastAbsoluteDeviation => LossName::LeastAbsoluteDeviation,
            Loss::Huber { .. } => LossName::Huber,
            Loss::Quantile { .. } => LossName::Quantile,
            Loss::BinomialDeviance => LossName::BinomialDeviance,
            Loss::MultinomialDeviance { .. } => LossName::MultinomialDeviance,
        }
    }

    /// Number of trees fitted per stage
    pub fn n_outputs(&self) -> usize {
        match self {
            Loss::MultinomialDeviance { n_classes } => *n_classes,
            _ => 1,
        }
    }

    /// The baseline estimator this loss starts from when no other is configured
    pub fn init_estimator(&self) -> Box<dyn BaselineEstimator<F>> {
        match self {
            Loss::LeastSquares => Box::new(MeanEstimator::default()),
            Loss::LeastAbsoluteDeviation | Loss::Huber { .. } => {
                Box::new(QuantileEstimator::new(F::cast(0.5)))
            }
            Loss::Quantile { alpha } => Box::new(QuantileEstimator::new(*alpha)),
            Loss::BinomialDeviance => Box::new(LogOddsEstimator::default()),
            Loss::MultinomialDeviance { .. } => Box::new(PriorProbabilityEstimator::default()),
        }
    }

    /// Mean loss of the predictions `pred` for targets `y`, zero for an empty set of samples
    ///
    /// Every loss is averaged over the samples, the multinomial deviance included, so scores of
    /// data sets with different sizes are comparable. The quantile loss is the pinball loss
    /// `alpha * (y - p)` above and `(1 - alpha) * (p - y)` below the prediction, never negative.
    pub fn loss(&self, y: ArrayView1<F>, pred: ArrayView2<F>) -> F {
        let n_samples = y.len();
        if n_samples == 0 {
            return F::zero();
        }
        let n = F::cast(n_samples);
        let first = pred.column(0);

        match self {
            Loss::LeastSquares => {
                y.iter()
                    .zip(first.iter())
                    .map(|(&y, &p)| (y - p) * (y - p))
                    .sum::<F>()
                    / n
            }
            Loss::LeastAbsoluteDeviation => {
                y.iter()
                    .zip(first.iter())
                    .map(|(&y, &p)| (y - p).abs())
                    .sum::<F>()
                    / n
            }
            Loss::Huber { alpha, gamma } => {
                let diff = residuals(&y, &first);
                let gamma = gamma.unwrap_or_else(|| abs_quantile(&diff, *alpha));
                let half = F::cast(0.5);

                diff.iter()
                    .map(|&d| {
                        if d.abs() <= gamma {
                            half * d * d
                        } else {
                            gamma * (d.abs() - gamma * half)
                        }
                    })
                    .sum::<F>()
                    / n
            }
            Loss::Quantile { alpha } => {
                let alpha = *alpha;
                y.iter()
                    .zip(first.iter())
                    .map(|(&y, &p)| {
                        if y > p {
                            alpha * (y - p)
                        } else {
                            (alpha - F::one()) * (y - p)
                        }
                    })
                    .sum::<F>()
                    / n
            }
            Loss::BinomialDeviance => {
                let log_likelihood = y
                    .iter()
                    .zip(first.iter())
                    .map(|(&y, &p)| y * p - log_add_exp(p))
                    .sum::<F>()
                    / n;
                F::cast(-2.0) * log_likelihood
            }
            Loss::MultinomialDeviance { .. } => {
                pred.rows()
                    .into_iter()
                    .zip(y.iter())
                    .map(|(row, &label)| {
                        let selected = row
                            .iter()
                            .enumerate()
                            .filter(|(k, _)| F::cast(*k) == label)
                            .map(|(_, &p)| p)
                            .sum::<F>();
                        log_sum_exp(&row) - selected
                    })
                    .sum::<F>()
                    / n
            }
        }
    }

    /// Negative gradient of the loss for output `k`, the pseudo-residual of the next tree
    ///
    /// The Huber loss caches the clipping threshold computed here; the following calls to
    /// [`loss`](Self::loss) and [`refine_leaves`](Self::refine_leaves) reuse it.
    pub fn negative_gradient(&mut self, y: ArrayView1<F>, pred: ArrayView2<F>, k: usize) -> Array1<F> {
        let first = pred.column(0);

        match self {
            Loss::LeastSquares => residuals(&y, &first),
            Loss::LeastAbsoluteDeviation => y
                .iter()
                .zip(first.iter())
                .map(|(&y, &p)| if y - p > F::zero() { F::one() } else { -F::one() })
                .collect(),
            Loss::Huber { alpha, gamma } => {
                let diff = residuals(&y, &first);
                let threshold = abs_quantile(&diff, *alpha);
                *gamma = Some(threshold);

                diff.mapv(|d| {
                    if d.abs() <= threshold {
                        d
                    } else {
                        threshold * d.signum()
                    }
                })
            }
            Loss::Quantile { alpha } => {
                let alpha = *alpha;
                y.iter()
                    .zip(first.iter())
                    .map(|(&y, &p)| if y > p { alpha } else { alpha - F::one() })
                    .collect()
            }
            Loss::BinomialDeviance => y
                .iter()
                .zip(first.iter())
                .map(|(&y, &p)| y - sigmoid(p))
                .collect(),
            Loss::MultinomialDeviance { .. } => pred
                .rows()
                .into_iter()
                .zip(y.iter())
                .map(|(row, &label)| {
                    let probability = nan_to_num((row[k] - log_sum_exp(&row)).exp());
                    indicator(label, k) - probability
                })
                .collect(),
        }
    }

    /// Replace the leaf values of `tree` by the optimal step of the loss
    ///
    /// `leaves` holds the leaf of every training sample. Only samples selected by `sample_mask`
    /// (all samples if `None`) contribute to a leaf. Least squares keeps the fitted values.
    #[allow(clippy::too_many_arguments)]
    pub fn refine_leaves(
        &self,
        tree: &mut RegressionTree<F>,
        leaves: &Array1<usize>,
        sample_mask: Option<&[bool]>,
        y: ArrayView1<F>,
        residual: ArrayView1<F>,
        pred: ArrayView2<F>,
        k: usize,
    ) {
        if let Loss::LeastSquares = self {
            return;
        }

        let mut regions = vec![Vec::new(); tree.nodes().len()];
        for (idx, &leaf) in leaves.iter().enumerate() {
            if sample_mask.map_or(true, |mask| mask[idx]) {
                regions[leaf].push(idx);
            }
        }

        let pred = pred.column(k);
        for leaf in tree.leaf_ids() {
            let region = &regions[leaf];
            if region.is_empty() {
                continue;
            }

            let value = self.region_value(region, &y, &residual, &pred, k);
            if let Some(leaf_value) = tree.leaf_value_mut(leaf) {
                *leaf_value = value;
            }
        }
    }

    /// Optimal leaf value for the samples in `region`
    fn region_value(
        &self,
        region: &[usize],
        y: &ArrayView1<F>,
        residual: &ArrayView1<F>,
        pred: &ArrayView1<F>,
        k: usize,
    ) -> F {
        let diff = || region.iter().map(|&i| y[i] - pred[i]).collect::<Vec<_>>();

        match self {
            Loss::LeastSquares => F::zero(),
            Loss::LeastAbsoluteDeviation => median(&diff()),
            Loss::Huber { gamma, .. } => {
                let diff = diff();
                let median = median(&diff);
                let gamma = gamma.unwrap_or_else(F::infinity);
                let correction = diff
                    .iter()
                    .map(|&d| (d - median).signum() * (d - median).abs().min(gamma))
                    .sum::<F>()
                    / F::cast(diff.len());

                median + correction
            }
            Loss::Quantile { alpha } => {
                percentile(&diff(), *alpha * F::cast(100.0)).unwrap_or_else(F::zero)
            }
            Loss::BinomialDeviance => newton_step(region, |i| y[i], residual, F::one()),
            Loss::MultinomialDeviance { n_classes } => {
                let n_classes = F::cast(*n_classes);
                newton_step(
                    region,
                    |i| indicator(y[i], k),
                    residual,
                    (n_classes - F::one()) / n_classes,
                )
            }
        }
    }
}

/// One Newton-Raphson step `scale * sum(r) / sum((y - r) * (1 - y + r))`, zero when the
/// denominator vanishes
fn newton_step<F: Float>(
    region: &[usize],
    target: impl Fn(usize) -> F,
    residual: &ArrayView1<F>,
    scale: F,
) -> F {
    let (numerator, denominator) =
        region
            .iter()
            .fold((F::zero(), F::zero()), |(num, den), &i| {
                let (y, r) = (target(i), residual[i]);
                (num + r, den + (y - r) * (F::one() - y + r))
            });

    if denominator == F::zero() {
        F::zero()
    } else {
        scale * numerator / denominator
    }
}

fn residuals<F: Float>(y: &ArrayView1<F>, pred: &ArrayView1<F>) -> Array1<F> {
    y - pred
}

fn indicator<F: Float>(label: F, k: usize) -> F {
    if label == F::cast(k) {
        F::one()
    } else {
        F::zero()
    }
}

fn abs_quantile<F: Float>(diff: &Array1<F>, alpha: F) -> F {
    let abs = diff.iter().map(|d| d.abs()).collect::<Vec<_>>();
    percentile(&abs, alpha * F::cast(100.0)).unwrap_or_else(F::zero)
}

pub(crate) fn sigmoid<F: Float>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}

/// `log(1 + exp(x))` without overflow
fn log_add_exp<F: Float>(x: F) -> F {
    x.max(F::zero()) + (-x.abs()).exp().ln_1p()
}

pub(crate) fn log_sum_exp<F: Float>(row: &ArrayView1<F>) -> F {
    let max = row.fold(F::neg_infinity(), |max, &x| max.max(x));
    if !max.is_finite() {
        return max;
    }

    max + row.iter().map(|&x| (x - max).exp()).sum::<F>().ln()
}

/// Replace NaN by zero and infinities by the largest finite values
pub(crate) fn nan_to_num<F: Float>(x: F) -> F {
    if x.is_nan() {
        F::zero()
    } else if x == F::infinity() {
        F::max_value()
    } else if x == F::neg_infinity() {
        F::min_value()
    } else {
        x
    }
}

/// Percentile `q` in `[0, 100]` of `values`, linearly interpolated between the order statistics
///
/// Returns `None` for an empty slice.
pub(crate) fn percentile<F: Float>(values: &[F], q: F) -> Option<F> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = q / F::cast(100.0) * F::cast(sorted.len() - 1);
    let lower = rank.floor();
    let lower_idx = lower.to_usize().unwrap_or(0).min(sorted.len() - 1);
    let upper_idx = (lower_idx + 1).min(sorted.len() - 1);
    let fraction = rank - lower;

    Some(sorted[lower_idx] + (sorted[upper_idx] - sorted[lower_idx]) * fraction)
}

fn median<F: Float>(values: &[F]) -> F {
    percentile(values, F::cast(50.0)).unwrap_or_else(F::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use sylva::{traits::Predict, ParamGuard};

    fn column(values: Array1<f64>) -> Array2<f64> {
        values.insert_axis(ndarray::Axis(1))
    }

    #[test]
    fn parse_loss_names() {
        assert_eq!("ls".parse::<LossName>().unwrap(), LossName::LeastSquares);
        assert_eq!("mdeviance".parse::<LossName>().unwrap(), LossName::MultinomialDeviance);
        assert!(LossName::BinomialDeviance.is_deprecated());
        assert_eq!(LossName::Quantile.to_string(), "quantile");
        assert!(matches!(
            "hinge".parse::<LossName>(),
            Err(GradientBoostError::UnknownLoss(name)) if name == "hinge"
        ));
    }

    #[test]
    fn resolve_deviance_by_class_count() {
        let binary = Loss::<f64>::from_name(LossName::Deviance, 2, 0.9).unwrap();
        assert_eq!(binary.kind(), LossName::BinomialDeviance);
        assert_eq!(binary.n_outputs(), 1);

        let multi = Loss::<f64>::from_name(LossName::Deviance, 4, 0.9).unwrap();
        assert_eq!(multi.kind(), LossName::MultinomialDeviance);
        assert_eq!(multi.n_outputs(), 4);

        assert!(Loss::<f64>::from_name(LossName::BinomialDeviance, 3, 0.9).is_err());
        assert!(Loss::<f64>::from_name(LossName::MultinomialDeviance, 2, 0.9).is_err());
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [4., 1., 3., 2.];
        assert_abs_diff_eq!(percentile(&values, 50.).unwrap(), 2.5);
        assert_abs_diff_eq!(percentile(&values, 90.).unwrap(), 3.7, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile(&values, 0.).unwrap(), 1.);
        assert_abs_diff_eq!(percentile(&values, 100.).unwrap(), 4.);
        assert_eq!(percentile::<f64>(&[], 50.), None);
    }

    #[test]
    fn least_squares() {
        let mut loss = Loss::LeastSquares;
        let y = array![1., 2., 3.];
        let pred = column(array![0.5, 2., 4.]);

        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 0),
            array![0.5, 0., -1.]
        );
        assert_abs_diff_eq!(loss.loss(y.view(), pred.view()), 1.25 / 3., epsilon = 1e-12);
    }

    #[test]
    fn least_absolute_deviation() {
        let mut loss = Loss::LeastAbsoluteDeviation;
        let y = array![1., 2., 3.];
        let pred = column(array![0.5, 2., 4.]);

        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 0),
            array![1., -1., -1.]
        );
        assert_abs_diff_eq!(loss.loss(y.view(), pred.view()), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn huber_clips_at_quantile() {
        let mut loss = Loss::Huber {
            alpha: 0.5,
            gamma: None,
        };
        let y = array![-3., -1., 0.5, 2.];
        let pred = column(array![0., 0., 0., 0.]);

        // the median of |y - pred| = [3, 1, 0.5, 2] is 1.5
        let gradient = loss.negative_gradient(y.view(), pred.view(), 0);
        assert_abs_diff_eq!(gradient, array![-1.5, -1., 0.5, 1.5]);
        assert_eq!(
            loss,
            Loss::Huber {
                alpha: 0.5,
                gamma: Some(1.5)
            }
        );

        // 0.5 + 0.125 quadratic, 1.5 * (3 - 0.75) + 1.5 * (2 - 0.75) linear
        assert_abs_diff_eq!(loss.loss(y.view(), pred.view()), 5.875 / 4., epsilon = 1e-12);
    }

    #[test]
    fn quantile_is_pinball_loss() {
        let mut loss = Loss::Quantile { alpha: 0.9 };
        let y = array![1., 3.];
        let pred = column(array![2., 2.]);

        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 0),
            array![-0.1, 0.9],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(loss.loss(y.view(), pred.view()), 0.5, epsilon = 1e-12);

        // below the prediction the loss grows with 1 - alpha
        let below = array![0., 0.];
        assert_abs_diff_eq!(loss.loss(below.view(), pred.view()), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn binomial_deviance() {
        let mut loss = Loss::BinomialDeviance;
        let y = array![0., 1.];
        let pred = column(array![0., 0.]);

        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 0),
            array![-0.5, 0.5]
        );
        assert_abs_diff_eq!(
            loss.loss(y.view(), pred.view()),
            2. * std::f64::consts::LN_2,
            epsilon = 1e-12
        );
        // large scores do not overflow
        let confident = column(array![-800., 800.]);
        assert_abs_diff_eq!(loss.loss(y.view(), confident.view()), 0., epsilon = 1e-12);
    }

    #[test]
    fn multinomial_deviance() {
        let mut loss = Loss::MultinomialDeviance { n_classes: 3 };
        let y = array![0., 2.];
        let pred = Array2::zeros((2, 3));

        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 0),
            array![2. / 3., -1. / 3.],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            loss.negative_gradient(y.view(), pred.view(), 2),
            array![-1. / 3., 2. / 3.],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(loss.loss(y.view(), pred.view()), 3f64.ln(), epsilon = 1e-12);

        // averaged, repeating the samples keeps the loss
        let repeated = array![0., 2., 0., 2.];
        assert_abs_diff_eq!(
            loss.loss(repeated.view(), Array2::zeros((4, 3)).view()),
            3f64.ln(),
            epsilon = 1e-12
        );
    }

    fn two_leaf_tree(x: &Array2<f64>, target: &Array1<f64>) -> RegressionTree<f64> {
        RegressionTree::params()
            .max_depth(Some(1))
            .check_unwrap()
            .fit_weighted(
                x.view(),
                target.view(),
                None,
                &mut Xoshiro256Plus::seed_from_u64(0),
            )
            .unwrap()
    }

    #[test]
    fn least_squares_keeps_leaf_values() {
        let x = array![[0.], [1.], [2.], [3.]];
        let y = array![1., 2., 10., 20.];
        let mut tree = two_leaf_tree(&x, &y);
        let before = tree.clone();

        let leaves = tree.apply(&x);
        let pred = Array2::zeros((4, 1));
        Loss::LeastSquares.refine_leaves(
            &mut tree,
            &leaves,
            None,
            y.view(),
            y.view(),
            pred.view(),
            0,
        );

        assert_eq!(tree, before);
    }

    #[test]
    fn lad_refines_to_in_bag_median() {
        let x = array![[0.], [1.], [2.], [3.], [4.]];
        let y = array![1., 2., 6., 40., 50.];
        let mut tree = two_leaf_tree(&x, &y);
        let leaves = tree.apply(&x);
        let pred = Array2::zeros((5, 1));

        // the tree separates {0, 1, 2} from {3, 4}, sample 4 is out of bag
        let mask = [true, true, true, true, false];
        Loss::LeastAbsoluteDeviation.refine_leaves(
            &mut tree,
            &leaves,
            Some(&mask),
            y.view(),
            y.view(),
            pred.view(),
            0,
        );

        let refined: Array1<f64> = tree.predict(&x);
        assert_abs_diff_eq!(refined, array![2., 2., 2., 40., 40.]);
    }

    #[test]
    fn newton_step_with_vanishing_denominator_is_zero() {
        let residual = array![1., 1.];
        let value = newton_step(&[0, 1], |_| 1., &residual.view(), 1.);
        assert_eq!(value, 0.);

        let residual = array![0.5, -0.5];
        // sum(r) = 0 over (0.5 * 0.5) + (0.5 * 0.5)
        let value = newton_step(&[0, 1], |i| [1., 0.][i], &residual.view(), 1.);
        assert_abs_diff_eq!(value, 0.);
    }

    #[test]
    fn numerics_helpers() {
        assert_abs_diff_eq!(sigmoid(0.), 0.5);
        assert_abs_diff_eq!(log_add_exp(0.), std::f64::consts::LN_2);
        assert_abs_diff_eq!(log_add_exp(1000.), 1000.);
        assert_abs_diff_eq!(log_sum_exp(&array![1000., 1000.].view()), 1000. + 2f64.ln());
        assert_eq!(nan_to_num(f64::NAN), 0.);
        assert_eq!(nan_to_num(f64::INFINITY), f64::MAX);
    }
}
