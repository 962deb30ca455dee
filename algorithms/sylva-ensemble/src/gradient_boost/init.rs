//! Baseline estimators producing the prediction a boosted ensemble starts from
use std::fmt;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::ToPrimitive;
use sylva::Float;

use super::{loss::percentile, GradientBoostError, Result};

/// Estimator fitted once on the training targets before the first stage
///
/// `predict` returns either one column, which is broadcast to every output of the ensemble, or
/// one column per output.
pub trait BaselineEstimator<F: Float>: BaselineClone<F> + fmt::Debug {
    fn fit(&mut self, x: ArrayView2<F>, y: ArrayView1<F>) -> Result<()>;

    fn predict(&self, x: ArrayView2<F>) -> Array2<F>;
}

/// Object-safe cloning of boxed baseline estimators, implemented for every `Clone` estimator
pub trait BaselineClone<F> {
    fn clone_box(&self) -> Box<dyn BaselineEstimator<F>>;
}

impl<F: Float, T: BaselineEstimator<F> + Clone + 'static> BaselineClone<F> for T {
    fn clone_box(&self) -> Box<dyn BaselineEstimator<F>> {
        Box::new(self.clone())
    }
}

impl<F: Float> Clone for Box<dyn BaselineEstimator<F>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Predicts the mean of the training targets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeanEstimator<F> {
    mean: F,
}

impl<F: Float> BaselineEstimator<F> for MeanEstimator<F> {
    fn fit(&mut self, _x: ArrayView2<F>, y: ArrayView1<F>) -> Result<()> {
        self.mean = y.mean().ok_or_else(|| {
            GradientBoostError::InvalidInput("cannot fit the mean of empty targets".to_string())
        })?;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Array2<F> {
        Array2::from_elem((x.nrows(), 1), self.mean)
    }
}

/// Predicts the `alpha`-quantile of the training targets
#[derive(Clone, Debug, PartialEq)]
pub struct QuantileEstimator<F> {
    alpha: F,
    quantile: F,
}

impl<F: Float> QuantileEstimator<F> {
    pub fn new(alpha: F) -> Self {
        QuantileEstimator {
            alpha,
            quantile: F::zero(),
        }
    }
}

impl<F: Float> BaselineEstimator<F> for QuantileEstimator<F> {
    fn fit(&mut self, _x: ArrayView2<F>, y: ArrayView1<F>) -> Result<()> {
        self.quantile = percentile(&y.to_vec(), self.alpha * F::cast(100.0)).ok_or_else(|| {
            GradientBoostError::InvalidInput("cannot fit a quantile of empty targets".to_string())
        })?;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Array2<F> {
        Array2::from_elem((x.nrows(), 1), self.quantile)
    }
}

/// Predicts the log-odds `ln(n_positive / n_negative)` of binary targets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogOddsEstimator<F> {
    prior: F,
}

impl<F: Float> BaselineEstimator<F> for LogOddsEstimator<F> {
    fn fit(&mut self, _x: ArrayView2<F>, y: ArrayView1<F>) -> Result<()> {
        let positive = y.sum();
        let negative = F::cast(y.len()) - positive;
        if positive <= F::zero() || negative <= F::zero() {
            return Err(GradientBoostError::InvalidInput(
                "log-odds baseline needs samples of both classes".to_string(),
            ));
        }

        self.prior = (positive / negative).ln();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Array2<F> {
        Array2::from_elem((x.nrows(), 1), self.prior)
    }
}

/// Predicts the relative frequency of every class
#[derive(Clone, Debug, PartialEq)]
pub struct PriorProbabilityEstimator<F> {
    priors: Array1<F>,
}

impl<F: Float> Default for PriorProbabilityEstimator<F> {
    fn default() -> Self {
        PriorProbabilityEstimator {
            priors: Array1::zeros(1),
        }
    }
}

impl<F: Float> PriorProbabilityEstimator<F> {
    pub fn priors(&self) -> &Array1<F> {
        &self.priors
    }
}

impl<F: Float> BaselineEstimator<F> for PriorProbabilityEstimator<F> {
    fn fit(&mut self, _x: ArrayView2<F>, y: ArrayView1<F>) -> Result<()> {
        let labels = y
            .iter()
            .map(|label| {
                label
                    .to_usize()
                    .filter(|&idx| F::cast(idx) == *label)
                    .ok_or_else(|| {
                        GradientBoostError::InvalidInput(format!(
                            "class label {} is not a non-negative integer",
                            label
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let n_classes = labels.iter().max().map(|max| max + 1).ok_or_else(|| {
            GradientBoostError::InvalidInput("cannot fit class priors of empty targets".to_string())
        })?;

        let mut counts = Array1::<F>::zeros(n_classes);
        for label in labels {
            counts[label] += F::one();
        }
        self.priors = counts / F::cast(y.len());
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Array2<F> {
        let mut pred = Array2::zeros((x.nrows(), self.priors.len()));
        pred.rows_mut()
            .into_iter()
            .for_each(|mut row| row.assign(&self.priors));
        pred
    }
}

/// Predicts zero, the ensemble then starts from scratch
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZeroEstimator;

impl<F: Float> BaselineEstimator<F> for ZeroEstimator {
    fn fit(&mut self, _x: ArrayView2<F>, _y: ArrayView1<F>) -> Result<()> {
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Array2<F> {
        Array2::zeros((x.nrows(), 1))
    }
}

/// Baseline prediction of `init` with one column per output
pub(crate) fn baseline_prediction<F: Float>(
    init: &dyn BaselineEstimator<F>,
    x: ArrayView2<F>,
    n_outputs: usize,
) -> Result<Array2<F>> {
    let pred = init.predict(x);
    let (rows, cols) = pred.dim();

    if rows == x.nrows() && cols == n_outputs {
        Ok(pred)
    } else if rows == x.nrows() && cols == 1 {
        let column = pred.index_axis(Axis(1), 0);
        let mut broadcast = Array2::zeros((rows, n_outputs));
        broadcast
            .columns_mut()
            .into_iter()
            .for_each(|mut col| col.assign(&column));
        Ok(broadcast)
    } else {
        Err(GradientBoostError::BaselineShape {
            rows,
            cols,
            expected_rows: x.nrows(),
            expected_cols: n_outputs,
        })
    }
}
