use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};
use sylva::{dataset::AsSingleTargets, traits::*, DatasetBase, Float, ParamGuard};

use super::{
    FitObserver, GradientBoostError, GradientBoosting, GradientBoostingParams,
    GradientBoostingValidParams, Monitor, NeverStop, Regression, Result,
};

/// Gradient boosted regression trees
///
/// Fits an additive model of shallow regression trees stage by stage, every tree following the
/// negative gradient of the selected loss.
///
/// ### Example
///
/// ```rust
/// use sylva::prelude::*;
/// use sylva_ensemble::{GradientBoostingRegressor, LossName};
/// use ndarray::array;
///
/// let records = array![[0.], [1.], [2.], [3.], [4.], [5.]];
/// let dataset = Dataset::new(records.clone(), array![1., 1.2, 0.9, 5., 5.1, 4.8]);
///
/// let model = GradientBoostingRegressor::params()
///     .loss(LossName::Huber)
///     .n_estimators(50)
///     .fit(&dataset)
///     .unwrap();
///
/// let prediction: ndarray::Array1<f64> = model.predict(&records);
/// assert!((prediction[0] - 1.0).abs() < 0.5 && (prediction[4] - 5.0).abs() < 0.5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GradientBoostingRegressor<F: Float> {
    ensemble: GradientBoosting<F>,
}

impl<F: Float> GradientBoostingRegressor<F> {
    /// The fitted ensemble with its stages and score history
    pub fn ensemble(&self) -> &GradientBoosting<F> {
        &self.ensemble
    }

    pub fn n_stages(&self) -> usize {
        self.ensemble.n_stages()
    }

    pub fn train_score(&self) -> &[F] {
        self.ensemble.train_score()
    }

    pub fn oob_score(&self) -> Option<&[F]> {
        self.ensemble.oob_score()
    }

    pub fn oob_improvement(&self) -> Option<&[F]> {
        self.ensemble.oob_improvement()
    }

    pub fn feature_importance(&self) -> Result<Array1<F>> {
        self.ensemble.feature_importance()
    }

    /// Predicted targets, failing instead of panicking on unfitted models or mismatched records
    pub fn decision_function(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        Ok(self.ensemble.decision_function(x)?.column(0).to_owned())
    }

    /// Predicted targets after each stage
    pub fn staged_predict<'a>(
        &'a self,
        x: &'a ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<impl ExactSizeIterator<Item = Array1<F>> + Clone + 'a> {
        Ok(self
            .ensemble
            .staged_decision_function(x)?
            .map(|score| score.column(0).to_owned()))
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for GradientBoostingRegressor<F>
{
    /// Predict the targets of `x`
    ///
    /// # Panics
    ///
    /// If the model is not fitted, `x` has a different number of features than the training
    /// records or contains non-finite values. See
    /// [`decision_function`](GradientBoostingRegressor::decision_function) for the fallible
    /// version.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        match self.decision_function(x) {
            Ok(prediction) => y.assign(&prediction),
            Err(err) => panic!("{}", err),
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

pub(crate) fn validate_records<F: Float>(x: &ArrayView2<F>, n_targets: usize) -> Result<()> {
    if x.nrows() == 0 {
        return Err(GradientBoostError::InvalidInput(
            "at least one sample is required".to_string(),
        ));
    }
    if x.nrows() != n_targets {
        return Err(GradientBoostError::InvalidInput(format!(
            "{} samples but {} targets",
            x.nrows(),
            n_targets
        )));
    }
    if x.iter().any(|value| !value.is_finite()) {
        return Err(GradientBoostError::InvalidInput(
            "records contain NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

fn validate_targets<F: Float>(y: &ArrayView1<F>) -> Result<()> {
    if y.iter().any(|value| !value.is_finite()) {
        return Err(GradientBoostError::InvalidInput(
            "targets contain NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

impl<F: Float> GradientBoostingValidParams<F, Regression> {
    /// Fit, or continue fitting when warm starting, checking `monitor` after every stage
    pub fn fit_with_monitor<D: Data<Elem = F>, T: AsSingleTargets<Elem = F>>(
        &self,
        model: Option<GradientBoostingRegressor<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
    ) -> Result<GradientBoostingRegressor<F>> {
        self.fit_observed(model, dataset, monitor, &mut ())
    }

    /// Like [`fit_with_monitor`](Self::fit_with_monitor), notifying `observer` of the progress
    pub fn fit_observed<D: Data<Elem = F>, T: AsSingleTargets<Elem = F>>(
        &self,
        model: Option<GradientBoostingRegressor<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
        observer: &mut dyn FitObserver<F>,
    ) -> Result<GradientBoostingRegressor<F>> {
        let x = dataset.records().view();
        let y = dataset.as_single_targets();
        validate_records(&x, y.len())?;
        validate_targets(&y)?;

        let mut ensemble = model.map(|model| model.ensemble).unwrap_or_default();
        ensemble.fit_stages(self, x, y, 1, monitor, observer)?;

        Ok(GradientBoostingRegressor { ensemble })
    }
}

impl<F: Float> GradientBoostingParams<F, Regression> {
    /// Check the hyperparameters, then call
    /// [`GradientBoostingValidParams::fit_with_monitor`]
    pub fn fit_with_monitor<D: Data<Elem = F>, T: AsSingleTargets<Elem = F>>(
        &self,
        model: Option<GradientBoostingRegressor<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
    ) -> Result<GradientBoostingRegressor<F>> {
        self.check_ref()?.fit_with_monitor(model, dataset, monitor)
    }

    /// Check the hyperparameters, then call [`GradientBoostingValidParams::fit_observed`]
    pub fn fit_observed<D: Data<Elem = F>, T: AsSingleTargets<Elem = F>>(
        &self,
        model: Option<GradientBoostingRegressor<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
        observer: &mut dyn FitObserver<F>,
    ) -> Result<GradientBoostingRegressor<F>> {
        self.check_ref()?
            .fit_observed(model, dataset, monitor, observer)
    }
}

impl<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = F>>
    Fit<ArrayBase<D, Ix2>, T, GradientBoostError> for GradientBoostingValidParams<F, Regression>
{
    type Object = GradientBoostingRegressor<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        self.fit_observed(None, dataset, &mut NeverStop, &mut ())
    }
}

impl<'a, F, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, GradientBoostError>
    for GradientBoostingValidParams<F, Regression>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type ObjectIn = Option<GradientBoostingRegressor<F>>;
    type ObjectOut = GradientBoostingRegressor<F>;

    /// Continue fitting `model` when `warm_start` is set, otherwise fit from scratch
    fn fit_with(
        &self,
        model: Self::ObjectIn,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        self.fit_observed(model, dataset, &mut NeverStop, &mut ())
    }
}
