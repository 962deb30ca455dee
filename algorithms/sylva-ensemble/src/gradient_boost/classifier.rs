use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix2};
use sylva::{dataset::AsSingleTargets, traits::*, DatasetBase, Float, ParamGuard};

use super::{
    loss::{log_sum_exp, nan_to_num, sigmoid},
    regressor::validate_records,
    Classification, FitObserver, GradientBoostError, GradientBoosting, GradientBoostingParams,
    GradientBoostingValidParams, Monitor, NeverStop, Result,
};

/// Gradient boosted classification trees
///
/// Labels are the integers `0..K` and every class needs at least one sample. Two classes are
/// modelled by a single raw score passed through the logistic function, more classes by one
/// score per class and the softmax.
///
/// ### Example
///
/// ```rust
/// use sylva::prelude::*;
/// use sylva_ensemble::GradientBoostingClassifier;
/// use ndarray::{array, Array1};
///
/// let records = array![[0.], [1.], [2.], [10.], [11.], [12.], [20.], [21.], [22.]];
/// let dataset = Dataset::new(records.clone(), array![0, 0, 0, 1, 1, 1, 2, 2, 2]);
///
/// let model = GradientBoostingClassifier::params()
///     .n_estimators(20)
///     .fit(&dataset)
///     .unwrap();
///
/// let labels: Array1<usize> = model.predict(&records);
/// assert_eq!(&labels, dataset.targets());
/// assert_eq!(model.predict_proba(&records).unwrap().dim(), (9, 3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct GradientBoostingClassifier<F: Float> {
    ensemble: GradientBoosting<F>,
    n_classes: usize,
}

impl<F: Float> GradientBoostingClassifier<F> {
    /// The fitted ensemble with its stages and score history
    pub fn ensemble(&self) -> &GradientBoosting<F> {
        &self.ensemble
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
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

    /// Raw scores, one column for two classes and one column per class otherwise
    pub fn decision_function(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.ensemble.decision_function(x)
    }

    /// Class probabilities with shape `(n_samples, n_classes)`
    pub fn predict_proba(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        Ok(score_to_proba(self.ensemble.decision_function(x)?))
    }

    /// Class probabilities after each stage
    pub fn staged_predict_proba<'a>(
        &'a self,
        x: &'a ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<impl ExactSizeIterator<Item = Array2<F>> + Clone + 'a> {
        Ok(self.ensemble.staged_decision_function(x)?.map(score_to_proba))
    }

    /// Predicted labels after each stage
    pub fn staged_predict<'a>(
        &'a self,
        x: &'a ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<impl ExactSizeIterator<Item = Array1<usize>> + Clone + 'a> {
        Ok(self
            .ensemble
            .staged_decision_function(x)?
            .map(|score| most_probable(&score_to_proba(score))))
    }
}

fn score_to_proba<F: Float>(mut score: Array2<F>) -> Array2<F> {
    if score.ncols() == 1 {
        let mut proba = Array2::zeros((score.nrows(), 2));
        for (mut row, &raw) in proba.rows_mut().into_iter().zip(score.column(0).iter()) {
            let positive = sigmoid(raw);
            row[0] = F::one() - positive;
            row[1] = positive;
        }
        return proba;
    }

    for mut row in score.rows_mut() {
        let normalizer = log_sum_exp(&row.view());
        row.mapv_inplace(|raw| nan_to_num((raw - normalizer).exp()));
    }
    score
}

/// Index of the largest probability of every row, the first one on ties
fn most_probable<F: Float>(proba: &Array2<F>) -> Array1<usize> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, F::neg_infinity()), |(best, max), (idx, &p)| {
                    if p > max {
                        (idx, p)
                    } else {
                        (best, max)
                    }
                })
                .0
        })
        .collect()
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<usize>>
    for GradientBoostingClassifier<F>
{
    /// Predict the most probable class of every row of `x`
    ///
    /// # Panics
    ///
    /// If the model is not fitted, `x` has a different number of features than the training
    /// records or contains non-finite values. See
    /// [`predict_proba`](GradientBoostingClassifier::predict_proba) for the fallible version.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<usize>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        match self.predict_proba(x) {
            Ok(proba) => y.assign(&most_probable(&proba)),
            Err(err) => panic!("{}", err),
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

/// Number of classes `K` of labels which have to cover `0..K` with `K >= 2`
fn count_classes(y: &ArrayView1<usize>) -> Result<usize> {
    let max = y.iter().copied().max();
    // every class needs a sample, so a label of at least `n_samples` always leaves one empty
    if let Some(max) = max.filter(|&max| max >= y.len()) {
        return Err(GradientBoostError::InvalidInput(format!(
            "labels must cover 0..K, but label {} exceeds the {} samples",
            max,
            y.len()
        )));
    }

    let n_classes = max.map_or(0, |max| max + 1);
    if n_classes < 2 {
        return Err(GradientBoostError::InvalidInput(format!(
            "classification needs at least 2 classes, but the labels contain {}",
            n_classes
        )));
    }

    let mut seen = vec![false; n_classes];
    y.iter().for_each(|&label| seen[label] = true);
    if let Some(missing) = seen.iter().position(|&seen| !seen) {
        return Err(GradientBoostError::InvalidInput(format!(
            "labels must cover 0..{}, but class {} has no samples",
            n_classes, missing
        )));
    }

    Ok(n_classes)
}

impl<F: Float> GradientBoostingValidParams<F, Classification> {
    /// Fit, or continue fitting when warm starting, checking `monitor` after every stage
    pub fn fit_with_monitor<D: Data<Elem = F>, T: AsSingleTargets<Elem = usize>>(
        &self,
        model: Option<GradientBoostingClassifier<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
    ) -> Result<GradientBoostingClassifier<F>> {
        self.fit_observed(model, dataset, monitor, &mut ())
    }

    /// Like [`fit_with_monitor`](Self::fit_with_monitor), notifying `observer` of the progress
    pub fn fit_observed<D: Data<Elem = F>, T: AsSingleTargets<Elem = usize>>(
        &self,
        model: Option<GradientBoostingClassifier<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
        observer: &mut dyn FitObserver<F>,
    ) -> Result<GradientBoostingClassifier<F>> {
        let x = dataset.records().view();
        let labels = dataset.as_single_targets();
        validate_records(&x, labels.len())?;
        let n_classes = count_classes(&labels)?;

        let mut ensemble = match model {
            Some(model) if self.warm_start() && model.ensemble.is_fitted() => {
                if model.n_classes != n_classes {
                    return Err(GradientBoostError::WarmStartOutputs {
                        fitted: model.n_classes,
                        requested: n_classes,
                    });
                }
                model.ensemble
            }
            _ => GradientBoosting::default(),
        };

        let y = labels.mapv(F::cast);
        ensemble.fit_stages(self, x, y.view(), n_classes, monitor, observer)?;

        Ok(GradientBoostingClassifier {
            ensemble,
            n_classes,
        })
    }
}

impl<F: Float> GradientBoostingParams<F, Classification> {
    /// Check the hyperparameters, then call
    /// [`GradientBoostingValidParams::fit_with_monitor`]
    pub fn fit_with_monitor<D: Data<Elem = F>, T: AsSingleTargets<Elem = usize>>(
        &self,
        model: Option<GradientBoostingClassifier<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
    ) -> Result<GradientBoostingClassifier<F>> {
        self.check_ref()?.fit_with_monitor(model, dataset, monitor)
    }

    /// Check the hyperparameters, then call [`GradientBoostingValidParams::fit_observed`]
    pub fn fit_observed<D: Data<Elem = F>, T: AsSingleTargets<Elem = usize>>(
        &self,
        model: Option<GradientBoostingClassifier<F>>,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
        monitor: &mut dyn Monitor<F>,
        observer: &mut dyn FitObserver<F>,
    ) -> Result<GradientBoostingClassifier<F>> {
        self.check_ref()?
            .fit_observed(model, dataset, monitor, observer)
    }
}

impl<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = usize>>
    Fit<ArrayBase<D, Ix2>, T, GradientBoostError>
    for GradientBoostingValidParams<F, Classification>
{
    type Object = GradientBoostingClassifier<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        self.fit_observed(None, dataset, &mut NeverStop, &mut ())
    }
}

impl<'a, F, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, GradientBoostError>
    for GradientBoostingValidParams<F, Classification>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = usize>,
{
    type ObjectIn = Option<GradientBoostingClassifier<F>>;
    type ObjectOut = GradientBoostingClassifier<F>;

    /// Continue fitting `model` when `warm_start` is set, otherwise fit from scratch
    fn fit_with(
        &self,
        model: Self::ObjectIn,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        self.fit_observed(model, dataset, &mut NeverStop, &mut ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, LossName};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use sylva::Dataset;

    fn bands(n_classes: usize) -> Dataset<f64, usize> {
        let records = Array2::from_shape_fn((10 * n_classes, 1), |(i, _)| i as f64);
        let targets = (0..10 * n_classes).map(|i| i / 10).collect::<Array1<_>>();
        Dataset::new(records, targets)
    }

    #[test]
    fn binary_uses_a_single_score() {
        let dataset = bands(2);
        let model = GradientBoostingClassifier::params()
            .n_estimators(30)
            .fit(&dataset)
            .unwrap();

        assert_eq!(model.n_classes(), 2);
        assert_eq!(model.ensemble().n_outputs(), 1);
        assert_eq!(
            model.ensemble().loss().map(|loss| loss.kind()),
            Some(LossName::BinomialDeviance)
        );

        let proba = model.predict_proba(dataset.records()).unwrap();
        assert_eq!(proba.dim(), (20, 2));
        assert_abs_diff_eq!(proba.sum_axis(Axis(1)), Array1::ones(20), epsilon = 1e-12);

        let labels: Array1<usize> = model.predict(dataset.records());
        assert_eq!(&labels, dataset.targets());
    }

    #[test]
    fn multi_class_fits_one_tree_per_class() {
        let dataset = bands(3);
        let model = GradientBoostingClassifier::params()
            .n_estimators(30)
            .fit(&dataset)
            .unwrap();

        assert_eq!(model.ensemble().n_outputs(), 3);
        assert!(model
            .ensemble()
            .stages()
            .iter()
            .all(|stage| stage.trees().len() == 3));

        let labels: Array1<usize> = model.predict(dataset.records());
        assert_eq!(&labels, dataset.targets());

        let staged = model.staged_predict_proba(dataset.records()).unwrap();
        assert_eq!(staged.len(), 30);
        for proba in staged {
            assert_abs_diff_eq!(proba.sum_axis(Axis(1)), Array1::ones(30), epsilon = 1e-12);
        }
        let last = model.staged_predict(dataset.records()).unwrap().last().unwrap();
        assert_eq!(last, labels);
    }

    #[test]
    fn labels_have_to_cover_every_class() {
        let params = GradientBoostingClassifier::<f64>::params();

        let missing = Dataset::new(array![[0.], [1.], [2.]], array![0, 2, 2]);
        assert_eq!(params.fit(&missing).unwrap_err().kind(), ErrorKind::InvalidInput);

        let single = Dataset::new(array![[0.], [1.]], array![0, 0]);
        assert_eq!(params.fit(&single).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn huge_labels_are_rejected() {
        let params = GradientBoostingClassifier::<f64>::params();

        let largest = Dataset::new(array![[0.], [1.]], array![0, usize::MAX]);
        assert_eq!(params.fit(&largest).unwrap_err().kind(), ErrorKind::InvalidInput);

        let sparse = Dataset::new(array![[0.], [1.], [2.]], array![0, 1, usize::MAX / 2]);
        assert_eq!(params.fit(&sparse).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn deviance_aliases_check_the_class_count() {
        let err = GradientBoostingClassifier::params()
            .loss(LossName::BinomialDeviance)
            .fit(&bands(3))
            .unwrap_err();
        assert!(matches!(err, GradientBoostError::ClassCount { found: 3, .. }));
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = GradientBoostingClassifier::params()
            .loss(LossName::MultinomialDeviance)
            .fit(&bands(2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let model = GradientBoostingClassifier::params()
            .loss(LossName::MultinomialDeviance)
            .n_estimators(5)
            .fit(&bands(4))
            .unwrap();
        assert_eq!(model.ensemble().n_outputs(), 4);
    }

    #[test]
    fn warm_start_keeps_the_classes() {
        let model = GradientBoostingClassifier::params()
            .n_estimators(5)
            .fit(&bands(3))
            .unwrap();

        let err = GradientBoostingClassifier::params()
            .n_estimators(10)
            .warm_start(true)
            .fit_with(Some(model.clone()), &bands(4))
            .unwrap_err();
        assert!(matches!(
            err,
            GradientBoostError::WarmStartOutputs {
                fitted: 3,
                requested: 4
            }
        ));

        let grown = GradientBoostingClassifier::params()
            .n_estimators(10)
            .warm_start(true)
            .fit_with(Some(model), &bands(3))
            .unwrap();
        assert_eq!(grown.n_stages(), 10);
    }

    #[test]
    fn probabilities_from_scores() {
        let binary = score_to_proba(array![[0.], [2f64.ln()]]);
        assert_abs_diff_eq!(binary, array![[0.5, 0.5], [1. / 3., 2. / 3.]], epsilon = 1e-12);

        let multi = score_to_proba(array![[0., 0., 0.], [1000., 0., 0.]]);
        assert_abs_diff_eq!(multi.row(0), array![1. / 3., 1. / 3., 1. / 3.], epsilon = 1e-12);
        assert_abs_diff_eq!(multi.row(1), array![1., 0., 0.], epsilon = 1e-12);

        assert_eq!(most_probable(&array![[0.2, 0.8], [0.5, 0.5]]), array![1, 0]);
    }
}
