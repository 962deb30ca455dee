use super::{DatasetBase, Float, Records};
use crate::traits::{Predict, PredictInplace};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use rand::{seq::SliceRandom, Rng};

/// Implementation without constraints on records and targets
///
/// This implementation block provides methods for the creation and mutation of datasets. This
/// includes swapping the targets, return the records etc.
impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dataset = Dataset::new(records, targets);
    /// ```
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            weights: Array1::zeros(0),
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns optionally weights
    pub fn weights(&self) -> Option<&[f32]> {
        if !self.weights.is_empty() {
            Some(self.weights.as_slice().unwrap())
        } else {
            None
        }
    }

    /// Return a single weight
    ///
    /// The weight of the `idx`th observation is returned. If no weight is specified, then all
    /// observations are unweighted with default value `1.0`.
    pub fn weight_for(&self, idx: usize) -> f32 {
        self.weights.get(idx).copied().unwrap_or(1.0)
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// This allow the reader to understand its purpose while analysing results, for example
    /// correlation analysis or feature importance.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Return records of a dataset
    ///
    /// The records are data points from which predictions are made. This functions returns a
    /// reference to the record field.
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Updates the records of a dataset
    pub fn with_records<T2: Records>(self, records: T2) -> DatasetBase<T2, T> {
        DatasetBase {
            records,
            targets: self.targets,
            weights: self.weights,
            feature_names: self.feature_names,
        }
    }

    /// Updates the weights of a dataset
    pub fn with_weights(mut self, weights: Array1<f32>) -> DatasetBase<R, T> {
        self.weights = weights;

        self
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }

    /// Number of observations in the dataset
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    /// Number of features of each observation
    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }
}

impl<F: Float, L: Clone> DatasetBase<Array2<F>, Array1<L>> {
    /// Shuffle the observations of an owned dataset with a random number generator
    pub fn shuffle<Rn: Rng>(self, rng: &mut Rn) -> Self {
        let mut indices = (0..self.nsamples()).collect::<Vec<_>>();
        indices.shuffle(rng);

        let records = self.records.select(Axis(0), &indices);
        let targets = self.targets.select(Axis(0), &indices);
        let weights = if self.weights.is_empty() {
            self.weights
        } else {
            self.weights.select(Axis(0), &indices)
        };

        DatasetBase {
            records,
            targets,
            weights,
            feature_names: self.feature_names,
        }
    }
}

/// Predict a target for each row of a record matrix
impl<'a, F, D, T, O> Predict<&'a ArrayBase<D, Ix2>, T> for O
where
    D: Data<Elem = F>,
    O: PredictInplace<ArrayBase<D, Ix2>, T>,
{
    fn predict(&self, records: &'a ArrayBase<D, Ix2>) -> T {
        let mut targets = self.default_target(records);
        self.predict_inplace(records, &mut targets);
        targets
    }
}

/// Predict a target for each record of a dataset
impl<'a, F, D, T, S, O> Predict<&'a DatasetBase<ArrayBase<D, Ix2>, T>, S> for O
where
    D: Data<Elem = F>,
    O: PredictInplace<ArrayBase<D, Ix2>, S>,
{
    fn predict(&self, ds: &'a DatasetBase<ArrayBase<D, Ix2>, T>) -> S {
        let mut targets = self.default_target(&ds.records);
        self.predict_inplace(&ds.records, &mut targets);
        targets
    }
}
