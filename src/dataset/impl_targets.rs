use super::{AsSingleTargets, DatasetBase, Records};
use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

/// A one-dimensional NdArray can act as targets
impl<L, S: Data<Elem = L>> AsSingleTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_single_targets(&self) -> ArrayView1<L> {
        self.view()
    }
}

impl<T: AsSingleTargets> AsSingleTargets for &T {
    type Elem = T::Elem;

    fn as_single_targets(&self) -> ArrayView1<Self::Elem> {
        (*self).as_single_targets()
    }
}

impl<R: Records, T: AsSingleTargets> DatasetBase<R, T> {
    /// Returns a view on the single target of the dataset
    pub fn as_single_targets(&self) -> ArrayView1<T::Elem> {
        self.targets.as_single_targets()
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{Dataset, DatasetBase};
    use crate::traits::PredictInplace;
    use crate::Predict;
    use ndarray::{array, Array1, Array2, ArrayBase, Data, Ix2};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct RowSum;

    impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for RowSum {
        fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
            for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
                *target = row.sum();
            }
        }

        fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
            Array1::zeros(x.nrows())
        }
    }

    #[test]
    fn single_targets_view() {
        let dataset = DatasetBase::new(array![[1., 2.], [3., 4.]], array![0.5, 1.5]);
        assert_eq!(dataset.as_single_targets(), array![0.5, 1.5]);
        assert_eq!(dataset.nsamples(), 2);
        assert_eq!(dataset.nfeatures(), 2);
        assert_eq!(dataset.feature_names(), vec!["feature-0", "feature-1"]);
        assert_eq!(dataset.weight_for(1), 1.0);
        assert!(dataset.weights().is_none());
    }

    #[test]
    fn predict_from_records_and_dataset() {
        let records = array![[1., 2.], [3., 4.], [5., 6.]];
        let dataset = Dataset::new(records.clone(), array![0usize, 1, 0]);

        let from_records: Array1<f64> = RowSum.predict(&records);
        let from_dataset: Array1<f64> = RowSum.predict(&dataset);

        assert_eq!(from_records, array![3., 7., 11.]);
        assert_eq!(from_records, from_dataset);
    }

    #[test]
    fn shuffle_and_split_keep_rows_aligned() {
        let records: Array2<f64> = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64);
        let targets: Array1<usize> = (0..10).collect();
        let weights = Array1::from_iter((0..10).map(|x| x as f32));
        let dataset = Dataset::new(records, targets).with_weights(weights);

        let mut rng = SmallRng::seed_from_u64(42);
        let (train, valid) = dataset.shuffle(&mut rng).split_with_ratio(0.8);

        assert_eq!(train.nsamples(), 8);
        assert_eq!(valid.nsamples(), 2);
        for part in &[&train, &valid] {
            for (i, row) in part.records().rows().into_iter().enumerate() {
                let target = part.targets()[i];
                assert_eq!(row[0], (target * 2) as f64);
                assert_eq!(part.weight_for(i), target as f32);
            }
        }
    }
}
