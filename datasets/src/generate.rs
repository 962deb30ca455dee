//! Utility functions for randomly generating datasets

use ndarray::{s, Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Distribution, StandardNormal, Uniform},
    RandomExt,
};
use sylva::Dataset;

/// Special case of `blobs_with_distribution` with a standard normal distribution.
pub fn blobs(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    blobs_with_distribution(blob_size, blob_centroids, StandardNormal, rng)
}

/// Given an input matrix `blob_centroids`, with shape `(n_blobs, n_features)`,
/// generate `blob_size` data points (a "blob") around each of the blob centroids.
///
/// Rows are ordered blob by blob: the first `blob_size` rows belong to the first centroid and
/// so on.
pub fn blobs_with_distribution(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    distribution: impl Distribution<f64> + Clone,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let (n_centroids, n_features) = blob_centroids.dim();
    let mut blobs: Array2<f64> = Array2::zeros((n_centroids * blob_size, n_features));

    for (blob_index, blob_centroid) in blob_centroids.rows().into_iter().enumerate() {
        let blob = make_blob(blob_size, &blob_centroid, distribution.clone(), rng);

        let indexes = s![blob_index * blob_size..(blob_index + 1) * blob_size, ..];
        blobs.slice_mut(indexes).assign(&blob);
    }
    blobs
}

/// Generate `blob_size` data points (a "blob") around `blob_centroid` using the given distribution.
fn make_blob(
    blob_size: usize,
    blob_centroid: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    distribution: impl Distribution<f64>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let shape = (blob_size, blob_centroid.len());
    let origin_blob: Array2<f64> = Array::random_using(shape, distribution, rng);
    origin_blob + blob_centroid
}

/// Blobs around `blob_centroids` labelled with the row index of their centroid
///
/// The labels run from `0` to `n_blobs - 1`, which makes the result a ready-made multi-class
/// classification problem.
pub fn labelled_blobs(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Dataset<f64, usize> {
    let records = blobs(blob_size, blob_centroids, rng);
    let targets = (0..blob_centroids.nrows())
        .flat_map(|label| std::iter::repeat(label).take(blob_size))
        .collect::<Array1<_>>();

    Dataset::new(records, targets)
}

/// Binary classification problem used in Hastie et al., "Elements of Statistical Learning",
/// example 10.2
///
/// Ten standard normal features. The label is `1` when the squared norm of a sample exceeds
/// `9.34` (the median of a chi-squared distribution with ten degrees of freedom) and `0`
/// otherwise.
pub fn make_hastie_10_2(n_samples: usize, rng: &mut impl Rng) -> Dataset<f64, usize> {
    let records: Array2<f64> = Array::random_using((n_samples, 10), StandardNormal, rng);
    let targets = records
        .map_axis(Axis(1), |row| row.dot(&row))
        .mapv(|norm| if norm > 9.34 { 1 } else { 0 });

    Dataset::new(records, targets)
}

/// Friedman's first regression problem
///
/// Features are drawn uniformly from `[0, 1)`. Only the first five influence the target
///
/// `y = 10 sin(pi x0 x1) + 20 (x2 - 0.5)^2 + 10 x3 + 5 x4 + noise * N(0, 1)`
///
/// the remaining `n_features - 5` are independent of it.
///
/// # Panics
///
/// If `n_features` is smaller than five.
pub fn make_friedman1(
    n_samples: usize,
    n_features: usize,
    noise: f64,
    rng: &mut impl Rng,
) -> Dataset<f64, f64> {
    assert!(
        n_features >= 5,
        "make_friedman1 needs at least five features, got {}",
        n_features
    );

    let records: Array2<f64> =
        Array::random_using((n_samples, n_features), Uniform::new(0., 1.), rng);
    let noise: Array1<f64> = Array::random_using(n_samples, StandardNormal, rng) * noise;

    let targets = records
        .rows()
        .into_iter()
        .zip(noise.iter())
        .map(|(x, eps)| {
            10. * (std::f64::consts::PI * x[0] * x[1]).sin()
                + 20. * (x[2] - 0.5).powi(2)
                + 10. * x[3]
                + 5. * x[4]
                + eps
        })
        .collect::<Array1<_>>();

    Dataset::new(records, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn labelled_blobs_are_ordered_by_centroid() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let centroids = array![[0., 0.], [10., 10.], [-10., 10.]];
        let dataset = labelled_blobs(20, &centroids, &mut rng);

        assert_eq!(dataset.records().dim(), (60, 2));
        assert_eq!(dataset.targets()[0], 0);
        assert_eq!(dataset.targets()[20], 1);
        assert_eq!(dataset.targets()[59], 2);

        let second = dataset.records().slice(s![20..40, ..]).mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(second, array![10., 10.], epsilon = 1.0);
    }

    #[test]
    fn hastie_labels_follow_the_norm() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let dataset = make_hastie_10_2(200, &mut rng);

        assert_eq!(dataset.nfeatures(), 10);
        for (row, &label) in dataset.records().rows().into_iter().zip(dataset.targets()) {
            assert_eq!(label == 1, row.dot(&row) > 9.34);
        }
        // roughly balanced by construction
        let positives = dataset.targets().iter().filter(|&&y| y == 1).count();
        assert!(positives > 60 && positives < 140);
    }

    #[test]
    fn friedman1_without_noise_is_deterministic_function() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let dataset = make_friedman1(50, 7, 0.0, &mut rng);

        assert_eq!(dataset.records().dim(), (50, 7));
        let x = dataset.records().row(0);
        let expected = 10. * (std::f64::consts::PI * x[0] * x[1]).sin()
            + 20. * (x[2] - 0.5).powi(2)
            + 10. * x[3]
            + 5. * x[4];
        assert_abs_diff_eq!(dataset.targets()[0], expected, epsilon = 1e-12);
        assert!(dataset.records().iter().all(|&v| (0. ..1.).contains(&v)));
    }
}
