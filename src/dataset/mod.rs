//! Datasets
//!
//! This module implements the dataset struct and various helper traits to extend its
//! functionality.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Ix1, Ix2, OwnedRepr, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::cmp::PartialOrd;
use std::fmt;
use std::hash::Hash;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

mod impl_dataset;
mod impl_records;
mod impl_targets;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in records of a dataset and, for
/// regression task, in the targets as well.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq
    + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable and hashable. Class indices are `usize`, binary outcomes may
/// also be `bool`.
pub trait Label: PartialEq + Eq + Hash + Clone {}

impl Label for bool {}
impl Label for usize {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the data
/// and may contain targets, weights and feature names. In order to keep the type complexity low
/// the dataset base is only generic over the records and targets and introduces a trait bound on
/// the records. `weights` and `feature_names`, on the other hand, are always assumed to be owned
/// and copied when views are created.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: a one-dimensional array with dimensionality (nsamples)
/// * `weights`: optional weights for each sample with dimensionality (nsamples), an empty array
/// stands for unit weights
/// * `feature_names`: optional descriptive feature names with dimensionality (nfeatures)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    pub weights: Array1<f32>,
    feature_names: Vec<String>,
}

/// Dataset
///
/// The most commonly used typed of dataset. It contains a number of records
/// stored as an `Array2` and each record corresponds to a single target, stored
/// in an `Array1`.
pub type Dataset<D, T> = DatasetBase<ArrayBase<OwnedRepr<D>, Ix2>, ArrayBase<OwnedRepr<T>, Ix1>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

/// Return a reference to a single target variable
pub trait AsSingleTargets {
    type Elem;

    /// Returns a view on the targets as one-dimensional array
    fn as_single_targets(&self) -> ArrayView1<Self::Elem>;
}

impl<F: Float, L> Dataset<F, L> {
    /// Split the dataset into two owned parts, the first one containing `ratio` of the
    /// samples
    pub fn split_with_ratio(self, ratio: f32) -> (Dataset<F, L>, Dataset<F, L>)
    where
        L: Clone,
    {
        let n = (self.nsamples() as f32 * ratio).ceil() as usize;
        let n = n.min(self.nsamples());

        let first = self.select_rows(&(0..n).collect::<Vec<_>>());
        let second = self.select_rows(&(n..self.nsamples()).collect::<Vec<_>>());

        (first, second)
    }

    fn select_rows(&self, indices: &[usize]) -> Dataset<F, L>
    where
        L: Clone,
    {
        let records: Array2<F> = self.records.select(ndarray::Axis(0), indices);
        let targets: Array1<L> = indices.iter().map(|&i| self.targets[i].clone()).collect();
        let weights = if self.weights.is_empty() {
            Array1::zeros(0)
        } else {
            self.weights.select(ndarray::Axis(0), indices)
        };

        DatasetBase {
            records,
            targets,
            weights,
            feature_names: self.feature_names.clone(),
        }
    }
}
