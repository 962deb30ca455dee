//! `sylva-datasets` provides seeded synthetic datasets used by the tests, benchmarks and
//! examples of the `sylva` workspace.
//!
//! ## Current State
//!
//! All generators live in [`generate`]:
//!
//! * `blobs`: points sampled around a set of centroids
//! * `labelled_blobs`: blobs together with the index of their centroid as class label
//! * `make_hastie_10_2`: the binary classification problem of Hastie et al. (ESL, example 10.2)
//! * `make_friedman1`: Friedman's first regression problem
//!
//! Every generator takes the random number generator explicitly, so a seeded generator yields
//! the same dataset on every run:
//! ```ignore
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let (train, valid) = sylva_datasets::generate::make_friedman1(500, 10, 1.0, &mut rng)
//!     .split_with_ratio(0.8);
//! ```

pub mod generate;
