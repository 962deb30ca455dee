//! `sylva` provides the shared building blocks for stage-wise additive models in Rust.
//!
//! ## The big picture
//!
//! The crate is the root of a small workspace, in the spirit of Python's `scikit-learn`:
//!
//! * `sylva` contains the dataset abstraction, the `Fit`/`FitWith`/`Predict` traits and the
//!   checked hyperparameter pattern (`ParamGuard`) every algorithm crate builds on
//! * [`sylva-trees`](../sylva_trees/index.html) fits weighted regression trees, the weak learner
//!   of boosted ensembles
//! * [`sylva-ensemble`](../sylva_ensemble/index.html) implements gradient boosting for regression
//!   and classification
//!
//! ## Conventions
//!
//! Hyperparameters are built with an unchecked `XParams` builder. Calling `fit` on it validates
//! the parameters first and only then touches the data:
//!
//! ```ignore
//! let model = GradientBoostingRegressor::params()
//!     .n_estimators(200)
//!     .learning_rate(0.05)
//!     .fit(&dataset)?;
//! let prediction = model.predict(&dataset);
//! ```
//!

pub mod benchmarks;
pub mod dataset;
pub mod error;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, Float, Label};
pub use param_guard::ParamGuard;
pub use traits::*;
