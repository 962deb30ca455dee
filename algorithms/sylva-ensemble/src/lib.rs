//! # Gradient Boosting
//!
//! Gradient boosting builds an additive model in a forward stage-wise fashion. Every stage fits
//! one regression tree (see `sylva-trees`) per output to the negative gradient of a loss
//! function, evaluated at the current prediction, and adds it to the model scaled by a learning
//! rate. The leaf values of each tree are afterwards replaced by the optimal step of the loss in
//! that region.
//!
//! ## Losses
//!
//! | [`LossName`] | task | baseline |
//! |---|---|---|
//! | `LeastSquares` | regression | mean |
//! | `LeastAbsoluteDeviation` | regression | median |
//! | `Huber` | regression | `alpha`-quantile |
//! | `Quantile` | regression | `alpha`-quantile |
//! | `Deviance` | classification | log-odds or class priors |
//!
//! The explicit `BinomialDeviance` and `MultinomialDeviance` aliases are deprecated in favour of
//! `Deviance`, which picks one of them from the number of classes.
//!
//! ## Beyond `fit`
//!
//! * stochastic gradient boosting with `subsample < 1`, tracking the out-of-bag improvement of
//!   every stage
//! * warm starting, growing a fitted model with additional stages
//! * a [`Monitor`] consulted after every stage, able to stop the fit early
//! * staged predictions, yielding the prediction after every stage
//!
//! ## Reference
//!
//! * J. Friedman, Greedy Function Approximation: A Gradient Boosting Machine, The Annals of
//!   Statistics, Vol. 29, No. 5, 2001.
//! * J. Friedman, Stochastic Gradient Boosting, 1999.
//!
//! ## Example
//!
//! ```no_run
//! use sylva::prelude::*;
//! use sylva_ensemble::{EarlyStopping, GradientBoostingRegressor, LossName};
//! use ndarray::Array1;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let (train, valid) =
//!     sylva_datasets::generate::make_friedman1(500, 10, 1.0, &mut rng).split_with_ratio(0.8);
//!
//! let model = GradientBoostingRegressor::params()
//!     .loss(LossName::Huber)
//!     .n_estimators(500)
//!     .subsample(0.5)
//!     .fit_with_monitor(None, &train, &mut EarlyStopping::<f64>::new(20))
//!     .unwrap();
//!
//! let prediction: Array1<f64> = model.predict(valid.records());
//! let mse = (&prediction - valid.targets()).mapv(|e| e * e).mean().unwrap();
//! println!("{} stages, validation mse {:.3}", model.n_stages(), mse);
//! ```

mod gradient_boost;

pub use gradient_boost::*;
