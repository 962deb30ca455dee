//!
//! # Regression trees
//! `sylva-trees` provides the weak learner of the `sylva` boosting ensembles: a regression tree
//! fitted to weighted targets.
//!
//! # The big picture
//!
//! `sylva-trees` is a crate in the `sylva` workspace. The gradient boosting driver of
//! `sylva-ensemble` fits one tree per stage and output dimension against the pseudo-residuals of
//! its loss, reads back the leaf each training sample falls into and replaces the leaf values by
//! the optimal step of the loss.
//!
//! # Current state
//!
//! `sylva-trees` provides an [implementation](RegressionTree) of single-tree fitting for
//! regression with
//!
//! * mean squared error and Friedman's improvement score as split criteria
//! * depth-first growth, or best-first growth bounded by a number of leaves
//! * per-sample weights, where zero-weight samples are excluded from fitting
//! * random feature subsampling at each node
//!

mod decision_trees;

pub use decision_trees::*;

// Re-export the common Result alias for convenience
pub use sylva::error::Result;
