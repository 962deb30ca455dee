mod algorithm;
mod classifier;
mod error;
mod hyperparams;
mod init;
mod loss;
mod monitor;
mod regressor;
mod reporter;
mod state;

pub use algorithm::*;
pub use classifier::*;
pub use error::*;
pub use hyperparams::*;
pub use init::{
    BaselineClone, BaselineEstimator, LogOddsEstimator, MeanEstimator, PriorProbabilityEstimator,
    QuantileEstimator, ZeroEstimator,
};
pub use loss::{Loss, LossName};
pub use monitor::*;
pub use regressor::GradientBoostingRegressor;
pub use reporter::*;
pub use state::*;
