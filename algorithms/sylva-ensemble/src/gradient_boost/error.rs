use thiserror::Error;

use super::LossName;

/// Simplified `Result` using [`GradientBoostError`] as error type
pub type Result<T> = std::result::Result<T, GradientBoostError>;

/// Coarse classification of a [`GradientBoostError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or inconsistent configuration, detected before any stage is fitted
    Config,
    /// Malformed records or targets
    InvalidInput,
    /// Prediction requested from an ensemble without stages
    NotFitted,
    /// Feature count differs from the one seen during fitting
    Shape,
    /// A collaborator (weak learner or baseline estimator) failed while fitting
    Learner,
}

#[derive(Error, Debug, Clone)]
pub enum GradientBoostError {
    #[error("n_estimators must be greater than 0 but was {0}")]
    InvalidNEstimators(usize),
    #[error("learning_rate must be greater than 0 and finite but was {0}")]
    InvalidLearningRate(f64),
    #[error("subsample must be in (0, 1] but was {0}")]
    InvalidSubsample(f64),
    #[error("alpha must be in (0, 1) for loss '{loss}' but was {alpha}")]
    InvalidAlpha { loss: LossName, alpha: f64 },
    #[error("loss '{0}' not supported")]
    UnknownLoss(String),
    #[error("loss '{loss}' not supported for {task}")]
    UnsupportedLoss { loss: LossName, task: &'static str },
    #[error("loss '{loss}' requires {expected} classes, but the targets contain {found}")]
    ClassCount {
        loss: LossName,
        expected: &'static str,
        found: usize,
    },
    #[error("invalid tree parameters: {0}")]
    TreeParams(sylva::error::Error),
    #[error(
        "n_estimators={requested} must be larger or equal to the {fitted} fitted stages when warm starting"
    )]
    ShrinkingWarmStart { requested: usize, fitted: usize },
    #[error("cannot warm start an ensemble fitted with loss '{fitted}' using loss '{requested}'")]
    WarmStartLoss {
        fitted: LossName,
        requested: LossName,
    },
    #[error("cannot warm start an ensemble with {fitted} outputs on targets requiring {requested}")]
    WarmStartOutputs { fitted: usize, requested: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("estimator not fitted, call `fit` before `{0}`")]
    NotFitted(&'static str),
    #[error("records have {found} features, but the ensemble was fitted on {expected}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("baseline estimator predicted shape ({rows}, {cols}), expected ({expected_rows}, 1) or ({expected_rows}, {expected_cols})")]
    BaselineShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
    #[error(transparent)]
    BaseCrate(#[from] sylva::error::Error),
}

impl GradientBoostError {
    /// Which part of the error taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        use GradientBoostError::*;

        match self {
            InvalidNEstimators(_)
            | InvalidLearningRate(_)
            | InvalidSubsample(_)
            | InvalidAlpha { .. }
            | UnknownLoss(_)
            | UnsupportedLoss { .. }
            | ClassCount { .. }
            | TreeParams(_)
            | ShrinkingWarmStart { .. }
            | WarmStartLoss { .. }
            | WarmStartOutputs { .. } => ErrorKind::Config,
            InvalidInput(_) => ErrorKind::InvalidInput,
            NotFitted(_) => ErrorKind::NotFitted,
            FeatureMismatch { .. } => ErrorKind::Shape,
            BaselineShape { .. } | BaseCrate(_) => ErrorKind::Learner,
        }
    }
}
