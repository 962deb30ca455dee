//! Callbacks deciding whether fitting continues after a stage
use sylva::Float;

use super::GradientBoosting;

/// Checked after every completed stage, returning `true` stops the fit
///
/// The stage index is absolute, so a warm-started fit continues counting where the previous fit
/// stopped. A stop after stage `i` leaves exactly `i + 1` stages in the ensemble.
///
/// Closures taking `(usize, &GradientBoosting<F>)` are monitors as well. Annotate the reference
/// parameter so the closure accepts any lifetime:
///
/// ```rust
/// use sylva_ensemble::{GradientBoosting, Monitor};
///
/// let mut stop_after_ten = |stage: usize, _model: &GradientBoosting<f64>| stage >= 9;
/// assert!(!stop_after_ten.should_stop(3, &GradientBoosting::default()));
/// ```
pub trait Monitor<F: Float> {
    fn should_stop(&mut self, stage: usize, model: &GradientBoosting<F>) -> bool;
}

impl<F: Float, T> Monitor<F> for T
where
    T: FnMut(usize, &GradientBoosting<F>) -> bool,
{
    fn should_stop(&mut self, stage: usize, model: &GradientBoosting<F>) -> bool {
        self(stage, model)
    }
}

/// Monitor which never interrupts the fit
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverStop;

impl<F: Float> Monitor<F> for NeverStop {
    fn should_stop(&mut self, _stage: usize, _model: &GradientBoosting<F>) -> bool {
        false
    }
}

/// Stops once the loss did not improve for `patience` consecutive stages
///
/// The out-of-bag loss is watched when the ensemble tracks it, the training loss otherwise.
/// Since the training loss of a boosted ensemble hardly ever increases, this is mostly useful
/// together with subsampling.
///
/// A stage index that does not advance past the previous one marks a new fit, which starts the
/// search for the best loss over.
#[derive(Clone, Debug)]
pub struct EarlyStopping<F> {
    patience: usize,
    best: Option<F>,
    best_stage: usize,
    last_stage: Option<usize>,
}

impl<F: Float> EarlyStopping<F> {
    /// A `patience` of zero stops after the first stage
    pub fn new(patience: usize) -> Self {
        EarlyStopping {
            patience,
            best: None,
            best_stage: 0,
            last_stage: None,
        }
    }

    /// Lowest loss observed so far
    pub fn best(&self) -> Option<F> {
        self.best
    }

    /// Stage at which the lowest loss was observed
    pub fn best_stage(&self) -> usize {
        self.best_stage
    }

    fn update(&mut self, stage: usize, loss: F) -> bool {
        if self.last_stage.map_or(false, |last| stage <= last) {
            self.best = None;
        }
        self.last_stage = Some(stage);

        if self.best.map_or(true, |best| loss < best) {
            self.best = Some(loss);
            self.best_stage = stage;
        }

        stage.saturating_sub(self.best_stage) >= self.patience
    }
}

impl<F: Float> Monitor<F> for EarlyStopping<F> {
    fn should_stop(&mut self, stage: usize, model: &GradientBoosting<F>) -> bool {
        let loss = match model.oob_score() {
            Some(oob) => oob.last(),
            None => model.train_score().last(),
        };

        match loss {
            Some(&loss) => self.update(stage, loss),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_going_while_improving() {
        let mut early_stopping = EarlyStopping::new(2);
        for (stage, loss) in [1.0, 0.9, 0.8, 0.7].iter().enumerate() {
            assert!(!early_stopping.update(stage, *loss));
        }
        assert_eq!(early_stopping.best_stage(), 3);
        assert_eq!(early_stopping.best(), Some(0.7));
    }

    #[test]
    fn stops_after_patience_stages() {
        let mut early_stopping = EarlyStopping::new(2);
        assert!(!early_stopping.update(0, 0.5));
        assert!(!early_stopping.update(1, 0.6));
        assert!(early_stopping.update(2, 0.5));
        assert_eq!(early_stopping.best_stage(), 0);
    }

    #[test]
    fn restarts_when_reused_for_a_new_fit() {
        let mut early_stopping = EarlyStopping::new(3);
        for (stage, loss) in [1.0, 0.5, 0.2].iter().enumerate() {
            assert!(!early_stopping.update(stage, *loss));
        }
        assert_eq!(early_stopping.best_stage(), 2);

        // a fresh fit counts from zero again and its losses are not compared to the old ones
        assert!(!early_stopping.update(0, 0.9));
        assert_eq!(early_stopping.best_stage(), 0);
        assert_eq!(early_stopping.best(), Some(0.9));
        assert!(!early_stopping.update(1, 1.0));
        assert!(!early_stopping.update(2, 1.0));
        assert!(early_stopping.update(3, 1.0));
    }

    #[test]
    fn never_stop_and_closures() {
        let model = GradientBoosting::<f64>::default();
        assert!(!NeverStop.should_stop(100, &model));

        let mut calls = 0;
        let mut counting = |_stage: usize, _model: &GradientBoosting<f64>| {
            calls += 1;
            calls == 2
        };
        assert!(!counting.should_stop(0, &model));
        assert!(counting.should_stop(1, &model));

        // an unfitted model has no history to watch
        assert!(!EarlyStopping::new(0).should_stop(0, &model));
    }
}
