//! Observers notified while the stages of an ensemble are fitted
use std::time::{Duration, Instant};

use sylva::Float;
use tracing::info;

use super::GradientBoosting;

/// Hooks invoked by the fitting loop
///
/// All hooks default to doing nothing. `()` is the observer which ignores every event.
pub trait FitObserver<F: Float> {
    /// Called once before the first stage of a fit, `begin_at_stage` is non-zero when warm
    /// starting
    fn fit_started(
        &mut self,
        _model: &GradientBoosting<F>,
        _begin_at_stage: usize,
        _n_estimators: usize,
    ) {
    }

    fn stage_started(&mut self, _stage: usize) {}

    /// Called after the scores of `stage` have been recorded in `model`
    fn stage_completed(&mut self, _stage: usize, _model: &GradientBoosting<F>) {}
}

impl<F: Float> FitObserver<F> for () {}

/// Logs a progress table at `info` level
///
/// With `verbose == 1` the table is printed for the first ten stages, then every ten stages up
/// to a hundred and so on. Higher levels report every stage.
#[derive(Clone, Debug)]
pub struct VerboseReporter {
    verbose: usize,
    verbose_mod: usize,
    begin_at_stage: usize,
    n_estimators: usize,
    started: Instant,
}

impl VerboseReporter {
    pub fn new(verbose: usize) -> Self {
        VerboseReporter {
            verbose,
            verbose_mod: 1,
            begin_at_stage: 0,
            n_estimators: 0,
            started: Instant::now(),
        }
    }

    /// Column titles of the progress table
    pub fn header(track_oob: bool) -> String {
        let mut header = format!("{:>10} {:>16}", "Iter", "Train Loss");
        if track_oob {
            header.push_str(&format!(" {:>16}", "OOB Improve"));
        }
        header.push_str(&format!(" {:>16}", "Remaining Time"));
        header
    }

    /// One row of the progress table, stages are printed one-based
    pub fn progress_line<F: Float>(
        stage: usize,
        train_score: F,
        oob_improvement: Option<F>,
        remaining: Duration,
    ) -> String {
        let mut line = format!("{:>10} {:>16.4}", stage + 1, train_score);
        if let Some(improvement) = oob_improvement {
            line.push_str(&format!(" {:>16.4}", improvement));
        }
        line.push_str(&format!(" {:>16}", format_remaining(remaining)));
        line
    }
}

fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs_f64();
    if secs > 60.0 {
        format!("{:.2}m", secs / 60.0)
    } else {
        format!("{:.2}s", secs)
    }
}

impl<F: Float> FitObserver<F> for VerboseReporter {
    fn fit_started(&mut self, model: &GradientBoosting<F>, begin_at_stage: usize, n_estimators: usize) {
        self.verbose_mod = 1;
        self.begin_at_stage = begin_at_stage;
        self.n_estimators = n_estimators;
        self.started = Instant::now();

        info!("{}", Self::header(model.oob_score().is_some()));
    }

    fn stage_completed(&mut self, stage: usize, model: &GradientBoosting<F>) {
        let completed = stage + 1 - self.begin_at_stage;
        if completed % self.verbose_mod != 0 {
            return;
        }

        let remaining = self
            .started
            .elapsed()
            .mul_f64((self.n_estimators.saturating_sub(stage + 1)) as f64 / completed as f64);
        let train_score = model.train_score().get(stage).copied().unwrap_or_else(F::zero);
        let oob_improvement = model
            .oob_improvement()
            .map(|improvement| improvement.get(stage).copied().unwrap_or_else(F::zero));

        info!(
            "{}",
            Self::progress_line(stage, train_score, oob_improvement, remaining)
        );

        if self.verbose == 1 && completed / (self.verbose_mod * 10) > 0 {
            self.verbose_mod *= 10;
        }
    }
}
