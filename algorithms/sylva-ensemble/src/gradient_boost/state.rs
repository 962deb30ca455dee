use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use sylva::{traits::Predict, Float};
use sylva_trees::RegressionTree;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::{GradientBoostError, Result};

/// Grow-only buffer holding one entry per fitted stage
///
/// The logical length is the number of entries pushed so far, `planned` the number of stages the
/// current fit is going to produce. Warm starting may raise the plan but never below the entries
/// already stored.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct StageBuffer<T> {
    items: Vec<T>,
    planned: usize,
}

impl<T> Default for StageBuffer<T> {
    fn default() -> Self {
        Self::with_planned(0)
    }
}

impl<T> StageBuffer<T> {
    pub fn with_planned(planned: usize) -> Self {
        StageBuffer {
            items: Vec::with_capacity(planned),
            planned,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn planned(&self) -> usize {
        self.planned
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Raise the planned number of stages
    pub fn grow_to(&mut self, planned: usize) -> Result<()> {
        if planned < self.items.len() {
            return Err(GradientBoostError::ShrinkingWarmStart {
                requested: planned,
                fitted: self.items.len(),
            });
        }

        self.items.reserve(planned - self.items.len());
        self.planned = planned;
        Ok(())
    }

    pub fn push(&mut self, item: T) {
        debug_assert!(self.items.len() < self.planned, "stage buffer overflow");
        self.items.push(item);
    }

    /// Drop the unused part of the plan, after an early stop the plan equals the entries stored
    pub fn finalize(&mut self) {
        self.planned = self.items.len();
        self.items.shrink_to_fit();
    }
}

impl<T: Clone + Default> StageBuffer<T> {
    /// Buffer already holding `len` default entries
    fn filled(len: usize, planned: usize) -> Self {
        let mut buffer = Self::with_planned(planned.max(len));
        buffer.items.resize(len, T::default());
        buffer
    }
}

/// One boosting stage: a tree per output and the learning rate it was fitted with
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Stage<F> {
    trees: Vec<RegressionTree<F>>,
    learning_rate: F,
}

impl<F: Float> Stage<F> {
    pub(crate) fn new(trees: Vec<RegressionTree<F>>, learning_rate: F) -> Self {
        Stage {
            trees,
            learning_rate,
        }
    }

    /// The trees of this stage, indexed by output
    pub fn trees(&self) -> &[RegressionTree<F>] {
        &self.trees
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    /// Add the scaled output of every tree to the matching column of `score`
    pub(crate) fn add_to(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, score: &mut Array2<F>) {
        for (k, tree) in self.trees.iter().enumerate() {
            let output: Array1<F> = tree.predict(x);
            score.column_mut(k).scaled_add(self.learning_rate, &output);
        }
    }

    /// Mean of the normalised feature importance over the trees of this stage
    pub(crate) fn feature_importance(&self, n_features: usize) -> Array1<F> {
        let mut importance = Array1::zeros(n_features);
        for tree in &self.trees {
            importance += &Array1::from(tree.feature_importance());
        }
        importance / F::cast(self.trees.len().max(1))
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
struct OobHistory<F> {
    score: StageBuffer<F>,
    improvement: StageBuffer<F>,
}

/// Per-stage training loss and, when subsampling, out-of-bag loss and improvement
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct History<F> {
    train_score: StageBuffer<F>,
    oob: Option<OobHistory<F>>,
}

impl<F: Float> Default for History<F> {
    fn default() -> Self {
        History {
            train_score: StageBuffer::default(),
            oob: None,
        }
    }
}

impl<F: Float> History<F> {
    pub(crate) fn new(planned: usize, track_oob: bool) -> Self {
        let mut history = History {
            train_score: StageBuffer::with_planned(planned),
            oob: None,
        };
        if track_oob {
            history.track_oob();
        }
        history
    }

    /// Raise the plan to `planned` stages, creating the out-of-bag history when newly requested
    ///
    /// Stages fitted before out-of-bag tracking started record zero.
    pub(crate) fn grow_to(&mut self, planned: usize, track_oob: bool) -> Result<()> {
        self.train_score.grow_to(planned)?;
        if track_oob && self.oob.is_none() {
            self.track_oob();
        }
        if let Some(oob) = self.oob.as_mut() {
            oob.score.grow_to(planned)?;
            oob.improvement.grow_to(planned)?;
        }
        Ok(())
    }

    fn track_oob(&mut self) {
        let (len, planned) = (self.train_score.len(), self.train_score.planned());
        self.oob = Some(OobHistory {
            score: StageBuffer::filled(len, planned),
            improvement: StageBuffer::filled(len, planned),
        });
    }

    /// Record the scores of a completed stage, `oob` holds the out-of-bag loss and improvement
    pub(crate) fn record(&mut self, train_score: F, oob: Option<(F, F)>) {
        self.train_score.push(train_score);
        if let Some(history) = self.oob.as_mut() {
            let (score, improvement) = oob.unwrap_or((F::zero(), F::zero()));
            history.score.push(score);
            history.improvement.push(improvement);
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.train_score.finalize();
        if let Some(oob) = self.oob.as_mut() {
            oob.score.finalize();
            oob.improvement.finalize();
        }
    }

    pub fn len(&self) -> usize {
        self.train_score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_score.is_empty()
    }

    pub fn train_score(&self) -> &[F] {
        self.train_score.as_slice()
    }

    pub fn oob_score(&self) -> Option<&[F]> {
        self.oob.as_ref().map(|oob| oob.score.as_slice())
    }

    pub fn oob_improvement(&self) -> Option<&[F]> {
        self.oob.as_ref().map(|oob| oob.improvement.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_grows_but_never_below_its_entries() {
        let mut buffer = StageBuffer::with_planned(3);
        buffer.push(1);
        buffer.push(2);

        buffer.grow_to(5).unwrap();
        assert_eq!(buffer.planned(), 5);
        buffer.grow_to(2).unwrap();

        let err = buffer.grow_to(1).unwrap_err();
        assert!(matches!(
            err,
            GradientBoostError::ShrinkingWarmStart {
                requested: 1,
                fitted: 2
            }
        ));

        buffer.finalize();
        assert_eq!(buffer.planned(), 2);
        assert_eq!(buffer.as_slice(), &[1, 2]);
    }

    #[test]
    fn oob_history_is_zero_filled_when_started_late() {
        let mut history = History::<f64>::new(2, false);
        history.record(1.0, None);
        history.record(0.5, None);
        assert_eq!(history.oob_score(), None);

        history.grow_to(4, true).unwrap();
        history.record(0.4, Some((0.6, 0.1)));
        history.finalize();

        assert_eq!(history.train_score(), &[1.0, 0.5, 0.4]);
        assert_eq!(history.oob_score().unwrap(), &[0.0, 0.0, 0.6]);
        assert_eq!(history.oob_improvement().unwrap(), &[0.0, 0.0, 0.1]);
    }

    #[test]
    fn oob_history_records_zero_without_subsampling() {
        let mut history = History::<f64>::new(2, true);
        history.record(1.0, Some((2.0, 0.5)));
        history.grow_to(2, false).unwrap();
        history.record(0.8, None);

        assert_eq!(history.len(), 2);
        assert_eq!(history.oob_score().unwrap(), &[2.0, 0.0]);
    }
}
