//! Bound Tracker
//!
//! Pure state machine deciding which candidate bounds are worth publishing.
//!
//! ```text
//! [COLLECTING] ──strict improvement──→ [PUBLISHING] ──finalize──→ [FINALIZED]
//!      │                                   ↺ strict improvement        ▲
//!      └─────────────────────────finalize──────────────────────────────┘
//! ```
//!
//! Equal candidates are never accepted, so the same value is never
//! published twice in a row.

use crate::error::{SpokeError, SpokeResult};
use serde::Serialize;
use shared_types::Improvement;

/// Lifecycle of a bound-reporting spoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BoundState {
    /// No candidate accepted yet.
    Collecting,
    /// At least one improvement has been published.
    Publishing,
    /// Terminal; no more offers.
    Finalized,
}

/// Best-so-far bound under a fixed improvement direction.
#[derive(Clone, Debug)]
pub struct BoundTracker {
    improvement: Improvement,
    best: Option<f64>,
    state: BoundState,
    improvements: u64,
}

impl BoundTracker {
    pub fn new(improvement: Improvement) -> Self {
        Self {
            improvement,
            best: None,
            state: BoundState::Collecting,
            improvements: 0,
        }
    }

    pub fn improvement(&self) -> Improvement {
        self.improvement
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn state(&self) -> BoundState {
        self.state
    }

    /// Number of accepted improvements.
    pub fn improvements(&self) -> u64 {
        self.improvements
    }

    /// The candidate, if it strictly improves on the best bound so far.
    ///
    /// `None`, NaN and non-strict candidates yield `None`. Never changes the
    /// tracker; accepted values are recorded with `commit`.
    pub fn check(&self, candidate: Option<f64>) -> SpokeResult<Option<f64>> {
        if self.state == BoundState::Finalized {
            return Err(SpokeError::AlreadyFinalized);
        }
        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let current = self.best.unwrap_or_else(|| self.improvement.worst());
        Ok(self
            .improvement
            .improves(candidate, current)
            .then_some(candidate))
    }

    /// Record a value `check` accepted and that has since been published.
    pub fn commit(&mut self, value: f64) {
        self.best = Some(value);
        self.state = BoundState::Publishing;
        self.improvements += 1;
    }

    /// `check` then `commit` in one step.
    pub fn offer(&mut self, candidate: Option<f64>) -> SpokeResult<Option<f64>> {
        let accepted = self.check(candidate)?;
        if let Some(value) = accepted {
            self.commit(value);
        }
        Ok(accepted)
    }

    /// Enter the terminal state and return the best bound, if any.
    pub fn finalize(&mut self) -> Option<f64> {
        self.state = BoundState::Finalized;
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimizing_inner_bound_scenario() {
        let mut tracker = BoundTracker::new(Improvement::SmallerIsBetter);
        assert_eq!(tracker.state(), BoundState::Collecting);

        assert_eq!(tracker.offer(Some(10.0)).unwrap(), Some(10.0));
        assert_eq!(tracker.offer(Some(8.0)).unwrap(), Some(8.0));
        assert_eq!(tracker.offer(Some(8.0)).unwrap(), None);
        assert_eq!(tracker.offer(Some(9.0)).unwrap(), None);

        assert_eq!(tracker.best(), Some(8.0));
        assert_eq!(tracker.improvements(), 2);
        assert_eq!(tracker.state(), BoundState::Publishing);
    }

    #[test]
    fn test_outer_bound_improves_upward() {
        let mut tracker = BoundTracker::new(Improvement::LargerIsBetter);
        tracker.offer(Some(-5.0)).unwrap();
        assert_eq!(tracker.offer(Some(-7.0)).unwrap(), None);
        assert_eq!(tracker.offer(Some(-1.0)).unwrap(), Some(-1.0));
    }

    #[test]
    fn test_none_and_nan_are_ignored() {
        let mut tracker = BoundTracker::new(Improvement::SmallerIsBetter);
        assert_eq!(tracker.offer(None).unwrap(), None);
        assert_eq!(tracker.offer(Some(f64::NAN)).unwrap(), None);
        assert_eq!(tracker.state(), BoundState::Collecting);
    }

    #[test]
    fn test_best_is_monotone() {
        let mut tracker = BoundTracker::new(Improvement::SmallerIsBetter);
        let mut previous = f64::INFINITY;
        for candidate in [5.0, 7.0, 3.0, 3.0, 4.0, 1.0, 2.0] {
            tracker.offer(Some(candidate)).unwrap();
            let best = tracker.best().unwrap();
            assert!(best <= previous);
            previous = best;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_check_leaves_tracker_untouched() {
        let mut tracker = BoundTracker::new(Improvement::SmallerIsBetter);
        tracker.offer(Some(10.0)).unwrap();

        assert_eq!(tracker.check(Some(8.0)).unwrap(), Some(8.0));
        assert_eq!(tracker.check(Some(8.0)).unwrap(), Some(8.0));
        assert_eq!(tracker.best(), Some(10.0));
        assert_eq!(tracker.improvements(), 1);

        tracker.commit(8.0);
        assert_eq!(tracker.check(Some(8.0)).unwrap(), None);
        assert_eq!(tracker.best(), Some(8.0));
    }

    #[test]
    fn test_finalize_without_candidate_returns_none() {
        let mut tracker = BoundTracker::new(Improvement::LargerIsBetter);
        assert_eq!(tracker.finalize(), None);
        assert_eq!(tracker.state(), BoundState::Finalized);
    }

    #[test]
    fn test_offer_after_finalize_rejected() {
        let mut tracker = BoundTracker::new(Improvement::SmallerIsBetter);
        tracker.offer(Some(1.0)).unwrap();
        assert_eq!(tracker.finalize(), Some(1.0));
        assert!(matches!(
            tracker.offer(Some(0.5)),
            Err(SpokeError::AlreadyFinalized)
        ));
        assert_eq!(tracker.finalize(), Some(1.0));
    }
}
