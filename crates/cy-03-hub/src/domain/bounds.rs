//! Global Bounds
//!
//! Best inner and outer bound reported by any spoke, each kept monotone
//! under the problem sense.

use serde::Serialize;
use shared_types::{BoundKind, Improvement, Sense};

#[derive(Clone, Debug, Serialize)]
pub struct GlobalBounds {
    #[serde(skip)]
    inner_improvement: Improvement,
    #[serde(skip)]
    outer_improvement: Improvement,
    pub inner: Option<f64>,
    pub outer: Option<f64>,
}

impl GlobalBounds {
    pub fn new(sense: Sense) -> Self {
        Self {
            inner_improvement: Improvement::for_bound(sense, BoundKind::Inner),
            outer_improvement: Improvement::for_bound(sense, BoundKind::Outer),
            inner: None,
            outer: None,
        }
    }

    /// Fold a reported bound in; returns whether it improved the global one.
    pub fn offer(&mut self, kind: BoundKind, value: f64) -> bool {
        let (improvement, slot) = match kind {
            BoundKind::Inner => (self.inner_improvement, &mut self.inner),
            BoundKind::Outer => (self.outer_improvement, &mut self.outer),
        };
        let current = slot.unwrap_or_else(|| improvement.worst());
        if improvement.improves(value, current) {
            *slot = Some(value);
            return true;
        }
        false
    }

    /// `[outer, inner]` as published on the `Bounds` field; unknown bounds
    /// are sent as their worst value.
    pub fn wire(&self) -> [f64; 2] {
        [
            self.outer.unwrap_or_else(|| self.outer_improvement.worst()),
            self.inner.unwrap_or_else(|| self.inner_improvement.worst()),
        ]
    }
}
