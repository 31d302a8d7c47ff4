//! Incumbent Cache
//!
//! Solution vector captured at the moment of the last accepted improvement,
//! paired with the coordinate order fixed at setup.

use crate::error::{SpokeError, SpokeResult};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IncumbentCache {
    coordinates: Vec<usize>,
    values: Option<Vec<f64>>,
}

impl IncumbentCache {
    pub fn new(coordinates: Vec<usize>) -> Self {
        Self {
            coordinates,
            values: None,
        }
    }

    pub fn coordinates(&self) -> &[usize] {
        &self.coordinates
    }

    /// Cached values, one per coordinate.
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    /// Whether `snapshot` fits this cache's coordinates.
    pub fn validate(&self, snapshot: &[f64]) -> SpokeResult<()> {
        if snapshot.len() != self.coordinates.len() {
            return Err(SpokeError::SnapshotLength {
                expected: self.coordinates.len(),
                actual: snapshot.len(),
            });
        }
        Ok(())
    }

    /// Overwrite the cache with a fresh snapshot.
    pub fn store(&mut self, snapshot: Vec<f64>) -> SpokeResult<()> {
        self.validate(&snapshot)?;
        self.values = Some(snapshot);
        Ok(())
    }
}
