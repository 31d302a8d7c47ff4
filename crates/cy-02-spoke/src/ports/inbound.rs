//! Driving Ports (API - Inbound)

use crate::error::SpokeResult;
use async_trait::async_trait;
use serde::Serialize;
use shared_types::SpokeVariant;

/// What a spoke hands back when it stops.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalBound {
    pub variant: SpokeVariant,
    pub bound: f64,
    /// Cached incumbent, for incumbent-caching variants.
    pub solution: Option<Vec<f64>>,
}

/// Bound-reporting API driven by a spoke's algorithm loop.
///
/// Methods that publish or fetch are collective over the spoke's cylinder.
#[async_trait]
pub trait BoundSpokeApi: Send {
    /// Publish `value` unconditionally and append it to the trace.
    async fn set_bound(&mut self, value: f64) -> SpokeResult<()>;

    /// Publish `candidate` only if it strictly improves the best bound.
    /// Returns whether it was published.
    async fn update_if_improving(&mut self, candidate: Option<f64>) -> SpokeResult<bool>;

    /// Refresh hub-published inputs and check for termination.
    async fn got_kill_signal(&mut self) -> SpokeResult<bool>;

    /// Stop accepting bounds and return the best one, restoring the cached
    /// incumbent into the solution source. `None` if nothing was accepted.
    fn finalize(&mut self) -> SpokeResult<Option<FinalBound>>;
}
