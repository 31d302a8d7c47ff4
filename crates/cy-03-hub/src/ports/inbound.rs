//! Driving Ports (API - Inbound)

use crate::domain::Gaps;
use crate::error::HubResult;
use async_trait::async_trait;
use serde::Serialize;
use shared_types::WriteId;

/// Result of one pass over the spokes' bound fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BoundsUpdate {
    /// Spoke bound fields that held a new value.
    pub received: usize,
    /// New global inner bound, if any spoke improved it.
    pub new_inner: Option<f64>,
    /// New global outer bound, if any spoke improved it.
    pub new_outer: Option<f64>,
}

impl BoundsUpdate {
    pub fn improved(&self) -> bool {
        self.new_inner.is_some() || self.new_outer.is_some()
    }
}

/// Hub operations, collective over the hub cylinder.
#[async_trait]
pub trait HubApi: Send {
    async fn publish_nonants(&mut self, values: &[f64]) -> HubResult<WriteId>;

    async fn publish_duals(&mut self, values: &[f64]) -> HubResult<WriteId>;

    /// Publish `[outer, inner]` global bounds.
    async fn publish_bounds(&mut self) -> HubResult<WriteId>;

    /// Fetch every spoke's bound field and fold new values in.
    async fn receive_bounds(&mut self) -> HubResult<BoundsUpdate>;

    /// `publish_bounds` then `receive_bounds`.
    async fn sync(&mut self) -> HubResult<BoundsUpdate>;

    /// Tell every spoke to stop. Only the first call publishes.
    async fn send_terminate(&mut self) -> HubResult<()>;

    fn compute_gaps(&self) -> Gaps;

    fn is_converged(&self) -> bool;
}
