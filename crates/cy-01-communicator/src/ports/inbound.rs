//! Driving Ports (API - Inbound)

use crate::domain::FetchOutcome;
use crate::error::CommResult;
use async_trait::async_trait;
use shared_types::{Field, Rank, WriteId};

/// Exchange operations a cylinder drives every iteration.
///
/// Every method except `got_kill_signal`'s cached fast path is collective
/// over the caller's cylinder: all members call it in the same order.
#[async_trait]
pub trait ExchangeApi: Send {
    /// Publish a new payload for a field this rank owns.
    async fn publish(&mut self, field: Field, values: &[f64]) -> CommResult<WriteId>;

    /// Publish a record readers must accept even if they saw its id before.
    async fn publish_forced(&mut self, field: Field, values: &[f64]) -> CommResult<WriteId>;

    /// Pull the latest record of `(field, owner)` into the local buffer if
    /// the cylinder agrees it is new.
    async fn fetch(&mut self, field: Field, owner: Rank) -> CommResult<FetchOutcome>;

    /// Fetch every registered receive field, in key order.
    async fn update_locals(&mut self) -> CommResult<()>;

    /// Refresh every receive buffer, then report whether the hub has
    /// requested termination.
    async fn got_kill_signal(&mut self) -> CommResult<bool>;
}
