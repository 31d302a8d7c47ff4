//! # Transport Ports
//!
//! The two collaborators every communicator is built on:
//!
//! - `WindowTransport`: one-sided `put`/`get` on a shared strata window.
//! - `GroupComm`: collective `barrier` and elementwise-MAX `allreduce` over a
//!   process group (a cylinder, or a strata group during setup).
//!
//! Real deployments back these with MPI RMA windows and communicators; the
//! in-memory adapters in `crate::memory` back them with shared slot tables so
//! a whole topology can run inside one test process.

use async_trait::async_trait;
use shared_types::{FieldKey, Rank, WindowRecord};
use thiserror::Error;

/// Errors from the transport layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// The key was never declared on this window.
    #[error("Field {key} is not declared on this window")]
    UnknownField { key: FieldKey },

    /// Two declarations of the same key disagree on its length.
    #[error("Field {key} declared with length {declared}, but rank {rank} requested {requested}")]
    LengthMismatch {
        key: FieldKey,
        declared: usize,
        requested: usize,
        rank: Rank,
    },

    /// A rank tried to write a field owned by someone else.
    #[error("Rank {rank} cannot put to {key}: only the owner writes a field")]
    NotOwner { key: FieldKey, rank: Rank },

    /// Payload length differs from the declared field length.
    #[error("Payload of length {actual} does not fit {key} (length {expected})")]
    PayloadLength {
        key: FieldKey,
        expected: usize,
        actual: usize,
    },

    /// Members contributed reductions of different shapes.
    #[error("Allreduce shape mismatch: expected {expected} values, got {actual}")]
    ReductionShape { expected: usize, actual: usize },

    /// A topology must have at least one spoke and one rank per cylinder.
    #[error("Topology needs at least one spoke and one rank per cylinder")]
    EmptyTopology,

    /// The rank is outside the group or window.
    #[error("Rank {rank} is outside a group of size {size}")]
    RankOutOfRange { rank: Rank, size: usize },
}

/// Result type for transport operations.
pub type WindowResult<T> = Result<T, WindowError>;

/// One-sided access to a strata window, as seen from a single rank.
#[async_trait]
pub trait WindowTransport: Send + Sync {
    /// This rank's position in the strata group.
    fn rank(&self) -> Rank;

    /// Declare a field instance and its payload length.
    ///
    /// Every rank touching a key declares it; all declarations must agree on
    /// the length or the later one fails with `LengthMismatch`.
    async fn declare(&self, key: FieldKey, len: usize) -> WindowResult<()>;

    /// One-sided write of a field this rank owns. Fire-and-forget.
    async fn put(&self, key: FieldKey, record: &WindowRecord) -> WindowResult<()>;

    /// One-sided read of any declared field.
    ///
    /// The returned record may be torn relative to a concurrent `put`; the
    /// caller is responsible for deciding whether to trust it.
    async fn get(&self, key: FieldKey) -> WindowResult<WindowRecord>;
}

/// Collective operations over a process group.
#[async_trait]
pub trait GroupComm: Send + Sync {
    /// This member's rank within the group.
    fn rank(&self) -> Rank;

    /// Number of members in the group.
    fn size(&self) -> usize;

    /// Block until every member has entered the barrier.
    async fn barrier(&self) -> WindowResult<()>;

    /// Elementwise maximum of every member's `values`, returned to all.
    async fn allreduce_max(&self, values: &[i64]) -> WindowResult<Vec<i64>>;
}
