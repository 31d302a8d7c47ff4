//! # Core Exchange Entities
//!
//! Defines the values every cylinder agrees on before any data flows.
//!
//! ## Clusters
//!
//! - **Addressing**: `Field`, `Rank`, `FieldKey`, `Direction`
//! - **Versioning**: `WriteId`
//! - **Transport boundary**: `WindowRecord`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: ADDRESSING
// =============================================================================

/// Rank of a process inside a strata group.
///
/// Strata rank 0 is always the hub; spoke `i` sits at strata rank `i`.
pub type Rank = usize;

/// Strata rank of the hub.
pub const HUB_RANK: Rank = 0;

/// Logical channel tag of a window field.
///
/// A tag alone does not identify a field: the same tag is owned by several
/// ranks (every spoke owns its own `InnerBound`, for example). See `FieldKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    /// Hub-owned termination flag, 1 slot.
    Shutdown,
    /// Hub-owned `[outer, inner]` global bounds, 2 slots.
    Bounds,
    /// Spoke-owned inner (primal, incumbent) bound, 1 slot.
    InnerBound,
    /// Spoke-owned outer (dual) bound, 1 slot.
    OuterBound,
    /// Hub-owned nonanticipative candidate vector.
    Nonant,
    /// Hub-owned dual weights (Ws).
    Duals,
}

impl Field {
    /// All channel tags, in wire declaration order.
    pub const ALL: [Field; 6] = [
        Field::Shutdown,
        Field::Bounds,
        Field::InnerBound,
        Field::OuterBound,
        Field::Nonant,
        Field::Duals,
    ];

    /// Short, stable name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Shutdown => "shutdown",
            Field::Bounds => "bounds",
            Field::InnerBound => "inner_bound",
            Field::OuterBound => "outer_bound",
            Field::Nonant => "nonant",
            Field::Duals => "duals",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one field instance: a channel tag plus its owning rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub field: Field,
    pub owner: Rank,
}

impl FieldKey {
    pub fn new(field: Field, owner: Rank) -> Self {
        Self { field, owner }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.field, self.owner)
    }
}

/// Whether a process writes or reads a field instance. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Send,
    Receive,
}

// =============================================================================
// CLUSTER B: VERSIONING
// =============================================================================

/// Monotonic per-`(field, owner)` publish counter.
///
/// `WriteId(0)` means "never published". Ids travel through the window as
/// `f64`, which is exact up to 2^53.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WriteId(pub u64);

impl WriteId {
    pub const NEVER: WriteId = WriteId(0);

    /// The id that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        WriteId(self.0.saturating_add(1))
    }

    /// Decode a raw id slot read from a window.
    ///
    /// A remote write in progress can surface a non-finite value; that and
    /// any negative value decode to `NEVER`.
    pub fn from_wire(raw: f64) -> Self {
        if !raw.is_finite() || raw < 0.0 {
            return WriteId::NEVER;
        }
        WriteId(raw as u64)
    }

    /// Encode for the id slot of a window.
    pub fn to_wire(self) -> f64 {
        self.0 as f64
    }

    pub fn is_never(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: TRANSPORT BOUNDARY
// =============================================================================

/// One field instance as seen at the transport boundary.
///
/// The flat window layout (payload followed by reserved control slots) is
/// private to transport adapters; everything above them works with this
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WindowRecord {
    /// Payload, exactly the field's registered length.
    pub values: Vec<f64>,
    /// Version stamped by the owner on publish.
    pub write_id: WriteId,
    /// Readers must accept this record even if `write_id` is not newer.
    pub forced: bool,
}

impl WindowRecord {
    pub fn new(values: Vec<f64>, write_id: WriteId) -> Self {
        Self {
            values,
            write_id,
            forced: false,
        }
    }

    /// A record readers accept unconditionally (termination signals).
    pub fn forced(values: Vec<f64>, write_id: WriteId) -> Self {
        Self {
            values,
            write_id,
            forced: true,
        }
    }

    /// The zeroed record a window holds before its owner's first publish.
    pub fn empty(len: usize) -> Self {
        Self::new(vec![0.0; len], WriteId::NEVER)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
