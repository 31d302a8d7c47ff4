//! Freshness Consensus
//!
//! Individual one-sided reads are unsynchronized and may observe a torn
//! write id. Every member of the reading cylinder contributes
//!
//! ```text
//! [ id, -id, forced, -forced ]
//! ```
//!
//! to an elementwise MAX reduction. The group agrees only if
//! `max(id) == -max(-id)` and likewise for the forced flag; otherwise the
//! fetch is `Torn` and every member keeps its previous buffer. Agreement on
//! the id is a proxy for payload consistency, not a fence over every word.
//!
//! ```text
//!                 agreed?
//!        ┌──── no ───┴─── yes ────┐
//!        ▼                         ▼
//!     [TORN]          id > last_seen || forced ?
//!                       ┌── no ──┴── yes ──┐
//!                       ▼                   ▼
//!                    [STALE]           [ACCEPTED]
//! ```

use shared_types::{WindowRecord, WriteId};

/// Number of values each member contributes to the reduction.
pub const CONTRIBUTION_LEN: usize = 4;

/// What one member saw in the control slots of its scratch read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub write_id: WriteId,
    pub forced: bool,
}

impl Observation {
    pub fn of(record: &WindowRecord) -> Self {
        Self {
            write_id: record.write_id,
            forced: record.forced,
        }
    }

    /// Signed pairs for the MAX reduction.
    pub fn contribution(&self) -> [i64; CONTRIBUTION_LEN] {
        let id = i64::try_from(self.write_id.0).unwrap_or(i64::MAX);
        let forced = i64::from(self.forced);
        [id, -id, forced, -forced]
    }
}

/// Result of one fetch, identical on every member of the reading group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The group agreed on a new (or forced) record; buffers were replaced.
    Accepted(WriteId),
    /// The group agreed on a record it had already seen.
    Stale(WriteId),
    /// Members observed different records; nothing is trusted this round.
    Torn { highest: WriteId, lowest: WriteId },
}

impl FetchOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, FetchOutcome::Accepted(_))
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Accepted(_) => "accepted",
            FetchOutcome::Stale(_) => "stale",
            FetchOutcome::Torn { .. } => "torn",
        }
    }
}

fn to_id(value: i64) -> WriteId {
    WriteId(u64::try_from(value).unwrap_or(0))
}

/// Decide a fetch from the local observation and the reduced contributions.
pub fn decide(local: Observation, reduced: &[i64], last_seen: WriteId) -> FetchOutcome {
    let [max_id, neg_min_id, max_forced, neg_min_forced] = match reduced {
        [a, b, c, d] => [*a, *b, *c, *d],
        // a malformed reduction is treated like a disagreement
        _ => {
            return FetchOutcome::Torn {
                highest: local.write_id,
                lowest: WriteId::NEVER,
            }
        }
    };
    let min_id = -neg_min_id;
    let min_forced = -neg_min_forced;

    if max_id != min_id || max_forced != min_forced {
        return FetchOutcome::Torn {
            highest: to_id(max_id),
            lowest: to_id(min_id),
        };
    }

    let agreed = Observation {
        write_id: to_id(max_id),
        forced: max_forced == 1,
    };
    if agreed != local {
        // cannot happen when every member reports honestly
        return FetchOutcome::Torn {
            highest: agreed.write_id,
            lowest: local.write_id,
        };
    }

    if agreed.write_id > last_seen || agreed.forced {
        FetchOutcome::Accepted(agreed.write_id)
    } else {
        FetchOutcome::Stale(agreed.write_id)
    }
}
