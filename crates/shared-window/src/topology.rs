//! # Rank Topology
//!
//! A run is partitioned into cylinders of equal size: cylinder 0 is the hub,
//! cylinder `i` is spoke `i`. The member with cylinder rank `j` in every
//! cylinder forms strata group `j`, which shares one window:
//!
//! ```text
//!              strata 0        strata 1
//! hub      ┌──  rank 0  ──┬──  rank 1  ──┐   cylinder 0
//! spoke 1  ├──  rank 2  ──┼──  rank 3  ──┤   cylinder 1
//! spoke 2  └──  rank 4  ──┴──  rank 5  ──┘   cylinder 2
//! ```
//!
//! `CommContext` is the explicit per-rank bundle of these handles, threaded
//! through every communicator constructor instead of process-global state.

use crate::memory::{InMemoryGroup, InMemoryWindow};
use crate::transport::{GroupComm, WindowError, WindowResult, WindowTransport};
use shared_types::{Rank, HUB_RANK};
use std::sync::Arc;

/// Everything one rank needs to talk to the rest of the run.
#[derive(Clone)]
pub struct CommContext {
    /// Rank across the whole run, for logs.
    pub global_rank: usize,
    /// Index of this rank's cylinder (0 = hub).
    pub cylinder_index: usize,
    /// This rank's handle on its strata window.
    pub window: Arc<dyn WindowTransport>,
    /// Hub plus one member of every spoke cylinder.
    pub strata: Arc<dyn GroupComm>,
    /// Members cooperating on this cylinder's workload.
    pub cylinder: Arc<dyn GroupComm>,
}

impl CommContext {
    pub fn strata_rank(&self) -> Rank {
        self.strata.rank()
    }

    pub fn cylinder_rank(&self) -> Rank {
        self.cylinder.rank()
    }

    pub fn is_hub(&self) -> bool {
        self.strata_rank() == HUB_RANK
    }

    pub fn n_spokes(&self) -> usize {
        self.strata.size().saturating_sub(1)
    }
}

impl std::fmt::Debug for CommContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommContext")
            .field("global_rank", &self.global_rank)
            .field("cylinder_index", &self.cylinder_index)
            .field("strata_rank", &self.strata_rank())
            .field("cylinder_rank", &self.cylinder_rank())
            .finish()
    }
}

/// A hub plus `n_spokes` spoke cylinders wired over in-memory transports.
pub struct InMemoryTopology {
    cylinder_size: usize,
    cylinders: Vec<Vec<CommContext>>,
    /// `windows[strata][strata_rank]`
    windows: Vec<Vec<Arc<InMemoryWindow>>>,
}

impl InMemoryTopology {
    pub fn new(n_spokes: usize, cylinder_size: usize) -> WindowResult<Self> {
        if n_spokes == 0 || cylinder_size == 0 {
            return Err(WindowError::EmptyTopology);
        }
        let n_cylinders = n_spokes + 1;

        let mut strata_groups: Vec<Vec<Option<InMemoryGroup>>> = Vec::with_capacity(cylinder_size);
        let mut windows = Vec::with_capacity(cylinder_size);
        for _ in 0..cylinder_size {
            strata_groups.push(InMemoryGroup::create(n_cylinders).into_iter().map(Some).collect());
            windows.push(
                InMemoryWindow::create(n_cylinders)
                    .into_iter()
                    .map(Arc::new)
                    .collect::<Vec<_>>(),
            );
        }

        let mut cylinders = Vec::with_capacity(n_cylinders);
        for cylinder_index in 0..n_cylinders {
            let members = InMemoryGroup::create(cylinder_size);
            let mut contexts = Vec::with_capacity(cylinder_size);
            for (cylinder_rank, member) in members.into_iter().enumerate() {
                let strata = strata_groups[cylinder_rank][cylinder_index]
                    .take()
                    .ok_or(WindowError::RankOutOfRange {
                        rank: cylinder_index,
                        size: n_cylinders,
                    })?;
                let window: Arc<dyn WindowTransport> =
                    windows[cylinder_rank][cylinder_index].clone();
                contexts.push(CommContext {
                    global_rank: cylinder_index * cylinder_size + cylinder_rank,
                    cylinder_index,
                    window,
                    strata: Arc::new(strata),
                    cylinder: Arc::new(member),
                });
            }
            cylinders.push(contexts);
        }

        Ok(Self {
            cylinder_size,
            cylinders,
            windows,
        })
    }

    pub fn n_spokes(&self) -> usize {
        self.cylinders.len() - 1
    }

    pub fn cylinder_size(&self) -> usize {
        self.cylinder_size
    }

    /// Contexts of the hub cylinder, one per member.
    pub fn hub(&self) -> Vec<CommContext> {
        self.cylinders[0].clone()
    }

    /// Contexts of spoke `spoke` (1-based, matching its strata rank).
    pub fn spoke(&self, spoke: usize) -> WindowResult<Vec<CommContext>> {
        if spoke == 0 || spoke >= self.cylinders.len() {
            return Err(WindowError::RankOutOfRange {
                rank: spoke,
                size: self.cylinders.len(),
            });
        }
        Ok(self.cylinders[spoke].clone())
    }

    /// Concrete window handle of a rank, for inspection and fault injection.
    pub fn window(&self, cylinder_index: usize, cylinder_rank: usize) -> Arc<InMemoryWindow> {
        Arc::clone(&self.windows[cylinder_rank][cylinder_index])
    }
}
