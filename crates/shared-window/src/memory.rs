//! # In-Memory Transport
//!
//! Shared-slot implementations of `WindowTransport` and `GroupComm`.
//!
//! Every rank gets its own handle; handles created together share one slot
//! table. Suitable for single-process simulation and tests; a distributed
//! deployment would back the ports with real RMA windows instead.

use crate::transport::{GroupComm, WindowError, WindowResult, WindowTransport};
use crate::wire;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{FieldKey, Rank, WindowRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;
use tracing::{debug, trace};

// =============================================================================
// WINDOW
// =============================================================================

struct WindowShared {
    size: usize,
    /// Flat layout per field instance, see `crate::wire`.
    slots: RwLock<HashMap<FieldKey, Vec<f64>>>,
    puts: AtomicU64,
}

/// One rank's handle on a shared in-memory strata window.
pub struct InMemoryWindow {
    rank: Rank,
    shared: Arc<WindowShared>,
    /// Raw id-slot values the next `get` of a key observes instead of the
    /// stored one. Reproduces torn reads deterministically.
    id_overrides: Mutex<HashMap<FieldKey, f64>>,
    gets: AtomicU64,
}

impl InMemoryWindow {
    /// Create handles for a window shared by `size` ranks.
    pub fn create(size: usize) -> Vec<InMemoryWindow> {
        let shared = Arc::new(WindowShared {
            size,
            slots: RwLock::new(HashMap::new()),
            puts: AtomicU64::new(0),
        });
        (0..size)
            .map(|rank| InMemoryWindow {
                rank,
                shared: Arc::clone(&shared),
                id_overrides: Mutex::new(HashMap::new()),
                gets: AtomicU64::new(0),
            })
            .collect()
    }

    /// Make this rank's next `get` of `key` observe `raw` in the id slot.
    pub fn override_next_id(&self, key: FieldKey, raw: f64) {
        self.id_overrides.lock().insert(key, raw);
    }

    /// Declared payload length of `key`, if any rank declared it.
    pub fn declared_len(&self, key: FieldKey) -> Option<usize> {
        self.shared
            .slots
            .read()
            .get(&key)
            .map(|slots| slots.len() - crate::RESERVED_SLOTS)
    }

    /// Total puts performed on the shared window by all ranks.
    pub fn puts_performed(&self) -> u64 {
        self.shared.puts.load(Ordering::Relaxed)
    }

    /// Gets performed through this handle.
    pub fn gets_performed(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl WindowTransport for InMemoryWindow {
    fn rank(&self) -> Rank {
        self.rank
    }

    async fn declare(&self, key: FieldKey, len: usize) -> WindowResult<()> {
        if key.owner >= self.shared.size {
            return Err(WindowError::RankOutOfRange {
                rank: key.owner,
                size: self.shared.size,
            });
        }

        let mut slots = self.shared.slots.write();
        match slots.get(&key) {
            Some(existing) if existing.len() != wire::slot_len(len) => {
                Err(WindowError::LengthMismatch {
                    key,
                    declared: existing.len() - crate::RESERVED_SLOTS,
                    requested: len,
                    rank: self.rank,
                })
            }
            Some(_) => Ok(()),
            None => {
                slots.insert(key, wire::encode(&WindowRecord::empty(len)));
                debug!(field = %key, len, rank = self.rank, "Field declared");
                Ok(())
            }
        }
    }

    async fn put(&self, key: FieldKey, record: &WindowRecord) -> WindowResult<()> {
        if key.owner != self.rank {
            return Err(WindowError::NotOwner {
                key,
                rank: self.rank,
            });
        }

        let mut slots = self.shared.slots.write();
        let target = slots
            .get_mut(&key)
            .ok_or(WindowError::UnknownField { key })?;
        let expected = target.len() - crate::RESERVED_SLOTS;
        if record.len() != expected {
            return Err(WindowError::PayloadLength {
                key,
                expected,
                actual: record.len(),
            });
        }
        wire::encode_into(record, target);
        drop(slots);

        self.shared.puts.fetch_add(1, Ordering::Relaxed);
        trace!(field = %key, write_id = %record.write_id, "Window put");
        Ok(())
    }

    async fn get(&self, key: FieldKey) -> WindowResult<WindowRecord> {
        let mut observed = self
            .shared
            .slots
            .read()
            .get(&key)
            .cloned()
            .ok_or(WindowError::UnknownField { key })?;

        if let Some(raw) = self.id_overrides.lock().remove(&key) {
            if let Some(id_slot) = observed.last_mut() {
                *id_slot = raw;
            }
        }

        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(wire::decode(&observed))
    }
}

// =============================================================================
// GROUP
// =============================================================================

struct GroupShared {
    size: usize,
    barrier: Barrier,
    contributions: Mutex<Vec<Option<Vec<i64>>>>,
}

/// One member's handle on an in-memory process group.
pub struct InMemoryGroup {
    rank: Rank,
    shared: Arc<GroupShared>,
}

impl InMemoryGroup {
    /// Create handles for a group of `size` members.
    pub fn create(size: usize) -> Vec<InMemoryGroup> {
        let shared = Arc::new(GroupShared {
            size,
            barrier: Barrier::new(size.max(1)),
            contributions: Mutex::new(vec![None; size]),
        });
        (0..size)
            .map(|rank| InMemoryGroup {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

/// Elementwise maximum over every contribution of length `expected`.
fn reduce_max(contributions: &[Option<Vec<i64>>], expected: usize) -> WindowResult<Vec<i64>> {
    let mut reduced = vec![i64::MIN; expected];
    for values in contributions.iter().flatten() {
        if values.len() != expected {
            return Err(WindowError::ReductionShape {
                expected,
                actual: values.len(),
            });
        }
        for (acc, v) in reduced.iter_mut().zip(values) {
            *acc = (*acc).max(*v);
        }
    }
    Ok(reduced)
}

#[async_trait]
impl GroupComm for InMemoryGroup {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    async fn barrier(&self) -> WindowResult<()> {
        self.shared.barrier.wait().await;
        Ok(())
    }

    async fn allreduce_max(&self, values: &[i64]) -> WindowResult<Vec<i64>> {
        self.shared.contributions.lock()[self.rank] = Some(values.to_vec());

        // Everyone has contributed once all members pass the first barrier;
        // nobody overwrites a slot for the next round before all have read
        // past the second one.
        self.shared.barrier.wait().await;
        let reduced = reduce_max(&self.shared.contributions.lock(), values.len());
        self.shared.barrier.wait().await;

        reduced
    }
}
