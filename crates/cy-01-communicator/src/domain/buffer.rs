//! Local Buffers
//!
//! Versioned mirrors of one field instance, owned by the rank holding them.
//!
//! - `SendBuffer`: the owner's copy; stamps a fresh `WriteId` on every publish.
//! - `RecvBuffer`: a reader's copy; replaced only when the exchange protocol
//!   accepts a fetched record.

use shared_types::{FieldKey, WindowRecord, WriteId};

/// Owner-side buffer of a field this rank publishes.
#[derive(Clone, Debug)]
pub struct SendBuffer {
    key: FieldKey,
    values: Vec<f64>,
    write_id: WriteId,
}

impl SendBuffer {
    pub fn new(key: FieldKey, len: usize) -> Self {
        Self {
            key,
            values: vec![0.0; len],
            write_id: WriteId::NEVER,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last published payload.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Id of the last publish (`NEVER` before the first).
    pub fn write_id(&self) -> WriteId {
        self.write_id
    }

    /// Copy `values` in and stamp the next write id.
    ///
    /// Caller has checked the length.
    pub fn stage(&mut self, values: &[f64], forced: bool) -> WindowRecord {
        self.values.copy_from_slice(values);
        self.write_id = self.write_id.next();
        WindowRecord {
            values: self.values.clone(),
            write_id: self.write_id,
            forced,
        }
    }
}

/// Reader-side buffer of a field owned by another rank.
#[derive(Clone, Debug)]
pub struct RecvBuffer {
    key: FieldKey,
    values: Vec<f64>,
    last_id: WriteId,
    is_new: bool,
    accepted: u64,
}

impl RecvBuffer {
    pub fn new(key: FieldKey, len: usize) -> Self {
        Self {
            key,
            values: vec![0.0; len],
            last_id: WriteId::NEVER,
            is_new: false,
            accepted: 0,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last accepted payload (zeros before the first acceptance).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Id of the last accepted record.
    pub fn last_id(&self) -> WriteId {
        self.last_id
    }

    /// Whether the most recent fetch accepted a new record.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Number of records accepted over the buffer's lifetime.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Consumer acknowledges it has read the current payload.
    pub fn mark_read(&mut self) {
        self.is_new = false;
    }

    /// Replace the payload with an accepted record.
    pub(crate) fn accept(&mut self, record: WindowRecord) {
        debug_assert_eq!(record.values.len(), self.values.len());
        self.values = record.values;
        self.last_id = self.last_id.max(record.write_id);
        self.is_new = true;
        self.accepted += 1;
    }

    /// A fetch ran but nothing was accepted; payload stays as it was.
    pub(crate) fn reject(&mut self) {
        self.is_new = false;
    }
}
