//! Field Registry
//!
//! Static mapping from `(field, owner)` to a fixed payload length, filled
//! once during setup and frozen when the window is built.

use crate::error::{CommError, CommResult};
use shared_types::{Direction, FieldKey};
use std::collections::BTreeMap;

/// A registered field instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHandle {
    pub key: FieldKey,
    pub len: usize,
    pub direction: Direction,
}

/// Per-rank registry of every field instance this rank sends or receives.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    entries: BTreeMap<FieldKey, FieldHandle>,
    closed: bool,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` with `direction` and payload length `len`.
    ///
    /// Re-registering with the same length and direction returns the
    /// existing handle; any disagreement is a setup error.
    pub fn register(
        &mut self,
        key: FieldKey,
        direction: Direction,
        len: usize,
    ) -> CommResult<FieldHandle> {
        if self.closed {
            return Err(CommError::RegistrationClosed { key });
        }

        if let Some(existing) = self.entries.get(&key) {
            if existing.direction != direction {
                return Err(CommError::DirectionConflict {
                    key,
                    registered: existing.direction,
                });
            }
            if existing.len != len {
                return Err(CommError::LengthMismatch {
                    key,
                    registered: existing.len,
                    requested: len,
                });
            }
            return Ok(*existing);
        }

        let handle = FieldHandle {
            key,
            len,
            direction,
        };
        self.entries.insert(key, handle);
        Ok(handle)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldHandle> {
        self.entries.get(key)
    }

    /// All handles in key order.
    pub fn handles(&self) -> impl Iterator<Item = &FieldHandle> {
        self.entries.values()
    }

    /// Freeze the registry; later registrations fail.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
