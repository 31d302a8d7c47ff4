//! # Flat Window Layout
//!
//! A field instance occupies `len + RESERVED_SLOTS` consecutive `f64` slots:
//!
//! ```text
//! [ payload[0] .. payload[len-1] | forced | write_id ]
//! ```
//!
//! The write-id slot is last and is written last, so a reader that sees a
//! new id has at least started observing the matching payload.

use crate::RESERVED_SLOTS;
use shared_types::{WindowRecord, WriteId};

/// Number of slots a field of payload length `len` occupies.
pub fn slot_len(len: usize) -> usize {
    len + RESERVED_SLOTS
}

/// Write `record` into `slots`, id slot last.
///
/// `slots` must already have `slot_len(record.len())` entries.
pub fn encode_into(record: &WindowRecord, slots: &mut [f64]) {
    let len = record.len();
    debug_assert_eq!(slots.len(), slot_len(len));
    slots[..len].copy_from_slice(&record.values);
    slots[len] = if record.forced { 1.0 } else { 0.0 };
    slots[len + 1] = record.write_id.to_wire();
}

/// Fresh slot vector holding `record`.
pub fn encode(record: &WindowRecord) -> Vec<f64> {
    let mut slots = vec![0.0; slot_len(record.len())];
    encode_into(record, &mut slots);
    slots
}

/// Read a record back out of `slots`.
///
/// The id slot is sanitized by `WriteId::from_wire`; the forced slot counts
/// only an exact `1.0`.
pub fn decode(slots: &[f64]) -> WindowRecord {
    let len = slots.len().saturating_sub(RESERVED_SLOTS);
    WindowRecord {
        values: slots[..len].to_vec(),
        forced: slots.get(len).copied() == Some(1.0),
        write_id: slots
            .get(len + 1)
            .copied()
            .map(WriteId::from_wire)
            .unwrap_or(WriteId::NEVER),
    }
}
