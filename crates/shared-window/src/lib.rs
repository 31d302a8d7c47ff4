//! # Shared Window - One-Sided Exchange Transport
//!
//! Ports and in-memory adapters for the window transport that hub and spoke
//! communicators exchange field data through.
//!
//! ## Exchange Model
//!
//! ```text
//! ┌──────────────┐                          ┌──────────────┐
//! │  Owner rank  │                          │ Reader ranks │
//! │              │    put() (one-sided)     │              │
//! │              │ ──────┐                  │              │
//! └──────────────┘       │                  └──────────────┘
//!                        ▼                          │
//!                 ┌──────────────┐                  │
//!                 │ Strata Window│ ◀────────────────┘
//!                 │ [data|f|id]  │      get() (one-sided, unsynchronized)
//!                 └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - A field instance has exactly one writer, its owner.
//! - Readers never lock the window; they detect torn reads themselves.
//! - The flat `[payload | forced | write_id]` layout never leaves this crate.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod memory;
pub mod topology;
pub mod transport;
pub mod wire;

// Re-export main types
pub use memory::{InMemoryGroup, InMemoryWindow};
pub use topology::{CommContext, InMemoryTopology};
pub use transport::{GroupComm, WindowError, WindowResult, WindowTransport};

/// Control slots appended after every payload: force flag, then write id.
pub const RESERVED_SLOTS: usize = 2;
