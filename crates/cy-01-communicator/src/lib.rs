//! # cy-01-communicator
//!
//! Per-rank exchange endpoint for hub/spoke cylinders.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Field Registry**: static `(field, owner) -> length` map, frozen at window build
//! - **Local Buffers**: versioned send/receive copies of every field instance
//! - **Freshness Consensus**: a cylinder accepts a record only if all members saw it
//! - **Kill Signal**: latched shutdown observation
//!
//! ## Architecture
//!
//! ```text
//! Spoke cylinder ──publish(InnerBound)──→ strata window ←──fetch── Hub cylinder
//!        ▲                                                              │
//!        └──────────────fetch(Shutdown, Bounds, Nonant, Duals)──────────┘
//! ```
//!
//! ## Fetch Outcomes
//!
//! ```text
//! fetch ──→ [ACCEPTED]   new id (or forced), buffer replaced
//!       ──→ [STALE]      id already seen, buffer untouched
//!       ──→ [TORN]       members disagreed, buffer untouched
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cy_01_communicator::{Communicator, ExchangeApi};
//! use shared_types::Field;
//!
//! let mut comm = Communicator::new(ctx);
//! comm.register_send_field(Field::InnerBound, 1)?;
//! comm.register_recv_field(Field::Shutdown, 0, 1)?;
//! comm.make_window().await?;
//!
//! comm.publish(Field::InnerBound, &[42.0]).await?;
//! if comm.got_kill_signal().await? {
//!     return Ok(());
//! }
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    FetchOutcome, FieldHandle, FieldRegistry, RecvBuffer, SendBuffer, ShutdownLatch,
    SHUTDOWN_VALUE,
};
pub use error::{CommError, CommResult};
pub use ports::inbound::ExchangeApi;
pub use service::{Communicator, ExchangeStats};
