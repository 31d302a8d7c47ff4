//! # cy-03-hub
//!
//! Hub communicator: the counterpart every bound spoke exchanges with.
//!
//! ## Fields Owned
//!
//! | Field | Length | Readers |
//! |-------|--------|---------|
//! | Shutdown | 1 | every spoke |
//! | Bounds | 2 (`[outer, inner]`) | every spoke |
//! | Nonant | nonant length | nonant-reading spokes |
//! | Duals | nonant length | dual-reading spokes |
//!
//! ## Iteration
//!
//! ```text
//! publish_nonants / publish_duals ──→ sync() ──→ is_converged()?
//!        ▲                                          │ no      │ yes
//!        └──────────────────────────────────────────┘         ▼
//!                                                    send_terminate()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{Gaps, GlobalBounds};
pub use error::{HubError, HubResult};
pub use ports::inbound::{BoundsUpdate, HubApi};
pub use service::{Hub, HubConfig};
