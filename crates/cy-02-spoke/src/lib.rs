//! # cy-02-spoke
//!
//! Bound-reporting spokes: each spoke computes an inner or outer bound on its
//! own schedule and publishes it to the hub only when it strictly improves.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Bound Tracker**: improvement filter under the problem sense
//! - **Incumbent Cache**: solution snapshot of the last accepted improvement
//! - **Trace Log**: optional `time,bound` CSV per spoke
//! - **Hub Inputs**: local copies of hub bounds, dual weights and nonants
//!
//! ## Variants
//!
//! | Variant | Bound | Reads | Char |
//! |---------|-------|-------|------|
//! | InnerBound | inner | - | I |
//! | OuterBound | outer | - | O |
//! | InnerBoundWithIncumbent | inner | Nonant | I |
//! | OuterBoundWithDuals | outer | Duals | O |
//! | OuterBoundWithNonants | outer | Nonant | A |
//!
//! ## State Machine
//!
//! ```text
//! [COLLECTING] ──improvement──→ [PUBLISHING] ──finalize──→ [FINALIZED]
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cy_02_spoke::{BoundSpoke, BoundSpokeApi, SpokeConfig};
//!
//! let mut spoke = BoundSpoke::setup(ctx, variant, SpokeConfig::default(), None).await?;
//! while !spoke.got_kill_signal().await? {
//!     let candidate = compute_bound(spoke.local_ws());
//!     spoke.update_if_improving(candidate).await?;
//! }
//! let result = spoke.finalize()?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{BoundState, BoundTracker, IncumbentCache, TraceLog};
pub use error::{SpokeError, SpokeResult};
pub use ports::inbound::{BoundSpokeApi, FinalBound};
pub use ports::outbound::SolutionSource;
pub use service::{BoundSpoke, SpokeConfig};
