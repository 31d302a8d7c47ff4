//! # Shared Types Crate
//!
//! Value types every rank of a cylinder topology agrees on: window field
//! addressing, write-id versioning, the transport-boundary record, and the
//! closed set of spoke variants.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: hub and spokes derive their field layout
//!   from the same `SpokeVariant` definitions.
//! - **Explicit Versioning**: a `WindowRecord` always carries its `WriteId`
//!   and force-accept flag as named fields; no sign-bit tricks.

pub mod entities;
pub mod spoke;

pub use entities::*;
pub use spoke::*;
