//! # Cylinder Runtime Library
//!
//! Wiring for a complete hub/spoke run inside one process. The main entry
//! point is the `main.rs` binary; the library is exposed for tests.
//!
//! ## Modules
//!
//! - `config` - `RuntimeConfig` aggregated from the environment
//! - `toy` - toy problem, solution source and per-variant bound generators
//! - `runtime` - rank tasks, hub loop, spoke loop and the run summary

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod runtime;
pub mod toy;

pub use config::{ConfigError, RuntimeConfig};
pub use runtime::{CylinderRuntime, HubReport, RunSummary, SpokeReport};
