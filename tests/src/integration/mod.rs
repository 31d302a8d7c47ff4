//! # Integration Scenarios
//!
//! Every scenario builds an in-memory topology and drives real hub and
//! spoke endpoints, one future per rank.

pub mod exchange;
pub mod setup;
pub mod termination;
