//! # Cylinders Test Suite
//!
//! Unified test crate for scenarios that span more than one cylinder crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── exchange.rs      # hub ↔ spoke bound flow, torn reads
//!     ├── setup.rs         # collective setup failures
//!     └── termination.rs   # kill signal end to end, full runtime runs
//! tests/benches/
//! └── exchange_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cy-tests
//! cargo test -p cy-tests integration::termination
//! cargo bench -p cy-tests
//! ```

#![allow(dead_code)]

pub mod integration;
