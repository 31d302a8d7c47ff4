//! # Cylinder Telemetry
//!
//! Structured logging for cylinder runs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cylinder_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // every rank task logs through `tracing` from here on
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CY_SERVICE_NAME` | `cylinders` | Service name in logs |
//! | `CY_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` overrides) |
//! | `CY_JSON_LOGS` | `false` | JSON output |
//! | `CY_THREAD_IDS` | `false` | Include thread ids |

mod config;
mod logging;

pub use config::{flag, TelemetryConfig};
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}
