//! # Cylinders Runtime
//!
//! Runs a hub cylinder and its spoke cylinders over the in-memory window
//! transport and prints a JSON summary of the run.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`CY_LOG_LEVEL`, `CY_JSON_LOGS`)
//! 2. Load `RuntimeConfig` from the environment
//! 3. Spawn every rank and run until the hub terminates the spokes
//! 4. Print the summary to stdout
//!
//! Ctrl+C asks the hub to stop iterating and terminate the spokes.

use anyhow::{Context, Result};
use cylinder_runtime::{CylinderRuntime, RuntimeConfig};
use cylinder_telemetry::{init_logging, TelemetryConfig};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    let runtime = CylinderRuntime::new(config);

    let (interrupt_tx, interrupt_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, asking the hub to terminate");
            if let Err(e) = interrupt_tx.send(true) {
                error!("Failed to send interrupt: {}", e);
            }
        }
    });

    let summary = runtime.run(interrupt_rx).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to encode run summary")?
    );

    Ok(())
}
