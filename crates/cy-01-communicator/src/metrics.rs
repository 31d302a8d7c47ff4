//! # Exchange Metrics
//!
//! Prometheus metrics for the window exchange.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cy-01-communicator = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `exchange_publishes_total` - Counter of publishes (by field)
//! - `exchange_fetches_total` - Counter of fetches (by outcome)
//! - `exchange_kill_signal_observed` - Gauge, 1 once shutdown was seen

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_gauge, register_int_counter_vec, Gauge, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total publishes, labeled by field
    pub static ref PUBLISHES: IntCounterVec = register_int_counter_vec!(
        "exchange_publishes_total",
        "Total number of field publishes",
        &["field"]
    )
    .expect("Failed to create PUBLISHES metric");

    /// Total fetches, labeled by outcome
    pub static ref FETCHES: IntCounterVec = register_int_counter_vec!(
        "exchange_fetches_total",
        "Total number of field fetches",
        &["outcome"]
    )
    .expect("Failed to create FETCHES metric");

    /// Kill signal observed flag
    pub static ref KILL_SIGNAL_OBSERVED: Gauge = register_gauge!(
        "exchange_kill_signal_observed",
        "Whether this rank has observed the shutdown signal (0=no, 1=yes)"
    )
    .expect("Failed to create KILL_SIGNAL_OBSERVED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a publish of `field`
#[cfg(feature = "metrics")]
pub fn record_publish(field: &str) {
    PUBLISHES.with_label_values(&[field]).inc();
}

/// Record a fetch outcome ("accepted", "stale", "torn")
#[cfg(feature = "metrics")]
pub fn record_fetch(outcome: &str) {
    FETCHES.with_label_values(&[outcome]).inc();
}

/// Update kill signal flag
#[cfg(feature = "metrics")]
pub fn set_kill_signal_observed(observed: bool) {
    KILL_SIGNAL_OBSERVED.set(if observed { 1.0 } else { 0.0 });
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_publish(_field: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fetch(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_kill_signal_observed(_observed: bool) {}
