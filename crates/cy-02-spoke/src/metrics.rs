//! # Spoke Metrics
//!
//! Prometheus metrics for bound-reporting spokes.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cy-02-spoke = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `spoke_bound_improvements_total` - Counter of published improvements (by variant)
//! - `spoke_computation_failures_total` - Counter of failed units (by variant)
//! - `spoke_best_bound` - Gauge of the best bound (by variant)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_gauge_vec, register_int_counter_vec, GaugeVec, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total bound improvements, labeled by variant
    pub static ref BOUND_IMPROVEMENTS: IntCounterVec = register_int_counter_vec!(
        "spoke_bound_improvements_total",
        "Total number of strictly improving bounds published",
        &["variant"]
    )
    .expect("Failed to create BOUND_IMPROVEMENTS metric");

    /// Total computation failures, labeled by variant
    pub static ref COMPUTATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "spoke_computation_failures_total",
        "Total number of subordinate computations recorded infeasible",
        &["variant"]
    )
    .expect("Failed to create COMPUTATION_FAILURES metric");

    /// Best bound so far, labeled by variant
    pub static ref BEST_BOUND: GaugeVec = register_gauge_vec!(
        "spoke_best_bound",
        "Best bound published by the spoke",
        &["variant"]
    )
    .expect("Failed to create BEST_BOUND metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record an accepted improvement
#[cfg(feature = "metrics")]
pub fn record_improvement(variant: &str, bound: f64) {
    BOUND_IMPROVEMENTS.with_label_values(&[variant]).inc();
    BEST_BOUND.with_label_values(&[variant]).set(bound);
}

/// Record a failed subordinate computation
#[cfg(feature = "metrics")]
pub fn record_computation_failure(variant: &str) {
    COMPUTATION_FAILURES.with_label_values(&[variant]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_improvement(_variant: &str, _bound: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_computation_failure(_variant: &str) {}
