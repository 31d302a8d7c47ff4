//! Subscriber setup.
//!
//! A `tracing-subscriber` registry with an `EnvFilter` and either a
//! human-readable fmt layer or a JSON layer. JSON records carry:
//! - `timestamp`, `level`, `target`
//! - `fields`: structured fields such as `strata_rank`, `field`, `write_id`
//! - `span`: the enclosing `rank_span!`, if any

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the env filter for `config`.
///
/// `RUST_LOG` wins when set, matching every other tracing-based binary.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails with `AlreadyInitialized` if another subscriber is installed, so
/// tests that each call it can ignore the error.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let result = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(config.thread_ids)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(config.thread_ids);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Structured log entry stamped with a component name.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Span carrying the rank coordinates of a `CommContext`-like value.
///
/// ```rust,ignore
/// let span = rank_span!("spoke", ctx, variant = %variant);
/// async move { ... }.instrument(span).await;
/// ```
#[macro_export]
macro_rules! rank_span {
    ($name:expr, $ctx:expr) => {
        tracing::info_span!(
            $name,
            global_rank = $ctx.global_rank,
            cylinder = $ctx.cylinder_index
        )
    };

    ($name:expr, $ctx:expr, $($field:tt)+) => {
        tracing::info_span!(
            $name,
            global_rank = $ctx.global_rank,
            cylinder = $ctx.cylinder_index,
            $($field)+
        )
    };
}
