//! # Runtime Configuration
//!
//! Aggregates the hub and spoke configuration of one run.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CY_SPOKES` | `inner,outer` | Comma-separated spoke variants, one cylinder each |
//! | `CY_CYLINDER_SIZE` | `1` | Ranks per cylinder |
//! | `CY_SENSE` | `min` | Objective sense (`min`/`max`) |
//! | `CY_MAX_ITERATIONS` | `100` | Hub iteration cap |
//! | `CY_REL_GAP` | `1e-4` | Relative gap stopping tolerance |
//! | `CY_ABS_GAP` | `0` | Absolute gap stopping tolerance |
//! | `CY_NONANT_LEN` | `4` | Nonant vector length per rank |
//! | `CY_TRACE_PREFIX` | unset | Write `<prefix><Spoke>.csv` bound traces |
//! | `CY_STRICT` | `false` | Abort a spoke on its first failed unit |
//! | `CY_SEED` | `17` | Seed of the toy bound generators |
//! | `CY_POLL_MS` | `1` | Pause between loop iterations |
//! | `CY_RUN_TIMEOUT_SECS` | `300` | Wall-clock limit for the whole run |

use cy_02_spoke::SpokeConfig;
use cy_03_hub::HubConfig;
use shared_types::{Sense, SpokeVariant};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("At least one spoke is required")]
    NoSpokes,

    #[error("Cylinder size must be at least 1")]
    EmptyCylinder,

    #[error("{name} tolerance must be finite and non-negative, got {value}")]
    BadTolerance { name: &'static str, value: f64 },

    #[error("{variant} reads hub vectors but CY_NONANT_LEN is 0")]
    NonantLenRequired { variant: SpokeVariant },
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Spoke `i + 1` runs `spokes[i]`.
    pub spokes: Vec<SpokeVariant>,
    pub cylinder_size: usize,
    pub sense: Sense,
    pub max_iterations: u64,
    pub rel_gap: f64,
    pub abs_gap: f64,
    pub nonant_len: usize,
    pub trace_prefix: Option<PathBuf>,
    pub strict: bool,
    pub seed: u64,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            spokes: vec![SpokeVariant::InnerBound, SpokeVariant::OuterBound],
            cylinder_size: 1,
            sense: hub.sense,
            max_iterations: hub.max_iterations,
            rel_gap: hub.rel_gap,
            abs_gap: hub.abs_gap,
            nonant_len: 4,
            trace_prefix: None,
            strict: false,
            seed: 17,
            poll_interval: Duration::from_millis(1),
            run_timeout: Duration::from_secs(300),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset variables, then validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("CY_SPOKES") {
            config.spokes = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse::<SpokeVariant>().map_err(|reason| ConfigError::Invalid {
                        var: "CY_SPOKES",
                        value: raw.clone(),
                        reason,
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = parse(&lookup, "CY_CYLINDER_SIZE")? {
            config.cylinder_size = v;
        }
        if let Some(raw) = lookup("CY_SENSE") {
            config.sense = raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "CY_SENSE",
                value: raw.clone(),
                reason,
            })?;
        }
        if let Some(v) = parse(&lookup, "CY_MAX_ITERATIONS")? {
            config.max_iterations = v;
        }
        if let Some(v) = parse(&lookup, "CY_REL_GAP")? {
            config.rel_gap = v;
        }
        if let Some(v) = parse(&lookup, "CY_ABS_GAP")? {
            config.abs_gap = v;
        }
        if let Some(v) = parse(&lookup, "CY_NONANT_LEN")? {
            config.nonant_len = v;
        }
        if let Some(raw) = lookup("CY_TRACE_PREFIX") {
            config.trace_prefix = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("CY_STRICT") {
            config.strict = cylinder_telemetry::flag(&raw);
        }
        if let Some(v) = parse(&lookup, "CY_SEED")? {
            config.seed = v;
        }
        if let Some(ms) = parse(&lookup, "CY_POLL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse(&lookup, "CY_RUN_TIMEOUT_SECS")? {
            config.run_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would fail collectively at setup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spokes.is_empty() {
            return Err(ConfigError::NoSpokes);
        }
        if self.cylinder_size == 0 {
            return Err(ConfigError::EmptyCylinder);
        }
        for (name, value) in [("Relative gap", self.rel_gap), ("Absolute gap", self.abs_gap)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::BadTolerance { name, value });
            }
        }
        if self.nonant_len == 0 {
            if let Some(variant) = self.spokes.iter().find(|v| v.needs_nonant_len()) {
                return Err(ConfigError::NonantLenRequired { variant: *variant });
            }
        }
        Ok(())
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            sense: self.sense,
            rel_gap: self.rel_gap,
            abs_gap: self.abs_gap,
            max_iterations: self.max_iterations,
            nonant_len: self.nonant_len,
        }
    }

    pub fn spoke_config(&self) -> SpokeConfig {
        SpokeConfig {
            sense: self.sense,
            strict: self.strict,
            trace_prefix: self.trace_prefix.clone(),
            nonant_len: self.nonant_len,
        }
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
