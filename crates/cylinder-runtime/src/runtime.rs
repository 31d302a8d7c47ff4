//! # Cylinder Runtime
//!
//! One tokio task per rank over an in-memory topology.
//!
//! ```text
//!  hub cylinder (strata rank 0)            spoke cylinder i (strata rank i)
//!  ┌──────────────────────────────┐        ┌──────────────────────────────┐
//!  │ publish nonants / duals      │ ─────→ │ got_kill_signal (refresh)    │
//!  │ sync: publish + read bounds  │ ←───── │ generator → evaluate         │
//!  │ converged or capped?         │        │   └─ update_if_improving     │
//!  │   └─ send_terminate ─────────┼──────→ │ finalize → SpokeReport       │
//!  └──────────────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! Every member of a cylinder runs the same loop and makes the same
//! decisions, so their collective calls line up.

use crate::config::RuntimeConfig;
use crate::toy::{BoundGenerator, ToyProblem, ToySolution};
use anyhow::{anyhow, Context, Result};
use cy_01_communicator::CommError;
use cy_02_spoke::{BoundSpoke, BoundSpokeApi, FinalBound, SolutionSource, SpokeResult};
use cy_03_hub::{Gaps, Hub, HubApi, HubResult};
use futures::future::join_all;
use serde::Serialize;
use shared_types::{Field, Sense, SpokeKind, SpokeVariant};
use shared_window::{CommContext, InMemoryTopology};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

/// Hub outcome, as seen by hub cylinder rank 0.
#[derive(Clone, Debug, Serialize)]
pub struct HubReport {
    pub iterations: u64,
    pub converged: bool,
    pub interrupted: bool,
    pub inner_bound: Option<f64>,
    pub outer_bound: Option<f64>,
    pub gaps: Gaps,
}

/// Outcome of one spoke rank.
#[derive(Clone, Debug, Serialize)]
pub struct SpokeReport {
    pub strata_rank: usize,
    pub cylinder_rank: usize,
    pub variant: SpokeVariant,
    pub iterations: u64,
    pub infeasible_units: usize,
    #[serde(rename = "final")]
    pub final_bound: Option<FinalBound>,
}

/// JSON summary printed at the end of a run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub sense: Sense,
    pub cylinder_size: usize,
    pub convergers: String,
    pub hub: HubReport,
    /// Cylinder rank 0 of each spoke, in strata-rank order.
    pub spokes: Vec<SpokeReport>,
}

/// Runs a hub and its spokes to completion.
pub struct CylinderRuntime {
    config: RuntimeConfig,
}

impl CylinderRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run every rank until the hub terminates the spokes.
    ///
    /// Setting `interrupt` makes the hub stop iterating and send the kill
    /// signal at its next check.
    pub async fn run(&self, interrupt: watch::Receiver<bool>) -> Result<RunSummary> {
        let config = &self.config;
        config.validate()?;

        info!("===========================================");
        info!("  Cylinders Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Spokes: {}", Hub::converger_chars(&config.spokes));
        info!("  Ranks per cylinder: {}", config.cylinder_size);
        info!("===========================================");

        let topology = InMemoryTopology::new(config.spokes.len(), config.cylinder_size)
            .context("Failed to build the rank topology")?;
        let problem = ToyProblem::new(config.sense, config.nonant_len);

        let mut hub_tasks: Vec<JoinHandle<HubResult<HubReport>>> = Vec::new();
        for ctx in topology.hub() {
            let span = cylinder_telemetry::rank_span!("hub", ctx);
            let task = run_hub(
                ctx,
                config.clone(),
                problem.clone(),
                interrupt.clone(),
            );
            hub_tasks.push(tokio::spawn(task.instrument(span)));
        }

        let mut spoke_tasks: Vec<JoinHandle<SpokeResult<SpokeReport>>> = Vec::new();
        for (i, variant) in config.spokes.iter().enumerate() {
            let strata_rank = i + 1;
            for ctx in topology.spoke(strata_rank)? {
                let span = cylinder_telemetry::rank_span!("spoke", ctx, variant = %variant);
                let task = run_spoke(
                    ctx,
                    *variant,
                    config.clone(),
                    problem.clone(),
                    config.seed.wrapping_add(strata_rank as u64),
                );
                spoke_tasks.push(tokio::spawn(task.instrument(span)));
            }
        }

        let (hub_results, spoke_results) = tokio::time::timeout(
            config.run_timeout,
            futures::future::join(join_all(hub_tasks), join_all(spoke_tasks)),
        )
        .await
        .map_err(|_| anyhow!("Run did not finish within {:?}", config.run_timeout))?;

        let mut hub = None;
        for result in hub_results {
            let report = result.context("Hub task panicked")??;
            hub.get_or_insert(report);
        }
        let hub = hub.ok_or_else(|| anyhow!("Hub cylinder has no members"))?;

        let mut spokes = Vec::new();
        for result in spoke_results {
            let report = result.context("Spoke task panicked")??;
            if report.cylinder_rank == 0 {
                spokes.push(report);
            }
        }

        info!(
            iterations = hub.iterations,
            converged = hub.converged,
            inner = ?hub.inner_bound,
            outer = ?hub.outer_bound,
            "Run complete"
        );

        Ok(RunSummary {
            sense: config.sense,
            cylinder_size: config.cylinder_size,
            convergers: Hub::converger_chars(&config.spokes),
            hub,
            spokes,
        })
    }
}

/// Hub loop of one hub cylinder member.
async fn run_hub(
    ctx: CommContext,
    config: RuntimeConfig,
    problem: ToyProblem,
    interrupt: watch::Receiver<bool>,
) -> HubResult<HubReport> {
    let mut hub = Hub::setup(ctx, config.hub_config(), &config.spokes).await?;
    let mut x = problem.starting_point();
    let mut iterations = 0;
    let mut converged = false;
    let mut interrupted = false;

    while iterations < config.max_iterations {
        iterations += 1;
        if hub.publishes(Field::Nonant) {
            hub.publish_nonants(&x).await?;
        }
        if hub.publishes(Field::Duals) {
            hub.publish_duals(&problem.duals(&x)).await?;
        }
        hub.sync().await?;
        hub.log_progress(iterations);

        if hub.is_converged() {
            converged = true;
            break;
        }
        if interrupt_agreed(&hub, &interrupt).await? {
            interrupted = true;
            break;
        }
        x = problem.hub_step(&x);
        pause(config.poll_interval).await;
    }

    if !converged && !interrupted {
        cylinder_telemetry::log_event!(
            warn,
            "hub",
            "Iteration cap reached before convergence",
            iterations = iterations
        );
    }
    hub.send_terminate().await?;

    Ok(HubReport {
        iterations,
        converged,
        interrupted,
        inner_bound: hub.inner_bound(),
        outer_bound: hub.outer_bound(),
        gaps: hub.compute_gaps(),
    })
}

/// Whether any hub cylinder member has seen the interrupt.
async fn interrupt_agreed(hub: &Hub, interrupt: &watch::Receiver<bool>) -> HubResult<bool> {
    let flag = i64::from(*interrupt.borrow());
    let reduced = hub
        .communicator()
        .ctx()
        .cylinder
        .allreduce_max(&[flag])
        .await
        .map_err(CommError::from)?;
    Ok(reduced.first().copied().unwrap_or(0) > 0)
}

/// Spoke loop of one spoke cylinder member.
async fn run_spoke(
    ctx: CommContext,
    variant: SpokeVariant,
    config: RuntimeConfig,
    problem: ToyProblem,
    seed: u64,
) -> SpokeResult<SpokeReport> {
    let strata_rank = ctx.strata_rank();
    let cylinder_rank = ctx.cylinder_rank();

    let solution = variant
        .caches_incumbent()
        .then(|| Arc::new(ToySolution::new(problem.starting_point())));
    let source = solution
        .clone()
        .map(|s| s as Arc<dyn SolutionSource>);

    let mut spoke = BoundSpoke::setup(ctx, variant, config.spoke_config(), source).await?;
    let mut generator = BoundGenerator::new(variant, problem, seed, solution);
    let mut iterations = 0;

    while !spoke.got_kill_signal().await? {
        iterations += 1;
        let (unit, outcome) = generator.next(&spoke);
        spoke.evaluate(&unit, outcome).await?;
        pause(config.poll_interval).await;
    }

    let final_bound = spoke.finalize()?;
    Ok(SpokeReport {
        strata_rank,
        cylinder_rank,
        variant,
        iterations,
        infeasible_units: spoke.infeasible_units().len(),
        final_bound,
    })
}

async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
