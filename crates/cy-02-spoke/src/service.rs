//! Bound Spoke Service
//!
//! Wraps a `Communicator` with the bound-reporting state machine, the
//! incumbent cache and the optional trace log of one spoke rank.

use crate::domain::{trace_path, BoundState, BoundTracker, IncumbentCache, TraceLog};
use crate::error::{SpokeError, SpokeResult};
use crate::metrics;
use crate::ports::inbound::{BoundSpokeApi, FinalBound};
use crate::ports::outbound::SolutionSource;
use async_trait::async_trait;
use cy_01_communicator::{Communicator, ExchangeApi};
use shared_types::{Field, Improvement, Sense, SpokeKind, SpokeVariant, HUB_RANK};
use shared_window::CommContext;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Spoke configuration
#[derive(Clone, Debug)]
pub struct SpokeConfig {
    /// Objective sense of the underlying problem
    pub sense: Sense,
    /// Abort on the first failed subordinate computation
    pub strict: bool,
    /// Write `<prefix><VariantName>.csv` traces from cylinder rank 0
    pub trace_prefix: Option<PathBuf>,
    /// Length of the local nonant vector (auxiliary hub fields)
    pub nonant_len: usize,
}

impl Default for SpokeConfig {
    fn default() -> Self {
        Self {
            sense: Sense::Minimize,
            strict: false,
            trace_prefix: None,
            nonant_len: 0,
        }
    }
}

/// A bound-reporting spoke on one rank.
pub struct BoundSpoke {
    variant: SpokeVariant,
    config: SpokeConfig,
    comm: Communicator,
    tracker: BoundTracker,
    /// Last published bound.
    bound: Option<f64>,
    incumbent: Option<IncumbentCache>,
    solution: Option<Arc<dyn SolutionSource>>,
    trace: Option<TraceLog>,
    infeasible: Vec<String>,
    finalized: Option<Option<FinalBound>>,
}

impl BoundSpoke {
    /// Validate the local setup, register the variant's fields and build the
    /// window.
    ///
    /// Collective: every member of the spoke cylinder and of its strata
    /// groups (the hub included) must be setting up concurrently. A failure
    /// on any member fails setup everywhere.
    pub async fn setup(
        ctx: CommContext,
        variant: SpokeVariant,
        config: SpokeConfig,
        solution: Option<Arc<dyn SolutionSource>>,
    ) -> SpokeResult<Self> {
        let mut comm = Communicator::new(ctx);
        let improvement = Improvement::for_bound(config.sense, variant.bound_kind());

        let mut local_failure = None;
        let mut trace = None;
        match Self::prepare(&comm, variant, &config, solution.as_deref()) {
            Ok(log) => trace = log,
            Err(e) => local_failure = Some(e),
        }

        // agree on local validation before any strata-wide step
        let flag = i64::from(local_failure.is_some());
        let reduced = comm
            .ctx()
            .cylinder
            .allreduce_max(&[flag])
            .await
            .map_err(cy_01_communicator::CommError::from)?;
        let cylinder_failed = reduced.first().copied().unwrap_or(0) > 0;

        if cylinder_failed {
            let reason = match &local_failure {
                Some(e) => e.to_string(),
                None => format!("another member of the {variant} cylinder failed setup"),
            };
            comm.abandon_setup(reason);
        } else if let Err(e) = Self::register_fields(&mut comm, variant, config.nonant_len) {
            // replayed by make_window on every rank of the strata group
            debug!(variant = %variant, error = %e, "Field registration failed");
        }

        let built = comm.make_window().await;
        let outcome = match local_failure {
            Some(err) => Err(err),
            None => built.map_err(SpokeError::from),
        };
        if let Err(err) = outcome {
            // a failed setup leaves no header-only trace behind
            if let Some(log) = trace {
                log.discard();
            }
            return Err(err);
        }

        let incumbent = match (&solution, variant.caches_incumbent()) {
            (Some(source), true) => Some(IncumbentCache::new(source.coordinates())),
            _ => None,
        };

        info!(
            variant = %variant,
            strata_rank = comm.strata_rank(),
            cylinder_rank = comm.cylinder_rank(),
            ?improvement,
            trace = trace.is_some(),
            "Bound spoke ready"
        );

        Ok(Self {
            variant,
            config,
            comm,
            tracker: BoundTracker::new(improvement),
            bound: None,
            incumbent,
            solution,
            trace,
            infeasible: Vec::new(),
            finalized: None,
        })
    }

    fn register_fields(
        comm: &mut Communicator,
        variant: SpokeVariant,
        nonant_len: usize,
    ) -> cy_01_communicator::CommResult<()> {
        comm.register_send_field(variant.bound_kind().field(), 1)?;
        comm.register_recv_field(Field::Shutdown, HUB_RANK, 1)?;
        comm.register_recv_field(Field::Bounds, HUB_RANK, 2)?;
        for field in variant.auxiliary_fields() {
            comm.register_recv_field(*field, HUB_RANK, nonant_len)?;
        }
        Ok(())
    }

    /// Local checks that must pass before the window is built.
    fn prepare(
        comm: &Communicator,
        variant: SpokeVariant,
        config: &SpokeConfig,
        solution: Option<&dyn SolutionSource>,
    ) -> SpokeResult<Option<TraceLog>> {
        if variant.needs_nonant_len() && config.nonant_len == 0 {
            return Err(SpokeError::NoLocalWorkload { variant });
        }
        if variant.caches_incumbent() && solution.is_none() {
            return Err(SpokeError::MissingSolutionSource { variant });
        }

        match &config.trace_prefix {
            Some(prefix) if comm.cylinder_rank() == 0 => {
                TraceLog::create(trace_path(prefix, variant.name())).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn variant(&self) -> SpokeVariant {
        self.variant
    }

    pub fn config(&self) -> &SpokeConfig {
        &self.config
    }

    pub fn communicator(&self) -> &Communicator {
        &self.comm
    }

    pub fn state(&self) -> BoundState {
        self.tracker.state()
    }

    /// Last published bound.
    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    /// Best bound accepted by the improvement filter.
    pub fn best_bound(&self) -> Option<f64> {
        self.tracker.best()
    }

    /// Units recorded infeasible after a failed computation.
    pub fn infeasible_units(&self) -> &[String] {
        &self.infeasible
    }

    pub fn trace_file(&self) -> Option<&std::path::Path> {
        self.trace.as_ref().map(TraceLog::path)
    }

    pub async fn update_locals(&mut self) -> SpokeResult<()> {
        Ok(self.comm.update_locals().await?)
    }

    /// Run one unit's computation result through the improvement filter.
    ///
    /// A failed computation marks the unit infeasible and reports nothing;
    /// in strict mode it also aborts the spoke.
    pub async fn evaluate<E>(
        &mut self,
        unit: &str,
        outcome: Result<Option<f64>, E>,
    ) -> SpokeResult<bool>
    where
        E: fmt::Display + Send,
    {
        match outcome {
            Ok(candidate) => self.update_if_improving(candidate).await,
            Err(e) => {
                warn!(variant = %self.variant, unit, error = %e, "Computation failed, unit recorded infeasible");
                metrics::record_computation_failure(self.variant.name());
                self.infeasible.push(unit.to_string());
                if self.config.strict {
                    return Err(SpokeError::ComputationFailed {
                        unit: unit.to_string(),
                        reason: e.to_string(),
                    });
                }
                Ok(false)
            }
        }
    }

    async fn publish_bound(&mut self, value: f64) -> SpokeResult<()> {
        self.comm
            .publish(self.variant.bound_kind().field(), &[value])
            .await?;
        self.bound = Some(value);
        Ok(())
    }

    fn trace_bound(&mut self, value: f64) -> SpokeResult<()> {
        match self.trace.as_mut() {
            Some(trace) => trace.append(value),
            None => Ok(()),
        }
    }

    // =========================================================================
    // HUB INPUTS
    // =========================================================================

    fn hub_bounds(&self) -> Option<&[f64]> {
        self.comm
            .local(Field::Bounds, HUB_RANK)
            .filter(|buffer| !buffer.last_id().is_never())
            .map(|buffer| buffer.values())
    }

    /// Hub's global outer bound, once the hub has published one.
    pub fn hub_outer_bound(&self) -> Option<f64> {
        self.hub_bounds().and_then(|b| b.first().copied())
    }

    /// Hub's global inner bound, once the hub has published one.
    pub fn hub_inner_bound(&self) -> Option<f64> {
        self.hub_bounds().and_then(|b| b.get(1).copied())
    }

    fn auxiliary(&self, field: Field) -> Option<&cy_01_communicator::RecvBuffer> {
        if !self.variant.auxiliary_fields().contains(&field) {
            return None;
        }
        self.comm.local(field, HUB_RANK)
    }

    /// Local copy of the hub's dual weights (`OuterBoundWithDuals` only).
    pub fn local_ws(&self) -> Option<&[f64]> {
        self.auxiliary(Field::Duals).map(|b| b.values())
    }

    /// Whether the last refresh brought new dual weights.
    pub fn new_ws(&self) -> bool {
        self.auxiliary(Field::Duals).is_some_and(|b| b.is_new())
    }

    /// Local copy of the hub's nonants (nonant-reading variants only).
    pub fn local_nonants(&self) -> Option<&[f64]> {
        self.auxiliary(Field::Nonant).map(|b| b.values())
    }

    /// Whether the last refresh brought new nonants.
    pub fn new_nonants(&self) -> bool {
        self.auxiliary(Field::Nonant).is_some_and(|b| b.is_new())
    }
}

#[async_trait]
impl BoundSpokeApi for BoundSpoke {
    async fn set_bound(&mut self, value: f64) -> SpokeResult<()> {
        self.publish_bound(value).await?;
        self.trace_bound(value)
    }

    async fn update_if_improving(&mut self, candidate: Option<f64>) -> SpokeResult<bool> {
        let Some(improved) = self.tracker.check(candidate)? else {
            return Ok(false);
        };

        // tracker and cache move only after the snapshot and the publish
        // both succeeded, so a failed attempt can be offered again
        let snapshot = match (self.incumbent.as_ref(), self.solution.as_ref()) {
            (Some(cache), Some(source)) => {
                let values = source.snapshot();
                cache.validate(&values)?;
                Some(values)
            }
            _ => None,
        };
        self.publish_bound(improved).await?;

        self.tracker.commit(improved);
        if let (Some(cache), Some(values)) = (self.incumbent.as_mut(), snapshot) {
            cache.store(values)?;
        }
        self.trace_bound(improved)?;

        metrics::record_improvement(self.variant.name(), improved);
        info!(variant = %self.variant, bound = improved, "Bound improved");
        Ok(true)
    }

    async fn got_kill_signal(&mut self) -> SpokeResult<bool> {
        Ok(self.comm.got_kill_signal().await?)
    }

    fn finalize(&mut self) -> SpokeResult<Option<FinalBound>> {
        if let Some(done) = &self.finalized {
            return Ok(done.clone());
        }

        let cached = self.incumbent.as_ref().and_then(IncumbentCache::values);
        let result = self.tracker.finalize().map(|bound| FinalBound {
            variant: self.variant,
            bound,
            solution: cached.map(<[f64]>::to_vec),
        });

        if let (Some(values), Some(source)) = (cached, self.solution.as_ref()) {
            source.restore(values);
            debug!(variant = %self.variant, coordinates = values.len(), "Incumbent restored");
        }

        match &result {
            Some(done) => info!(variant = %self.variant, bound = done.bound, "Spoke finalized"),
            None => info!(variant = %self.variant, "Spoke finalized without an incumbent"),
        }
        self.finalized = Some(result.clone());
        Ok(result)
    }
}
