//! Hub Service
//!
//! The hub side of every strata window: owns `Shutdown`, `Bounds` and, when
//! some spoke reads them, `Nonant` and `Duals`; reads each spoke's bound.

use crate::domain::{Gaps, GlobalBounds};
use crate::error::{HubError, HubResult};
use crate::ports::inbound::{BoundsUpdate, HubApi};
use async_trait::async_trait;
use cy_01_communicator::{Communicator, ExchangeApi, FetchOutcome, SHUTDOWN_VALUE};
use shared_types::{BoundKind, Field, Rank, Sense, SpokeKind, SpokeVariant, WriteId};
use shared_window::CommContext;
use tracing::{debug, info};

/// Hub configuration
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Objective sense of the underlying problem
    pub sense: Sense,
    /// Stop when `|inner - outer| / |inner|` drops to this
    pub rel_gap: f64,
    /// Stop when `|inner - outer|` drops to this
    pub abs_gap: f64,
    /// Iteration cap for the hub algorithm loop
    pub max_iterations: u64,
    /// Length of the nonant/dual vectors
    pub nonant_len: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            sense: Sense::Minimize,
            rel_gap: 1e-4,
            abs_gap: 0.0,
            max_iterations: 100,
            nonant_len: 0,
        }
    }
}

/// One spoke as the hub sees it.
#[derive(Clone, Debug)]
struct SpokeSlot {
    rank: Rank,
    variant: SpokeVariant,
    last: Option<f64>,
}

/// Hub endpoint on one rank of the hub cylinder.
pub struct Hub {
    config: HubConfig,
    comm: Communicator,
    spokes: Vec<SpokeSlot>,
    bounds: GlobalBounds,
    terminated: bool,
}

impl Hub {
    /// Register the hub's fields for `spokes` (spoke `i + 1` runs
    /// `spokes[i]`) and build the window.
    ///
    /// Collective over every strata group the hub cylinder belongs to and
    /// over the hub cylinder; a setup failure on any rank fails every rank.
    pub async fn setup(
        ctx: CommContext,
        config: HubConfig,
        spokes: &[SpokeVariant],
    ) -> HubResult<Self> {
        let mut comm = Communicator::new(ctx);
        let needs = |field: Field| spokes.iter().any(|v| v.auxiliary_fields().contains(&field));
        let sends_nonants = needs(Field::Nonant);
        let sends_duals = needs(Field::Duals);

        let local_failure = Self::validate(&comm, &config, spokes, sends_nonants, sends_duals).err();
        match &local_failure {
            Some(e) => comm.abandon_setup(e.to_string()),
            None => {
                if let Err(e) =
                    Self::register_fields(&mut comm, &config, spokes, sends_nonants, sends_duals)
                {
                    // replayed by make_window on every rank of the strata group
                    debug!(error = %e, "Field registration failed");
                }
            }
        }

        let built = comm.make_window().await;
        if let Some(err) = local_failure {
            return Err(err);
        }
        built?;

        info!(
            global_rank = comm.ctx().global_rank,
            spokes = spokes.len(),
            convergers = %Self::converger_chars(spokes),
            sends_nonants,
            sends_duals,
            "Hub ready"
        );

        Ok(Self {
            bounds: GlobalBounds::new(config.sense),
            config,
            comm,
            spokes: spokes
                .iter()
                .enumerate()
                .map(|(i, variant)| SpokeSlot {
                    rank: i + 1,
                    variant: *variant,
                    last: None,
                })
                .collect(),
            terminated: false,
        })
    }

    fn validate(
        comm: &Communicator,
        config: &HubConfig,
        spokes: &[SpokeVariant],
        sends_nonants: bool,
        sends_duals: bool,
    ) -> HubResult<()> {
        let expected = comm.ctx().n_spokes();
        if spokes.len() != expected {
            return Err(HubError::SpokeCountMismatch {
                expected,
                actual: spokes.len(),
            });
        }
        if config.nonant_len == 0 {
            if sends_nonants {
                return Err(HubError::NoLocalWorkload {
                    field: Field::Nonant,
                });
            }
            if sends_duals {
                return Err(HubError::NoLocalWorkload { field: Field::Duals });
            }
        }
        Ok(())
    }

    fn register_fields(
        comm: &mut Communicator,
        config: &HubConfig,
        spokes: &[SpokeVariant],
        sends_nonants: bool,
        sends_duals: bool,
    ) -> HubResult<()> {
        comm.register_send_field(Field::Shutdown, 1)?;
        comm.register_send_field(Field::Bounds, 2)?;
        if sends_nonants {
            comm.register_send_field(Field::Nonant, config.nonant_len)?;
        }
        if sends_duals {
            comm.register_send_field(Field::Duals, config.nonant_len)?;
        }
        for (i, variant) in spokes.iter().enumerate() {
            comm.register_recv_field(variant.bound_kind().field(), i + 1, 1)?;
        }
        Ok(())
    }

    /// One character per spoke, in rank order (e.g. `"IOA"`).
    pub fn converger_chars(spokes: &[SpokeVariant]) -> String {
        spokes.iter().map(|v| v.converger_char()).collect()
    }

    /// Whether this hub owns `field` (nonants and duals only when some
    /// spoke reads them).
    pub fn publishes(&self, field: Field) -> bool {
        self.comm.send_buffer(field).is_some()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn communicator(&self) -> &Communicator {
        &self.comm
    }

    pub fn inner_bound(&self) -> Option<f64> {
        self.bounds.inner
    }

    pub fn outer_bound(&self) -> Option<f64> {
        self.bounds.outer
    }

    pub fn global_bounds(&self) -> &GlobalBounds {
        &self.bounds
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Latest value received from each spoke, in rank order.
    pub fn spoke_bounds(&self) -> Vec<(Rank, SpokeVariant, Option<f64>)> {
        self.spokes
            .iter()
            .map(|s| (s.rank, s.variant, s.last))
            .collect()
    }

    /// Log one progress line for `iteration`.
    pub fn log_progress(&self, iteration: u64) {
        let gaps = self.compute_gaps();
        info!(
            iteration,
            outer = ?self.bounds.outer,
            inner = ?self.bounds.inner,
            abs_gap = gaps.abs,
            rel_gap = gaps.rel,
            "Hub progress"
        );
    }
}

#[async_trait]
impl HubApi for Hub {
    async fn publish_nonants(&mut self, values: &[f64]) -> HubResult<WriteId> {
        Ok(self.comm.publish(Field::Nonant, values).await?)
    }

    async fn publish_duals(&mut self, values: &[f64]) -> HubResult<WriteId> {
        Ok(self.comm.publish(Field::Duals, values).await?)
    }

    async fn publish_bounds(&mut self) -> HubResult<WriteId> {
        let wire = self.bounds.wire();
        Ok(self.comm.publish(Field::Bounds, &wire).await?)
    }

    async fn receive_bounds(&mut self) -> HubResult<BoundsUpdate> {
        let mut update = BoundsUpdate::default();
        for slot in self.spokes.iter_mut() {
            let kind = slot.variant.bound_kind();
            let outcome = self.comm.fetch(kind.field(), slot.rank).await?;
            if !matches!(outcome, FetchOutcome::Accepted(_)) {
                continue;
            }
            let Some(value) = self
                .comm
                .local(kind.field(), slot.rank)
                .and_then(|b| b.values().first().copied())
            else {
                continue;
            };

            update.received += 1;
            slot.last = Some(value);
            if self.bounds.offer(kind, value) {
                match kind {
                    BoundKind::Inner => update.new_inner = Some(value),
                    BoundKind::Outer => update.new_outer = Some(value),
                }
                debug!(spoke = slot.rank, variant = %slot.variant, value, "Global bound improved");
            }
        }
        Ok(update)
    }

    async fn sync(&mut self) -> HubResult<BoundsUpdate> {
        self.publish_bounds().await?;
        self.receive_bounds().await
    }

    async fn send_terminate(&mut self) -> HubResult<()> {
        if self.terminated {
            return Ok(());
        }
        self.comm
            .publish_forced(Field::Shutdown, &[SHUTDOWN_VALUE])
            .await?;
        self.terminated = true;
        info!(global_rank = self.comm.ctx().global_rank, "Terminate sent to spokes");
        Ok(())
    }

    fn compute_gaps(&self) -> Gaps {
        Gaps::compute(self.bounds.inner, self.bounds.outer)
    }

    fn is_converged(&self) -> bool {
        self.compute_gaps()
            .within(self.config.abs_gap, self.config.rel_gap)
    }
}
