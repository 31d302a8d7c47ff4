//! Communicator Service - per-rank exchange state and protocol
//!
//! One `Communicator` lives on every rank. It owns the rank's field
//! registry, its send and receive buffers, and the kill-signal latch, and
//! drives the transport ports in `CommContext`.

use crate::domain::{
    decide, FetchOutcome, FieldHandle, FieldRegistry, Observation, RecvBuffer, SendBuffer,
    ShutdownLatch,
};
use crate::error::{CommError, CommResult};
use crate::metrics;
use crate::ports::inbound::ExchangeApi;
use async_trait::async_trait;
use serde::Serialize;
use shared_types::{Direction, Field, FieldKey, Rank, WriteId, HUB_RANK};
use shared_window::CommContext;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

/// Running totals of exchange activity on one rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeStats {
    pub publishes: u64,
    pub accepted: u64,
    pub stale: u64,
    pub torn: u64,
}

impl ExchangeStats {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Accepted(_) => self.accepted += 1,
            FetchOutcome::Stale(_) => self.stale += 1,
            FetchOutcome::Torn { .. } => self.torn += 1,
        }
    }

    pub fn fetches(&self) -> u64 {
        self.accepted + self.stale + self.torn
    }
}

/// Exchange endpoint of one rank.
pub struct Communicator {
    ctx: CommContext,
    registry: FieldRegistry,
    sends: BTreeMap<Field, SendBuffer>,
    locals: BTreeMap<FieldKey, RecvBuffer>,
    window_ready: bool,
    /// First registration error, replayed collectively by `make_window`.
    setup_failure: Option<CommError>,
    shutdown: ShutdownLatch,
    stats: ExchangeStats,
}

impl Communicator {
    pub fn new(ctx: CommContext) -> Self {
        Self {
            ctx,
            registry: FieldRegistry::new(),
            sends: BTreeMap::new(),
            locals: BTreeMap::new(),
            window_ready: false,
            setup_failure: None,
            shutdown: ShutdownLatch::new(),
            stats: ExchangeStats::default(),
        }
    }

    pub fn ctx(&self) -> &CommContext {
        &self.ctx
    }

    pub fn strata_rank(&self) -> Rank {
        self.ctx.strata_rank()
    }

    pub fn cylinder_rank(&self) -> Rank {
        self.ctx.cylinder_rank()
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn is_window_ready(&self) -> bool {
        self.window_ready
    }

    pub fn stats(&self) -> ExchangeStats {
        self.stats
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a field this rank owns and publishes.
    pub fn register_send_field(&mut self, field: Field, len: usize) -> CommResult<FieldHandle> {
        let key = FieldKey::new(field, self.strata_rank());
        let result = self.registry.register(key, Direction::Send, len);
        match &result {
            Ok(_) => {
                self.sends
                    .entry(field)
                    .or_insert_with(|| SendBuffer::new(key, len));
            }
            Err(e) => self.note_setup_failure(e),
        }
        result
    }

    /// Register a field owned by `owner` that this rank reads.
    pub fn register_recv_field(
        &mut self,
        field: Field,
        owner: Rank,
        len: usize,
    ) -> CommResult<FieldHandle> {
        let key = FieldKey::new(field, owner);
        let result = if owner == self.strata_rank() {
            Err(CommError::SelfReceive { key })
        } else {
            self.registry.register(key, Direction::Receive, len)
        };
        match &result {
            Ok(_) => {
                self.locals
                    .entry(key)
                    .or_insert_with(|| RecvBuffer::new(key, len));
            }
            Err(e) => self.note_setup_failure(e),
        }
        result
    }

    /// Record a failure found outside the registry (bad local workload,
    /// unusable trace file) so that `make_window` still runs and fails on
    /// every rank.
    pub fn abandon_setup(&mut self, reason: impl Into<String>) {
        self.setup_failure
            .get_or_insert(CommError::SetupAbandoned {
                reason: reason.into(),
            });
    }

    fn note_setup_failure(&mut self, err: &CommError) {
        if err.is_setup_error() && self.setup_failure.is_none() {
            self.setup_failure = Some(err.clone());
        }
    }

    /// Declare every registered field on the strata window and freeze the
    /// registry.
    ///
    /// Collective over the strata group, then over the cylinder. A failure
    /// on any rank fails `make_window` on every rank of every cylinder:
    /// each strata group holds one member of each cylinder, so agreeing
    /// within the strata group and then within the cylinder reaches all.
    pub async fn make_window(&mut self) -> CommResult<()> {
        if self.window_ready {
            return Err(CommError::WindowAlreadyBuilt);
        }
        self.registry.close();

        let mut failure = self.setup_failure.take();
        for handle in self.registry.handles() {
            if let Err(e) = self.ctx.window.declare(handle.key, handle.len).await {
                failure.get_or_insert(CommError::from(e));
            }
        }

        // failing strata rank + 1, or 0
        let me = self.strata_rank();
        let flag = if failure.is_some() { me as i64 + 1 } else { 0 };
        self.ctx.strata.barrier().await?;
        let in_strata = Self::first_slot(self.ctx.strata.allreduce_max(&[flag]).await?);
        let in_cylinder =
            Self::first_slot(self.ctx.cylinder.allreduce_max(&[in_strata]).await?);

        if let Some(err) = failure {
            return Err(err);
        }
        if let Some(rank) = [in_strata, in_cylinder].into_iter().find(|worst| *worst > 0) {
            debug!(
                global_rank = self.ctx.global_rank,
                failed_strata_rank = rank - 1,
                "Window setup failed elsewhere"
            );
            return Err(CommError::RemoteSetupFailure {
                rank: (rank - 1) as Rank,
            });
        }

        self.window_ready = true;
        info!(
            global_rank = self.ctx.global_rank,
            strata_rank = me,
            fields = self.registry.len(),
            "Window built"
        );
        Ok(())
    }

    fn first_slot(reduced: Vec<i64>) -> i64 {
        reduced.first().copied().unwrap_or(0)
    }

    // =========================================================================
    // EXCHANGE
    // =========================================================================

    async fn put(&mut self, field: Field, values: &[f64], forced: bool) -> CommResult<WriteId> {
        if !self.window_ready {
            return Err(CommError::WindowNotReady);
        }
        let buffer = self
            .sends
            .get_mut(&field)
            .ok_or(CommError::NotOwner { field })?;
        if values.len() != buffer.len() {
            return Err(CommError::PayloadLength {
                key: buffer.key(),
                expected: buffer.len(),
                actual: values.len(),
            });
        }

        self.ctx.cylinder.barrier().await?;
        let record = buffer.stage(values, forced);
        self.ctx.window.put(buffer.key(), &record).await?;

        self.stats.publishes += 1;
        metrics::record_publish(field.name());
        trace!(field = %buffer.key(), write_id = %record.write_id, forced, "Published");
        Ok(record.write_id)
    }

    /// The receive buffer of `(field, owner)`.
    pub fn local(&self, field: Field, owner: Rank) -> Option<&RecvBuffer> {
        self.locals.get(&FieldKey::new(field, owner))
    }

    /// Mutable access, for consumers acknowledging a read.
    pub fn local_mut(&mut self, field: Field, owner: Rank) -> Option<&mut RecvBuffer> {
        self.locals.get_mut(&FieldKey::new(field, owner))
    }

    /// Every receive buffer in key order.
    pub fn locals(&self) -> impl Iterator<Item = &RecvBuffer> {
        self.locals.values()
    }

    /// The send buffer of a field this rank owns.
    pub fn send_buffer(&self, field: Field) -> Option<&SendBuffer> {
        self.sends.get(&field)
    }
}

#[async_trait]
impl ExchangeApi for Communicator {
    async fn publish(&mut self, field: Field, values: &[f64]) -> CommResult<WriteId> {
        self.put(field, values, false).await
    }

    async fn publish_forced(&mut self, field: Field, values: &[f64]) -> CommResult<WriteId> {
        self.put(field, values, true).await
    }

    async fn fetch(&mut self, field: Field, owner: Rank) -> CommResult<FetchOutcome> {
        if !self.window_ready {
            return Err(CommError::WindowNotReady);
        }
        let key = FieldKey::new(field, owner);
        let buffer = self
            .locals
            .get_mut(&key)
            .ok_or(CommError::NotRegistered { key })?;

        self.ctx.cylinder.barrier().await?;
        let scratch = self.ctx.window.get(key).await?;
        let observed = Observation::of(&scratch);
        let reduced = self
            .ctx
            .cylinder
            .allreduce_max(&observed.contribution())
            .await?;

        let outcome = decide(observed, &reduced, buffer.last_id());
        match outcome {
            FetchOutcome::Accepted(_) => buffer.accept(scratch),
            FetchOutcome::Stale(_) => buffer.reject(),
            FetchOutcome::Torn { highest, lowest } => {
                buffer.reject();
                debug!(field = %key, %highest, %lowest, "Torn read, keeping previous buffer");
            }
        }

        self.stats.record(&outcome);
        metrics::record_fetch(outcome.label());
        trace!(field = %key, outcome = outcome.label(), "Fetched");
        Ok(outcome)
    }

    async fn update_locals(&mut self) -> CommResult<()> {
        let keys: Vec<FieldKey> = self.locals.keys().copied().collect();
        for key in keys {
            self.fetch(key.field, key.owner).await?;
        }
        Ok(())
    }

    async fn got_kill_signal(&mut self) -> CommResult<bool> {
        if self.shutdown.is_set() {
            return Ok(true);
        }
        self.update_locals().await?;
        let key = FieldKey::new(Field::Shutdown, HUB_RANK);
        let buffer = self
            .locals
            .get(&key)
            .ok_or(CommError::NotRegistered { key })?;

        let observed = self.shutdown.observe(buffer);
        if observed {
            metrics::set_kill_signal_observed(true);
            info!(
                global_rank = self.ctx.global_rank,
                checks = self.shutdown.checks(),
                "Kill signal received"
            );
        }
        Ok(observed)
    }
}
