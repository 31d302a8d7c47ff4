//! # Termination End to End
//!
//! Hub and spoke ranks run as independent tasks; the only way a spoke
//! leaves its loop is the hub's kill signal.
//!
//! ```text
//! Hub ──Nonant/Bounds──→ Spokes ──Inner/Outer──→ Hub ──Shutdown──→ Spokes
//!                                                                    │
//!                                                             finalize()
//! ```

#[cfg(test)]
mod tests {
    use cy_02_spoke::{BoundSpoke, BoundSpokeApi, FinalBound, SpokeConfig, SpokeResult};
    use cy_03_hub::{Hub, HubApi, HubConfig, HubResult};
    use cylinder_runtime::{CylinderRuntime, RuntimeConfig};
    use futures::future::join_all;
    use shared_types::{Field, SpokeVariant};
    use shared_window::{CommContext, InMemoryTopology};
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    const SCENARIO_TIMEOUT: Duration = Duration::from_secs(20);
    const NONANT_LEN: usize = 3;
    const OPTIMUM: f64 = 50.0;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct SpokeOutcome {
        cylinder_rank: usize,
        variant: SpokeVariant,
        polls: u64,
        final_bound: Option<FinalBound>,
        still_killed: bool,
    }

    struct HubOutcome {
        converged: bool,
        inner: Option<f64>,
        outer: Option<f64>,
    }

    /// Scripted bounds closing in on `OPTIMUM`.
    fn candidate(spoke: &BoundSpoke, step: u64) -> Option<f64> {
        let slack = 8.0 * 0.5f64.powi(step.min(60) as i32);
        match spoke.variant() {
            SpokeVariant::InnerBound => Some(OPTIMUM + slack),
            SpokeVariant::OuterBound => Some(OPTIMUM - slack),
            SpokeVariant::OuterBoundWithNonants => spoke
                .new_nonants()
                .then(|| spoke.local_nonants())
                .flatten()
                .map(|x| OPTIMUM - x.iter().map(|v| v.abs()).sum::<f64>()),
            _ => None,
        }
    }

    async fn spoke_task(
        ctx: CommContext,
        variant: SpokeVariant,
        scripted: bool,
    ) -> SpokeResult<SpokeOutcome> {
        let cylinder_rank = ctx.cylinder_rank();
        let config = SpokeConfig {
            nonant_len: NONANT_LEN,
            ..SpokeConfig::default()
        };
        let mut spoke = BoundSpoke::setup(ctx, variant, config, None).await?;

        let mut polls = 0;
        while !spoke.got_kill_signal().await? {
            polls += 1;
            if scripted {
                let next = candidate(&spoke, polls);
                spoke.update_if_improving(next).await?;
            }
            tokio::task::yield_now().await;
        }

        let still_killed = spoke.got_kill_signal().await?;
        Ok(SpokeOutcome {
            cylinder_rank,
            variant,
            polls,
            final_bound: spoke.finalize()?,
            still_killed,
        })
    }

    async fn hub_task(
        ctx: CommContext,
        spokes: Vec<SpokeVariant>,
        max_iterations: u64,
    ) -> HubResult<HubOutcome> {
        let config = HubConfig {
            nonant_len: NONANT_LEN,
            max_iterations,
            ..HubConfig::default()
        };
        let mut hub = Hub::setup(ctx, config, &spokes).await?;

        let mut converged = false;
        for iteration in 0..max_iterations {
            if hub.publishes(Field::Nonant) {
                let x = vec![0.5f64.powi(iteration.min(60) as i32); NONANT_LEN];
                hub.publish_nonants(&x).await?;
            }
            hub.sync().await?;
            if hub.is_converged() {
                converged = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        hub.send_terminate().await?;

        Ok(HubOutcome {
            converged,
            inner: hub.inner_bound(),
            outer: hub.outer_bound(),
        })
    }

    /// Spawn every rank of a `cylinder_size`-wide topology and wait for all.
    async fn run_ranks(
        spokes: Vec<SpokeVariant>,
        cylinder_size: usize,
        max_iterations: u64,
        scripted: bool,
    ) -> (Vec<HubOutcome>, Vec<SpokeOutcome>) {
        let topology = InMemoryTopology::new(spokes.len(), cylinder_size).unwrap();

        let hubs: Vec<_> = topology
            .hub()
            .into_iter()
            .map(|ctx| tokio::spawn(hub_task(ctx, spokes.clone(), max_iterations)))
            .collect();
        let mut spoke_handles = Vec::new();
        for (i, variant) in spokes.iter().enumerate() {
            for ctx in topology.spoke(i + 1).unwrap() {
                spoke_handles.push(tokio::spawn(spoke_task(ctx, *variant, scripted)));
            }
        }

        let (hubs, spokes) = timeout(
            SCENARIO_TIMEOUT,
            futures::future::join(join_all(hubs), join_all(spoke_handles)),
        )
        .await
        .expect("every rank must stop once terminate is sent");

        (
            hubs.into_iter().map(|r| r.unwrap().unwrap()).collect(),
            spokes.into_iter().map(|r| r.unwrap().unwrap()).collect(),
        )
    }

    // =============================================================================
    // KILL SIGNAL
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_converged_hub_terminates_every_spoke_rank() {
        let variants = vec![
            SpokeVariant::InnerBound,
            SpokeVariant::OuterBound,
            SpokeVariant::OuterBoundWithNonants,
        ];
        let (hubs, spokes) = run_ranks(variants, 2, 10_000, true).await;

        assert_eq!(hubs.len(), 2);
        for hub in &hubs {
            assert!(hub.converged);
            let (inner, outer) = (hub.inner.unwrap(), hub.outer.unwrap());
            assert!(outer <= OPTIMUM && OPTIMUM <= inner);
        }
        assert_eq!(hubs[0].inner, hubs[1].inner);

        assert_eq!(spokes.len(), 6);
        for spoke in &spokes {
            assert!(spoke.still_killed, "kill signal must stay set");
            assert!(spoke.polls > 0 || spoke.variant == SpokeVariant::OuterBoundWithNonants);
        }
        for rank in 0..2 {
            let inner = spokes
                .iter()
                .find(|s| s.variant == SpokeVariant::InnerBound && s.cylinder_rank == rank)
                .and_then(|s| s.final_bound.clone())
                .unwrap();
            assert!(inner.bound >= OPTIMUM);
            assert!(inner.solution.is_none());
        }
    }

    /// Terminate before any bound arrives: every spoke finalizes empty.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_immediate_terminate_leaves_spokes_without_bounds() {
        let (hubs, spokes) = run_ranks(
            vec![SpokeVariant::InnerBound, SpokeVariant::OuterBound],
            1,
            0,
            false,
        )
        .await;

        assert!(!hubs[0].converged);
        assert!(hubs[0].inner.is_none() && hubs[0].outer.is_none());
        for spoke in &spokes {
            assert!(spoke.final_bound.is_none());
            assert!(spoke.still_killed);
        }
    }

    // =============================================================================
    // FULL RUNTIME
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_runtime_run_writes_one_trace_per_spoke() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            spokes: SpokeVariant::ALL.to_vec(),
            cylinder_size: 2,
            max_iterations: 1_000,
            trace_prefix: Some(dir.path().join("trace-")),
            poll_interval: Duration::ZERO,
            run_timeout: SCENARIO_TIMEOUT,
            ..RuntimeConfig::default()
        };
        let (_tx, rx) = watch::channel(false);
        let summary = CylinderRuntime::new(config).run(rx).await.unwrap();

        assert!(summary.hub.converged);
        assert_eq!(summary.spokes.len(), SpokeVariant::ALL.len());
        for variant in SpokeVariant::ALL {
            let path = dir.path().join(format!("trace-{variant}.csv"));
            let contents = std::fs::read_to_string(&path).unwrap();
            let mut lines = contents.lines();
            assert_eq!(lines.next(), Some("time,bound"));
            assert!(lines.count() >= 1, "{variant} wrote no bounds");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), SpokeVariant::ALL.len());

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"convergers\":\"IOIOA\""));
    }
}
