//! # Collective Setup Failures
//!
//! A defect on any rank fails setup on every rank: first across its strata
//! group, then across every cylinder, so no member is left blocked on a
//! window that will never work.

#[cfg(test)]
mod tests {
    use cy_01_communicator::CommError;
    use cy_02_spoke::{BoundSpoke, SolutionSource, SpokeConfig, SpokeError};
    use cy_03_hub::{Hub, HubConfig, HubError};
    use cylinder_runtime::toy::ToySolution;
    use shared_types::SpokeVariant;
    use shared_window::InMemoryTopology;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Only member 1 of the incumbent cylinder lacks a solution source.
    /// Its cylinder peer abandons with it, and the hub and the unrelated
    /// inner-bound spoke fail remotely.
    #[tokio::test]
    async fn test_one_missing_solution_source_fails_every_rank() {
        let topology = InMemoryTopology::new(2, 2).unwrap();
        let mut hub = topology.hub();
        let mut plain = topology.spoke(1).unwrap();
        let mut incumbent = topology.spoke(2).unwrap();
        let spokes = [SpokeVariant::InnerBound, SpokeVariant::InnerBoundWithIncumbent];
        let hub_config = HubConfig {
            nonant_len: 2,
            ..HubConfig::default()
        };
        let spoke_config = SpokeConfig {
            nonant_len: 2,
            ..SpokeConfig::default()
        };
        let source: Arc<dyn SolutionSource> = Arc::new(ToySolution::new(vec![0.0, 0.0]));

        let results = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                BoundSpoke::setup(plain.remove(0), spokes[0], spoke_config.clone(), None),
                BoundSpoke::setup(plain.remove(0), spokes[0], spoke_config.clone(), None),
                BoundSpoke::setup(incumbent.remove(0), spokes[1], spoke_config.clone(), Some(source)),
                BoundSpoke::setup(incumbent.remove(0), spokes[1], spoke_config.clone(), None)
            )
        })
        .await
        .expect("setup must not hang");

        let (h0, h1, p0, p1, i0, i1) = results;
        for hub in [h0.err().unwrap(), h1.err().unwrap()] {
            assert!(hub.is_setup_error());
        }
        for spoke in [p0.err().unwrap(), p1.err().unwrap()] {
            assert!(matches!(
                spoke,
                SpokeError::Comm(CommError::RemoteSetupFailure { .. })
            ));
        }
        assert!(matches!(
            i0.err().unwrap(),
            SpokeError::Comm(CommError::SetupAbandoned { .. })
        ));
        assert!(matches!(
            i1.err().unwrap(),
            SpokeError::MissingSolutionSource { .. }
        ));
    }

    /// Member 0 opens its trace before member 1 reports a missing solution
    /// source; the abandoned setup removes the file so a rerun with the same
    /// prefix can start.
    #[tokio::test]
    async fn test_abandoned_setup_leaves_no_trace_file() {
        let dir = tempfile::tempdir().unwrap();
        let variant = SpokeVariant::InnerBoundWithIncumbent;
        let spokes = [variant];
        let hub_config = HubConfig {
            nonant_len: 2,
            ..HubConfig::default()
        };
        let spoke_config = SpokeConfig {
            nonant_len: 2,
            trace_prefix: Some(dir.path().join("run_")),
            ..SpokeConfig::default()
        };
        let source = || -> Arc<dyn SolutionSource> { Arc::new(ToySolution::new(vec![0.0, 0.0])) };

        let topology = InMemoryTopology::new(1, 2).unwrap();
        let mut hub = topology.hub();
        let mut spoke = topology.spoke(1).unwrap();
        let (_, _, s0, s1) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                BoundSpoke::setup(spoke.remove(0), variant, spoke_config.clone(), Some(source())),
                BoundSpoke::setup(spoke.remove(0), variant, spoke_config.clone(), None)
            )
        })
        .await
        .expect("setup must not hang");

        assert!(matches!(
            s0.err().unwrap(),
            SpokeError::Comm(CommError::SetupAbandoned { .. })
        ));
        assert!(matches!(
            s1.err().unwrap(),
            SpokeError::MissingSolutionSource { .. }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let topology = InMemoryTopology::new(1, 1).unwrap();
        let (hub, spoke) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(topology.hub().remove(0), hub_config.clone(), &spokes),
                BoundSpoke::setup(
                    topology.spoke(1).unwrap().remove(0),
                    variant,
                    spoke_config.clone(),
                    Some(source())
                )
            )
        })
        .await
        .expect("setup must not hang");
        hub.unwrap();
        assert!(spoke.unwrap().trace_file().is_some());
    }

    #[tokio::test]
    async fn test_hub_with_wrong_spoke_list_fails_spokes_too() {
        let topology = InMemoryTopology::new(1, 1).unwrap();
        let spokes = [SpokeVariant::InnerBound, SpokeVariant::OuterBound];

        let (hub, spoke) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(topology.hub().remove(0), HubConfig::default(), &spokes),
                BoundSpoke::setup(
                    topology.spoke(1).unwrap().remove(0),
                    SpokeVariant::InnerBound,
                    SpokeConfig::default(),
                    None
                )
            )
        })
        .await
        .expect("setup must not hang");

        assert_eq!(
            hub.err(),
            Some(HubError::SpokeCountMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert!(matches!(
            spoke.err().unwrap(),
            SpokeError::Comm(CommError::RemoteSetupFailure { rank: 0 })
        ));
    }

    /// Hub and spoke disagree on the nonant length of a shared field.
    #[tokio::test]
    async fn test_nonant_length_disagreement_fails_both_sides() {
        let topology = InMemoryTopology::new(1, 1).unwrap();
        let variant = SpokeVariant::OuterBoundWithNonants;
        let spokes = [variant];

        let (hub, spoke) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(
                    topology.hub().remove(0),
                    HubConfig {
                        nonant_len: 3,
                        ..HubConfig::default()
                    },
                    &spokes
                ),
                BoundSpoke::setup(
                    topology.spoke(1).unwrap().remove(0),
                    variant,
                    SpokeConfig {
                        nonant_len: 4,
                        ..SpokeConfig::default()
                    },
                    None
                )
            )
        })
        .await
        .expect("setup must not hang");

        assert!(hub.err().unwrap().is_setup_error());
        assert!(spoke.err().unwrap().is_setup_error());
    }

    /// Only spoke member 1 disagrees with the hub on the nonant length, so
    /// only strata group 1 sees the defect. Strata group 0 must fail too,
    /// or its ranks would block on their first cylinder barrier.
    #[tokio::test]
    async fn test_length_defect_in_one_strata_fails_every_rank() {
        let topology = InMemoryTopology::new(1, 2).unwrap();
        let mut hub = topology.hub();
        let mut spoke = topology.spoke(1).unwrap();
        let variant = SpokeVariant::OuterBoundWithNonants;
        let spokes = [variant];
        let hub_config = HubConfig {
            nonant_len: 3,
            ..HubConfig::default()
        };
        let spoke_config = |nonant_len| SpokeConfig {
            nonant_len,
            ..SpokeConfig::default()
        };

        let (h0, h1, s0, s1) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                Hub::setup(hub.remove(0), hub_config.clone(), &spokes),
                BoundSpoke::setup(spoke.remove(0), variant, spoke_config(3), None),
                BoundSpoke::setup(spoke.remove(0), variant, spoke_config(4), None)
            )
        })
        .await
        .expect("setup must not hang");

        assert!(matches!(
            h0.err().unwrap(),
            HubError::Comm(CommError::RemoteSetupFailure { .. })
        ));
        assert!(matches!(
            s0.err().unwrap(),
            SpokeError::Comm(CommError::RemoteSetupFailure { .. })
        ));
        assert!(h1.err().unwrap().is_setup_error());
        assert!(s1.err().unwrap().is_setup_error());
    }

    #[tokio::test]
    async fn test_hub_without_workload_fails_nonant_spoke() {
        let topology = InMemoryTopology::new(1, 1).unwrap();
        let variant = SpokeVariant::OuterBoundWithDuals;
        let spokes = [variant];

        let (hub, spoke) = timeout(SETUP_TIMEOUT, async {
            tokio::join!(
                Hub::setup(topology.hub().remove(0), HubConfig::default(), &spokes),
                BoundSpoke::setup(
                    topology.spoke(1).unwrap().remove(0),
                    variant,
                    SpokeConfig {
                        nonant_len: 2,
                        ..SpokeConfig::default()
                    },
                    None
                )
            )
        })
        .await
        .expect("setup must not hang");

        assert!(matches!(hub, Err(HubError::NoLocalWorkload { .. })));
        assert!(spoke.err().unwrap().is_setup_error());
    }
}
