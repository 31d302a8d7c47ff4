//! # Bound Exchange Flows
//!
//! Hub ↔ spoke traffic over a built window:
//!
//! 1. **Spoke → Hub**: only strict improvements are published, and the hub
//!    sees each one exactly once
//! 2. **Hub → Spoke**: published global bounds reach every spoke member
//! 3. **Torn reads**: a cylinder that disagrees on the observed write id
//!    keeps its old buffer on every member and catches up next round

#[cfg(test)]
mod tests {
    use cy_02_spoke::{BoundSpoke, BoundSpokeApi, SpokeConfig};
    use cy_03_hub::{Hub, HubApi, HubConfig};
    use shared_types::{Field, FieldKey, SpokeVariant, WriteId, HUB_RANK};
    use shared_window::{CommContext, InMemoryTopology};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// One hub and one spoke of `variant`, both built.
    async fn single_spoke(variant: SpokeVariant) -> (Hub, BoundSpoke) {
        let topology = InMemoryTopology::new(1, 1).unwrap();
        let hub_ctx = topology.hub().remove(0);
        let spoke_ctx = topology.spoke(1).unwrap().remove(0);
        let spokes = [variant];
        let (hub, spoke) = tokio::join!(
            Hub::setup(hub_ctx, HubConfig::default(), &spokes),
            BoundSpoke::setup(spoke_ctx, variant, SpokeConfig::default(), None)
        );
        (hub.unwrap(), spoke.unwrap())
    }

    fn pop_two(mut contexts: Vec<CommContext>) -> (CommContext, CommContext) {
        let first = contexts.remove(0);
        let second = contexts.remove(0);
        (first, second)
    }

    // =============================================================================
    // SPOKE → HUB
    // =============================================================================

    /// Improvements 10 then 8 reach the hub; a repeated 8 is never sent.
    #[tokio::test]
    async fn test_improving_sequence_seen_once_by_hub() {
        let (mut hub, mut spoke) = single_spoke(SpokeVariant::InnerBound).await;

        assert!(spoke.update_if_improving(Some(10.0)).await.unwrap());
        let update = hub.receive_bounds().await.unwrap();
        assert_eq!(update.received, 1);
        assert_eq!(update.new_inner, Some(10.0));

        assert!(spoke.update_if_improving(Some(8.0)).await.unwrap());
        let update = hub.receive_bounds().await.unwrap();
        assert_eq!(update.received, 1);
        assert_eq!(update.new_inner, Some(8.0));

        assert!(!spoke.update_if_improving(Some(8.0)).await.unwrap());
        let update = hub.receive_bounds().await.unwrap();
        assert_eq!(update.received, 0);
        assert!(!update.improved());

        assert_eq!(spoke.bound(), Some(8.0));
        assert_eq!(hub.inner_bound(), Some(8.0));
        assert_eq!(
            hub.spoke_bounds(),
            vec![(1, SpokeVariant::InnerBound, Some(8.0))]
        );
        assert_eq!(spoke.communicator().stats().publishes, 2);
    }

    /// Worse candidates after an improvement leave the hub's view alone.
    #[tokio::test]
    async fn test_worse_candidates_not_published() {
        let (mut hub, mut spoke) = single_spoke(SpokeVariant::OuterBound).await;

        assert!(spoke.update_if_improving(Some(5.0)).await.unwrap());
        assert!(!spoke.update_if_improving(Some(4.0)).await.unwrap());
        assert!(!spoke.update_if_improving(None).await.unwrap());
        assert!(!spoke.update_if_improving(Some(f64::NAN)).await.unwrap());

        hub.receive_bounds().await.unwrap();
        assert_eq!(hub.outer_bound(), Some(5.0));
        assert!(hub.inner_bound().is_none());
        assert!(hub.compute_gaps().abs.is_infinite());
    }

    // =============================================================================
    // HUB → SPOKE
    // =============================================================================

    #[tokio::test]
    async fn test_global_bounds_reach_spoke() {
        let (mut hub, mut spoke) = single_spoke(SpokeVariant::InnerBound).await;
        spoke.update_locals().await.unwrap();
        assert!(spoke.hub_inner_bound().is_none());

        spoke.update_if_improving(Some(12.0)).await.unwrap();
        hub.sync().await.unwrap();
        // the sync above published before reading, so publish again
        hub.publish_bounds().await.unwrap();

        spoke.update_locals().await.unwrap();
        assert_eq!(spoke.hub_inner_bound(), Some(12.0));
        assert_eq!(spoke.hub_outer_bound(), Some(f64::NEG_INFINITY));
    }

    /// Write ids a reader accepts only ever go up, even while the owner
    /// keeps publishing.
    #[tokio::test]
    async fn test_accepted_ids_strictly_increase_under_concurrent_publishing() {
        const ROUNDS: u64 = 50;
        let (mut hub, mut spoke) = single_spoke(SpokeVariant::InnerBound).await;

        let publisher = async {
            for _ in 0..ROUNDS {
                hub.publish_bounds().await.unwrap();
                tokio::task::yield_now().await;
            }
        };
        let reader = async {
            let mut accepted = Vec::new();
            while accepted.last().copied() != Some(ROUNDS) {
                spoke.update_locals().await.unwrap();
                let buffer = spoke.communicator().local(Field::Bounds, HUB_RANK).unwrap();
                if buffer.is_new() {
                    accepted.push(buffer.last_id().0);
                }
                tokio::task::yield_now().await;
            }
            accepted
        };
        let ((), accepted) = tokio::join!(publisher, reader);

        assert!(!accepted.is_empty());
        assert!(accepted.windows(2).all(|w| w[0] < w[1]));
    }

    // =============================================================================
    // TORN READS
    // =============================================================================

    /// Member 1 sees id 4 while member 0 sees 5: neither accepts, both keep
    /// their old buffer, and the next refresh accepts 5 on both.
    #[tokio::test]
    async fn test_torn_bounds_read_rejected_by_whole_spoke_cylinder() {
        let topology = InMemoryTopology::new(1, 2).unwrap();
        let (hub0, hub1) = pop_two(topology.hub());
        let (spoke0, spoke1) = pop_two(topology.spoke(1).unwrap());
        let variant = SpokeVariant::OuterBound;
        let spokes = [variant];

        let (h0, h1, s0, s1) = tokio::join!(
            Hub::setup(hub0, HubConfig::default(), &spokes),
            Hub::setup(hub1, HubConfig::default(), &spokes),
            BoundSpoke::setup(spoke0, variant, SpokeConfig::default(), None),
            BoundSpoke::setup(spoke1, variant, SpokeConfig::default(), None)
        );
        let (mut h0, mut h1, mut s0, mut s1) =
            (h0.unwrap(), h1.unwrap(), s0.unwrap(), s1.unwrap());

        let (a, b) = tokio::join!(
            s0.update_if_improving(Some(3.0)),
            s1.update_if_improving(Some(3.0))
        );
        assert!(a.unwrap() && b.unwrap());
        let (a, b) = tokio::join!(h0.receive_bounds(), h1.receive_bounds());
        a.unwrap();
        b.unwrap();

        for _ in 0..5 {
            let (a, b) = tokio::join!(h0.publish_bounds(), h1.publish_bounds());
            assert_eq!(a.unwrap(), b.unwrap());
        }

        let key = FieldKey::new(Field::Bounds, HUB_RANK);
        topology.window(1, 1).override_next_id(key, 4.0);

        let (a, b) = tokio::join!(s0.update_locals(), s1.update_locals());
        a.unwrap();
        b.unwrap();
        for spoke in [&s0, &s1] {
            assert!(spoke.hub_outer_bound().is_none());
            let buffer = spoke.communicator().local(Field::Bounds, HUB_RANK).unwrap();
            assert!(!buffer.is_new());
            assert!(buffer.last_id().is_never());
            assert_eq!(spoke.communicator().stats().torn, 1);
        }

        let (a, b) = tokio::join!(s0.update_locals(), s1.update_locals());
        a.unwrap();
        b.unwrap();
        for spoke in [&s0, &s1] {
            assert_eq!(spoke.hub_outer_bound(), Some(3.0));
            let buffer = spoke.communicator().local(Field::Bounds, HUB_RANK).unwrap();
            assert_eq!(buffer.last_id(), WriteId(5));
        }
    }

    /// A torn observation on the hub side: the two hub members disagree on
    /// a spoke's bound id, so neither records the bound this round.
    #[tokio::test]
    async fn test_torn_spoke_bound_rejected_by_hub_cylinder() {
        let topology = InMemoryTopology::new(1, 2).unwrap();
        let (hub0, hub1) = pop_two(topology.hub());
        let (spoke0, spoke1) = pop_two(topology.spoke(1).unwrap());
        let variant = SpokeVariant::InnerBound;
        let spokes = [variant];

        let (h0, h1, s0, s1) = tokio::join!(
            Hub::setup(hub0, HubConfig::default(), &spokes),
            Hub::setup(hub1, HubConfig::default(), &spokes),
            BoundSpoke::setup(spoke0, variant, SpokeConfig::default(), None),
            BoundSpoke::setup(spoke1, variant, SpokeConfig::default(), None)
        );
        let (mut h0, mut h1, mut s0, mut s1) =
            (h0.unwrap(), h1.unwrap(), s0.unwrap(), s1.unwrap());

        for candidate in [9.0, 7.0] {
            let (a, b) = tokio::join!(
                s0.update_if_improving(Some(candidate)),
                s1.update_if_improving(Some(candidate))
            );
            assert!(a.unwrap() && b.unwrap());
        }

        let key = FieldKey::new(Field::InnerBound, 1);
        topology.window(0, 0).override_next_id(key, 1.0);

        let (a, b) = tokio::join!(h0.receive_bounds(), h1.receive_bounds());
        assert_eq!(a.unwrap().received, 0);
        assert_eq!(b.unwrap().received, 0);
        assert!(h0.inner_bound().is_none() && h1.inner_bound().is_none());

        let (a, b) = tokio::join!(h0.receive_bounds(), h1.receive_bounds());
        assert_eq!(a.unwrap().new_inner, Some(7.0));
        assert_eq!(b.unwrap().new_inner, Some(7.0));

        let outcome = {
            let (a, b) = tokio::join!(
                s0.update_if_improving(Some(7.0)),
                s1.update_if_improving(Some(7.0))
            );
            (a.unwrap(), b.unwrap())
        };
        assert_eq!(outcome, (false, false));
    }
}
