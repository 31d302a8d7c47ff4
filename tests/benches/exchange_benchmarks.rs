//! # Cylinders Exchange Benchmarks
//!
//! | Path | Work per iteration |
//! |------|--------------------|
//! | wire encode/decode | one field record, payload 1..4096 |
//! | consensus decide | one reduced observation |
//! | publish + fetch | one bound through a built in-memory window |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cy_01_communicator::domain::{decide, Observation};
use cy_01_communicator::{Communicator, ExchangeApi};
use shared_types::{Field, WindowRecord, WriteId, HUB_RANK};
use shared_window::{wire, InMemoryTopology};
use std::time::Duration;

// ============================================================================
// WIRE LAYOUT
// ============================================================================

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    group.measurement_time(Duration::from_secs(5));

    for len in [1usize, 64, 4096] {
        let record = WindowRecord::new((0..len).map(|i| i as f64).collect(), WriteId(42));
        let slots = wire::encode(&record);

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &record, |b, record| {
            b.iter(|| black_box(wire::encode(record)))
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &slots, |b, slots| {
            b.iter(|| black_box(wire::decode(slots)))
        });
    }

    group.finish();
}

// ============================================================================
// FRESHNESS CONSENSUS
// ============================================================================

fn bench_decide(c: &mut Criterion) {
    let local = Observation::of(&WindowRecord::new(vec![1.0], WriteId(7)));
    let agreed = local.contribution();
    let torn = [7, -6, 0, 0];

    c.bench_function("consensus_decide_agreed", |b| {
        b.iter(|| black_box(decide(local, black_box(&agreed), WriteId(6))))
    });
    c.bench_function("consensus_decide_torn", |b| {
        b.iter(|| black_box(decide(local, black_box(&torn), WriteId(6))))
    });
}

// ============================================================================
// ROUND TRIP THROUGH A WINDOW
// ============================================================================

fn bench_publish_fetch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let (mut hub, mut spoke) = runtime.block_on(async {
        let topology = InMemoryTopology::new(1, 1).expect("topology");
        let mut hub = Communicator::new(topology.hub().remove(0));
        let mut spoke = Communicator::new(topology.spoke(1).expect("spoke").remove(0));
        hub.register_send_field(Field::Bounds, 2).expect("register");
        spoke
            .register_recv_field(Field::Bounds, HUB_RANK, 2)
            .expect("register");
        let (a, b) = tokio::join!(hub.make_window(), spoke.make_window());
        a.expect("hub window");
        b.expect("spoke window");
        (hub, spoke)
    });

    let mut value = 0.0;
    c.bench_function("publish_then_fetch_bounds", |b| {
        b.iter(|| {
            value += 1.0;
            runtime.block_on(async {
                hub.publish(Field::Bounds, &[value, -value])
                    .await
                    .expect("publish");
                black_box(spoke.fetch(Field::Bounds, HUB_RANK).await.expect("fetch"))
            })
        })
    });
}

criterion_group!(benches, bench_wire, bench_decide, bench_publish_fetch);
criterion_main!(benches);
