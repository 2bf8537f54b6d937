/*
 * Swarm Step Benchmark
 *
 * Measures one tick of the swarm (attract, integrate, publish) for both
 * layouts at several particle counts, and the cost of a renderer snapshot.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use swarm_field::{Layout, SimConfig, Swarm};

const COUNTS: [usize; 4] = [25, 250, 2_500, 25_000];

fn swarm(count: usize, layout: Layout) -> Swarm {
    let swarm = Swarm::new(&SimConfig {
        particle_count: count,
        layout,
        ..SimConfig::default()
    })
    .expect("valid benchmark config");
    swarm
        .context()
        .target
        .store(120.0, 80.0)
        .expect("finite target");
    swarm
}

fn bench_step(c: &mut Criterion) {
    for (name, layout) in [
        ("step_grid", Layout::Grid { cell_size: 4.0 }),
        ("step_trails", Layout::Trails { damping: 0.2 }),
    ] {
        let mut group = c.benchmark_group(name);
        for count in COUNTS {
            group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
                let mut swarm = swarm(n, layout);
                b.iter(|| black_box(swarm.step()));
            });
        }
        group.finish();
    }
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    for count in COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            let swarm = swarm(n, Layout::Grid { cell_size: 4.0 });
            let field = &swarm.context().field;
            b.iter(|| black_box((field.snapshot(), field.grid_snapshot())));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_step, bench_snapshot
}

criterion_main!(benches);
