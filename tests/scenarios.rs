//! Deterministic end-to-end scenarios, stepping the swarm tick by tick.

use cgmath::vec2;
use swarm_field::vector::distance;
use swarm_field::{Color, ColorPolicy, Layout, ParticleConfig, SimConfig, Swarm};

const TOLERANCE: f32 = 1e-4;

#[test]
fn test_swarm_at_target_stays_put() {
    for layout in [Layout::Grid { cell_size: 10.0 }, Layout::Trails { damping: 0.2 }] {
        let mut swarm = Swarm::new(&SimConfig {
            particle_count: 20,
            spawn_point: [400.0, 300.0],
            layout,
            ..SimConfig::default()
        })
        .unwrap();
        swarm.context().target.store(400.0, 300.0).unwrap();

        for _ in 0..100 {
            assert_eq!(swarm.step(), 0);
        }

        let target = vec2(400.0, 300.0);
        for sample in swarm.context().field.snapshot() {
            assert!(distance(sample.position, target) < TOLERANCE, "{layout:?}");
            assert!(distance(sample.previous_position, target) < TOLERANCE);
        }
    }
}

#[test]
fn test_single_particle_reaches_target() {
    let mut swarm = Swarm::new(&SimConfig {
        particle_count: 1,
        spawn_point: [0.0, 0.0],
        layout: Layout::Grid { cell_size: 10.0 },
        ..SimConfig::default()
    })
    .unwrap();
    swarm.context().target.store(100.0, 0.0).unwrap();

    for _ in 0..100 {
        swarm.step();
    }

    let p = swarm.particles()[0];
    assert!(distance(p.position, vec2(100.0, 0.0)) < 1.0);
    assert_eq!(swarm.context().ticks(), 100);
}

#[test]
fn test_trails_converge_from_far_away() {
    let mut swarm = Swarm::new(&SimConfig {
        particle_count: 25,
        spawn_point: [50.0, 50.0],
        ..SimConfig::default()
    })
    .unwrap();
    swarm.context().target.store(700.0, 500.0).unwrap();

    let target = vec2(700.0, 500.0);
    let mut last = distance(vec2(50.0, 50.0), target);

    for tick in 0..1000 {
        swarm.step();
        let d = distance(swarm.particles()[0].position, target);
        // Damped approach: never farther than the step before, except for
        // the sub-unit overshoot as it lands.
        assert!(d <= last + 1.0, "tick {tick}: {d} > {last}");
        last = d;
    }

    for p in swarm.particles() {
        assert!(distance(p.position, target) < 1e-2);
    }
}

#[test]
fn test_target_moves_mid_run() {
    let mut swarm = Swarm::new(&SimConfig {
        particle_count: 5,
        layout: Layout::Grid { cell_size: 5.0 },
        ..SimConfig::default()
    })
    .unwrap();
    let ctx = swarm.context().clone();

    ctx.target.store(420.0, 300.0).unwrap();
    for _ in 0..10 {
        swarm.step();
    }
    assert!(swarm.particles().iter().all(|p| p.position == vec2(410.0, 300.0)));

    ctx.target.store(410.0, 280.0).unwrap();
    for _ in 0..30 {
        swarm.step();
    }
    assert!(
        swarm
            .particles()
            .iter()
            .all(|p| distance(p.position, vec2(410.0, 280.0)) < TOLERANCE)
    );

    let grid = ctx.field.grid_snapshot().unwrap();
    assert_eq!(grid.total_occupancy(), 5);
    assert_eq!(grid.occupancy(grid.cell_of(vec2(410.0, 280.0))), 5);
}

#[test]
fn test_fixed_color_and_reserved_life() {
    let red = Color::new(200, 10, 10);
    let swarm = Swarm::new(&SimConfig {
        particle_count: 4,
        particle: ParticleConfig {
            color: ColorPolicy::Fixed(red),
            life: Some(300),
        },
        ..SimConfig::default()
    })
    .unwrap();

    for p in swarm.particles() {
        assert_eq!(p.color, red);
        assert_eq!(p.life, Some(300));
    }
    assert!(swarm.context().field.snapshot().iter().all(|s| s.color == red));
}
