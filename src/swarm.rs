use std::sync::Arc;

use cgmath::Vector2;
use rand::thread_rng;
use rayon::prelude::*;
use tracing::{debug, error, warn};

use crate::config::{InvalidSamplePolicy, SimConfig};
use crate::context::SimContext;
use crate::error::{FieldError, SimError};
use crate::field::SharedField;
use crate::particle::{Motion, Particle};

/// All particles of a run, stepped together once per tick.
///
/// Each particle's update only reads the tick's target and writes its own
/// state, so the step is a data-parallel loop over the current rayon pool.
/// Every particle publishes into the shared field as soon as it has moved.
pub struct Swarm {
    particles: Vec<Particle>,
    context: Arc<SimContext>,
    motion: Motion,
    invalid_sample: InvalidSamplePolicy,
}

impl Swarm {
    /// Spawn `config.particle_count` particles at the spawn point, publish
    /// them, and aim them at the spawn point until a target is set.
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let spawn_point = Vector2::new(config.spawn_point[0], config.spawn_point[1]);
        let context = Arc::new(SimContext::new(SharedField::from_config(config), spawn_point));

        let mut rng = thread_rng();
        let mut particles: Vec<Particle> = (0..config.particle_count)
            .map(|id| Particle::spawn(id, spawn_point, &config.particle, &mut rng))
            .collect();

        for particle in &mut particles {
            context
                .field
                .publish(particle.id, &particle.sample(), &mut particle.cell)?;
        }

        Ok(Self {
            particles,
            context,
            motion: config.motion(),
            invalid_sample: config.invalid_sample,
        })
    }

    pub fn context(&self) -> &Arc<SimContext> {
        &self.context
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// Advance every particle one tick. Returns the number of samples the
    /// field rejected.
    pub fn step(&mut self) -> u64 {
        let target = self.context.target.load();
        let motion = self.motion;
        let policy = self.invalid_sample;
        let context = &self.context;

        let dropped: u64 = self
            .particles
            .par_iter_mut()
            .map(|particle| {
                let last = particle.sample();
                particle.step(target, motion);

                match context
                    .field
                    .publish(particle.id, &particle.sample(), &mut particle.cell)
                {
                    Ok(()) => {
                        particle.rejected = false;
                        0
                    }
                    Err(err) => {
                        reject_sample(context, err, policy, particle.rejected);
                        particle.rejected = true;
                        particle.rewind(&last);
                        1
                    }
                }
            })
            .sum();

        if dropped > 0 {
            self.context.record_dropped(dropped);
        }
        self.context.record_tick();
        dropped
    }
}

/// `repeated` is set when the particle's previous tick was rejected too;
/// only the first of a streak is logged as a warning.
fn reject_sample(
    context: &SimContext,
    err: FieldError,
    policy: InvalidSamplePolicy,
    repeated: bool,
) {
    match policy {
        InvalidSamplePolicy::Skip if repeated => {
            debug!(%err, "dropping invalid sample again");
        }
        InvalidSamplePolicy::Skip => {
            warn!(%err, "dropping invalid sample");
        }
        InvalidSamplePolicy::Shutdown => {
            error!(%err, "invalid sample, shutting down");
            context.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use crate::vector;
    use cgmath::vec2;

    fn grid_config(count: usize) -> SimConfig {
        SimConfig {
            particle_count: count,
            layout: Layout::Grid { cell_size: 10.0 },
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_spawn_publishes_every_particle() {
        let swarm = Swarm::new(&grid_config(20)).unwrap();
        let ctx = swarm.context();
        assert_eq!(swarm.len(), 20);
        assert!(!swarm.is_empty());
        assert_eq!(swarm.motion(), Motion::Direct);

        let snapshot = ctx.field.snapshot();
        assert_eq!(snapshot.len(), 20);
        assert!(snapshot.iter().all(|s| s.position == vec2(400.0, 300.0)));

        let grid = ctx.field.grid_snapshot().unwrap();
        assert_eq!(grid.total_occupancy(), 20);
        assert_eq!(grid.occupancy(grid.cell_of(vec2(400.0, 300.0))), 20);
        assert_eq!(ctx.ticks(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig {
            particle_count: 0,
            ..SimConfig::default()
        };
        assert!(matches!(Swarm::new(&config), Err(SimError::Config(_))));
    }

    #[test]
    fn test_step_publishes_new_positions() {
        let mut swarm = Swarm::new(&grid_config(5)).unwrap();
        swarm.context().target.store(400.0, 400.0).unwrap();

        assert_eq!(swarm.step(), 0);

        let snapshot = swarm.context().field.snapshot();
        for (sample, particle) in snapshot.iter().zip(swarm.particles()) {
            assert_eq!(sample.position, vec2(400.0, 301.0));
            assert_eq!(sample.previous_position, vec2(400.0, 300.0));
            assert_eq!(*sample, particle.sample());
        }
        assert_eq!(swarm.context().ticks(), 1);
    }

    #[test]
    fn test_grid_tracks_moving_swarm() {
        let mut swarm = Swarm::new(&grid_config(10)).unwrap();
        swarm.context().target.store(105.0, 55.0).unwrap();

        for _ in 0..400 {
            swarm.step();
        }

        let grid = swarm.context().field.grid_snapshot().unwrap();
        assert_eq!(grid.total_occupancy(), 10);
        let cell = grid.cell_of(vec2(105.0, 55.0));
        assert_eq!(grid.coords(cell), (10, 5));
        assert_eq!(grid.occupancy(cell), 10);
        for p in swarm.particles() {
            assert!(vector::distance(p.position, vec2(105.0, 55.0)) < 1e-3);
        }
    }

    // Verlet velocity between two extreme positions overflows to infinity.
    fn overflowing(swarm: &mut Swarm, id: usize) {
        swarm.particles[id].position = vec2(f32::MAX, 300.0);
        swarm.particles[id].previous_position = vec2(-f32::MAX, 300.0);
    }

    #[test]
    fn test_invalid_sample_is_skipped() {
        let mut swarm = Swarm::new(&SimConfig {
            particle_count: 3,
            ..SimConfig::default()
        })
        .unwrap();
        overflowing(&mut swarm, 1);

        assert_eq!(swarm.step(), 1);
        let ctx = swarm.context();
        assert_eq!(ctx.dropped_samples(), 1);
        assert!(!ctx.cancel.is_cancelled());

        let rewound = swarm.particles()[1];
        assert_eq!(rewound.position, vec2(f32::MAX, 300.0));
        assert_eq!(rewound.previous_position, vec2(-f32::MAX, 300.0));

        let snapshot = ctx.field.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[1].position, vec2(400.0, 300.0));
    }

    #[test]
    fn test_stuck_particle_is_flagged_until_it_recovers() {
        let mut swarm = Swarm::new(&SimConfig {
            particle_count: 2,
            ..SimConfig::default()
        })
        .unwrap();
        overflowing(&mut swarm, 0);

        for _ in 0..5 {
            assert_eq!(swarm.step(), 1);
            assert!(swarm.particles()[0].rejected);
            assert!(!swarm.particles()[1].rejected);
        }
        assert_eq!(swarm.context().dropped_samples(), 5);

        swarm.particles[0].position = vec2(10.0, 10.0);
        swarm.particles[0].previous_position = vec2(10.0, 10.0);
        assert_eq!(swarm.step(), 0);
        assert!(!swarm.particles()[0].rejected);
        assert_eq!(swarm.context().dropped_samples(), 5);
    }

    #[test]
    fn test_invalid_sample_can_shut_down() {
        let mut swarm = Swarm::new(&SimConfig {
            particle_count: 2,
            invalid_sample: InvalidSamplePolicy::Shutdown,
            ..SimConfig::default()
        })
        .unwrap();
        overflowing(&mut swarm, 0);

        assert_eq!(swarm.step(), 1);
        assert!(swarm.context().cancel.is_cancelled());
    }
}
