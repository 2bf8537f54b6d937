//! Concurrent particle swarm attracted toward a shared target point.
//!
//! Particles step toward the target by at most one unit per tick, then
//! integrate: directly in the [`Layout::Grid`] layout, with damped Verlet in
//! the [`Layout::Trails`] layout. Every particle publishes into a
//! [`SharedField`] that a renderer reads once per frame.
//!
//! ```no_run
//! use swarm_field::{SimConfig, Simulation};
//!
//! let handle = Simulation::start(SimConfig::default())?;
//! handle.set_target(120.0, 80.0)?;
//! let frame = handle.snapshot();
//! # drop(frame);
//! let stats = handle.stop()?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod particle;
pub mod simulation;
pub mod swarm;
pub mod vector;

pub use clock::Ticker;
pub use config::{InvalidSamplePolicy, Layout, ParticleConfig, SimConfig, TickPolicy};
pub use context::{CancelToken, SharedTarget, SimContext};
pub use error::{ConfigError, FieldError, SimError};
pub use field::{GridCell, OccupancyGrid, SharedField};
pub use particle::{Color, ColorPolicy, Motion, Particle, ParticleSample};
pub use simulation::{Frame, RunHandle, RunStats, Simulation};
pub use swarm::Swarm;
