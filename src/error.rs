//! Error types for the swarm engine.
//!
//! Degenerate attraction (a particle sitting exactly on the target) is not an
//! error; it is a guarded branch in [`crate::particle::Particle::step`].

use thiserror::Error;

/// Errors raised while loading or validating a [`crate::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Geometry rejected at the shared-field boundary.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FieldError {
    #[error("non-finite coordinates for particle {id}")]
    NonFinite { id: usize },
    #[error("non-finite target ({x}, {y})")]
    NonFiniteTarget { x: f32, y: f32 },
    #[error("unknown particle {id} (field holds {len})")]
    UnknownParticle { id: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("scheduler thread panicked")]
    SchedulerPanicked,
}
