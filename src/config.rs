//! Startup configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "particle_count": 30, "layout": { "mode": "grid", "cell_size": 8 } }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::particle::{Color, ColorPolicy, Motion};

/// Longest tick period a fixed rate may ask for.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(3600);

/// Upper bound on `cols * rows` of the occupancy grid.
pub const MAX_GRID_CELLS: usize = 1 << 24;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub particle_count: usize,
    /// Common spawn point of every particle, usually the display center.
    pub spawn_point: [f32; 2],
    /// Display dimensions in simulation units.
    pub width: f32,
    pub height: f32,
    pub layout: Layout,
    pub particle: ParticleConfig,
    pub tick: TickPolicy,
    /// Target frame rate for the render collaborator.
    pub fps: u32,
    /// Size of the rayon pool stepping the swarm; 0 lets rayon decide.
    pub workers: usize,
    pub invalid_sample: InvalidSamplePolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_count: 25,
            spawn_point: [400.0, 300.0],
            width: 800.0,
            height: 600.0,
            layout: Layout::default(),
            particle: ParticleConfig::default(),
            tick: TickPolicy::default(),
            fps: 60,
            workers: 0,
            invalid_sample: InvalidSamplePolicy::default(),
        }
    }
}

/// How particles are published for rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Layout {
    /// Flat occupancy grid of filled cells. Particles step directly toward
    /// the target with no carried velocity.
    Grid { cell_size: f32 },
    /// Line segments from previous to current position, integrated with
    /// damped Verlet.
    Trails { damping: f32 },
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Trails { damping: 0.2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParticleConfig {
    pub color: ColorPolicy,
    /// Reserved countdown copied onto every particle. Nothing reads it.
    pub life: Option<u32>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            color: ColorPolicy::Random {
                min: Color::new(60, 60, 160),
                max: Color::new(255, 255, 255),
            },
            life: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// Fixed timestep at `hz` ticks per second.
    FixedRate { hz: f32 },
    /// No pacing; step as fast as the scheduler allows.
    FreeRun,
}

impl Default for TickPolicy {
    fn default() -> Self {
        TickPolicy::FixedRate { hz: 120.0 }
    }
}

impl TickPolicy {
    /// Time between ticks, `None` when free running. A rate too slow to
    /// represent falls back to [`MAX_TICK_PERIOD`].
    pub fn period(&self) -> Option<Duration> {
        match *self {
            TickPolicy::FixedRate { hz } => Some(fixed_period(hz).unwrap_or(MAX_TICK_PERIOD)),
            TickPolicy::FreeRun => None,
        }
    }
}

fn fixed_period(hz: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(1.0 / hz)
        .ok()
        .filter(|period| *period <= MAX_TICK_PERIOD)
}

/// What to do when a particle produces a sample the field rejects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidSamplePolicy {
    /// Drop the sample, rewind the particle to its last published state.
    #[default]
    Skip,
    /// Cancel the whole run.
    Shutdown,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be positive"));
        }
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(ConfigError::Invalid("width and height must be positive"));
        }
        if !self.spawn_point.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::Invalid("spawn_point must be finite"));
        }
        if self.fps == 0 {
            return Err(ConfigError::Invalid("fps must be positive"));
        }

        match self.layout {
            Layout::Grid { cell_size } => {
                if !cell_size.is_finite() || cell_size <= 0.0 {
                    return Err(ConfigError::Invalid("cell_size must be positive"));
                }
                if cell_size > self.width || cell_size > self.height {
                    return Err(ConfigError::Invalid("cell_size exceeds the display"));
                }
                let cells = self
                    .grid_dimensions()
                    .and_then(|(cols, rows)| cols.checked_mul(rows));
                if !cells.is_some_and(|cells| cells <= MAX_GRID_CELLS) {
                    return Err(ConfigError::Invalid("grid has too many cells"));
                }
            }
            Layout::Trails { damping } => {
                if !(0.0..=1.0).contains(&damping) {
                    return Err(ConfigError::Invalid("damping must be within 0..=1"));
                }
            }
        }

        if let TickPolicy::FixedRate { hz } = self.tick {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(ConfigError::Invalid("tick rate must be positive"));
            }
            if fixed_period(hz).is_none() {
                return Err(ConfigError::Invalid("tick rate is too slow"));
            }
        }

        if let ColorPolicy::Random { min, max } = self.particle.color {
            if min.r > max.r || min.g > max.g || min.b > max.b {
                return Err(ConfigError::Invalid("random color min exceeds max"));
            }
        }

        Ok(())
    }

    /// `(cols, rows)` of the occupancy grid, `None` for the trails layout.
    pub fn grid_dimensions(&self) -> Option<(usize, usize)> {
        match self.layout {
            Layout::Grid { cell_size } => Some((
                (self.width / cell_size).floor() as usize,
                (self.height / cell_size).floor() as usize,
            )),
            Layout::Trails { .. } => None,
        }
    }

    pub fn motion(&self) -> Motion {
        match self.layout {
            Layout::Grid { .. } => Motion::Direct,
            Layout::Trails { damping } => Motion::Verlet { damping },
        }
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.fps as f32)
    }
}
