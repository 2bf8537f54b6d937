use cgmath::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ParticleConfig;
use crate::vector;

/// Largest displacement a single attraction step applies.
pub const ATTRACTION_STEP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Color assigned to each particle at spawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    Fixed(Color),
    /// Uniform per channel within the inclusive range.
    Random { min: Color, max: Color },
}

impl ColorPolicy {
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Color {
        match *self {
            ColorPolicy::Fixed(color) => color,
            ColorPolicy::Random { min, max } => Color::new(
                rng.gen_range(min.r..=max.r),
                rng.gen_range(min.g..=max.g),
                rng.gen_range(min.b..=max.b),
            ),
        }
    }
}

/// Integration scheme applied after the attraction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Position becomes the attracted position; no velocity is carried.
    Direct,
    /// Implicit velocity from the position history, scaled by `damping`.
    Verlet { damping: f32 },
}

/// What a particle publishes and what the renderer reads back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSample {
    pub position: Vector2<f32>,
    pub previous_position: Vector2<f32>,
    pub color: Color,
}

impl ParticleSample {
    pub fn is_finite(&self) -> bool {
        vector::is_finite(self.position) && vector::is_finite(self.previous_position)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub id: usize,
    pub position: Vector2<f32>,
    pub previous_position: Vector2<f32>,
    pub color: Color,
    pub life: Option<u32>,
    /// Grid cell this particle last published into.
    pub(crate) cell: Option<usize>,
    /// Set while the field keeps rejecting this particle's samples.
    pub(crate) rejected: bool,
}

impl Particle {
    pub fn spawn<R: Rng>(
        id: usize,
        spawn_point: Vector2<f32>,
        config: &ParticleConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            position: spawn_point,
            previous_position: spawn_point,
            color: config.color.pick(rng),
            life: config.life,
            cell: None,
            rejected: false,
        }
    }

    /// Position after one attraction step toward `target`.
    ///
    /// The step is a unit move along the direction to the target, shortened
    /// so it never passes the target. A particle already on the target does
    /// not move.
    pub fn attract(&self, target: Vector2<f32>) -> Vector2<f32> {
        match vector::direction_to(self.position, target) {
            Some((direction, distance)) => {
                self.position + direction * distance.min(ATTRACTION_STEP)
            }
            None => self.position,
        }
    }

    pub fn step(&mut self, target: Vector2<f32>, motion: Motion) {
        let attracted = self.attract(target);

        match motion {
            Motion::Direct => {
                self.previous_position = self.position;
                self.position = attracted;
            }
            Motion::Verlet { damping } => {
                let velocity = (attracted - self.previous_position) * damping;
                self.previous_position = attracted;
                self.position = attracted + velocity;
            }
        }
    }

    pub fn sample(&self) -> ParticleSample {
        ParticleSample {
            position: self.position,
            previous_position: self.previous_position,
            color: self.color,
        }
    }

    /// Restore kinematic state from a previously published sample.
    pub fn rewind(&mut self, sample: &ParticleSample) {
        self.position = sample.position;
        self.previous_position = sample.previous_position;
    }
}
