//! The shared field particles publish into and the renderer reads from.
//!
//! Two locks, each held for a single operation:
//!
//! - the sample list (`RwLock`), one slot per particle id, written once per
//!   particle per tick and cloned whole by [`SharedField::snapshot`];
//! - the occupancy grid (`Mutex`, grid layout only). A particle's move from
//!   its old cell to its new one is a single critical section, so nobody
//!   ever sees the particle missing from the grid.
//!
//! Nothing orders publishes of different particles. A snapshot taken while
//! a tick is running can mix positions from two ticks.

use cgmath::Vector2;
use parking_lot::{Mutex, RwLock};

use crate::config::{Layout, SimConfig};
use crate::error::FieldError;
use crate::particle::{Color, ParticleSample};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCell {
    /// Particles currently in this cell.
    pub count: u32,
    /// Color of the most recent particle to enter; `None` once empty.
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<GridCell>,
}

impl OccupancyGrid {
    pub fn new(cols: usize, rows: usize, cell_size: f32) -> Self {
        Self {
            cols,
            rows,
            cell_size,
            cells: vec![GridCell::default(); cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Index of the cell containing `position`. Positions off the grid are
    /// clamped onto its border cells.
    pub fn cell_of(&self, position: Vector2<f32>) -> usize {
        let clamp = |v: f32, len: usize| {
            (v / self.cell_size).floor().clamp(0.0, (len - 1) as f32) as usize
        };
        let col = clamp(position.x, self.cols);
        let row = clamp(position.y, self.rows);
        row * self.cols + col
    }

    /// `(col, row)` of a cell index.
    pub fn coords(&self, cell: usize) -> (usize, usize) {
        (cell % self.cols, cell / self.cols)
    }

    pub fn clear(&mut self, cell: usize) {
        let slot = &mut self.cells[cell];
        slot.count = slot.count.saturating_sub(1);
        if slot.count == 0 {
            slot.color = None;
        }
    }

    pub fn set(&mut self, cell: usize, color: Color) {
        let slot = &mut self.cells[cell];
        slot.count += 1;
        slot.color = Some(color);
    }

    pub fn get(&self, cell: usize) -> Option<Color> {
        self.cells.get(cell).and_then(|c| c.color)
    }

    pub fn occupancy(&self, cell: usize) -> u32 {
        self.cells.get(cell).map_or(0, |c| c.count)
    }

    pub fn total_occupancy(&self) -> u64 {
        self.cells.iter().map(|c| c.count as u64).sum()
    }

    /// Occupied cells as `(col, row, color)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            let (col, row) = self.coords(i);
            cell.color.map(|color| (col, row, color))
        })
    }
}

#[derive(Debug)]
pub struct SharedField {
    samples: RwLock<Vec<Option<ParticleSample>>>,
    grid: Option<Mutex<OccupancyGrid>>,
}

impl SharedField {
    /// Sample list only: the renderer draws each particle as a segment from
    /// its previous to its current position.
    pub fn trails(particles: usize) -> Self {
        Self {
            samples: RwLock::new(vec![None; particles]),
            grid: None,
        }
    }

    pub fn grid(particles: usize, cols: usize, rows: usize, cell_size: f32) -> Self {
        Self {
            samples: RwLock::new(vec![None; particles]),
            grid: Some(Mutex::new(OccupancyGrid::new(cols, rows, cell_size))),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        match (config.layout, config.grid_dimensions()) {
            (Layout::Grid { cell_size }, Some((cols, rows))) => {
                Self::grid(config.particle_count, cols, rows, cell_size)
            }
            _ => Self::trails(config.particle_count),
        }
    }

    /// Record particle `id`'s latest sample, replacing the previous one.
    ///
    /// `cell` is the particle's own record of the grid cell it occupies; it
    /// is updated in place when the particle changes cells. Non-finite
    /// samples are rejected and leave the field untouched.
    pub fn publish(
        &self,
        id: usize,
        sample: &ParticleSample,
        cell: &mut Option<usize>,
    ) -> Result<(), FieldError> {
        if !sample.is_finite() {
            return Err(FieldError::NonFinite { id });
        }

        {
            let mut samples = self.samples.write();
            let len = samples.len();
            let slot = samples
                .get_mut(id)
                .ok_or(FieldError::UnknownParticle { id, len })?;
            *slot = Some(*sample);
        }

        if let Some(grid) = &self.grid {
            let mut grid = grid.lock();
            let next = grid.cell_of(sample.position);
            if *cell != Some(next) {
                if let Some(prev) = *cell {
                    grid.clear(prev);
                }
                grid.set(next, sample.color);
                *cell = Some(next);
            }
        }

        Ok(())
    }

    /// Every published sample, ordered by particle id.
    pub fn snapshot(&self) -> Vec<ParticleSample> {
        self.samples.read().iter().flatten().copied().collect()
    }

    pub fn grid_snapshot(&self) -> Option<OccupancyGrid> {
        self.grid.as_ref().map(|grid| grid.lock().clone())
    }
}
