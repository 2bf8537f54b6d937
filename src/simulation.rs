//! Run orchestration: one scheduler thread stepping the swarm on a bounded
//! rayon pool, and a [`RunHandle`] for the input and render side.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use cgmath::Vector2;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::clock::Ticker;
use crate::config::{SimConfig, TickPolicy};
use crate::context::{CancelToken, SimContext};
use crate::error::{FieldError, SimError};
use crate::field::OccupancyGrid;
use crate::particle::ParticleSample;
use crate::swarm::Swarm;

/// Ticks between periodic debug logs.
const STATS_INTERVAL: u64 = 1000;

/// Poll interval of a paused scheduler.
const PAUSED_POLL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub ticks: u64,
    pub dropped_samples: u64,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn tick_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 { 0.0 } else { self.ticks as f64 / secs }
    }
}

/// One frame's consistent-enough read of the field.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    /// Scheduler tick count when the frame was read.
    pub tick: u64,
    pub samples: Vec<ParticleSample>,
    pub grid: Option<OccupancyGrid>,
}

pub struct Simulation;

impl Simulation {
    /// Spawn the swarm at the configured spawn point and start stepping it.
    pub fn start(config: SimConfig) -> Result<RunHandle, SimError> {
        let swarm = Swarm::new(&config)?;
        let context = Arc::clone(swarm.context());

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("swarm-worker-{i}"))
            .build()?;

        info!(
            particles = config.particle_count,
            workers = pool.current_num_threads(),
            layout = ?config.layout,
            tick = ?config.tick,
            "starting simulation"
        );

        let tick = config.tick;
        let scheduler = std::thread::Builder::new()
            .name("swarm-scheduler".into())
            .spawn(move || run_scheduler(swarm, pool, tick))?;

        Ok(RunHandle {
            context,
            scheduler: Some(scheduler),
            frame_period: config.frame_period(),
        })
    }
}

fn run_scheduler(mut swarm: Swarm, pool: ThreadPool, tick: TickPolicy) -> RunStats {
    let context = Arc::clone(swarm.context());
    let mut ticker = Ticker::new(tick.period());
    let started = Instant::now();

    while ticker.wait(&context.cancel) {
        let Some(_gate) = context.enter_tick() else {
            context.cancel.sleep(PAUSED_POLL);
            continue;
        };

        pool.install(|| swarm.step());

        let ticks = context.ticks();
        if ticks % STATS_INTERVAL == 0 {
            debug!(
                ticks,
                dropped = context.dropped_samples(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scheduler"
            );
        }
    }

    let stats = RunStats {
        ticks: context.ticks(),
        dropped_samples: context.dropped_samples(),
        elapsed: started.elapsed(),
    };
    info!(
        ticks = stats.ticks,
        dropped = stats.dropped_samples,
        tick_rate = format!("{:.1}", stats.tick_rate()),
        "scheduler stopped"
    );
    stats
}

/// Control surface of a running simulation.
///
/// Dropping the handle shuts the run down and waits for the scheduler.
pub struct RunHandle {
    context: Arc<SimContext>,
    scheduler: Option<JoinHandle<RunStats>>,
    frame_period: Duration,
}

impl RunHandle {
    pub fn set_target(&self, x: f32, y: f32) -> Result<(), FieldError> {
        self.context.target.store(x, y)
    }

    pub fn target(&self) -> Vector2<f32> {
        self.context.target.load()
    }

    pub fn snapshot(&self) -> Vec<ParticleSample> {
        self.context.field.snapshot()
    }

    pub fn grid_snapshot(&self) -> Option<OccupancyGrid> {
        self.context.field.grid_snapshot()
    }

    /// Stop stepping; returns once no tick is in flight.
    pub fn pause(&self) {
        self.context.pause();
    }

    pub fn resume(&self) {
        self.context.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.context.is_paused()
    }

    pub fn ticks(&self) -> u64 {
        self.context.ticks()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.context.cancel.clone()
    }

    pub fn context(&self) -> &Arc<SimContext> {
        &self.context
    }

    /// Signal every worker to stop. Does not wait.
    pub fn shutdown(&self) {
        self.context.cancel.cancel();
    }

    /// Wait for the scheduler to exit. Someone must have called
    /// [`RunHandle::shutdown`] (or fired the cancel token) for this to return.
    pub fn join(mut self) -> Result<RunStats, SimError> {
        self.finish()
    }

    pub fn stop(self) -> Result<RunStats, SimError> {
        self.shutdown();
        self.join()
    }

    /// Read the field once per frame at the configured fps until the run is
    /// cancelled or `draw` breaks, which shuts the run down.
    pub fn render_loop<F>(&self, mut draw: F)
    where
        F: FnMut(&Frame) -> ControlFlow<()>,
    {
        let mut ticker = Ticker::new(Some(self.frame_period));
        let mut index = 0;

        while ticker.wait(&self.context.cancel) {
            let frame = Frame {
                index,
                tick: self.ticks(),
                samples: self.snapshot(),
                grid: self.grid_snapshot(),
            };
            index += 1;

            if draw(&frame).is_break() {
                self.shutdown();
                break;
            }
        }
    }

    fn finish(&mut self) -> Result<RunStats, SimError> {
        let scheduler = self.scheduler.take().ok_or(SimError::SchedulerPanicked)?;
        scheduler.join().map_err(|_| SimError::SchedulerPanicked)
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if self.scheduler.is_some() {
            self.shutdown();
            let _ = self.finish();
        }
    }
}
