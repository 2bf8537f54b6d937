//! Headless runner: drives the target around an orbit in place of mouse
//! input and logs what the renderer would see.
//!
//! Run with: cargo run --features cli --bin particles -- [config.json] [seconds]

use std::ops::ControlFlow;

use swarm_field::{SimConfig, Simulation};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const ORBIT_RADIUS: f32 = 150.0;
const ORBIT_SPEED: f32 = 0.8;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,swarm_field=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig::default(),
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5.0);

    let fps = config.fps;
    let center = (config.width * 0.5, config.height * 0.5);
    let handle = Simulation::start(config)?;

    handle.render_loop(|frame| {
        let t = frame.index as f32 / fps as f32;
        if t >= seconds {
            return ControlFlow::Break(());
        }

        let angle = t * ORBIT_SPEED * std::f32::consts::TAU;
        let _ = handle.set_target(
            center.0 + ORBIT_RADIUS * angle.cos(),
            center.1 + ORBIT_RADIUS * angle.sin(),
        );

        if frame.index % fps as u64 == 0 {
            let target = handle.target();
            let spread = frame
                .samples
                .iter()
                .map(|s| swarm_field::vector::distance(s.position, target))
                .fold(0.0f32, f32::max);
            let occupied = frame.grid.as_ref().map(|g| g.occupied().count());

            info!(
                frame = frame.index,
                tick = frame.tick,
                particles = frame.samples.len(),
                spread = format!("{spread:.2}"),
                occupied_cells = ?occupied,
                "frame"
            );
        }

        ControlFlow::Continue(())
    });

    let stats = handle.stop()?;
    info!(
        ticks = stats.ticks,
        dropped = stats.dropped_samples,
        tick_rate = format!("{:.1}", stats.tick_rate()),
        "done"
    );
    Ok(())
}
