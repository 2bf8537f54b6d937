//! Interactive viewer. The pointer position sets the target, Escape quits.
//!
//! Run with: cargo run --release --features viewer --bin swarm-viewer -- [config.json]

use std::time::{Duration, Instant};

use eframe::egui;
use swarm_field::{Color, RunHandle, SimConfig, Simulation};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const PANEL_WIDTH: f32 = 180.0;
const TRAIL_WIDTH: f32 = 2.0;
/// Fraction of a cell taken by the border around its inner fill.
const CELL_BORDER: f32 = 0.15;

struct SwarmViewer {
    handle: RunHandle,
    width: f32,
    height: f32,
    frame_period: Duration,
    last_frame_time: Instant,
    last_ticks: u64,
    tick_rate: f32,
}

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

fn darker(c: Color) -> egui::Color32 {
    egui::Color32::from_rgb(c.r / 2, c.g / 2, c.b / 2)
}

impl SwarmViewer {
    fn new(handle: RunHandle, config: &SimConfig) -> Self {
        Self {
            handle,
            width: config.width,
            height: config.height,
            frame_period: config.frame_period(),
            last_frame_time: Instant::now(),
            last_ticks: 0,
            tick_rate: 0.0,
        }
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui, frame_time: f32) {
        ui.label(format!("FPS: {:.1}", 1.0 / frame_time.max(f32::EPSILON)));
        ui.label(format!("Frame Time: {:.3}ms", frame_time * 1000.0));
        ui.label(format!("Tick Rate: {:.0}/s", self.tick_rate));
        ui.label(format!("Ticks: {}", self.handle.ticks()));

        let target = self.handle.target();
        ui.label(format!("Target: ({:.0}, {:.0})", target.x, target.y));

        let dropped = self.handle.context().dropped_samples();
        if dropped > 0 {
            ui.colored_label(egui::Color32::YELLOW, format!("Dropped samples: {dropped}"));
        }

        ui.separator();
        let paused = self.handle.is_paused();
        if ui.button(if paused { "Resume" } else { "Pause" }).clicked() {
            if paused {
                self.handle.resume();
            } else {
                self.handle.pause();
            }
        }
    }
}

impl eframe::App for SwarmViewer {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let current_time = Instant::now();
        let ts = current_time.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = current_time;

        let ticks = self.handle.ticks();
        if ts > 0.0 {
            self.tick_rate = ticks.saturating_sub(self.last_ticks) as f32 / ts;
        }
        self.last_ticks = ticks;

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) || !self.handle.is_running() {
            info!("quit requested");
            self.handle.shutdown();
            frame.close();
            return;
        }

        egui::SidePanel::left("Control Panel")
            .exact_width(PANEL_WIDTH)
            .show(ctx, |ui| self.render_ui_panel(ui, ts));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                let scale = egui::vec2(rect.width() / self.width, rect.height() / self.height);
                let to_screen = |x: f32, y: f32| rect.min + egui::vec2(x * scale.x, y * scale.y);

                if let Some(pointer) = response.hover_pos() {
                    let local = pointer - rect.min;
                    let _ = self.handle.set_target(local.x / scale.x, local.y / scale.y);
                }

                let painter = ui.painter_at(rect);

                if let Some(grid) = self.handle.grid_snapshot() {
                    let cell = grid.cell_size();
                    let size = egui::vec2(cell * scale.x, cell * scale.y);
                    let inset = size.min_elem() * CELL_BORDER;
                    for (col, row, color) in grid.occupied() {
                        let min = to_screen(col as f32 * cell, row as f32 * cell);
                        let outer = egui::Rect::from_min_size(min, size);
                        painter.rect_filled(outer, 0.0, darker(color));
                        painter.rect_filled(outer.shrink(inset), 0.0, color32(color));
                    }
                } else {
                    for sample in self.handle.snapshot() {
                        painter.line_segment(
                            [
                                to_screen(sample.previous_position.x, sample.previous_position.y),
                                to_screen(sample.position.x, sample.position.y),
                            ],
                            egui::Stroke::new(TRAIL_WIDTH, color32(sample.color)),
                        );
                    }
                }

                let target = self.handle.target();
                painter.circle_stroke(
                    to_screen(target.x, target.y),
                    4.0,
                    egui::Stroke::new(1.0, egui::Color32::GRAY),
                );
            });

        ctx.request_repaint_after(self.frame_period);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,swarm_field=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let window_size = egui::vec2(config.width + PANEL_WIDTH, config.height);
    let handle = Simulation::start(config.clone())?;

    eframe::run_native(
        "Particle Swarm",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(window_size),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(SwarmViewer::new(handle, &config))),
    )
    .map_err(|err| format!("viewer failed: {err}"))?;

    Ok(())
}
