pub mod timer;

use std::collections::VecDeque;

use winit::window::Window;

use self::timer::SystemPhase;
use crate::heat::DiffusionFilter;
use crate::render::GpuState;
use crate::sim::SimStats;
use crate::spark::SparkKind;

/// Number of frame times to keep in the histogram.
const FRAME_HISTORY_LEN: usize = 300;
/// Seconds between FPS log lines.
const LOG_INTERVAL: f64 = 5.0;
/// Kinds a brush may place. Helpers only come from blazes.
const BRUSH_KINDS: [SparkKind; 3] = [SparkKind::Blaze, SparkKind::Burn, SparkKind::Sparkle];

/// Debug overlay powered by egui. Replaces the fixed debug text the
/// fire effect used to draw with a live panel.
pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub visible: bool,

    /// Rolling window of frame times (seconds).
    frame_times: VecDeque<f64>,

    /// Computed stats.
    pub fps: f64,
    pub frame_time_avg: f64,
    pub frame_time_min: f64,
    pub frame_time_max: f64,

    /// Smoothed per-phase durations (updated from app each frame).
    pub phase_us: [f64; 5],

    /// Simulation info (updated from app each frame).
    pub sim_stats: SimStats,
    pub spark_capacity: usize,

    /// UI controls.
    pub paused: bool,
    pub clear_requested: bool,
    pub brush: SparkKind,
    pub filter: DiffusionFilter,

    // Periodic log accumulator.
    frame_count: u64,
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

impl DebugOverlay {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            visible: false,
            frame_times: VecDeque::with_capacity(FRAME_HISTORY_LEN),
            fps: 0.0,
            frame_time_avg: 0.0,
            frame_time_min: 0.0,
            frame_time_max: 0.0,
            phase_us: [0.0; 5],
            sim_stats: SimStats::default(),
            spark_capacity: 0,
            paused: false,
            clear_requested: false,
            brush: SparkKind::Blaze,
            filter: DiffusionFilter::WithSelf,
            frame_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Record a frame time, update rolling stats, and periodically log.
    pub fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        if self.frame_times.len() == FRAME_HISTORY_LEN {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);

        let len = self.frame_times.len();
        let (sum, min, max) = self
            .frame_times
            .iter()
            .fold((0.0, f64::MAX, 0.0f64), |(s, lo, hi), &t| (s + t, lo.min(t), hi.max(t)));
        self.frame_time_avg = sum / len as f64;
        self.frame_time_min = min;
        self.frame_time_max = max;
        self.fps = if self.frame_time_avg > 0.0 {
            1.0 / self.frame_time_avg
        } else {
            0.0
        };

        self.log_frame_count += 1;
        self.log_frame_sum += dt;
        self.log_frame_min = self.log_frame_min.min(dt);
        self.log_frame_max = self.log_frame_max.max(dt);
        self.log_timer += dt;

        if self.log_timer >= LOG_INTERVAL {
            let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
            let fps = self.log_frame_count as f64 / self.log_timer;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | sparks: {} | frames: {}",
                fps,
                avg_ms,
                self.log_frame_min * 1000.0,
                self.log_frame_max * 1000.0,
                self.sim_stats.sparks,
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frame_count = 0;
            self.log_frame_sum = 0.0;
            self.log_frame_min = f64::MAX;
            self.log_frame_max = 0.0;
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay {}", if self.visible { "shown" } else { "hidden" });
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        self.visible && response.consumed
    }

    /// Run the egui frame and produce paint output.
    /// Returns (clipped_primitives, textures_delta, screen_descriptor).
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        // Snapshot read-only state so the UI closure does not borrow self.
        let ui_state = UiSnapshot {
            visible: self.visible,
            fps: self.fps,
            frame_time_avg: self.frame_time_avg,
            frame_time_min: self.frame_time_min,
            frame_time_max: self.frame_time_max,
            frame_times: self.frame_times.iter().copied().collect(),
            system_durations: self.phase_us,
            stats: self.sim_stats,
            spark_capacity: self.spark_capacity,
        };

        let mut controls = Controls {
            paused: self.paused,
            clear: false,
            brush: self.brush,
            filter: self.filter,
        };

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_ui(ctx, &ui_state, &mut controls);
        });

        self.paused = controls.paused;
        self.clear_requested |= controls.clear;
        self.brush = controls.brush;
        self.filter = controls.filter;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor)
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    /// Render egui into the given render pass.
    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// UI snapshot + free-function draw (avoids borrow conflicts with egui_ctx)
// ---------------------------------------------------------------------------

struct UiSnapshot {
    visible: bool,
    fps: f64,
    frame_time_avg: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frame_times: Vec<f64>,
    system_durations: [f64; 5],
    stats: SimStats,
    spark_capacity: usize,
}

struct Controls {
    paused: bool,
    clear: bool,
    brush: SparkKind,
    filter: DiffusionFilter,
}

/// Frame budget the histogram marks (the 30ms tick).
const FRAME_BUDGET: f64 = 0.030;

fn draw_ui(ctx: &egui::Context, s: &UiSnapshot, c: &mut Controls) {
    if !s.visible {
        return;
    }

    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Fire Demo")
        .default_pos([10.0, 10.0])
        .default_width(300.0)
        .resizable(true)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max",
                s.frame_time_avg * 1000.0,
                s.frame_time_min * 1000.0,
                s.frame_time_max * 1000.0,
            ));
            ui.add_space(4.0);

            if !s.frame_times.is_empty() {
                let max_time = s
                    .frame_times
                    .iter()
                    .copied()
                    .fold(0.0f64, f64::max)
                    .max(FRAME_BUDGET * 1.5);

                let (response, painter) =
                    ui.allocate_painter(egui::vec2(280.0, 50.0), egui::Sense::hover());
                let rect = response.rect;
                let bar_width = rect.width() / s.frame_times.len() as f32;
                let budget_y = rect.bottom() - (FRAME_BUDGET / max_time) as f32 * rect.height();

                for (i, &t) in s.frame_times.iter().enumerate() {
                    let h = (t / max_time) as f32 * rect.height();
                    let x = rect.left() + i as f32 * bar_width;
                    let color = if t > FRAME_BUDGET * 1.2 {
                        egui::Color32::from_rgb(255, 100, 80)
                    } else {
                        egui::Color32::from_rgb(255, 170, 60)
                    };
                    painter.rect_filled(
                        egui::Rect::from_min_max(
                            egui::pos2(x, rect.bottom() - h),
                            egui::pos2(x + bar_width, rect.bottom()),
                        ),
                        0.0,
                        color,
                    );
                }

                painter.line_segment(
                    [
                        egui::pos2(rect.left(), budget_y),
                        egui::pos2(rect.right(), budget_y),
                    ],
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 255, 100)),
                );
            }
            ui.add_space(4.0);

            ui.heading("Phases");
            let total: f64 = s.system_durations.iter().sum::<f64>().max(1.0);
            for phase in SystemPhase::ALL {
                let us = s.system_durations[phase as usize];
                ui.label(
                    egui::RichText::new(format!(
                        "{:<10} {:>6.0}us ({:>2.0}%)",
                        phase.label(),
                        us,
                        us / total * 100.0
                    ))
                    .monospace(),
                );
            }
            ui.add_space(4.0);

            ui.heading("Simulation");
            ui.label(format!(
                "Sparks: {} / {}  (ticks: {})",
                s.stats.sparks, s.spark_capacity, s.stats.ticks
            ));
            for (kind, count) in SparkKind::ALL.iter().zip(s.stats.per_kind) {
                ui.label(format!("  {:<13} {}", kind.label(), count));
            }
            ui.label(format!("Total heat: {}", s.stats.total_heat));
            ui.add_space(4.0);

            ui.heading("Controls");
            ui.checkbox(&mut c.paused, "Pause Simulation");
            if ui.button("Clear").clicked() {
                c.clear = true;
            }

            ui.horizontal(|ui| {
                ui.label("Brush:");
                egui::ComboBox::from_id_salt("brush_kind")
                    .selected_text(c.brush.label())
                    .show_ui(ui, |ui| {
                        for kind in BRUSH_KINDS {
                            ui.selectable_value(&mut c.brush, kind, kind.label());
                        }
                    });
            });

            ui.horizontal(|ui| {
                ui.label("Diffusion:");
                egui::ComboBox::from_id_salt("diffusion_filter")
                    .selected_text(c.filter.label())
                    .show_ui(ui, |ui| {
                        for filter in DiffusionFilter::ALL {
                            ui.selectable_value(&mut c.filter, filter, filter.label());
                        }
                    });
            });
            ui.add_space(4.0);

            ui.label("LMB: ignite + spawn | RMB drag: erase sparks");
            ui.label("F12: Toggle | ESC: Quit");
        });
}
