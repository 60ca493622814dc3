use std::sync::Arc;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::FireConfig;
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::debug::DebugOverlay;
use crate::input::PointerButton;
use crate::render::GpuState;
use crate::sim::FireSim;

// ---------------------------------------------------------------------------
// Pointer tracking
// ---------------------------------------------------------------------------

/// Raw button/cursor state between winit events.
#[derive(Default)]
struct PointerState {
    /// Last reported cursor position, whole window pixels.
    pos: Option<(i32, i32)>,
    left_down: bool,
    right_down: bool,
}

impl PointerState {
    /// Held button for move events. Primary wins when both are down.
    fn held(&self) -> PointerButton {
        if self.left_down {
            PointerButton::Primary
        } else if self.right_down {
            PointerButton::Secondary
        } else {
            PointerButton::None
        }
    }

    /// Store a new position. False when it repeats the last one.
    fn moved_to(&mut self, x: i32, y: i32) -> bool {
        if self.pos == Some((x, y)) {
            return false;
        }
        self.pos = Some((x, y));
        true
    }

    /// Record a button edge. Returns the matching pointer button, or None for
    /// buttons the fire does not use.
    fn set_button(&mut self, button: MouseButton, pressed: bool) -> Option<PointerButton> {
        match button {
            MouseButton::Left => {
                self.left_down = pressed;
                Some(PointerButton::Primary)
            }
            MouseButton::Right => {
                self.right_down = pressed;
                Some(PointerButton::Secondary)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    config: FireConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<DebugOverlay>,

    sim: FireSim,
    timers: SystemTimers,
    pointer: PointerState,

    // Timer
    next_tick: Instant,
    last_tick: Option<Instant>,

    // Screen dimensions
    screen_w: u32,
    screen_h: u32,

    /// Setup failure reported back out of `run()`.
    fatal: Option<String>,
}

impl App {
    fn new(config: FireConfig) -> Self {
        let sim = FireSim::new(&config);
        Self {
            config,
            window: None,
            gpu: None,
            overlay: None,
            sim,
            timers: SystemTimers::new(),
            pointer: PointerState::default(),
            next_tick: Instant::now(),
            last_tick: None,
            screen_w: 0,
            screen_h: 0,
            fatal: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attrs = WindowAttributes::default()
            .with_title(self.config.window_title)
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        self.screen_w = size.width;
        self.screen_h = size.height;
        log::info!("Window created: {}x{}", size.width, size.height);

        let (grid_w, grid_h) = self.sim.grid_size();
        let gpu = GpuState::new(window.clone(), grid_w, grid_h)?;
        log::info!("wgpu + frame pipeline initialized");

        let mut overlay = DebugOverlay::new(&window, &gpu);
        overlay.filter = self.sim.filter();
        overlay.brush = self.sim.brush();
        overlay.spark_capacity = self.sim.sparks().capacity();

        self.sim.set_window_size(size.width, size.height);
        self.sim.on_init();

        self.gpu = Some(gpu);
        self.overlay = Some(overlay);
        self.window = Some(window);
        Ok(())
    }

    /// Push overlay control changes into the simulation.
    fn sync_overlay_controls(&mut self) {
        let Some(overlay) = &mut self.overlay else {
            return;
        };
        self.sim.set_paused(overlay.paused);
        self.sim.set_filter(overlay.filter);
        self.sim.set_brush(overlay.brush);
        if std::mem::take(&mut overlay.clear_requested) {
            log::info!("Clearing heat field and sparks");
            self.sim.clear();
        }
    }

    /// One timer period: step the simulation and upload its frame.
    fn tick(&mut self, now: Instant) {
        self.sync_overlay_controls();

        self.sim.on_tick(&mut self.timers);
        let frame = self.sim.frame();
        if let Some(gpu) = &self.gpu {
            self.timers
                .measure(SystemPhase::Upload, || gpu.update_frame(frame));
        }

        if let Some(overlay) = &mut self.overlay {
            if let Some(last) = self.last_tick {
                overlay.record_frame(now.duration_since(last).as_secs_f64());
            }
            overlay.sim_stats = self.sim.stats();
            overlay.phase_us = SystemPhase::ALL.map(|p| self.timers.get_us(p));
        }
        self.last_tick = Some(now);

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn render(&mut self) {
        let (Some(gpu), Some(window)) = (&self.gpu, &self.window) else {
            return;
        };
        let Some(mut frame) = gpu.begin_frame() else {
            return;
        };
        let (screen_w, screen_h) = (self.screen_w, self.screen_h);
        let overlay = &mut self.overlay;

        self.timers.measure(SystemPhase::Render, || {
            gpu.draw_frame(&mut frame.encoder, &frame.view);

            let mut extra_cmd_bufs = Vec::new();
            if let Some(overlay) = overlay {
                let (primitives, textures_delta, screen) =
                    overlay.run_frame(window, screen_w, screen_h);
                if overlay.visible {
                    extra_cmd_bufs = overlay.prepare_egui(
                        &gpu.device,
                        &gpu.queue,
                        &mut frame.encoder,
                        &primitives,
                        &textures_delta,
                        &screen,
                    );
                    let mut pass = GpuState::begin_egui_pass(&mut frame.encoder, &frame.view);
                    overlay.render_egui(&mut pass, &primitives, &screen);
                }
                overlay.free_textures(&textures_delta);
            }

            gpu.finish_frame(frame.encoder, frame.output, extra_cmd_bufs);
        });
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => {
                log::info!("ESC pressed, exiting");
                event_loop.exit();
            }
            Key::Named(NamedKey::F12) => {
                if let Some(overlay) = &mut self.overlay {
                    overlay.toggle();
                }
            }
            Key::Character(s) => {
                if let Some(c) = s.chars().next() {
                    self.sim.on_key_down(c as u32);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            log::error!("Window setup failed: {e}");
            self.fatal = Some(e.to_string());
            event_loop.exit();
            return;
        }
        self.next_tick = Instant::now() + self.config.tick_period;
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            return;
        }

        let now = Instant::now();
        if now >= self.next_tick {
            self.tick(now);
            self.next_tick += self.config.tick_period;
            // Fell behind (window drag, breakpoint): skip ahead instead of bursting.
            if self.next_tick <= now {
                self.next_tick = now + self.config.tick_period;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Pointer bookkeeping below still runs for events egui takes, so a
        // release over the overlay cannot leave a button stuck down.
        let consumed = match (&mut self.overlay, &self.window) {
            (Some(overlay), Some(window)) => overlay.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                self.screen_w = new_size.width;
                self.screen_h = new_size.height;
                self.sim.set_window_size(new_size.width, new_size.height);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as i32, position.y as i32);
                if self.pointer.moved_to(x, y) && !consumed {
                    self.sim
                        .on_pointer_move(self.pointer.held(), x as f32, y as f32);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                let Some(which) = self.pointer.set_button(button, pressed) else {
                    return;
                };
                if consumed {
                    return;
                }
                if let (true, Some((x, y))) = (pressed, self.pointer.pos) {
                    self.sim.on_pointer_down(which, x as f32, y as f32);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.render(),
            _ => {}
        }
    }
}

/// Entry point: create the event loop and run.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FireConfig::from_env();
    if let Some(seed) = config.seed {
        log::info!("Using fixed seed {seed}");
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_wins_when_both_held() {
        let mut p = PointerState::default();
        assert_eq!(p.held(), PointerButton::None);
        p.right_down = true;
        assert_eq!(p.held(), PointerButton::Secondary);
        p.left_down = true;
        assert_eq!(p.held(), PointerButton::Primary);
    }

    #[test]
    fn repeated_positions_are_dropped() {
        let mut p = PointerState::default();
        assert!(p.moved_to(3, 4));
        assert!(!p.moved_to(3, 4));
        assert!(p.moved_to(4, 4));
    }

    #[test]
    fn release_over_overlay_still_lifts_button() {
        let mut p = PointerState::default();
        p.moved_to(100, 100);
        assert_eq!(p.set_button(MouseButton::Left, true), Some(PointerButton::Primary));
        assert_eq!(p.held(), PointerButton::Primary);

        // egui takes the release; the bookkeeping still sees it.
        p.moved_to(500, 20);
        p.set_button(MouseButton::Left, false);
        assert_eq!(p.held(), PointerButton::None);
        assert_eq!(p.pos, Some((500, 20)));
    }

    #[test]
    fn unused_buttons_are_ignored() {
        let mut p = PointerState::default();
        assert_eq!(p.set_button(MouseButton::Middle, true), None);
        assert_eq!(p.held(), PointerButton::None);
        assert_eq!(p.set_button(MouseButton::Right, true), Some(PointerButton::Secondary));
        p.set_button(MouseButton::Right, false);
        assert_eq!(p.held(), PointerButton::None);
    }
}
