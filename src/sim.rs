use glam::Vec2;

use crate::config::FireConfig;
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::heat::{DiffusionFilter, HeatField};
use crate::input::{InputCommand, InputMapper, PointerButton};
use crate::palette::{Color, HeatResponse, Palette};
use crate::rng::{ByteSource, RandomSource};
use crate::spark::{SparkKind, SparkPool};

/// Snapshot of simulation counters for the debug overlay and logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStats {
    pub ticks: u64,
    pub sparks: usize,
    /// Indexed like `SparkKind::ALL`.
    pub per_kind: [usize; 4],
    pub total_heat: u64,
}

/// The whole fire simulation: heat field, sparks, lookup tables and the frame
/// they render into. The host drives it through the `on_*` calls.
pub struct FireSim<R = RandomSource> {
    field: HeatField,
    sparks: SparkPool,
    palette: Palette,
    response: HeatResponse,
    frame: Vec<Color>,
    rng: R,
    input: InputMapper,
    /// Reused between input events.
    commands: Vec<InputCommand>,
    filter: DiffusionFilter,
    paused: bool,
    ticks: u64,
}

impl FireSim<RandomSource> {
    pub fn new(config: &FireConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => RandomSource::with_seed(seed),
            None => RandomSource::new(),
        };
        Self::with_source(config, rng)
    }
}

impl<R: ByteSource> FireSim<R> {
    pub fn with_source(config: &FireConfig, rng: R) -> Self {
        let (w, h) = (config.grid_width, config.grid_height);
        Self {
            field: HeatField::new(w, h),
            sparks: SparkPool::with_capacity(config.max_sparks),
            palette: Palette::build(),
            response: HeatResponse::build(config.conductivity),
            frame: vec![Color::BLACK; (w * h) as usize],
            rng,
            input: InputMapper::new(w, h),
            commands: Vec::with_capacity(4),
            filter: config.filter,
            paused: false,
            ticks: 0,
        }
    }

    /// Called once by the host before the first tick.
    pub fn on_init(&mut self) {
        self.clear();
        self.ticks = 0;
        log::info!(
            "Fire sim ready: {}x{} grid, {} spark slots, filter={}, conductivity={}",
            self.field.width(),
            self.field.height(),
            self.sparks.capacity(),
            self.filter.label(),
            self.response.conductivity(),
        );
    }

    pub fn on_pointer_move(&mut self, button: PointerButton, x: f32, y: f32) {
        let mut cmds = std::mem::take(&mut self.commands);
        self.input.pointer_move(button, Vec2::new(x, y), &mut cmds);
        self.apply(&mut cmds);
        self.commands = cmds;
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        let mut cmds = std::mem::take(&mut self.commands);
        self.input.pointer_down(button, Vec2::new(x, y), &mut cmds);
        self.apply(&mut cmds);
        self.commands = cmds;
    }

    /// Reserved for keyboard-driven behavior; ignores every key for now.
    pub fn on_key_down(&mut self, _key_code: u32) {}

    /// Advance one frame: sparks, then diffusion, then palette lookup.
    /// Returns the finished frame, `width * height` pixels, top row first.
    pub fn on_tick(&mut self, timers: &mut SystemTimers) -> &[Color] {
        if self.paused {
            return &self.frame;
        }

        timers.measure(SystemPhase::Sparks, || {
            self.sparks.update(&mut self.field, &mut self.rng)
        });
        timers.measure(SystemPhase::Diffusion, || {
            self.field.diffuse(&self.response, self.filter)
        });
        timers.measure(SystemPhase::Palette, || {
            for (px, &heat) in self.frame.iter_mut().zip(self.field.cells()) {
                *px = self.palette.color(heat);
            }
        });

        self.ticks += 1;
        &self.frame
    }

    fn apply(&mut self, cmds: &mut Vec<InputCommand>) {
        for cmd in cmds.drain(..) {
            log::debug!("input: {cmd:?}");
            match cmd {
                InputCommand::Ignite { x, y, heat } => self.field.ignite(x, y, heat),
                InputCommand::Spawn { kind, x, y } => {
                    self.sparks.spawn_kind(kind, x, y, &mut self.rng);
                }
                InputCommand::RemoveNear { x, y } => {
                    self.sparks.remove_near(x, y);
                }
            }
        }
    }

    /// Host window client-area size, used to scale pointer coordinates.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.input.set_window_size(width as f32, height as f32);
    }

    /// Drop every spark and cool the field to zero.
    pub fn clear(&mut self) {
        self.sparks.clear();
        self.field.clear();
        self.frame.fill(Color::BLACK);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_filter(&mut self, filter: DiffusionFilter) {
        if filter != self.filter {
            log::info!("Diffusion filter: {}", filter.label());
            self.filter = filter;
        }
    }

    pub fn filter(&self) -> DiffusionFilter {
        self.filter
    }

    pub fn set_brush(&mut self, kind: SparkKind) {
        self.input.brush = kind;
    }

    pub fn brush(&self) -> SparkKind {
        self.input.brush
    }

    pub fn frame(&self) -> &[Color] {
        &self.frame
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.field.width(), self.field.height())
    }

    #[cfg(test)]
    pub fn field(&self) -> &HeatField {
        &self.field
    }

    pub fn sparks(&self) -> &SparkPool {
        &self.sparks
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            ticks: self.ticks,
            sparks: self.sparks.len(),
            per_kind: SparkKind::ALL.map(|k| self.sparks.count_of(k)),
            total_heat: self.field.total_heat(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::tests::Scripted;

    fn sim(script: &[u8]) -> FireSim<Scripted> {
        let mut s = FireSim::with_source(&FireConfig::default(), Scripted::new(script));
        s.on_init();
        s.set_window_size(256, 256);
        s
    }

    #[test]
    fn blaze_tick_spawns_helper_on_low_roll() {
        let mut s = sim(&[0, 200, 50]);
        s.on_pointer_down(PointerButton::Primary, 128.0, 128.0);
        assert_eq!(s.stats().sparks, 1);

        let mut timers = SystemTimers::new();
        s.on_tick(&mut timers);
        assert_eq!(s.stats().sparks, 2);
        assert_eq!(s.stats().per_kind, [0, 0, 1, 1]);
        // The blaze never heats its own cell.
        assert_eq!(s.field().get(128, 128), 0);
        assert_eq!(s.stats().total_heat, 0);
    }

    #[test]
    fn blaze_tick_skips_on_high_roll() {
        let mut s = sim(&[200]);
        s.on_pointer_down(PointerButton::Primary, 128.0, 128.0);
        s.on_tick(&mut SystemTimers::new());
        assert_eq!(s.stats().sparks, 1);
        assert_eq!(s.field().get(128, 128), 0);
    }

    #[test]
    fn helpers_heat_the_frame_and_stay_on_grid() {
        let mut cfg = FireConfig::default();
        cfg.seed = Some(5);
        let mut s = FireSim::new(&cfg);
        s.on_init();
        s.set_window_size(256, 256);
        s.on_pointer_down(PointerButton::Primary, 128.0, 128.0);

        let mut timers = SystemTimers::new();
        for _ in 0..200 {
            s.on_tick(&mut timers);
            assert!(s.sparks().iter().all(|sp| sp.x < 256 && sp.y < 256));
        }
        assert!(s.stats().per_kind[3] > 0);
        assert!(s.stats().total_heat > 0);
        assert!(s.frame().iter().any(|c| c.r > 0));
        assert_eq!(s.stats().ticks, 200);
    }

    #[test]
    fn drag_injects_heat_that_diffuses_same_tick() {
        let mut s = sim(&[255]);
        s.on_pointer_move(PointerButton::Primary, 10.0, 10.0);
        assert_eq!(s.field().get(10, 10), 255);

        s.on_tick(&mut SystemTimers::new());
        let spread = HeatResponse::build(1.0).lookup(255);
        assert_eq!(s.field().get(10, 10), spread);
        assert_eq!(s.field().get(11, 10), spread);
        // The frame shows post-diffusion heat.
        let idx = s.field().index(10, 10);
        assert_eq!(s.frame()[idx], Palette::build().color(spread));
    }

    #[test]
    fn secondary_drag_removes_nearby_sparks() {
        let mut s = sim(&[255]);
        s.on_pointer_down(PointerButton::Primary, 50.0, 50.0);
        s.on_pointer_down(PointerButton::Primary, 55.0, 55.0);
        s.on_pointer_down(PointerButton::Primary, 200.0, 200.0);
        assert_eq!(s.stats().sparks, 3);

        s.on_pointer_move(PointerButton::Secondary, 52.0, 52.0);
        assert_eq!(s.stats().sparks, 1);
    }

    #[test]
    fn pool_full_spawn_is_silent() {
        let mut cfg = FireConfig::default();
        cfg.max_sparks = 1;
        let mut s = FireSim::with_source(&cfg, Scripted::new(&[0]));
        s.set_window_size(256, 256);
        s.on_pointer_down(PointerButton::Primary, 1.0, 1.0);
        s.on_pointer_down(PointerButton::Primary, 2.0, 2.0);
        assert_eq!(s.stats().sparks, 1);
        s.on_tick(&mut SystemTimers::new());
        assert_eq!(s.stats().sparks, 1);
    }

    #[test]
    fn paused_sim_keeps_its_frame() {
        let mut s = sim(&[255]);
        s.on_pointer_move(PointerButton::Primary, 10.0, 10.0);
        s.on_tick(&mut SystemTimers::new());
        let before = s.frame().to_vec();

        s.set_paused(true);
        s.on_pointer_move(PointerButton::Primary, 100.0, 100.0);
        s.on_tick(&mut SystemTimers::new());
        assert_eq!(s.frame(), &before[..]);
        assert_eq!(s.stats().ticks, 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = sim(&[0]);
        s.on_pointer_move(PointerButton::Primary, 10.0, 10.0);
        s.on_tick(&mut SystemTimers::new());
        s.clear();
        assert_eq!(s.stats().sparks, 0);
        assert_eq!(s.stats().total_heat, 0);
        assert!(s.frame().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn init_wipes_a_running_sim() {
        let mut s = sim(&[0, 200, 50]);
        s.on_pointer_move(PointerButton::Primary, 10.0, 10.0);
        s.on_pointer_down(PointerButton::Primary, 128.0, 128.0);
        s.on_tick(&mut SystemTimers::new());
        assert!(s.stats().sparks > 0);
        assert!(s.stats().total_heat > 0);

        s.on_init();
        let stats = s.stats();
        assert_eq!(stats.sparks, 0);
        assert_eq!(stats.total_heat, 0);
        assert_eq!(stats.ticks, 0);
        assert!(s.frame().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn key_down_is_a_no_op() {
        let mut s = sim(&[0]);
        s.on_key_down(0x20);
        assert_eq!(s.stats().sparks, 0);
        assert_eq!(s.stats().total_heat, 0);
    }
}
