use instant::Instant;

/// Which phase of a frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Sparks = 0,
    Diffusion = 1,
    Palette = 2,
    Upload = 3,
    Render = 4,
}

const PHASE_COUNT: usize = 5;

impl SystemPhase {
    pub const ALL: [SystemPhase; PHASE_COUNT] = [
        Self::Sparks,
        Self::Diffusion,
        Self::Palette,
        Self::Upload,
        Self::Render,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sparks => "Sparks",
            Self::Diffusion => "Diffusion",
            Self::Palette => "Palette",
            Self::Upload => "Upload",
            Self::Render => "Render",
        }
    }
}

/// Smoothing factor for the per-phase moving average.
const EMA_ALPHA: f64 = 0.1;

/// Per-phase wall time, smoothed with an exponential moving average.
pub struct SystemTimers {
    /// Smoothed duration in microseconds, indexed by `SystemPhase as usize`.
    durations_us: [f64; PHASE_COUNT],
}

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; PHASE_COUNT],
        }
    }

    /// Run `f`, charging its wall time to `phase`.
    pub fn measure<T>(&mut self, phase: SystemPhase, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(phase, start.elapsed().as_secs_f64() * 1_000_000.0);
        out
    }

    fn record(&mut self, phase: SystemPhase, elapsed_us: f64) {
        let d = &mut self.durations_us[phase as usize];
        *d = *d * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn get_us(&self, phase: SystemPhase) -> f64 {
        self.durations_us[phase as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_returns_closure_value() {
        let mut t = SystemTimers::new();
        assert_eq!(t.measure(SystemPhase::Palette, || 41 + 1), 42);
        assert!(t.get_us(SystemPhase::Palette) >= 0.0);
    }

    #[test]
    fn record_smooths_toward_sample() {
        let mut t = SystemTimers::new();
        t.record(SystemPhase::Sparks, 100.0);
        assert!((t.get_us(SystemPhase::Sparks) - 10.0).abs() < 1e-9);
        t.record(SystemPhase::Sparks, 100.0);
        assert!((t.get_us(SystemPhase::Sparks) - 19.0).abs() < 1e-9);
        assert_eq!(t.get_us(SystemPhase::Render), 0.0);
    }
}
