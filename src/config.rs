use std::time::Duration;

use crate::heat::DiffusionFilter;
use crate::spark::MAX_SPARKS;

/// Env var that pins the random seed, e.g. `FIREDEMO_SEED=42`.
const SEED_ENV: &str = "FIREDEMO_SEED";

/// Everything tunable about a run. Grid dimensions must be powers of two.
#[derive(Debug, Clone)]
pub struct FireConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub max_sparks: usize,
    /// Passed to the heat-response table; currently has no visible effect.
    pub conductivity: f32,
    /// None seeds from the OS.
    pub seed: Option<u64>,
    pub filter: DiffusionFilter,
    /// Simulation timer period.
    pub tick_period: Duration,
    pub window_title: &'static str,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            grid_width: 256,
            grid_height: 256,
            max_sparks: MAX_SPARKS,
            conductivity: 1.0,
            seed: None,
            filter: DiffusionFilter::WithSelf,
            tick_period: Duration::from_millis(30),
            window_title: "Fire Demo",
            window_width: 600,
            window_height: 600,
        }
    }
}

impl FireConfig {
    /// Defaults, plus a seed from `FIREDEMO_SEED` when it parses.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(SEED_ENV) {
            cfg.seed = parse_seed(&raw);
        }
        cfg
    }
}

/// Parse a seed value, warning (and returning None) when it is not a u64.
fn parse_seed(raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(e) => {
            log::warn!("ignoring {SEED_ENV}={raw:?}: {e}");
            None
        }
    }
}
