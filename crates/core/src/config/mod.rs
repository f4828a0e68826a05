use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{engine::TrackRole, CueVizError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub layout: LayoutConfig,
    pub placement: PlacementConfig,
    pub shapes: ShapeConfig,
    /// Which timeline track feeds which cue handler.
    pub tracks: Vec<TrackBinding>,
    /// Fixed seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            layout: LayoutConfig::default(),
            placement: PlacementConfig::default(),
            shapes: ShapeConfig::default(),
            tracks: vec![
                TrackBinding::new(0, TrackRole::Persistent),
                TrackBinding::new(1, TrackRole::Bubbles),
                TrackBinding::new(2, TrackRole::BubbleOpacity).poly(),
            ],
            seed: None,
        }
    }
}

impl AppConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timing.bpm > 0.0) {
            return Err(CueVizError::invalid_config("timing.bpm must be positive"));
        }
        if self.timing.ppq == 0 {
            return Err(CueVizError::invalid_config("timing.ppq must be positive"));
        }
        if self.placement.max_attempts == 0 {
            return Err(CueVizError::invalid_config(
                "placement.max_attempts must be at least 1",
            ));
        }
        if !(0.0..0.5).contains(&self.placement.inset) {
            return Err(CueVizError::invalid_config(
                "placement.inset must lie in [0, 0.5)",
            ));
        }
        if self.shapes.bubble_count.min == 0
            || self.shapes.bubble_count.min > self.shapes.bubble_count.max
        {
            return Err(CueVizError::invalid_config(
                "shapes.bubble_count must be a non-empty range starting at 1 or more",
            ));
        }
        if !(self.shapes.bubble_size.min > 0.0)
            || self.shapes.bubble_size.min >= self.shapes.bubble_size.max
        {
            return Err(CueVizError::invalid_config(
                "shapes.bubble_size must be a positive, non-empty range",
            ));
        }
        if !(self.shapes.bubble_decrement > 0.0) {
            return Err(CueVizError::invalid_config(
                "shapes.bubble_decrement must be positive",
            ));
        }
        if !(self.shapes.ring_step > 0.0) {
            return Err(CueVizError::invalid_config("shapes.ring_step must be positive"));
        }
        Ok(())
    }
}

/// Musical timing constants used to turn ticks into milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub bpm: f64,
    /// Ticks per quarter note.
    pub ppq: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            bpm: 104.0,
            ppq: 15_360,
        }
    }
}

impl TimingConfig {
    /// Shortest duration handed to a growing shape.
    pub const MIN_DURATION_MS: f64 = 1.0;

    /// Straight tick-to-millisecond conversion, `(ticks / PPQ) * (60000 / BPM)`.
    pub fn ticks_to_ms(&self, ticks: i64) -> f64 {
        (ticks as f64 / self.ppq as f64) * (60_000.0 / self.bpm)
    }

    /// Note duration as used by the animation: never below one millisecond.
    pub fn duration_ms(&self, duration_ticks: i64) -> f64 {
        self.ticks_to_ms(duration_ticks).max(Self::MIN_DURATION_MS)
    }

    /// Length of one 4/4 bar.
    pub fn bar_ms(&self) -> f64 {
        (60_000.0 / self.bpm) * 4.0
    }
}

/// How the persistent layer picks positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Complementary position of the cycle's pattern.
    Pattern,
    /// Circle-packing search away from the shapes already on screen.
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pattern names the selector may draw from.
    pub patterns: Vec<String>,
    pub persistent_placement: PlacementMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            patterns: ["grid", "diagonal", "wave", "invertedWave", "corners"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            persistent_placement: PlacementMode::Pattern,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub max_attempts: usize,
    /// Added to every radius before clearances are measured.
    pub safety_margin: f32,
    /// Fraction of the canvas kept free on each side when sampling.
    pub inset: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            safety_margin: 8.0,
            inset: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Size offset between neighbouring glow rings.
    pub ring_step: f32,
    /// Number of bubbles spawned per bubble cue (inclusive).
    pub bubble_count: CountRange,
    pub bubble_size: SizeRange,
    /// Size lost by a bubble on each update.
    pub bubble_decrement: f32,
    /// Maximum per-axis drift of a bubble on each update.
    pub bubble_jitter: f32,
    pub bubble_nested_layers: u32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            ring_step: 16.0,
            bubble_count: CountRange { min: 2, max: 8 },
            bubble_size: SizeRange {
                min: 16.0,
                max: 64.0,
            },
            bubble_decrement: 0.25,
            bubble_jitter: 20.0,
            bubble_nested_layers: 2,
        }
    }
}

/// Routes the cues of one timeline track to a handler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackBinding {
    pub track: usize,
    pub role: TrackRole,
    /// Give every event its own cue, even when several share a tick.
    #[serde(default)]
    pub poly: bool,
}

impl TrackBinding {
    pub fn new(track: usize, role: TrackRole) -> Self {
        Self {
            track,
            role,
            poly: false,
        }
    }

    pub fn poly(mut self) -> Self {
        self.poly = true;
        self
    }
}
