//! Canvas geometry and the pattern position tables.
//!
//! Every function here is pure apart from the random fallback, which takes
//! its random source as an argument.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::TimingConfig,
    shape::MAX_NESTED_LAYERS,
    pattern::{PatternAssignment, PatternKind},
};

/// Fraction of the canvas left empty on each side by random placement.
pub const RANDOM_INSET: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Size of the drawing area, read from the host whenever a cue fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    /// Uniform point inside the canvas with `inset` of each side left free.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R, inset: f32) -> Point {
        Point::new(
            uniform(rng, self.width * inset, self.width * (1.0 - inset)),
            uniform(rng, self.height * inset, self.height * (1.0 - inset)),
        )
    }
}

/// `gen_range` panics on empty ranges; degenerate ones collapse to `lo`.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Position of a cue on the primary layer.
///
/// `cycle_slot` is the cue's 0-based index within its cycle; the assignment's
/// slot order maps it to a physical slot. No pattern means a random point.
pub fn position<R: Rng + ?Sized>(
    assignment: &PatternAssignment,
    cycle_slot: usize,
    canvas: Canvas,
    rng: &mut R,
) -> Point {
    let slot = assignment.slot(cycle_slot);
    match assignment.pattern {
        Some(pattern) => pattern_point(pattern, slot, canvas),
        None => canvas.random_point(rng, RANDOM_INSET),
    }
}

/// Position of a cue on the second, synchronised layer. Uses the same slot
/// as [`position`] but a mirrored or reshuffled table of the same pattern.
pub fn complementary_position<R: Rng + ?Sized>(
    assignment: &PatternAssignment,
    cycle_slot: usize,
    canvas: Canvas,
    rng: &mut R,
) -> Point {
    let slot = assignment.slot(cycle_slot);
    match assignment.pattern {
        Some(pattern) => complementary_point(pattern, slot, canvas),
        None => canvas.random_point(rng, RANDOM_INSET),
    }
}

/// Primary table. `slot` is clamped to `0..=4`.
pub fn pattern_point(pattern: PatternKind, slot: usize, canvas: Canvas) -> Point {
    let Canvas {
        width: w,
        height: h,
    } = canvas;
    let slot = slot.min(4);
    let s = slot as f32;
    let t = s / 4.0;

    match pattern {
        PatternKind::Grid => {
            if slot < 3 {
                Point::new(w * (0.25 + 0.25 * s), h * 0.33)
            } else {
                Point::new(w * (0.33 + 0.33 * (s - 3.0)), h * 0.67)
            }
        }
        PatternKind::Diagonal => Point::new(w * 0.1 + w * 0.8 * t, h * 0.1 + h * 0.8 * t),
        PatternKind::Wave => Point::new((s + 0.5) * w / 5.0, h * 0.5 + h * 0.25 * (t * TAU).sin()),
        PatternKind::InvertedWave => {
            Point::new((s + 0.5) * w / 5.0, h * 0.5 + h * 0.25 * (t * TAU).cos())
        }
        PatternKind::Corners => {
            let (fx, fy) = [(0.2, 0.2), (0.8, 0.2), (0.5, 0.5), (0.2, 0.8), (0.8, 0.8)][slot];
            Point::new(w * fx, h * fy)
        }
    }
}

/// Complementary table. `slot` is clamped to `0..=4`.
pub fn complementary_point(pattern: PatternKind, slot: usize, canvas: Canvas) -> Point {
    let Canvas {
        width: w,
        height: h,
    } = canvas;
    let slot = slot.min(4);
    let s = slot as f32;
    let t = s / 4.0;

    match pattern {
        // two on top, three below
        PatternKind::Grid => {
            if slot < 2 {
                Point::new(w * (0.25 + 0.5 * s), h * 0.28)
            } else {
                Point::new(w * (0.15 + 0.35 * (s - 2.0)), h * 0.72)
            }
        }
        PatternKind::Diagonal => Point::new(w * 0.9 - w * 0.8 * t, h * 0.1 + h * 0.8 * t),
        PatternKind::Wave => Point::new((s + 0.5) * w / 5.0, h * 0.5 - h * 0.25 * (t * TAU).sin()),
        PatternKind::InvertedWave => {
            Point::new((s + 0.5) * w / 5.0, h * 0.5 - h * 0.25 * (t * TAU).cos())
        }
        PatternKind::Corners => {
            let (fx, fy) = [(0.5, 0.15), (0.15, 0.5), (0.5, 0.5), (0.85, 0.5), (0.5, 0.85)][slot];
            Point::new(w * fx, h * fy)
        }
    }
}

/// Size bounds of a persistent shape, before the random draw.
///
/// Longer notes grow larger shapes, capped at twice the base size, and
/// patterns that pack shapes closely shrink them.
pub fn persistent_size_range(
    canvas: Canvas,
    duration_ms: f64,
    pattern: Option<PatternKind>,
    timing: &TimingConfig,
) -> (f32, f32) {
    let base = canvas.min_side() * 0.3;
    let bars = (duration_ms / timing.bar_ms()) as f32;
    let grow = base.min(bars * 30.0);

    let scale = match pattern {
        Some(PatternKind::Grid | PatternKind::Corners) => 0.6,
        Some(PatternKind::Diagonal | PatternKind::Wave) => 0.7,
        Some(PatternKind::InvertedWave) | None => 1.0,
    };

    ((base + grow) * scale, (base * 1.5 + grow) * scale)
}

/// Number of extra nested copies drawn inside a persistent shape: one per
/// half bar of note length, at least one and at most [`MAX_NESTED_LAYERS`].
/// Notes without a length get three.
pub fn nested_layer_count(duration_ms: f64, timing: &TimingConfig) -> u32 {
    if duration_ms <= 0.0 {
        return 3;
    }
    let repeat_ms = timing.bar_ms() / 2.0;
    let halves = (duration_ms / repeat_ms).floor();
    if halves >= MAX_NESTED_LAYERS as f64 {
        return MAX_NESTED_LAYERS;
    }
    (halves as u32).max(1)
}
