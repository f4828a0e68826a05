//! Output side of the visualiser: colours, draw calls, and the surfaces they
//! are issued to.
//!
//! Rasterisation belongs to the host. The core only emits one [`DrawCall`]
//! per outline and always names the target surface explicitly.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{layout::Point, shape::ShapeKind};

/// Colour in HSB space with alpha, matching the host renderer's colour mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Degrees, `0..360`.
    pub hue: f32,
    /// `0..=100`.
    pub saturation: f32,
    /// `0..=100`.
    pub brightness: f32,
    /// `0..=1`.
    pub alpha: f32,
}

impl Color {
    pub fn hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 100.0),
            brightness: brightness.clamp(0.0, 100.0),
            alpha: 1.0,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn fade(self, opacity: f32) -> Self {
        self.with_alpha(self.alpha * opacity)
    }
}

/// Four opacity variations of one colour. Index 3 is the most opaque and is
/// used for the central glow ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp(pub [Color; 4]);

impl ColorRamp {
    pub const ALPHAS: [f32; 4] = [0.25, 0.5, 0.75, 1.0];

    pub fn from_base(base: Color) -> Self {
        Self(Self::ALPHAS.map(|alpha| base.with_alpha(alpha)))
    }

    /// Random saturated, bright colour.
    pub fn bright<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_base(Color::hsb(
            rng.gen_range(0.0..360.0),
            rng.gen_range(80.0..=100.0),
            rng.gen_range(90.0..=100.0),
        ))
    }

    pub fn get(&self, index: usize) -> Color {
        self.0[index.min(3)]
    }
}

/// One outline for the host to stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawCall {
    pub stroke: Color,
    pub kind: ShapeKind,
    pub center: Point,
    pub size: f32,
}

/// Immediate-mode 2D target implemented by the host renderer.
pub trait Surface {
    /// Erases everything drawn so far.
    fn clear(&mut self);

    fn draw(&mut self, call: &DrawCall);
}

/// Surface that keeps every call. Backs the headless runner and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    clears: usize,
    total_calls: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls issued since the last clear.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Calls issued over the surface's lifetime.
    pub fn total_calls(&self) -> usize {
        self.total_calls
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.clear();
        self.clears += 1;
    }

    fn draw(&mut self, call: &DrawCall) {
        self.calls.push(*call);
        self.total_calls += 1;
    }
}

/// The two offscreen layers a frame is composed from, bottom first.
pub struct FrameTargets<'a> {
    pub bubbles: &'a mut dyn Surface,
    pub main: &'a mut dyn Surface,
}

impl<'a> FrameTargets<'a> {
    pub fn new(bubbles: &'a mut dyn Surface, main: &'a mut dyn Surface) -> Self {
        Self { bubbles, main }
    }
}
