use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    layout::Point,
    render::{ColorRamp, DrawCall, Surface},
};

/// Number of glow rings on each side of a copy's nominal outline.
pub const RING_REACH: i32 = 3;

/// Upper bound on the nested copies drawn inside one shape.
pub const MAX_NESTED_LAYERS: u32 = 32;

/// The fixed palette of outlines a cycle is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Equilateral,
    Rect,
    Pentagon,
    Hexagon,
    Octagon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Equilateral,
        ShapeKind::Rect,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Octagon,
    ];

    pub fn sides(self) -> usize {
        match self {
            ShapeKind::Equilateral => 3,
            ShapeKind::Rect => 4,
            ShapeKind::Pentagon => 5,
            ShapeKind::Hexagon => 6,
            ShapeKind::Octagon => 8,
        }
    }

    /// Outline vertices of a shape `size` wide, centred on `center`.
    ///
    /// Hosts that only offer a polygon primitive can stroke these directly.
    pub fn outline(self, center: Point, size: f32) -> Vec<Point> {
        let sides = self.sides();
        let (radius, rotation) = match self {
            // axis-aligned square of side `size`
            ShapeKind::Rect => (size * 0.5 * std::f32::consts::SQRT_2, -FRAC_PI_2 / 2.0),
            // point up
            _ => (size * 0.5, -FRAC_PI_2),
        };
        (0..sides)
            .map(|i| {
                let angle = rotation + TAU * i as f32 / sides as f32;
                Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Growing,
    Held,
    Decaying,
    Dead,
}

/// Timing of a shape that grows with its note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Growth {
    pub start_ms: f64,
    pub duration_ms: f64,
}

/// Per-update shrink and drift of a decaying shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decay {
    pub decrement: f32,
    pub jitter: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Grow(Growth),
    Decay(Decay),
}

/// One animated outline stack on a layer.
///
/// Growing shapes take their size from the playback clock and settle at
/// `max_size`. Decaying shapes start at a random size, shrink by a fixed step
/// each update while drifting, and die once their size is gone.
#[derive(Debug, Clone)]
pub struct ShapeEntity {
    position: Point,
    max_size: f32,
    current_size: f32,
    kind: ShapeKind,
    nested_layers: u32,
    ramp: ColorRamp,
    ring_step: f32,
    state: LifecycleState,
    motion: Motion,
}

impl ShapeEntity {
    pub fn growing(
        kind: ShapeKind,
        position: Point,
        max_size: f32,
        growth: Growth,
        ramp: ColorRamp,
    ) -> Self {
        Self {
            position,
            max_size: max_size.max(0.0),
            current_size: 0.0,
            kind,
            nested_layers: 3,
            ramp,
            ring_step: 16.0,
            state: LifecycleState::Growing,
            motion: Motion::Grow(Growth {
                start_ms: growth.start_ms,
                duration_ms: growth.duration_ms.max(1.0),
            }),
        }
    }

    pub fn decaying(
        kind: ShapeKind,
        position: Point,
        initial_size: f32,
        decay: Decay,
        ramp: ColorRamp,
    ) -> Self {
        let state = if initial_size > 0.0 {
            LifecycleState::Decaying
        } else {
            LifecycleState::Dead
        };
        Self {
            position,
            max_size: initial_size,
            current_size: initial_size,
            kind,
            nested_layers: 2,
            ramp,
            ring_step: 16.0,
            state,
            motion: Motion::Decay(decay),
        }
    }

    /// Clamped to [`MAX_NESTED_LAYERS`].
    pub fn with_nested_layers(mut self, nested_layers: u32) -> Self {
        self.nested_layers = nested_layers.min(MAX_NESTED_LAYERS);
        self
    }

    pub fn with_ring_step(mut self, ring_step: f32) -> Self {
        self.ring_step = ring_step;
        self
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    pub fn current_size(&self) -> f32 {
        self.current_size
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn nested_layers(&self) -> u32 {
        self.nested_layers
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Growth timing, for shapes that grow.
    pub fn growth(&self) -> Option<Growth> {
        match self.motion {
            Motion::Grow(growth) => Some(growth),
            Motion::Decay(_) => None,
        }
    }

    /// Dead shapes are pruned from their layer on the next frame.
    pub fn is_active(&self) -> bool {
        self.state != LifecycleState::Dead
    }

    /// Advances the shape to playback time `now_ms`. Decaying shapes ignore
    /// the clock and step once per call.
    pub fn update<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) {
        match (self.state, self.motion) {
            (LifecycleState::Growing, Motion::Grow(growth)) => {
                let elapsed = now_ms - growth.start_ms;
                if elapsed >= growth.duration_ms {
                    self.current_size = self.max_size;
                    self.state = LifecycleState::Held;
                } else {
                    let progress = (elapsed / growth.duration_ms).clamp(0.0, 1.0) as f32;
                    // rounding must not reach full size before the note ends
                    self.current_size =
                        (self.max_size * progress).min(self.max_size * (1.0 - f32::EPSILON));
                }
            }
            (LifecycleState::Decaying, Motion::Decay(decay)) => {
                self.current_size -= decay.decrement;
                if decay.jitter > 0.0 {
                    self.position.x += rng.gen_range(-decay.jitter..=decay.jitter);
                    self.position.y += rng.gen_range(-decay.jitter..=decay.jitter);
                }
                if self.current_size <= 0.0 {
                    self.state = LifecycleState::Dead;
                }
            }
            _ => {}
        }
    }

    /// Strokes the shape onto `surface`.
    ///
    /// The shape is drawn as `nested_layers + 1` copies at `size / n`, and each
    /// copy as seven rings `size + k * ring_step` for `k` in `-3..=3`, coloured
    /// by `ramp[3 - |k|]`. Rings that would have no size are skipped.
    pub fn draw(&self, surface: &mut dyn Surface, opacity: f32) {
        if self.current_size <= 0.0 {
            return;
        }
        for copy in 0..=self.nested_layers {
            let size = self.current_size / (copy + 1) as f32;
            for k in -RING_REACH..=RING_REACH {
                let ring = size + k as f32 * self.ring_step;
                if ring <= 0.0 {
                    continue;
                }
                let color = self.ramp.get((RING_REACH - k.abs()) as usize);
                surface.draw(&DrawCall {
                    stroke: color.fade(opacity),
                    kind: self.kind,
                    center: self.position,
                    size: ring,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::render::{Color, RecordingSurface};

    fn ramp() -> ColorRamp {
        ColorRamp::from_base(Color::hsb(200.0, 90.0, 95.0))
    }

    fn grower(max_size: f32, start_ms: f64, duration_ms: f64) -> ShapeEntity {
        ShapeEntity::growing(
            ShapeKind::Pentagon,
            Point::new(100.0, 100.0),
            max_size,
            Growth {
                start_ms,
                duration_ms,
            },
            ramp(),
        )
    }

    #[test]
    fn growth_is_monotonic_and_reaches_max_at_duration() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut shape = grower(300.0, 0.0, 2_307.69);
        let mut last = shape.current_size();

        let mut now = -100.0;
        while now < 2_307.69 {
            shape.update(now, &mut rng);
            assert!(shape.current_size() >= last);
            assert!(shape.current_size() < shape.max_size());
            assert_eq!(shape.state(), LifecycleState::Growing);
            last = shape.current_size();
            now += 16.7;
        }

        shape.update(2_307.69, &mut rng);
        assert_eq!(shape.current_size(), 300.0);
        assert_eq!(shape.state(), LifecycleState::Held);

        shape.update(50_000.0, &mut rng);
        assert_eq!(shape.current_size(), 300.0);
        assert!(shape.is_active());
    }

    #[test]
    fn growth_is_proportional_to_elapsed_time() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut shape = grower(200.0, 0.0, 1_000.0);
        shape.update(250.0, &mut rng);
        assert!((shape.current_size() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn decay_strictly_decreases_until_dead() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut shape = ShapeEntity::decaying(
            ShapeKind::Hexagon,
            Point::new(50.0, 50.0),
            3.0,
            Decay {
                decrement: 0.25,
                jitter: 20.0,
            },
            ramp(),
        );

        let mut updates = 0;
        while shape.current_size() > 0.0 {
            assert!(shape.is_active());
            let before = shape.current_size();
            shape.update(0.0, &mut rng);
            assert!(shape.current_size() < before);
            updates += 1;
        }
        assert_eq!(updates, 12);
        assert!(!shape.is_active());
        assert_eq!(shape.state(), LifecycleState::Dead);

        let frozen = shape.current_size();
        shape.update(0.0, &mut rng);
        assert_eq!(shape.current_size(), frozen);
    }

    #[test]
    fn decaying_shapes_drift_within_jitter() {
        let mut rng = StdRng::seed_from_u64(8);
        let start = Point::new(500.0, 500.0);
        let mut shape = ShapeEntity::decaying(
            ShapeKind::Rect,
            start,
            64.0,
            Decay {
                decrement: 0.25,
                jitter: 20.0,
            },
            ramp(),
        );
        shape.update(0.0, &mut rng);
        let moved = shape.position();
        assert!((moved.x - start.x).abs() <= 20.0);
        assert!((moved.y - start.y).abs() <= 20.0);
        assert_ne!(moved, start);
    }

    #[test]
    fn draws_seven_graded_rings_per_copy() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut shape = grower(400.0, 0.0, 10.0).with_nested_layers(1);
        shape.update(10.0, &mut rng);

        let mut surface = RecordingSurface::new();
        shape.draw(&mut surface, 1.0);
        let calls = surface.calls();
        assert_eq!(calls.len(), 14);

        let sizes: Vec<f32> = calls[..7].iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![352.0, 368.0, 384.0, 400.0, 416.0, 432.0, 448.0]);
        let alphas: Vec<f32> = calls[..7].iter().map(|c| c.stroke.alpha).collect();
        assert_eq!(alphas, vec![0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25]);
        assert_eq!(calls[10].size, 200.0);
    }

    #[test]
    fn nested_layers_are_clamped_before_drawing() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut shape = grower(400.0, 0.0, 10.0).with_nested_layers(u32::MAX);
        shape.update(10.0, &mut rng);
        assert_eq!(shape.nested_layers(), MAX_NESTED_LAYERS);

        let mut surface = RecordingSurface::new();
        shape.draw(&mut surface, 1.0);
        let copies = MAX_NESTED_LAYERS as usize + 1;
        assert!(!surface.calls().is_empty());
        assert!(surface.calls().len() <= copies * 7);
        assert_eq!(surface.calls()[3].size, 400.0);
    }

    #[test]
    fn small_shapes_skip_rings_without_size() {
        let shape = ShapeEntity::decaying(
            ShapeKind::Octagon,
            Point::new(0.0, 0.0),
            20.0,
            Decay {
                decrement: 1.0,
                jitter: 0.0,
            },
            ramp(),
        )
        .with_nested_layers(0);

        let mut surface = RecordingSurface::new();
        shape.draw(&mut surface, 0.5);
        // 20 - 16 = 4 survives, 20 - 32 and 20 - 48 do not
        assert_eq!(surface.calls().len(), 5);
        assert!(surface.calls().iter().all(|c| c.size > 0.0));
        assert_eq!(surface.calls()[0].stroke.alpha, 0.375);
    }

    #[test]
    fn outlines_have_one_vertex_per_side() {
        let center = Point::new(10.0, 10.0);
        for kind in ShapeKind::ALL {
            let outline = kind.outline(center, 20.0);
            assert_eq!(outline.len(), kind.sides());
        }
        let square = ShapeKind::Rect.outline(center, 20.0);
        assert!(square
            .iter()
            .all(|p| (p.x - 10.0).abs() > 9.99 && (p.y - 10.0).abs() > 9.99));
    }
}
