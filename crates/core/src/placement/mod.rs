//! Rejection-sampling circle packing for shapes that are not tied to a
//! pattern slot.

use rand::Rng;

use crate::{
    config::PlacementConfig,
    layout::{uniform, Canvas, Point},
};

/// A shape already on the canvas, reduced to its bounding circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupied {
    pub center: Point,
    pub radius: f32,
}

impl Occupied {
    /// Bounding circle of a shape `size` wide.
    pub fn from_size(center: Point, size: f32) -> Self {
        Self {
            center,
            radius: size.max(0.0) * 0.5,
        }
    }
}

/// Chosen center and the clearance it achieved. Positive clearance means no
/// overlap with any occupied circle, margins included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: Point,
    pub clearance: f32,
    pub attempts: usize,
}

impl Placement {
    pub fn is_clear(&self) -> bool {
        self.clearance > 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementSolver {
    config: PlacementConfig,
}

impl Default for PlacementSolver {
    fn default() -> Self {
        Self::new(PlacementConfig::default())
    }
}

impl PlacementSolver {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Finds a center for a circle of `target_radius`.
    ///
    /// Samples up to `max_attempts` inset candidates, keeping the one with the
    /// largest worst-case clearance and stopping at the first clear one. Never
    /// fails: if nothing is clear, the least-overlapping candidate is returned.
    /// With nothing on the canvas, the very first placement takes the center
    /// and later ones a random inset point.
    pub fn solve<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        occupied: &[Occupied],
        target_radius: f32,
        canvas: Canvas,
        first_placement: bool,
    ) -> Placement {
        if occupied.is_empty() {
            let center = if first_placement {
                canvas.center()
            } else {
                canvas.random_point(rng, self.config.inset)
            };
            return Placement {
                center,
                clearance: f32::INFINITY,
                attempts: 0,
            };
        }

        let margin = self.config.safety_margin;
        let candidate_radius = target_radius.max(0.0) + margin;
        let (min_x, max_x) = (
            canvas.width * self.config.inset,
            canvas.width * (1.0 - self.config.inset),
        );
        let (min_y, max_y) = (
            canvas.height * self.config.inset,
            canvas.height * (1.0 - self.config.inset),
        );

        let mut best = Placement {
            center: canvas.center(),
            clearance: f32::NEG_INFINITY,
            attempts: 0,
        };

        for attempt in 1..=self.config.max_attempts.max(1) {
            let candidate = Point::new(uniform(rng, min_x, max_x), uniform(rng, min_y, max_y));
            let clearance = occupied
                .iter()
                .map(|other| {
                    candidate.distance(other.center) - candidate_radius - (other.radius + margin)
                })
                .fold(f32::INFINITY, f32::min);

            if clearance > best.clearance {
                best = Placement {
                    center: candidate,
                    clearance,
                    attempts: attempt,
                };
            }
            if clearance > 0.0 {
                return best;
            }
            best.attempts = attempt;
        }

        tracing::debug!(
            clearance = best.clearance,
            attempts = best.attempts,
            "no clear placement found, using least overlapping candidate"
        );
        best
    }
}
