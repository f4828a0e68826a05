//! Cue handlers and the frame loop.
//!
//! [`Visualizer`] owns every piece of mutable state: the cue queue, the
//! current cycle, the scene, and the random source. The host calls
//! [`Visualizer::frame`] once per rendered frame; cues that became due since
//! the previous frame are handled first, on the same thread, then the scene is
//! updated and drawn.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    audio::AudioTransport,
    config::{AppConfig, PlacementMode},
    layout::{self, uniform, Canvas},
    pattern::{CycleState, PatternSelector},
    placement::PlacementSolver,
    render::{Color, ColorRamp, FrameTargets},
    scene::{LayerId, SceneManager},
    shape::{Decay, Growth, ShapeEntity},
    timeline::{CueEvent, CueScheduler, Timeline, TimelineParser},
    Result,
};

/// Which handler a track's cues go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackRole {
    /// Growing polygons, one per cue, wiped at each cycle boundary.
    Persistent,
    /// Clusters of decaying bubbles.
    Bubbles,
    /// Controller stream that sets the bubble layer's opacity.
    BubbleOpacity,
}

/// What happened during one call to [`Visualizer::frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub cues_fired: usize,
    pub live_shapes: usize,
    /// False when the transport was paused and nothing advanced.
    pub drawn: bool,
}

/// Maps a controller value onto the bubble layer's opacity.
///
/// Values from 0.5 to 1 sweep the opacity from 0 to 0.9; anything outside is
/// clamped.
pub fn bubble_opacity(value: f32) -> f32 {
    ((value - 0.5) / 0.5 * 0.9).clamp(0.0, 0.9)
}

/// Hue of a bubble cluster, tied to the note's pitch class and cue number.
pub fn bubble_hue(pitch: i32, cue_index: u32) -> f32 {
    let hue = (pitch.rem_euclid(12) as i64 * 30 + cue_index as i64 * 17).rem_euclid(360);
    hue as f32
}

#[derive(Debug)]
pub struct Visualizer<R = StdRng> {
    config: AppConfig,
    scheduler: CueScheduler<TrackRole>,
    selector: PatternSelector,
    placement: PlacementSolver,
    cycle: CycleState,
    /// Track whose cycle boundaries pick the pattern and palette.
    cycle_driver: TrackRole,
    scene: SceneManager,
    rng: R,
    placed_any: bool,
}

impl Visualizer<StdRng> {
    /// Builds a visualiser seeded from `config.seed`, or from entropy when no
    /// seed is set.
    pub fn new(config: AppConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Visualizer<R> {
    pub fn with_rng(config: AppConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: PatternSelector::from_names(&config.layout.patterns),
            placement: PlacementSolver::new(config.placement),
            config,
            scheduler: CueScheduler::new(),
            cycle: CycleState::default(),
            cycle_driver: TrackRole::Persistent,
            scene: SceneManager::new(),
            rng,
            placed_any: false,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn cycle(&self) -> &CycleState {
        &self.cycle
    }

    pub fn scheduler(&self) -> &CueScheduler<TrackRole> {
        &self.scheduler
    }

    /// Parses every bound track and queues its cues. Missing or empty tracks
    /// are skipped with a warning. Returns the number of cues queued.
    pub fn load_timeline(&mut self, timeline: &Timeline) -> usize {
        let mut queued = 0;
        let mut has_persistent = false;

        for binding in &self.config.tracks {
            let parsed = TimelineParser::with_poly(binding.poly).parse(timeline.track(binding.track));
            if parsed.is_empty() {
                tracing::warn!(
                    track = binding.track,
                    role = ?binding.role,
                    "timeline track is missing or empty, its cues are disabled"
                );
                continue;
            }

            tracing::debug!(
                track = binding.track,
                role = ?binding.role,
                events = parsed.annotated.len(),
                cues = parsed.cues.len(),
                "scheduled track"
            );
            has_persistent |= binding.role == TrackRole::Persistent;
            queued += parsed.cues.len();
            self.scheduler.schedule_all(parsed.cues, binding.role);
        }

        self.cycle_driver = if has_persistent {
            TrackRole::Persistent
        } else {
            TrackRole::Bubbles
        };
        queued
    }

    /// Starts a new playback session from the top.
    pub fn restart(&mut self) {
        self.scheduler.rewind();
        self.scene.reset_layer(LayerId::Persistent);
        self.scene.reset_layer(LayerId::Bubbles);
        self.cycle = CycleState::default();
        self.placed_any = false;
    }

    /// Runs one frame against the host transport.
    ///
    /// Nothing happens while the transport is paused: no cue fires, no shape
    /// grows or decays, and no surface is touched.
    pub fn frame<T: AudioTransport + ?Sized>(
        &mut self,
        transport: &T,
        canvas: Canvas,
        targets: &mut FrameTargets<'_>,
    ) -> FrameReport {
        if !transport.is_playing() {
            return FrameReport {
                live_shapes: self.scene.len(),
                ..FrameReport::default()
            };
        }

        let now_ms = transport.position_ms();
        let mut due = Vec::new();
        self.scheduler
            .fire_due(transport.position_seconds(), |role, cue| {
                due.push((*role, cue.clone()))
            });
        for (role, cue) in &due {
            self.handle_cue(*role, cue, canvas, now_ms);
        }

        self.scene.frame(now_ms, &mut self.rng, targets);

        FrameReport {
            cues_fired: due.len(),
            live_shapes: self.scene.len(),
            drawn: true,
        }
    }

    /// Reacts to one fired cue. `canvas` is the size at firing time and
    /// `now_ms` the playback position the new shape starts from.
    pub fn handle_cue(&mut self, role: TrackRole, cue: &CueEvent, canvas: Canvas, now_ms: f64) {
        match role {
            TrackRole::Persistent => self.spawn_persistent(cue, canvas, now_ms),
            TrackRole::Bubbles => self.spawn_bubbles(cue, canvas),
            TrackRole::BubbleOpacity => {
                let value = cue.control_value.unwrap_or(0.0);
                self.scene.set_opacity(LayerId::Bubbles, bubble_opacity(value));
            }
        }
    }

    fn start_cycle(&mut self, cue: &CueEvent) {
        self.cycle = self.selector.select(&mut self.rng);
        tracing::debug!(
            cue = cue.cue_index,
            pattern = ?self.cycle.assignment.pattern,
            slots = ?self.cycle.assignment.slot_order,
            "new cycle"
        );
    }

    fn spawn_persistent(&mut self, cue: &CueEvent, canvas: Canvas, now_ms: f64) {
        if cue.starts_cycle() {
            self.scene.reset_layer(LayerId::Persistent);
            if self.cycle_driver == TrackRole::Persistent {
                self.start_cycle(cue);
            }
        }

        let timing = self.config.timing;
        let duration_ms = timing.duration_ms(cue.duration_ticks);
        let nested = layout::nested_layer_count(timing.ticks_to_ms(cue.duration_ticks), &timing);
        let slot = cue.cycle_slot();
        let pattern = self.cycle.assignment.pattern;

        let (min_size, max_size) =
            layout::persistent_size_range(canvas, duration_ms, pattern, &timing);
        let size = uniform(&mut self.rng, min_size, max_size);

        let position = match self.config.layout.persistent_placement {
            PlacementMode::Pattern => {
                layout::complementary_position(&self.cycle.assignment, slot, canvas, &mut self.rng)
            }
            PlacementMode::Free => {
                let occupied = self.scene.occupied(LayerId::Persistent);
                self.placement
                    .solve(&mut self.rng, &occupied, size * 0.5, canvas, !self.placed_any)
                    .center
            }
        };
        self.placed_any = true;

        let entity = ShapeEntity::growing(
            self.cycle.shape_for(slot),
            position,
            size,
            Growth {
                start_ms: now_ms,
                duration_ms,
            },
            ColorRamp::bright(&mut self.rng),
        )
        .with_nested_layers(nested)
        .with_ring_step(self.config.shapes.ring_step);
        self.scene.push(LayerId::Persistent, entity);
    }

    fn spawn_bubbles(&mut self, cue: &CueEvent, canvas: Canvas) {
        if cue.starts_cycle() {
            self.scene.reset_layer(LayerId::Bubbles);
            if self.cycle_driver == TrackRole::Bubbles {
                self.start_cycle(cue);
            }
        }

        let shapes = self.config.shapes;
        let slot = cue.cycle_slot();
        let position = layout::position(&self.cycle.assignment, slot, canvas, &mut self.rng);
        let kind = self.cycle.shape_for(slot);
        let hue = bubble_hue(cue.pitch, cue.cue_index);
        let count = self
            .rng
            .gen_range(shapes.bubble_count.min..=shapes.bubble_count.max);

        for _ in 0..count {
            let size = uniform(&mut self.rng, shapes.bubble_size.min, shapes.bubble_size.max).floor();
            let base = Color::hsb(
                hue,
                self.rng.gen_range(50.0..=100.0),
                self.rng.gen_range(50.0..=100.0),
            );
            let entity = ShapeEntity::decaying(
                kind,
                position,
                size,
                Decay {
                    decrement: shapes.bubble_decrement,
                    jitter: shapes.bubble_jitter,
                },
                ColorRamp::from_base(base),
            )
            .with_nested_layers(shapes.bubble_nested_layers)
            .with_ring_step(shapes.ring_step);
            self.scene.push(LayerId::Bubbles, entity);
        }
    }
}
