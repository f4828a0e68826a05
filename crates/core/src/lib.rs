//! Core library for the Cue Visualiser.
//!
//! A decoded musical timeline is turned into numbered cues, the cues fire as
//! the host's audio transport passes them, and each fired cue places a new
//! animated polygon on one of two layers. Every five cues form a cycle that
//! shares a shape palette and a layout pattern.
//!
//! Audio playback and rasterisation stay with the host; it supplies an
//! [`AudioTransport`] and a pair of [`Surface`]s and calls
//! [`Visualizer::frame`] once per rendered frame.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod pattern;
pub mod placement;
pub mod render;
pub mod scene;
pub mod shape;
pub mod timeline;

pub use audio::{AudioTransport, ClockTransport};
pub use config::{AppConfig, PlacementConfig, PlacementMode, ShapeConfig, TimingConfig, TrackBinding};
pub use engine::{FrameReport, TrackRole, Visualizer};
pub use error::{CueVizError, Result};
pub use layout::{Canvas, Point};
pub use pattern::{CycleState, PatternAssignment, PatternKind, PatternSelector};
pub use placement::{Occupied, Placement, PlacementSolver};
pub use render::{Color, ColorRamp, DrawCall, FrameTargets, RecordingSurface, Surface};
pub use scene::{LayerId, SceneManager};
pub use shape::{LifecycleState, ShapeEntity, ShapeKind};
pub use timeline::{CueEvent, CueScheduler, PlaybackClock, RawEvent, Timeline, TimelineParser};
