use std::fmt;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::shape::ShapeKind;

/// Layout families a cycle can be arranged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    Grid,
    Diagonal,
    Wave,
    InvertedWave,
    Corners,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::Grid,
        PatternKind::Diagonal,
        PatternKind::Wave,
        PatternKind::InvertedWave,
        PatternKind::Corners,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Grid => "grid",
            PatternKind::Diagonal => "diagonal",
            PatternKind::Wave => "wave",
            PatternKind::InvertedWave => "invertedWave",
            PatternKind::Corners => "corners",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pattern and slot permutation shared by the five cues of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAssignment {
    /// `None` when no configured pattern name was recognised; positions then
    /// fall back to random placement.
    pub pattern: Option<PatternKind>,
    /// `slot_order[i]` is the physical slot of the i-th cue in the cycle.
    pub slot_order: [usize; 5],
}

impl PatternAssignment {
    pub fn slot(&self, cycle_slot: usize) -> usize {
        self.slot_order[cycle_slot % self.slot_order.len()]
    }
}

impl Default for PatternAssignment {
    fn default() -> Self {
        Self {
            pattern: None,
            slot_order: [0, 1, 2, 3, 4],
        }
    }
}

/// Everything a cycle decides once, on its first cue.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleState {
    /// Shape kind for each cue of the cycle, in cue order.
    pub palette: [ShapeKind; 5],
    pub assignment: PatternAssignment,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            palette: ShapeKind::ALL,
            assignment: PatternAssignment::default(),
        }
    }
}

impl CycleState {
    pub fn shape_for(&self, cycle_slot: usize) -> ShapeKind {
        self.palette[cycle_slot % self.palette.len()]
    }
}

/// Draws a fresh [`CycleState`] at every cycle boundary.
#[derive(Debug, Clone)]
pub struct PatternSelector {
    patterns: Vec<PatternKind>,
}

impl Default for PatternSelector {
    fn default() -> Self {
        Self {
            patterns: PatternKind::ALL.to_vec(),
        }
    }
}

impl PatternSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the selector to the named patterns. Unrecognised names are
    /// skipped; if none are recognised, cycles get no pattern at all.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut patterns = Vec::new();
        for name in names {
            match PatternKind::from_name(name.as_ref()) {
                Some(kind) if !patterns.contains(&kind) => patterns.push(kind),
                Some(_) => {}
                None => tracing::warn!(name = name.as_ref(), "ignoring unknown pattern name"),
            }
        }
        Self { patterns }
    }

    pub fn patterns(&self) -> &[PatternKind] {
        &self.patterns
    }

    /// Palette, pattern, and slot order are three independent uniform draws.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> CycleState {
        let mut palette = ShapeKind::ALL;
        palette.shuffle(rng);

        let pattern = self.patterns.choose(rng).copied();

        let mut slot_order = [0, 1, 2, 3, 4];
        slot_order.shuffle(rng);

        CycleState {
            palette,
            assignment: PatternAssignment {
                pattern,
                slot_order,
            },
        }
    }
}
