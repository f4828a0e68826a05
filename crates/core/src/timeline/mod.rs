//! Decoded musical timelines and the cues derived from them.
//!
//! A [`Timeline`] is the already-decoded input (MIDI decoding happens
//! elsewhere). [`TimelineParser`] turns one track into numbered [`CueEvent`]s,
//! collapsing chords to a single cue, and [`CueScheduler`] fires those cues as
//! the transport position passes them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Number of cues that make up one layout cycle.
pub const CYCLE_LEN: u32 = 5;

/// Decoded timeline document, one entry per source track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Timeline {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// One note or automation point as it comes out of the decoder.
///
/// Control tracks only carry `time_seconds` and `value`; every other field
/// defaults to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub tick: i64,
    pub time_seconds: f64,
    #[serde(default)]
    pub duration_ticks: i64,
    #[serde(default)]
    pub pitch: i32,
    #[serde(default)]
    pub velocity: f32,
    #[serde(default)]
    pub value: Option<f32>,
}

impl RawEvent {
    pub fn note(tick: i64, time_seconds: f64, duration_ticks: i64, pitch: i32) -> Self {
        Self {
            tick,
            time_seconds,
            duration_ticks,
            pitch,
            velocity: 1.0,
            value: None,
        }
    }

    pub fn control(time_seconds: f64, value: f32) -> Self {
        Self {
            time_seconds,
            value: Some(value),
            ..Self::default()
        }
    }
}

/// A raw event annotated with its 1-based cue number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueEvent {
    pub tick: i64,
    pub time_seconds: f64,
    pub duration_ticks: i64,
    pub pitch: i32,
    pub velocity: f32,
    pub control_value: Option<f32>,
    pub cue_index: u32,
}

impl CueEvent {
    fn from_raw(raw: &RawEvent, cue_index: u32) -> Self {
        Self {
            tick: raw.tick,
            time_seconds: raw.time_seconds,
            duration_ticks: raw.duration_ticks,
            pitch: raw.pitch,
            velocity: raw.velocity,
            control_value: raw.value,
            cue_index,
        }
    }

    /// Zero-based position of the cue inside its cycle, `0..5`.
    pub fn cycle_slot(&self) -> usize {
        ((self.cue_index.max(1) - 1) % CYCLE_LEN) as usize
    }

    /// True for the cue that opens a new cycle (`cue_index % 5 == 1`).
    pub fn starts_cycle(&self) -> bool {
        self.cue_index % CYCLE_LEN == 1
    }
}

/// Result of parsing one track.
#[derive(Debug, Clone, Default)]
pub struct ParsedTrack {
    /// Every input event, in input order, carrying the index of the cue it
    /// belongs to. Chord members share their first note's index.
    pub annotated: Vec<CueEvent>,
    /// Only the events that trigger: one per distinct tick, or every event in
    /// poly mode.
    pub cues: Vec<CueEvent>,
}

impl ParsedTrack {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineParser {
    poly: bool,
}

impl TimelineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event becomes a cue, regardless of shared ticks. Used for
    /// continuous controller streams.
    pub fn poly() -> Self {
        Self { poly: true }
    }

    pub fn with_poly(poly: bool) -> Self {
        Self { poly }
    }

    /// Numbers the events of a track. An empty or missing track yields an
    /// empty result.
    pub fn parse_track(&self, events: Option<&[RawEvent]>) -> ParsedTrack {
        let Some(events) = events else {
            return ParsedTrack::default();
        };

        let mut parsed = ParsedTrack {
            annotated: Vec::with_capacity(events.len()),
            cues: Vec::new(),
        };
        let mut last_tick: Option<i64> = None;
        let mut next_cue = 1;

        for raw in events {
            if self.poly || last_tick != Some(raw.tick) {
                let cue = CueEvent::from_raw(raw, next_cue);
                parsed.annotated.push(cue.clone());
                parsed.cues.push(cue);
                last_tick = Some(raw.tick);
                next_cue += 1;
            } else {
                parsed
                    .annotated
                    .push(CueEvent::from_raw(raw, next_cue - 1));
            }
        }

        parsed
    }

    pub fn parse(&self, track: Option<&Track>) -> ParsedTrack {
        self.parse_track(track.map(|track| track.events.as_slice()))
    }
}

/// Forward-only cue queue polled against the transport position.
///
/// Each cue is stored with a routing key `T` naming the handler that should
/// receive it. Cues fire at most once per session, in non-decreasing time
/// order; cues registered for the same instant fire in registration order.
#[derive(Debug)]
pub struct CueScheduler<T> {
    entries: Vec<(CueEvent, T)>,
    next_cue: usize,
    sorted: bool,
}

impl<T> Default for CueScheduler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_cue: 0,
            sorted: true,
        }
    }
}

impl<T> CueScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cue` for delivery to the handler named by `key` once the
    /// playback position reaches `cue.time_seconds`.
    pub fn schedule(&mut self, cue: CueEvent, key: T) {
        if let Some((last, _)) = self.entries.last() {
            if cue.time_seconds.total_cmp(&last.time_seconds).is_lt() {
                self.sorted = false;
            }
        }
        self.entries.push((cue, key));
    }

    pub fn schedule_all(&mut self, cues: impl IntoIterator<Item = CueEvent>, key: T)
    where
        T: Clone,
    {
        for cue in cues {
            self.schedule(cue, key.clone());
        }
    }

    /// Invokes `handler` for every not-yet-fired cue at or before `position`.
    /// Returns the number of cues fired.
    pub fn fire_due<F>(&mut self, position_seconds: f64, mut handler: F) -> usize
    where
        F: FnMut(&T, &CueEvent),
    {
        self.ensure_sorted();

        let mut fired = 0;
        while let Some((cue, key)) = self.entries.get(self.next_cue) {
            if cue.time_seconds.total_cmp(&position_seconds).is_gt() {
                break;
            }
            handler(key, cue);
            self.next_cue += 1;
            fired += 1;
        }
        fired
    }

    /// Starts a new playback session: every cue becomes pending again.
    pub fn rewind(&mut self) {
        self.next_cue = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.entries.len() - self.next_cue
    }

    /// Time of the next cue to fire, if any.
    pub fn next_time(&self) -> Option<f64> {
        if self.sorted {
            self.entries
                .get(self.next_cue)
                .map(|(cue, _)| cue.time_seconds)
        } else {
            self.entries[self.next_cue..]
                .iter()
                .map(|(cue, _)| cue.time_seconds)
                .min_by(|a, b| a.total_cmp(b))
        }
    }

    fn ensure_sorted(&mut self) {
        if self.sorted {
            return;
        }
        // Stable, so equal times keep registration order. Only the pending
        // tail is reordered.
        self.entries[self.next_cue..]
            .sort_by(|a, b| a.0.time_seconds.total_cmp(&b.0.time_seconds));
        self.sorted = true;
    }
}

/// Millisecond playback clock. Stops advancing while paused.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    position_ms: f64,
    paused: bool,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.position_ms = 0.0;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn advance(&mut self, delta_ms: f64) {
        if !self.paused {
            self.position_ms = (self.position_ms + delta_ms).max(0.0);
        }
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_ms / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(ticks: &[i64]) -> Vec<RawEvent> {
        ticks
            .iter()
            .map(|&tick| RawEvent::note(tick, tick as f64 / 15_360.0 * 0.577, 15_360, 60))
            .collect()
    }

    #[test]
    fn chords_collapse_to_one_cue() {
        let events = notes(&[0, 0, 15_360, 30_720]);
        let parsed = TimelineParser::new().parse_track(Some(events.as_slice()));

        let indices: Vec<u32> = parsed.annotated.iter().map(|c| c.cue_index).collect();
        assert_eq!(indices, vec![1, 1, 2, 3]);

        let fire_times: Vec<f64> = parsed.cues.iter().map(|c| c.time_seconds).collect();
        assert_eq!(fire_times.len(), 3);
        assert!(fire_times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn poly_mode_numbers_every_event() {
        let events = notes(&[0, 0, 0, 10]);
        let parsed = TimelineParser::poly().parse_track(Some(events.as_slice()));
        let indices: Vec<u32> = parsed.cues.iter().map(|c| c.cue_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dedup_indices_are_a_run_from_one() {
        let ticks = [0, 0, 5, 5, 5, 9, 12, 12, 40, 41, 41];
        let events = notes(&ticks);
        let parsed = TimelineParser::new().parse_track(Some(events.as_slice()));

        let mut distinct = ticks.to_vec();
        distinct.dedup();
        let indices: Vec<u32> = parsed.cues.iter().map(|c| c.cue_index).collect();
        let expected: Vec<u32> = (1..=distinct.len() as u32).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn missing_or_empty_tracks_yield_nothing() {
        let parser = TimelineParser::new();
        assert!(parser.parse_track(None).is_empty());
        assert!(parser.parse_track(Some(&[][..])).is_empty());
        assert!(parser.parse(None).annotated.is_empty());
    }

    #[test]
    fn cycle_helpers_follow_modulo_five() {
        let raw = RawEvent::note(0, 0.0, 0, 0);
        let slots: Vec<usize> = (1..=11)
            .map(|i| CueEvent::from_raw(&raw, i).cycle_slot())
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4, 0]);
        assert!(CueEvent::from_raw(&raw, 6).starts_cycle());
        assert!(!CueEvent::from_raw(&raw, 10).starts_cycle());
    }

    #[test]
    fn unordered_times_sort_totally_with_nan_last() {
        let mut scheduler = CueScheduler::new();
        for (index, time) in [(1, 2.0), (2, f64::NAN), (3, 1.0), (4, 2.0)] {
            let cue = CueEvent::from_raw(&RawEvent::control(time, 0.5), index);
            scheduler.schedule(cue, ());
        }

        let mut fired = Vec::new();
        scheduler.fire_due(5.0, |_, cue| fired.push(cue.cue_index));
        assert_eq!(fired, vec![3, 1, 4]);
        assert_eq!(scheduler.pending(), 1);
        assert!(scheduler.next_time().is_some_and(f64::is_nan));
    }

    #[test]
    fn scheduler_fires_in_time_order_once() {
        let events = notes(&[0, 15_360, 30_720]);
        let parsed = TimelineParser::new().parse_track(Some(events.as_slice()));
        let mut scheduler = CueScheduler::new();
        for cue in parsed.cues.into_iter().rev() {
            scheduler.schedule(cue, "track");
        }

        let mut fired = Vec::new();
        scheduler.fire_due(0.6, |_, cue| fired.push(cue.cue_index));
        assert_eq!(fired, vec![1, 2]);

        scheduler.fire_due(0.6, |_, cue| fired.push(cue.cue_index));
        assert_eq!(fired, vec![1, 2]);

        scheduler.fire_due(10.0, |_, cue| fired.push(cue.cue_index));
        assert_eq!(fired, vec![1, 2, 3]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn same_time_cues_keep_registration_order() {
        let raw = RawEvent::note(0, 1.0, 0, 0);
        let mut scheduler = CueScheduler::new();
        scheduler.schedule(CueEvent::from_raw(&raw, 1), 'a');
        scheduler.schedule(CueEvent::from_raw(&raw, 1), 'b');

        let mut keys = Vec::new();
        scheduler.fire_due(1.0, |key, _| keys.push(*key));
        assert_eq!(keys, vec!['a', 'b']);
    }

    #[test]
    fn rewind_rearms_every_cue() {
        let events = notes(&[0, 15_360]);
        let mut scheduler = CueScheduler::new();
        scheduler.schedule_all(TimelineParser::new().parse_track(Some(events.as_slice())).cues, ());
        assert_eq!(scheduler.fire_due(100.0, |_, _| {}), 2);
        scheduler.rewind();
        assert_eq!(scheduler.next_time(), Some(0.0));
        assert_eq!(scheduler.fire_due(100.0, |_, _| {}), 2);
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let mut clock = PlaybackClock::new();
        clock.advance(16.0);
        clock.pause();
        clock.advance(500.0);
        assert_eq!(clock.position_ms(), 16.0);
        clock.resume();
        clock.advance(4.0);
        assert_eq!(clock.position_seconds(), 0.02);
    }

    #[test]
    fn decodes_timeline_json() {
        let timeline = Timeline::from_json_str(
            r#"{ "tracks": [
                { "name": "lead", "events": [
                    { "tick": 0, "timeSeconds": 0.0, "durationTicks": 61440, "pitch": 64, "velocity": 0.8 }
                ] },
                { "events": [ { "timeSeconds": 1.5, "value": 0.75 } ] }
            ] }"#,
        )
        .unwrap();

        assert_eq!(timeline.tracks.len(), 2);
        assert_eq!(timeline.track(0).unwrap().events[0].duration_ticks, 61_440);
        assert_eq!(timeline.track(1).unwrap().events[0].value, Some(0.75));
        assert!(timeline.track(2).is_none());
    }
}
