use crate::timeline::PlaybackClock;

/// View of the host audio transport that the visualiser is synchronised to.
///
/// The playback position is the single clock for everything time-based: cue
/// firing, shape growth, and whether the frame loop advances at all.
pub trait AudioTransport {
    /// Current playback position in seconds.
    fn position_seconds(&self) -> f64;

    /// Whether audio is currently playing. Paused transports freeze cue
    /// firing and animation.
    fn is_playing(&self) -> bool;

    fn position_ms(&self) -> f64 {
        self.position_seconds() * 1000.0
    }
}

/// In-process transport driven by explicit frame deltas.
///
/// Used by the command line runner and by tests in place of a real audio
/// backend.
#[derive(Debug, Clone)]
pub struct ClockTransport {
    clock: PlaybackClock,
    duration_seconds: Option<f64>,
}

impl Default for ClockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockTransport {
    pub fn new() -> Self {
        let mut clock = PlaybackClock::new();
        clock.pause();
        Self {
            clock,
            duration_seconds: None,
        }
    }

    /// A transport that stops by itself once `seconds` of audio have played.
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            duration_seconds: Some(seconds.max(0.0)),
            ..Self::new()
        }
    }

    /// Starts or resumes playback. A finished transport restarts from zero.
    pub fn play(&mut self) {
        if self.has_finished() {
            self.clock.reset();
        }
        self.clock.resume();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn stop(&mut self) {
        self.pause();
        self.clock.reset();
    }

    /// Advances playback by `delta_seconds`. No-op while paused.
    pub fn advance(&mut self, delta_seconds: f64) {
        self.clock.advance(delta_seconds * 1000.0);
        if let Some(end) = self.duration_seconds {
            if self.clock.position_seconds() >= end {
                self.pause();
            }
        }
    }

    /// True once the configured duration has fully played.
    pub fn has_finished(&self) -> bool {
        self.duration_seconds
            .map(|end| self.clock.position_seconds() >= end)
            .unwrap_or(false)
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }
}

impl AudioTransport for ClockTransport {
    fn position_seconds(&self) -> f64 {
        self.clock.position_seconds()
    }

    fn is_playing(&self) -> bool {
        !self.clock.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_advance_until_played() {
        let mut transport = ClockTransport::new();
        transport.advance(1.0);
        assert_eq!(transport.position_seconds(), 0.0);
        assert!(!transport.is_playing());

        transport.play();
        transport.advance(0.5);
        assert_eq!(transport.position_ms(), 500.0);
    }

    #[test]
    fn pause_freezes_position() {
        let mut transport = ClockTransport::new();
        transport.play();
        transport.advance(0.25);
        transport.pause();
        transport.advance(3.0);
        assert_eq!(transport.position_seconds(), 0.25);

        transport.play();
        transport.advance(0.25);
        assert_eq!(transport.position_seconds(), 0.5);
    }

    #[test]
    fn stops_at_duration_and_restarts() {
        let mut transport = ClockTransport::with_duration(1.0);
        transport.play();
        transport.advance(0.75);
        transport.advance(0.75);
        assert!(transport.has_finished());
        assert!(!transport.is_playing());

        transport.play();
        assert_eq!(transport.position_seconds(), 0.0);
        assert!(transport.is_playing());
    }

    #[test]
    fn stop_and_pause_share_one_playing_state() {
        let mut transport = ClockTransport::new();
        transport.play();
        transport.advance(0.5);
        transport.stop();
        assert!(!transport.is_playing());
        transport.advance(1.0);
        assert_eq!(transport.position_seconds(), 0.0);

        transport.play();
        transport.pause();
        transport.pause();
        assert!(!transport.is_playing());
        transport.play();
        assert!(transport.is_playing());
    }
}
