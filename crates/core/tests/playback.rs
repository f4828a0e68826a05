use cue_visualiser_core::{
    timeline::Track, AppConfig, AudioTransport, Canvas, ClockTransport, FrameTargets, LayerId,
    LifecycleState, PlacementMode, RawEvent, RecordingSurface, Timeline, Visualizer,
};
use rand::{rngs::StdRng, SeedableRng};

const CANVAS: Canvas = Canvas::new(1920.0, 1080.0);
const PPQ: i64 = 15_360;

fn seconds(tick: i64) -> f64 {
    tick as f64 / PPQ as f64 * (60.0 / 104.0)
}

/// Twelve half-note chords of two notes each, a quarter-note bubble pulse, and
/// a controller sweep.
fn song() -> Timeline {
    let mut lead = Vec::new();
    for i in 0..12 {
        let tick = i * PPQ * 2;
        lead.push(RawEvent::note(tick, seconds(tick), PPQ * 2, 60));
        lead.push(RawEvent::note(tick, seconds(tick), PPQ * 2, 64));
    }
    let pulse = (0..24)
        .map(|i| RawEvent::note(i * PPQ, seconds(i * PPQ), PPQ / 2, 48 + i as i32))
        .collect();
    let sweep = (0..48)
        .map(|i| RawEvent::control(seconds(i * PPQ / 2), 0.5 + (i % 10) as f32 * 0.05))
        .collect();

    Timeline {
        tracks: vec![
            Track {
                name: Some("lead".into()),
                events: lead,
            },
            Track {
                name: Some("pulse".into()),
                events: pulse,
            },
            Track {
                name: Some("sweep".into()),
                events: sweep,
            },
        ],
    }
}

fn play(config: AppConfig, seed: u64) -> (Visualizer<StdRng>, usize, usize) {
    let timeline = song();
    let mut visualizer = Visualizer::with_rng(config, StdRng::seed_from_u64(seed)).unwrap();
    let queued = visualizer.load_timeline(&timeline);

    let mut transport = ClockTransport::with_duration(seconds(PPQ * 24) + 1.0);
    let mut bubbles = RecordingSurface::new();
    let mut main = RecordingSurface::new();
    let mut fired = 0;

    transport.play();
    while transport.is_playing() {
        let report = visualizer.frame(
            &transport,
            CANVAS,
            &mut FrameTargets::new(&mut bubbles, &mut main),
        );
        fired += report.cues_fired;
        assert!(visualizer.scene().entities(LayerId::Persistent).len() <= 5);
        for call in main.calls() {
            assert!(call.size > 0.0);
        }
        transport.advance(1.0 / 60.0);
    }

    assert_eq!(visualizer.scheduler().pending(), 0);
    (visualizer, queued, fired)
}

#[test]
fn whole_song_fires_every_cue_once() {
    let (_, queued, fired) = play(AppConfig::default(), 1);
    // chords collapse to 12 cues, 24 pulses, 48 controller points
    assert_eq!(queued, 12 + 24 + 48);
    assert_eq!(fired, queued);
}

#[test]
fn last_cycle_holds_two_grown_shapes() {
    let (visualizer, _, _) = play(AppConfig::default(), 2);
    let persistent = visualizer.scene().entities(LayerId::Persistent);
    // cues 11 and 12 belong to the third cycle
    assert_eq!(persistent.len(), 2);
    assert!(persistent
        .iter()
        .all(|shape| shape.state() == LifecycleState::Held && shape.current_size() == shape.max_size()));
    // the final controller value is 0.85
    assert!((visualizer.scene().opacity(LayerId::Bubbles) - 0.63).abs() < 1e-4);
}

#[test]
fn free_placement_runs_the_whole_song() {
    let mut config = AppConfig::default();
    config.layout.persistent_placement = PlacementMode::Free;
    let (visualizer, queued, fired) = play(config, 3);
    assert_eq!(fired, queued);
    for shape in visualizer.scene().entities(LayerId::Persistent) {
        assert!(CANVAS.contains(shape.position()));
    }
}

#[test]
fn pausing_freezes_growth() {
    let timeline = song();
    let mut visualizer =
        Visualizer::with_rng(AppConfig::default(), StdRng::seed_from_u64(4)).unwrap();
    visualizer.load_timeline(&timeline);

    let mut transport = ClockTransport::new();
    let mut bubbles = RecordingSurface::new();
    let mut main = RecordingSurface::new();
    transport.play();
    for _ in 0..10 {
        visualizer.frame(&transport, CANVAS, &mut FrameTargets::new(&mut bubbles, &mut main));
        transport.advance(1.0 / 60.0);
    }
    let size_before = visualizer.scene().entities(LayerId::Persistent)[0].current_size();
    let position_before = transport.position_seconds();

    transport.pause();
    for _ in 0..100 {
        transport.advance(1.0 / 60.0);
        let report =
            visualizer.frame(&transport, CANVAS, &mut FrameTargets::new(&mut bubbles, &mut main));
        assert!(!report.drawn);
    }
    assert_eq!(
        visualizer.scene().entities(LayerId::Persistent)[0].current_size(),
        size_before
    );
    assert_eq!(transport.position_seconds(), position_before);
}
