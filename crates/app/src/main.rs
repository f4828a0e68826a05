use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cue_visualiser_core::{
    AppConfig, AudioTransport, Canvas, ClockTransport, FrameTargets, RecordingSurface, Timeline,
    TimelineParser, Visualizer,
};
use tracing_subscriber::EnvFilter;

/// Audio keeps playing for a moment after the last cue.
const TAIL_SECONDS: f64 = 4.0;

fn main() -> cue_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            timeline,
            config,
            fps,
            width,
            height,
            seconds,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            run_headless(&timeline, config, fps, Canvas::new(width, height), seconds)
        }
        Commands::Cues { timeline, config } => {
            let config = load_config(config.as_deref())?;
            print_cues(&timeline, &config)
        }
    }
}

fn load_config(path: Option<&Path>) -> cue_visualiser_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_headless(
    timeline_path: &Path,
    config: AppConfig,
    fps: u32,
    canvas: Canvas,
    seconds: Option<f64>,
) -> cue_visualiser_core::Result<()> {
    tracing::info!(?timeline_path, fps, ?canvas, "starting headless playback");

    let timeline = Timeline::load(timeline_path)?;
    let mut visualizer = Visualizer::new(config)?;
    let queued = visualizer.load_timeline(&timeline);
    if queued == 0 {
        tracing::warn!("no cues scheduled, visuals will stay empty");
    }

    let duration = seconds.unwrap_or_else(|| last_cue_time(&timeline) + TAIL_SECONDS);
    let mut transport = ClockTransport::with_duration(duration);
    let mut bubbles = RecordingSurface::new();
    let mut main = RecordingSurface::new();
    let frame_seconds = 1.0 / f64::from(fps.max(1));

    let mut frames = 0usize;
    let mut cues_fired = 0usize;
    let mut peak_shapes = 0usize;

    transport.play();
    while transport.is_playing() {
        let report = visualizer.frame(
            &transport,
            canvas,
            &mut FrameTargets::new(&mut bubbles, &mut main),
        );
        frames += 1;
        cues_fired += report.cues_fired;
        peak_shapes = peak_shapes.max(report.live_shapes);
        transport.advance(frame_seconds);
    }

    tracing::info!(
        frames,
        cues_fired,
        queued,
        peak_shapes,
        draw_calls = bubbles.total_calls() + main.total_calls(),
        seconds = transport.position_seconds(),
        "playback finished"
    );
    Ok(())
}

fn last_cue_time(timeline: &Timeline) -> f64 {
    timeline
        .tracks
        .iter()
        .flat_map(|track| track.events.iter())
        .map(|event| event.time_seconds)
        .fold(0.0, f64::max)
}

fn print_cues(timeline_path: &Path, config: &AppConfig) -> cue_visualiser_core::Result<()> {
    let timeline = Timeline::load(timeline_path)?;

    let mut report = Vec::new();
    for binding in &config.tracks {
        let parsed = TimelineParser::with_poly(binding.poly).parse(timeline.track(binding.track));
        report.push(serde_json::json!({
            "track": binding.track,
            "role": binding.role,
            "poly": binding.poly,
            "cues": parsed.cues,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Cue-driven polygon visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a timeline headlessly and report what was drawn.
    Run {
        /// Decoded timeline document (JSON).
        timeline: PathBuf,
        /// Optional configuration file (JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Frames rendered per second of playback.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
        #[arg(long, default_value_t = 720.0)]
        height: f32,
        /// Stop after this many seconds instead of shortly after the last cue.
        #[arg(long)]
        seconds: Option<f64>,
        /// Overrides the configured random seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the cues each bound track would schedule.
    Cues {
        /// Decoded timeline document (JSON).
        timeline: PathBuf,
        /// Optional configuration file (JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
