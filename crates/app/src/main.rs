use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vines_core::{
    AppConfig, Chart, InputEvent, InputQueue, PathGeometry, PlaybackClock, Session, Tier,
    VinesError,
};

fn main() -> vines_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Inspect { chart } => run_inspect(&chart, &config),
        Commands::Autoplay { chart, fps } => run_autoplay(&chart, fps, &config),
        Commands::Replay { chart, inputs, fps } => run_replay(&chart, &inputs, fps, &config),
    }
}

fn run_inspect(path: &Path, config: &AppConfig) -> vines_core::Result<()> {
    let chart = Chart::load(path)?;
    let tempo = chart.tempo_map()?;
    let end = chart.end_time().unwrap_or(0.0);

    tracing::info!(
        ?path,
        paths = chart.paths.len(),
        points = chart.points().count(),
        judgable = chart.judgable_count(),
        camera_keys = chart.camera.len(),
        "chart loaded"
    );
    tracing::info!(
        duration_ms = end,
        duration_beats = tempo.time_to_beat(end),
        start_bpm = tempo.bpm_at(0.0),
        tempo_changes = tempo.points().len(),
        "timing"
    );

    let geometry = PathGeometry::build(&chart.paths, config.gameplay.flatness_tolerance);
    for path in 0..geometry.path_count() {
        tracing::info!(path, segments = geometry.segments(path).len(), "flattened");
    }
    Ok(())
}

fn run_autoplay(path: &Path, fps: f64, config: &AppConfig) -> vines_core::Result<()> {
    let chart = Chart::load(path)?;
    let inputs = chart
        .points()
        .filter(|(_, point)| point.button.is_judgable())
        .map(|(_, point)| InputEvent::new(point.time, point.button))
        .collect();

    tracing::info!(?path, fps, "starting autoplay");
    play(chart, inputs, fps, config)
}

fn run_replay(path: &Path, inputs: &Path, fps: f64, config: &AppConfig) -> vines_core::Result<()> {
    let chart = Chart::load(path)?;
    let events: Vec<InputEvent> = serde_json::from_str(&std::fs::read_to_string(inputs)?)?;

    tracing::info!(?path, ?inputs, events = events.len(), fps, "starting replay");
    play(chart, events, fps, config)
}

/// Runs a session at a fixed frame rate until it finishes, then prints the
/// final score as JSON.
fn play(
    chart: Chart,
    inputs: Vec<InputEvent>,
    fps: f64,
    config: &AppConfig,
) -> vines_core::Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(VinesError::InvalidInput("fps must be a positive number"));
    }
    let frame_ms = 1000.0 / fps;

    let mut session = Session::new(chart, config)?;
    let mut queue = InputQueue::new();
    queue.set_events(inputs);
    let mut clock = PlaybackClock::new();
    clock.start(session.start_time());

    let mut frames = 0u64;
    loop {
        let now = clock.advance(frame_ms);
        for event in queue.drain_until(now) {
            for signal in session.process_input(event.button, event.time_ms) {
                tracing::debug!(t = event.time_ms, ?signal, "input");
            }
        }

        let report = session.advance_time(now);
        for signal in &report.signals {
            tracing::debug!(t = now, ?signal, "step");
        }
        frames += 1;
        if report.finished {
            break;
        }
    }

    let state = session.score_state();
    tracing::info!(
        frames,
        end_ms = clock.time_ms(),
        unused_inputs = queue.remaining(),
        hits = state.counts.hits(),
        misses = state.counts.miss,
        score = state.score,
        rank = %state.rank,
        "run complete"
    );
    for tier in Tier::ALL {
        tracing::info!(%tier, count = state.counts.get(tier), "tier breakdown");
    }
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Vines rhythm engine driver", long_about = None)]
struct Cli {
    /// Optional JSON settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of a chart file.
    Inspect {
        /// Path to the chart JSON.
        chart: PathBuf,
    },
    /// Play a chart with every point pressed exactly on time.
    Autoplay {
        chart: PathBuf,
        /// Simulated frame rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },
    /// Play a chart against recorded input.
    Replay {
        chart: PathBuf,
        /// JSON list of `{"t": ms, "button": "left"}` events.
        inputs: PathBuf,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },
}
