use std::path::{Path, PathBuf};

use caption_overlay_core::{
    AppConfig, CaptionHandle, CaptionOverlay, PlaybackClock, SourceChange, TimestampPattern, Track,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> caption_overlay_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };
    let pattern = TimestampPattern::new(
        cli.pattern
            .as_deref()
            .unwrap_or(config.track.timestamp_pattern.as_str()),
    )?;

    match cli.command {
        Commands::Dump { source } => run_dump(&source, pattern),
        Commands::At { source, seconds } => run_at(&source, pattern, seconds),
        Commands::Play {
            source,
            from,
            to,
            step,
        } => run_play(&source, pattern, &config, from, to, step),
    }
}

fn load(source: &Path, pattern: TimestampPattern) -> caption_overlay_core::Result<Track> {
    let mut track = Track::new(pattern);
    match track.set_source(source)? {
        SourceChange::Loaded { captions } => {
            tracing::info!(?source, captions, pattern = %track.pattern(), "loaded track")
        }
        SourceChange::Missing => tracing::warn!(?source, "no track at path, continuing empty"),
    }
    Ok(track)
}

fn run_dump(source: &Path, pattern: TimestampPattern) -> caption_overlay_core::Result<()> {
    let track = load(source, pattern)?;
    let json = serde_json::to_string_pretty(track.captions())
        .map_err(|err| caption_overlay_core::CaptionError::msg(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn run_at(
    source: &Path,
    pattern: TimestampPattern,
    seconds: f64,
) -> caption_overlay_core::Result<()> {
    let mut track = load(source, pattern)?;
    for caption in track.set_position(seconds) {
        println!("#{} [{:.3} --> {:.3}]", caption.id, caption.start, caption.end);
        println!("{}", caption.text);
    }
    Ok(())
}

fn run_play(
    source: &Path,
    pattern: TimestampPattern,
    config: &AppConfig,
    from: f64,
    to: Option<f64>,
    step: f64,
) -> caption_overlay_core::Result<()> {
    check_play_range(from, to, step)?;

    let track = load(source, pattern)?;
    let end = to.unwrap_or_else(|| {
        track
            .captions()
            .iter()
            .map(|caption| caption.end)
            .fold(from, f64::max)
    });
    tracing::info!(from, end, step, style = ?config.style, "starting playback");

    let mut next_slot = 0;
    let mut overlay = CaptionOverlay::new(track, move |text: &str| {
        let label = TerminalLabel::new(next_slot, text);
        next_slot += 1;
        label
    });

    let mut last_shown: Vec<String> = Vec::new();

    for at in ticks(from, end, step) {
        let update = overlay.set_position(at);
        if update.changed {
            tracing::debug!(at, released = update.released.len(), "display list changed");
        }
        overlay.recycle(update.released);

        let shown: Vec<String> = overlay
            .displayed()
            .iter()
            .map(|label| label.to_string())
            .collect();
        if shown != last_shown {
            println!("{}", format_clock(at));
            if shown.is_empty() {
                println!("  (no captions)");
            }
            for line in &shown {
                println!("  {line}");
            }
            last_shown = shown;
        }
    }

    Ok(())
}

fn check_play_range(from: f64, to: Option<f64>, step: f64) -> caption_overlay_core::Result<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err("--step must be a positive number of seconds".into());
    }
    if !from.is_finite() {
        return Err("--from must be a finite number of seconds".into());
    }
    if to.is_some_and(|to| !to.is_finite()) {
        return Err("--to must be a finite number of seconds".into());
    }
    Ok(())
}

/// Clock positions from `from` up to and including `end`. Stops early once
/// `step` is too small to move the clock at its current magnitude.
fn ticks(from: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let mut clock = PlaybackClock::default();
    clock.seek(from);
    let mut stalled = false;

    std::iter::from_fn(move || {
        if stalled || clock.time_seconds > end {
            return None;
        }
        let at = clock.time_seconds;
        clock.advance(step);
        stalled = clock.time_seconds == at;
        Some(at)
    })
}

/// Console stand-in for an on-screen caption element.
#[derive(Debug)]
struct TerminalLabel {
    slot: usize,
    text: String,
}

impl TerminalLabel {
    fn new(slot: usize, text: &str) -> Self {
        Self {
            slot,
            text: text.to_string(),
        }
    }
}

impl CaptionHandle for TerminalLabel {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}

impl std::fmt::Display for TerminalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[label {}] {}", self.slot, self.text.replace('\n', " / "))
    }
}

fn format_clock(seconds: f64) -> String {
    let millis = (seconds * 1_000.0).round() as u64;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1_000 % 60,
        millis % 1_000
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed caption overlay engine", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Timestamp pattern, overriding the configuration (e.g. `HH:MM:SS.mmm`).
    #[arg(short, long, global = true)]
    pattern: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a subtitle track and print its captions as JSON.
    Dump {
        /// Path to the subtitle track.
        source: PathBuf,
    },
    /// Print the captions visible at a playback position.
    At {
        /// Path to the subtitle track.
        source: PathBuf,
        /// Playback position in seconds.
        seconds: f64,
    },
    /// Simulate forward playback and print every change of the display.
    Play {
        /// Path to the subtitle track.
        source: PathBuf,
        /// Start position in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Stop position in seconds; defaults to the end of the last caption.
        #[arg(long)]
        to: Option<f64>,
        /// Clock tick in seconds.
        #[arg(long, default_value_t = 0.1)]
        step: f64,
    },
}
