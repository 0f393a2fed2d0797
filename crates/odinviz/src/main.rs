//! OdinViz - headless runner for the audio/MIDI reactivity pipeline.
//!
//! Loads a WAV backing track and a MIDI arrangement, then drives the
//! simulation at a fixed tick rate, logging a summary once per second.
//! Useful for tuning and profiling without a window.

#![warn(missing_docs)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use odinviz_core::{Session, VizConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "odinviz")]
#[command(about = "Audio/MIDI reactive visualization pipeline, headless", long_about = None)]
struct Args {
    /// WAV backing track
    #[arg(long, value_name = "FILE")]
    audio: PathBuf,

    /// Standard MIDI File driving the elements
    #[arg(long, value_name = "FILE")]
    midi: PathBuf,

    /// Stop after this many seconds instead of the track length
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f64>,

    /// Simulation tick rate in Hz
    #[arg(long, value_name = "HZ", default_value = "60")]
    rate: f64,

    /// Run as fast as possible instead of pacing to real time
    #[arg(long)]
    fast: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    ensure!(args.rate > 0.0, "tick rate must be positive");

    let mut session = Session::load(&args.audio, &args.midi, VizConfig::default())
        .with_context(|| {
            format!(
                "failed to load {} / {}",
                args.audio.display(),
                args.midi.display()
            )
        })?;

    // Default run length: the longer input plus a tail for decay.
    let end = args.duration.unwrap_or_else(|| session.duration() + 2.0);
    let dt = 1.0 / args.rate;
    info!(
        seconds = end,
        rate = args.rate,
        events = session.schedule().len(),
        "starting playback"
    );

    let start = Instant::now();
    let mut now = 0.0f64;
    let mut next_report = 1.0f64;
    let mut events_total = 0usize;
    let mut emissions_total = 0usize;
    let mut bursts_total = 0usize;

    while now < end {
        now += dt;
        let output = session.tick(now, dt as f32);
        events_total += output.events_processed;
        emissions_total += output.emissions.len();
        if let Some(colors) = output.burst {
            bursts_total += 1;
            info!(particles = colors.len(), time = format!("{now:.2}"), "hub burst");
        }

        if now >= next_report {
            let hub = session.hub();
            info!(
                time = format!("{now:.0}s"),
                hub_size = format!("{:.1}", hub.size),
                hub_activity = format!("{:.2}", hub.activity),
                audio_level = format!("{:.2}", session.audio_level()),
                events = events_total,
                emissions = emissions_total,
                "tick summary"
            );
            next_report += 1.0;
        }

        if !args.fast {
            let target = start + Duration::from_secs_f64(now);
            if let Some(remaining) = target.checked_duration_since(Instant::now()) {
                std::thread::sleep(remaining);
            }
        }
    }

    info!(
        events = events_total,
        emissions = emissions_total,
        bursts = bursts_total,
        elapsed = format!("{:.1}s", start.elapsed().as_secs_f64()),
        "playback finished"
    );
    Ok(())
}
