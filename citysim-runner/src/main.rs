// CitySim Runner - Command-line runner for CitySim districts
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # CitySim Runner
//!
//! Runs a district for a fixed simulated duration, either as fast as
//! possible or paced to the wall clock, and reports its readings.
//!
//! ## Usage
//!
//! ```bash
//! # Ten simulated minutes, final snapshot as JSON
//! citysim-runner --duration-secs 600 --seed 7
//!
//! # Real-time run with a CSV trace of two readings, sampled every second
//! citysim-runner --realtime --csv trace.csv \
//!     --keys garden.soil_moisture,garden.watering --sample-ms 1000
//!
//! # Print the default configuration, edit it, run with it
//! citysim-runner --dump-config > district.json
//! citysim-runner --config district.json
//! ```

mod error;
mod session;
mod trace;

use clap::Parser;
use citysim_district::DistrictConfig;
use error::{Result, RunnerError};
use session::{frames_for, Session};
use std::path::PathBuf;
use std::time::Duration;
use trace::TraceWriter;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// CitySim district runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for every fixture's random source
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Simulated duration in seconds
    #[arg(short, long, default_value = "120")]
    duration_secs: u64,

    /// Clock step per frame in milliseconds
    #[arg(short, long, default_value = "16")]
    frame_ms: u64,

    /// District configuration (JSON); defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pace frames to the wall clock
    #[arg(long)]
    realtime: bool,

    /// Write a CSV trace to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Store keys to trace (comma-separated); every key when omitted
    #[arg(long, value_delimiter = ',')]
    keys: Vec<String>,

    /// Simulated milliseconds between trace rows
    #[arg(long, default_value = "1000")]
    sample_ms: u64,

    /// Force the street lights on
    #[arg(long)]
    street_lights: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            DistrictConfig::from_path(path)?
        }
        None => DistrictConfig::default(),
    };

    if args.dump_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    if args.frame_ms == 0 {
        return Err(RunnerError::InvalidArgument(
            "--frame-ms must be non-zero".to_string(),
        ));
    }
    let frame = Duration::from_millis(args.frame_ms);
    let frames = frames_for(Duration::from_secs(args.duration_secs), frame);
    let sample_every = (args.sample_ms / args.frame_ms).max(1);

    info!("CitySim Runner v{}", env!("CARGO_PKG_VERSION"));
    let mut session = Session::new(&config, args.seed, frame)?;
    info!(
        "District mounted: {:?}, {} frames of {:?}{}",
        session.district().mounted(),
        frames,
        session.frame_duration(),
        if args.realtime { " (real time)" } else { "" }
    );

    if args.street_lights && !session.district().force_street_lights(true) {
        tracing::warn!("No day/night cycle mounted, ignoring --street-lights");
    }

    let mut trace = match &args.csv {
        Some(path) => {
            let keys = if args.keys.is_empty() {
                session.district().store().keys()
            } else {
                args.keys.clone()
            };
            let mut writer = TraceWriter::create(path, keys)?;
            info!("Tracing {} keys to {}", writer.keys().len(), path.display());
            writer.record(session.now(), session.frames(), &session.snapshot())?;
            Some(writer)
        }
        None => None,
    };

    let mut ticker = args.realtime.then(|| tokio::time::interval(frame));

    for _ in 0..frames {
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        let fired = session.step();
        if fired > 0 {
            debug!(
                "frame {} at {:?}: {} callbacks",
                session.frames(),
                session.now(),
                fired
            );
        }

        if session.frames() % sample_every == 0 {
            if let Some(writer) = trace.as_mut() {
                writer.record(session.now(), session.frames(), &session.snapshot())?;
            }
        }
    }

    if let Some(writer) = trace {
        let rows = writer.rows();
        writer.finish()?;
        info!("Trace complete: {} rows", rows);
    }

    let summary = session.summary();
    info!(
        "Run complete: {} frames, {} ms simulated, revision {}",
        summary.frames, summary.simulated_ms, summary.snapshot.revision
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
