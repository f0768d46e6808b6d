//! Live azimuth and elevation of a solar system body
//!
//! Usage:
//!   cargo run --bin skytrack -- --body mars --lat 51.48 --lon 0.0 --updates 5

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use env_logger::{Builder, Target};
use log::error;
use serde_json::json;

use skytrack::tracker::{FixedClock, TrackerError};
use skytrack::{
    open_ephemeris, to_degrees_minutes_seconds, Body, Loader, Observer, PositionCalculator,
    PositionSample, SkytrackError, StopSignal, Tracker, TrackerConfig, TrackerSink, Trajectory,
    Visibility,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tracks a solar system body across the sky from a location on Earth",
    long_about = None
)]
struct Args {
    /// Body to track (sun, moon, mercury ... pluto)
    #[arg(short, long, default_value = "moon")]
    body: String,

    /// Observer latitude in degrees
    #[arg(long, default_value_t = -23.5505, allow_hyphen_values = true)]
    lat: f64,

    /// Observer longitude in degrees
    #[arg(long, default_value_t = -46.6333, allow_hyphen_values = true)]
    lon: f64,

    /// Observer height above the WGS84 ellipsoid in metres
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    elevation_m: f64,

    /// SPK ephemeris file (defaults to de421.bsp in the cache directory)
    #[arg(short, long)]
    ephemeris: Option<PathBuf>,

    /// Track as if the clock were stopped at this RFC 3339 instant
    #[arg(long)]
    at: Option<String>,

    /// Tracker settings as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between position updates
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many position updates
    #[arg(short = 'n', long)]
    updates: Option<u64>,

    /// Rebuild the trajectory around every update
    #[arg(long, action = ArgAction::SetTrue)]
    recenter: bool,

    /// Half width of the trajectory window in minutes
    #[arg(long)]
    half_window_min: Option<i64>,

    /// Minutes between trajectory samples
    #[arg(long)]
    step_min: Option<i64>,

    /// Emit one JSON document per event instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

impl Args {
    fn tracker_config(&self) -> Result<TrackerConfig, TrackerError> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)?,
            None => TrackerConfig::default(),
        };
        if let Some(ms) = self.interval_ms {
            config.refresh_interval_ms = ms;
        }
        if let Some(n) = self.updates {
            config.max_updates = Some(n);
        }
        if let Some(minutes) = self.half_window_min {
            config.half_window_min = minutes;
        }
        if let Some(minutes) = self.step_min {
            config.step_min = minutes;
        }
        config.recenter_every_refresh |= self.recenter;
        Ok(config)
    }
}

struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TrackerSink for TextSink<W> {
    fn on_trajectory(&mut self, trajectory: &Trajectory) -> Result<(), TrackerError> {
        writeln!(
            self.out,
            "Trajectory of {} around {} ({} samples)",
            trajectory.body(),
            trajectory.center().format("%Y-%m-%d %H:%M:%S UTC"),
            trajectory.len()
        )?;
        writeln!(
            self.out,
            "{:<22} {:>10} {:>10}  {}",
            "UTC", "Azimuth", "Elevation", "Visibility"
        )?;
        for sample in trajectory {
            writeln!(
                self.out,
                "{:<22} {:>10.4} {:>10.4}  {}",
                sample.timestamp,
                sample.azimuth,
                sample.elevation,
                sample.visibility()
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn on_position(
        &mut self,
        sample: &PositionSample,
        visibility: Visibility,
    ) -> Result<(), TrackerError> {
        writeln!(
            self.out,
            "{}  az {:>9.4}° ({})  el {:>8.4}° ({})  {}",
            sample.timestamp,
            sample.azimuth,
            to_degrees_minutes_seconds(sample.azimuth),
            sample.elevation,
            to_degrees_minutes_seconds(sample.elevation),
            visibility
        )?;
        self.out.flush()?;
        Ok(())
    }
}

struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    fn emit(&mut self, value: serde_json::Value) -> Result<(), TrackerError> {
        serde_json::to_writer(&mut self.out, &value)
            .map_err(|e| TrackerError::Sink(e.to_string()))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> TrackerSink for JsonSink<W> {
    fn on_trajectory(&mut self, trajectory: &Trajectory) -> Result<(), TrackerError> {
        self.emit(json!({ "event": "trajectory", "trajectory": trajectory }))
    }

    fn on_position(
        &mut self,
        sample: &PositionSample,
        visibility: Visibility,
    ) -> Result<(), TrackerError> {
        self.emit(json!({
            "event": "position",
            "sample": sample,
            "visibility": visibility.to_string(),
            "azimuth_dms": to_degrees_minutes_seconds(sample.azimuth),
            "elevation_dms": to_degrees_minutes_seconds(sample.elevation),
        }))
    }
}

fn run(args: Args) -> Result<u64, TrackerError> {
    let config = args.tracker_config()?;
    let body: Body = args.body.parse().map_err(SkytrackError::from)?;
    let observer = Observer::with_elevation(args.lat, args.lon, args.elevation_m)
        .map_err(SkytrackError::from)?;

    let loader = Loader::new();
    let ephemeris = match &args.ephemeris {
        Some(path) => open_ephemeris(path)?,
        None => loader.load_ephemeris()?,
    };
    let timescale = loader.timescale();

    let tracker = Tracker::new(PositionCalculator::new(&ephemeris), body, observer, config)
        .with_timescale(timescale.clone());
    let stop = StopSignal::new();
    let stdout = io::stdout().lock();

    match &args.at {
        Some(text) => {
            let at = timescale.parse_utc(text).map_err(SkytrackError::from)?;
            let tracker = tracker.with_clock(FixedClock(at.utc_datetime()));
            if args.json {
                tracker.run(&mut JsonSink { out: stdout }, &stop)
            } else {
                tracker.run(&mut TextSink { out: stdout }, &stop)
            }
        }
        None if args.json => tracker.run(&mut JsonSink { out: stdout }, &stop),
        None => tracker.run(&mut TextSink { out: stdout }, &stop),
    }
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    match run(Args::parse()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
