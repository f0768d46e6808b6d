//! Live tracking loop
//!
//! A `Tracker` emits one trajectory when it starts and then the body's
//! current position at a fixed refresh interval until it is stopped, runs out
//! of updates, or a computation fails.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::earthlib::Observer;
use crate::planetlib::{Body, EphemerisProvider};
use crate::positions::{PositionCalculator, PositionSample, Visibility};
use crate::time::{Time, Timescale};
use crate::trajectory::{sample_trajectory, Trajectory};
use crate::SkytrackError;

/// Longest uninterrupted sleep between stop checks
const STOP_POLL: std::time::Duration = std::time::Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Compute(#[from] SkytrackError),

    #[error("Failed to read tracker config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tracker config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Sink failed: {0}")]
    Sink(String),
}

/// Tracking settings, loadable from JSON
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub refresh_interval_ms: u64,
    pub half_window_min: i64,
    pub step_min: i64,
    /// Recompute the trajectory around each refresh instead of keeping the
    /// one built at start
    pub recenter_every_refresh: bool,
    /// Stop after this many position updates; `None` runs until stopped
    pub max_updates: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            refresh_interval_ms: 1000,
            half_window_min: 6 * 60,
            step_min: 10,
            recenter_every_refresh: false,
            max_updates: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn half_window(&self) -> Result<Duration, SkytrackError> {
        minutes("half_window_min", self.half_window_min)
    }

    pub fn step(&self) -> Result<Duration, SkytrackError> {
        minutes("step_min", self.step_min)
    }
}

fn minutes(field: &str, value: i64) -> Result<Duration, SkytrackError> {
    Duration::try_minutes(value).ok_or_else(|| {
        SkytrackError::InvalidWindow(format!("{} = {} is out of range", field, value))
    })
}

/// Cloneable flag that asks a running tracker to stop
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` in short slices; returns true if stopped meanwhile
    pub fn sleep(&self, duration: std::time::Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_stopped() {
                return true;
            }
            let slice = remaining.min(STOP_POLL);
            thread::sleep(slice);
            remaining -= slice;
        }
        self.is_stopped()
    }
}

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Receives what the tracker computes
pub trait TrackerSink {
    fn on_trajectory(&mut self, trajectory: &Trajectory) -> Result<(), TrackerError>;

    fn on_position(
        &mut self,
        sample: &PositionSample,
        visibility: Visibility,
    ) -> Result<(), TrackerError>;
}

pub struct Tracker<'a, E: EphemerisProvider + ?Sized, C: Clock = SystemClock> {
    calculator: PositionCalculator<'a, E>,
    body: Body,
    observer: Observer,
    config: TrackerConfig,
    timescale: Timescale,
    clock: C,
}

impl<'a, E: EphemerisProvider + ?Sized> Tracker<'a, E, SystemClock> {
    pub fn new(
        calculator: PositionCalculator<'a, E>,
        body: Body,
        observer: Observer,
        config: TrackerConfig,
    ) -> Self {
        Tracker {
            calculator,
            body,
            observer,
            config,
            timescale: Timescale::default(),
            clock: SystemClock,
        }
    }
}

impl<'a, E: EphemerisProvider + ?Sized, C: Clock> Tracker<'a, E, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Tracker<'a, E, C2> {
        Tracker {
            calculator: self.calculator,
            body: self.body,
            observer: self.observer,
            config: self.config,
            timescale: self.timescale,
            clock,
        }
    }

    pub fn with_timescale(mut self, timescale: Timescale) -> Self {
        self.timescale = timescale;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn now(&self) -> Time {
        self.timescale.from_datetime(self.clock.now())
    }

    fn trajectory_around(&self, center: &Time) -> Result<Trajectory, TrackerError> {
        Ok(sample_trajectory(
            &self.calculator,
            self.body,
            &self.observer,
            center,
            self.config.half_window()?,
            self.config.step()?,
        )?)
    }

    /// Run until stopped; returns the number of positions emitted
    ///
    /// With `recenter_every_refresh`, every refresh after the first is
    /// preceded by a trajectory centred on that refresh's instant; the first
    /// refresh reuses the trajectory built at start.
    pub fn run<S: TrackerSink + ?Sized>(
        &self,
        sink: &mut S,
        stop: &StopSignal,
    ) -> Result<u64, TrackerError> {
        info!(
            "Tracking {} from ({}, {}) every {} ms",
            self.body,
            self.observer.latitude(),
            self.observer.longitude(),
            self.config.refresh_interval_ms
        );

        let start = self.now();
        sink.on_trajectory(&self.trajectory_around(&start)?)?;

        let mut updates = 0u64;
        loop {
            if stop.is_stopped() {
                break;
            }
            if self.config.max_updates.is_some_and(|max| updates >= max) {
                break;
            }

            let now = self.now();
            if self.config.recenter_every_refresh && updates > 0 {
                sink.on_trajectory(&self.trajectory_around(&now)?)?;
            }

            let sample = self
                .calculator
                .compute_position(self.body, &self.observer, &now)?;
            debug!(
                "{} at {}: az {:.4} el {:.4}",
                self.body, sample.timestamp, sample.azimuth, sample.elevation
            );
            sink.on_position(&sample, sample.visibility())?;
            updates += 1;

            if self.config.max_updates.is_some_and(|max| updates >= max) {
                break;
            }
            if stop.sleep(self.config.refresh_interval()) {
                break;
            }
        }

        info!("Tracking stopped after {} updates", updates);
        Ok(updates)
    }
}
