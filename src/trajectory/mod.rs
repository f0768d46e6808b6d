//! Fixed-cadence position samples around a reference time

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::earthlib::Observer;
use crate::planetlib::{Body, EphemerisProvider};
use crate::positions::{PositionCalculator, PositionSample};
use crate::time::Time;
use crate::{Result, SkytrackError};

/// Default half width of the sampled window
pub fn default_half_window() -> Duration {
    Duration::hours(6)
}

/// Default spacing between samples
pub fn default_step() -> Duration {
    Duration::minutes(10)
}

fn serialize_seconds<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_seconds())
}

/// Ordered samples of one body's path across the sky
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    body: Body,
    center: DateTime<Utc>,
    #[serde(rename = "half_window_s", serialize_with = "serialize_seconds")]
    half_window: Duration,
    #[serde(rename = "step_s", serialize_with = "serialize_seconds")]
    step: Duration,
    samples: Vec<PositionSample>,
}

impl Trajectory {
    /// Samples over `[start, start + span]`
    ///
    /// The dashboard's forward-looking view used a 12 hour span.
    pub fn forward<E: EphemerisProvider + ?Sized>(
        calculator: &PositionCalculator<'_, E>,
        body: Body,
        observer: &Observer,
        start: &Time,
        span: Duration,
        step: Duration,
    ) -> Result<Self> {
        if span < Duration::zero() {
            return Err(SkytrackError::InvalidWindow(format!("negative span {}", span)));
        }
        let mut trajectory = sample_range(calculator, body, observer, start, span, step)?;
        trajectory.half_window = span / 2;
        Ok(trajectory)
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn center(&self) -> DateTime<Utc> {
        self.center
    }

    pub fn half_window(&self) -> Duration {
        self.half_window
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PositionSample> {
        self.samples.iter()
    }

    pub fn into_samples(self) -> Vec<PositionSample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a PositionSample;
    type IntoIter = std::slice::Iter<'a, PositionSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Sample `body` every `step` from `center - half_window` to
/// `center + half_window` inclusive
///
/// With the defaults (6 h, 10 min) this gives 73 samples. The first failed
/// position aborts the whole trajectory.
pub fn sample_trajectory<E: EphemerisProvider + ?Sized>(
    calculator: &PositionCalculator<'_, E>,
    body: Body,
    observer: &Observer,
    center: &Time,
    half_window: Duration,
    step: Duration,
) -> Result<Trajectory> {
    if half_window < Duration::zero() {
        return Err(SkytrackError::InvalidWindow(format!(
            "negative half window {}",
            half_window
        )));
    }
    let span = half_window
        .checked_mul(2)
        .ok_or_else(|| out_of_range(half_window))?;
    let start = center
        .checked_sub(half_window)
        .ok_or_else(|| out_of_range(half_window))?;
    let mut trajectory = sample_range(calculator, body, observer, &start, span, step)?;
    trajectory.center = center.utc_datetime();
    Ok(trajectory)
}

fn out_of_range(half_window: Duration) -> SkytrackError {
    SkytrackError::InvalidWindow(format!(
        "half window of {} days leaves the supported date range",
        half_window.num_days()
    ))
}

fn sample_range<E: EphemerisProvider + ?Sized>(
    calculator: &PositionCalculator<'_, E>,
    body: Body,
    observer: &Observer,
    start: &Time,
    span: Duration,
    step: Duration,
) -> Result<Trajectory> {
    // Whole milliseconds, so every offset is exact
    let step_ms = step.num_milliseconds();
    if step_ms < 1 || step != Duration::milliseconds(step_ms) {
        return Err(SkytrackError::InvalidWindow(format!(
            "step must be a positive whole number of milliseconds, got {}",
            step
        )));
    }
    let end = start
        .checked_add(span)
        .ok_or_else(|| SkytrackError::InvalidWindow(format!("span {} ends out of range", span)))?;
    let count = span.num_milliseconds() / step_ms + 1;
    log::debug!("Sampling {} positions of {} from {}", count, body, start);

    let samples = (0..count)
        .map(|i| {
            // Offsets from the start, so rounding never accumulates
            let time = start.clone() + Duration::milliseconds(step_ms * i);
            calculator.compute_position(body, observer, &time)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Trajectory {
        body,
        center: start.utc_datetime() + (&end - start) / 2,
        half_window: span / 2,
        step,
        samples,
    })
}
