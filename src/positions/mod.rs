//! Apparent topocentric positions of solar system bodies
//!
//! The reduction follows the usual chain: observer in the GCRS, light-time
//! corrected target, gravitational deflection by the Sun, aberration, then a
//! rotation into the true equator of date and the local horizon.

use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::C_AUDAY;
use crate::earthlib::{EarthOrientation, Observer};
use crate::planetlib::{Body, EphemerisProvider};
use crate::time::Time;
use crate::Result;

/// Schwarzschild radius of the Sun in AU
const SCHWARZSCHILD_RADIUS_SUN: f64 = 1.974_125_743_36e-8;
/// Light-time iteration stops when the correction moves less than this (days)
const LIGHT_TIME_TOLERANCE: f64 = 1e-12;
const LIGHT_TIME_ITERATIONS: usize = 10;

/// Whether a body is above the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Invisible,
}

impl Visibility {
    /// `Visible` only for strictly positive elevations
    pub fn from_elevation(elevation: f64) -> Self {
        if elevation > 0.0 {
            Visibility::Visible
        } else {
            Visibility::Invisible
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Visible => f.write_str("Visible"),
            Visibility::Invisible => f.write_str("Invisible"),
        }
    }
}

/// Where a body appeared in the sky at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Instant of observation
    pub time: DateTime<Utc>,
    /// ISO 8601 UTC timestamp of `time`
    pub timestamp: String,
    /// Degrees east of north, in [0, 360)
    pub azimuth: f64,
    /// Degrees above the horizon, in [-90, 90]
    pub elevation: f64,
    /// Light-time corrected distance in AU
    pub distance_au: f64,
}

impl PositionSample {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_elevation(self.elevation)
    }
}

/// Computes horizon coordinates against a borrowed ephemeris
pub struct PositionCalculator<'a, E: EphemerisProvider + ?Sized> {
    ephemeris: &'a E,
}

impl<'a, E: EphemerisProvider + ?Sized> PositionCalculator<'a, E> {
    pub fn new(ephemeris: &'a E) -> Self {
        Self { ephemeris }
    }

    /// Azimuth and elevation of `body` seen by `observer` at `time`
    pub fn compute_position(
        &self,
        body: Body,
        observer: &Observer,
        time: &Time,
    ) -> Result<PositionSample> {
        let tdb = time.tdb();
        let orientation = EarthOrientation::at(time);

        // Observer relative to the solar system barycenter
        let earth = self.ephemeris.barycentric_state(Body::Earth.naif_id(), tdb)?;
        let (geo_position, geo_velocity) = observer.gcrs_position_velocity(&orientation);
        let observer_position = earth.position.coords + geo_position;
        let observer_velocity = earth.velocity + geo_velocity;

        // Light-time corrected geometric vector
        let mut light_time = 0.0;
        let mut target = self
            .ephemeris
            .barycentric_state(body.naif_id(), tdb)?
            .position
            .coords;
        for _ in 0..LIGHT_TIME_ITERATIONS {
            let distance = (target - observer_position).norm();
            let corrected = distance / C_AUDAY;
            if (corrected - light_time).abs() < LIGHT_TIME_TOLERANCE {
                break;
            }
            light_time = corrected;
            target = self
                .ephemeris
                .barycentric_state(body.naif_id(), tdb - light_time)?
                .position
                .coords;
        }
        let geometric = target - observer_position;
        let distance = geometric.norm();

        let sun = self
            .ephemeris
            .barycentric_state(Body::Sun.naif_id(), tdb)?
            .position
            .coords;
        let sun_to_observer = observer_position - sun;

        let mut direction = geometric / distance;
        if body != Body::Sun {
            direction = deflect(direction, target - sun, sun_to_observer);
        }
        let direction = aberrate(
            direction,
            observer_velocity / C_AUDAY,
            sun_to_observer.norm(),
        );

        let local = observer.horizon_matrix(&orientation) * orientation.gcrs_to_tod * direction;
        let (azimuth, elevation) = horizontal_angles(&local);

        Ok(PositionSample {
            time: time.utc_datetime(),
            timestamp: time.utc_iso(),
            azimuth,
            elevation,
            distance_au: distance,
        })
    }
}

/// Resolve raw boundary inputs and compute a single position
pub fn compute_position<E: EphemerisProvider + ?Sized>(
    ephemeris: &E,
    body_name: &str,
    latitude: f64,
    longitude: f64,
    time: &Time,
) -> Result<PositionSample> {
    let body: Body = body_name.parse()?;
    let observer = Observer::new(latitude, longitude)?;
    PositionCalculator::new(ephemeris).compute_position(body, &observer, time)
}

/// Bend a unit direction `p` for the Sun's gravity
///
/// `source` is the Sun -> source vector and `sun_to_observer` the
/// Sun -> observer vector, both in AU.
fn deflect(p: Vector3<f64>, source: Vector3<f64>, sun_to_observer: Vector3<f64>) -> Vector3<f64> {
    let em = sun_to_observer.norm();
    let q = source.normalize();
    let e = sun_to_observer / em;

    let qpe = q + e;
    let qdqpe = q.dot(&qpe);
    let dlim = 1e-6 / (em * em).max(1.0);
    let w = SCHWARZSCHILD_RADIUS_SUN / em / qdqpe.max(dlim);

    let eq = e.cross(&q);
    let peq = p.cross(&eq);
    (p + w * peq).normalize()
}

/// Apply stellar aberration to a unit direction for an observer moving at `v`
/// (units of c), `sun_distance` AU from the Sun
fn aberrate(p: Vector3<f64>, v: Vector3<f64>, sun_distance: f64) -> Vector3<f64> {
    let pdv = p.dot(&v);
    let bm1 = (1.0 - v.norm_squared()).sqrt();
    let w1 = 1.0 + pdv / (1.0 + bm1);
    let w2 = SCHWARZSCHILD_RADIUS_SUN / sun_distance;

    (p * bm1 + w1 * v + w2 * (v - pdv * p)).normalize()
}

/// Azimuth in [0, 360) and elevation from a (north, east, up) vector
fn horizontal_angles(local: &Vector3<f64>) -> (f64, f64) {
    let elevation = (local.z / local.norm()).clamp(-1.0, 1.0).asin().to_degrees();
    let mut azimuth = local.y.atan2(local.x).to_degrees().rem_euclid(360.0);
    if azimuth >= 360.0 {
        azimuth = 0.0;
    }
    (azimuth, elevation)
}
