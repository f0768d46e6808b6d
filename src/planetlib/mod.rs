//! Planetary ephemeris calculations module
//!
//! `Body` names the bodies a user can track, `EphemerisProvider` is the seam
//! through which the position calculator asks for barycentric states, and
//! `SpkEphemeris` answers those requests from a JPL SPK file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::AU_KM;
use crate::jplephem::{JplephemError, SPK};

/// Longest center chain followed before giving up (DE kernels need two links)
const MAX_CHAIN_LENGTH: usize = 8;

/// Error type for planetary calculations
#[derive(Debug, Error)]
pub enum PlanetError {
    #[error("Unknown body: {0:?}")]
    UnknownBody(String),

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] JplephemError),
}

/// Major solar system bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    /// Every trackable body, in menu order
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Moon,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    /// Get the body's name
    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }

    /// Get the NAIF SPICE ID looked up in the ephemeris
    ///
    /// DE421 carries no planet-center segments beyond Mars, so the outer
    /// planets resolve to their system barycenters.
    pub fn naif_id(&self) -> i32 {
        match self {
            Body::Sun => 10,
            Body::Mercury => 199,
            Body::Venus => 299,
            Body::Earth => 399,
            Body::Moon => 301,
            Body::Mars => 499,
            Body::Jupiter => 5,
            Body::Saturn => 6,
            Body::Uranus => 7,
            Body::Neptune => 8,
            Body::Pluto => 9,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive, ignoring surrounding whitespace
impl FromStr for Body {
    type Err = PlanetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Body::ALL
            .iter()
            .find(|body| body.name().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| PlanetError::UnknownBody(s.to_string()))
    }
}

/// A planet's state (position + velocity) at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetState {
    /// Position in AU (relative to SSB, ICRF axes)
    pub position: Point3<f64>,
    /// Velocity in AU/day
    pub velocity: Vector3<f64>,
}

/// Source of barycentric body states
pub trait EphemerisProvider {
    /// State of NAIF body `target` relative to the solar system barycenter
    /// at the TDB Julian date `tdb_jd`
    fn barycentric_state(&self, target: i32, tdb_jd: f64) -> Result<PlanetState, PlanetError>;
}

/// Planetary ephemeris backed by an SPK file
pub struct SpkEphemeris {
    path: PathBuf,
    spk: SPK,
}

impl SpkEphemeris {
    /// Open and index an SPK file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JplephemError> {
        let path = path.as_ref().to_path_buf();
        let spk = SPK::open(&path)?;
        info!(
            "Loaded ephemeris {} ({} segments)",
            path.display(),
            spk.segments.len()
        );
        Ok(Self { path, spk })
    }

    /// Path of the file this ephemeris was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Access the underlying SPK
    pub fn spk(&self) -> &SPK {
        &self.spk
    }

    /// TDB Julian date span covered by every segment in the file
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let start = self.spk.segments.iter().map(|s| s.start_jd).reduce(f64::max)?;
        let end = self.spk.segments.iter().map(|s| s.end_jd).reduce(f64::min)?;
        Some((start, end))
    }
}

impl EphemerisProvider for SpkEphemeris {
    fn barycentric_state(&self, target: i32, tdb_jd: f64) -> Result<PlanetState, PlanetError> {
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();

        // Sum segment states along the chain, e.g. 399 -> 3 -> 0
        let mut body = target;
        let mut links = 0;
        while body != 0 {
            if links == MAX_CHAIN_LENGTH {
                return Err(JplephemError::BodyNotFound { center: 0, target }.into());
            }
            let center = self
                .spk
                .center_of(body)
                .ok_or(JplephemError::BodyNotFound { center: 0, target })?;
            let (p, v) = self.spk.compute_and_differentiate(center, body, tdb_jd, 0.0)?;
            position += p;
            velocity += v;
            body = center;
            links += 1;
        }

        Ok(PlanetState {
            position: Point3::from(position / AU_KM),
            velocity: velocity / AU_KM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DAY_S;
    use crate::jplephem::tests::{fixed_type3_segment, linear_segment, write_spk};
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("moon", Body::Moon)]
    #[case("  MOON ", Body::Moon)]
    #[case("\tpluto\n", Body::Pluto)]
    #[case("Mars", Body::Mars)]
    #[case("jUpItEr", Body::Jupiter)]
    #[case("sun", Body::Sun)]
    fn test_body_parsing(#[case] input: &str, #[case] expected: Body) {
        assert_eq!(input.parse::<Body>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("vulcan")]
    #[case("earth moon")]
    fn test_unknown_body(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Body>(),
            Err(PlanetError::UnknownBody(_))
        ));
    }

    #[test]
    fn test_naif_ids() {
        assert_eq!(Body::Moon.naif_id(), 301);
        assert_eq!(Body::Earth.naif_id(), 399);
        assert_eq!(Body::Jupiter.naif_id(), 5);
        assert_eq!(Body::Pluto.naif_id(), 9);
        for body in Body::ALL {
            assert_eq!(body.name().parse::<Body>().unwrap(), body);
        }
    }

    fn kernel(dir: &TempDir) -> SpkEphemeris {
        let path = dir.path().join("chain.bsp");
        let segments = vec![
            linear_segment(0, 3, 2451000.5, 2452000.5, 4, [AU_KM, 0.0, 0.0], [0.0, 30.0, 0.0]),
            linear_segment(3, 399, 2451000.5, 2452000.5, 4, [-4670.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            fixed_type3_segment(3, 301, 2451000.5, 2452000.5, [380_000.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        write_spk(&path, "", &segments, false).unwrap();
        SpkEphemeris::open(&path).unwrap()
    }

    #[test]
    fn test_chain_is_summed_to_the_barycenter() {
        let dir = TempDir::new().unwrap();
        let ephemeris = kernel(&dir);

        let earth = ephemeris.barycentric_state(399, 2451000.5).unwrap();
        assert_relative_eq!(earth.position.x, 1.0 - 4670.0 / AU_KM, epsilon = 1e-12);
        assert_relative_eq!(earth.velocity.y, 30.0 * DAY_S / AU_KM, epsilon = 1e-12);

        let moon = ephemeris.barycentric_state(301, 2451000.5).unwrap();
        assert_relative_eq!(moon.position.x, 1.0 + 380_000.0 / AU_KM, epsilon = 1e-12);
        assert_relative_eq!(
            moon.velocity.y,
            (30.0 + 1.0) * DAY_S / AU_KM,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_body_and_range() {
        let dir = TempDir::new().unwrap();
        let ephemeris = kernel(&dir);

        assert!(matches!(
            ephemeris.barycentric_state(10, 2451500.0),
            Err(PlanetError::Ephemeris(JplephemError::BodyNotFound { target: 10, .. }))
        ));
        assert!(matches!(
            ephemeris.barycentric_state(399, 2460000.5),
            Err(PlanetError::Ephemeris(JplephemError::OutOfRange { .. }))
        ));

        let (start, end) = ephemeris.time_span().unwrap();
        assert_relative_eq!(start, 2451000.5, epsilon = 1e-9);
        assert_relative_eq!(end, 2452000.5, epsilon = 1e-9);
    }
}
