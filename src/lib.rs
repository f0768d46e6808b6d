//! Skytrack: where a solar system body sits in the sky, right now
//!
//! This crate reads JPL planetary ephemerides and reduces them to the
//! azimuth and elevation of a body seen from a point on the Earth, either at
//! one instant or as a trajectory sampled around it.
//!
//! ```no_run
//! use skytrack::{Body, Loader, Observer, PositionCalculator};
//!
//! let loader = Loader::new();
//! let ephemeris = loader.load_ephemeris()?;
//! let observer = Observer::new(-23.5505, -46.6333)?;
//! let now = loader.timescale().now();
//!
//! let sample = PositionCalculator::new(&ephemeris).compute_position(Body::Moon, &observer, &now)?;
//! println!("{} az {:.2} el {:.2}", sample.timestamp, sample.azimuth, sample.elevation);
//! # Ok::<(), skytrack::SkytrackError>(())
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod constants;
pub mod coordinates;
pub mod data;
pub mod earthlib;
pub mod jplephem;
pub mod nutationlib;
pub mod planetlib;
pub mod positions;
pub mod precessionlib;
pub mod time;
pub mod tracker;
pub mod trajectory;

// Re-export commonly used types
pub use coordinates::angle::{to_degrees_minutes_seconds, Dms};
pub use earthlib::Observer;
pub use planetlib::{Body, EphemerisProvider, SpkEphemeris};
pub use positions::{compute_position, PositionCalculator, PositionSample, Visibility};
pub use time::{Time, Timescale};
pub use tracker::{StopSignal, Tracker, TrackerConfig, TrackerSink};
pub use trajectory::{sample_trajectory, Trajectory};

use crate::jplephem::JplephemError;

/// Main error type for the skytrack library
#[derive(Debug, Error)]
pub enum SkytrackError {
    #[error("Unknown body: {0:?}")]
    InvalidBody(String),

    #[error("Failed to load ephemeris {path:?}: {source}")]
    EphemerisLoad {
        path: PathBuf,
        #[source]
        source: JplephemError,
    },

    #[error("Invalid observer location: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid sampling window: {0}")]
    InvalidWindow(String),

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] JplephemError),

    #[error("Time error: {0}")]
    Time(#[from] time::TimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data error: {0}")]
    Data(String),
}

impl From<planetlib::PlanetError> for SkytrackError {
    fn from(err: planetlib::PlanetError) -> Self {
        match err {
            planetlib::PlanetError::UnknownBody(name) => SkytrackError::InvalidBody(name),
            planetlib::PlanetError::Ephemeris(e) => SkytrackError::Ephemeris(e),
        }
    }
}

impl From<earthlib::InvalidCoordinate> for SkytrackError {
    fn from(err: earthlib::InvalidCoordinate) -> Self {
        SkytrackError::InvalidCoordinate {
            latitude: err.latitude,
            longitude: err.longitude,
        }
    }
}

/// Result type for skytrack operations
pub type Result<T> = std::result::Result<T, SkytrackError>;

/// Entry point for loading ephemerides and timescales
#[derive(Debug, Clone)]
pub struct Loader {
    data_dir: Option<PathBuf>,
}

impl Loader {
    /// Create a new loader using the cache directory
    pub fn new() -> Self {
        Self { data_dir: None }
    }

    /// Set a custom data directory
    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(data::get_cache_dir)
    }

    /// Open the default ephemeris, downloading it if absent
    pub fn load_ephemeris(&self) -> Result<SpkEphemeris> {
        self.load_named_ephemeris(data::DEFAULT_EPHEMERIS)
    }

    /// Open `name` from the data directory, downloading it if absent
    pub fn load_named_ephemeris(&self, name: &str) -> Result<SpkEphemeris> {
        let dir = self.data_dir();
        std::fs::create_dir_all(&dir)?;
        let path = data::download_ephemeris_to(&dir, name)?;
        open_ephemeris(path)
    }

    /// Load a timescale for time conversions
    pub fn timescale(&self) -> Timescale {
        Timescale::default()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Open an SPK file at an explicit path
pub fn open_ephemeris<P: AsRef<Path>>(path: P) -> Result<SpkEphemeris> {
    SpkEphemeris::open(path.as_ref()).map_err(|source| SkytrackError::EphemerisLoad {
        path: path.as_ref().to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jplephem::tests::{linear_segment, write_spk};

    #[test]
    fn test_loader_uses_cached_file() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![linear_segment(0, 399, 2_451_545.0, 2_451_645.0, 4, [1.5e8, 0.0, 0.0], [0.0, 30.0, 0.0])];
        write_spk(&dir.path().join("test.bsp"), "fixture", &segments, false).unwrap();

        let loader = Loader::new().with_data_dir(dir.path());
        assert_eq!(loader.data_dir(), dir.path());
        let ephemeris = loader.load_named_ephemeris("test.bsp").unwrap();
        assert_eq!(ephemeris.path(), dir.path().join("test.bsp"));
    }

    #[test]
    fn test_unreadable_ephemeris_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bsp");
        std::fs::write(&path, vec![7u8; 2048]).unwrap();

        match open_ephemeris(&path) {
            Err(SkytrackError::EphemerisLoad { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected EphemerisLoad, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            open_ephemeris(dir.path().join("missing.bsp")),
            Err(SkytrackError::EphemerisLoad { .. })
        ));
    }

    #[test]
    fn test_error_conversions() {
        let err: SkytrackError = planetlib::PlanetError::UnknownBody("Vulcan".into()).into();
        assert!(matches!(err, SkytrackError::InvalidBody(ref name) if name == "Vulcan"));

        let err: SkytrackError = Observer::new(100.0, 0.0).unwrap_err().into();
        assert_eq!(err.to_string(), "Invalid observer location: latitude 100, longitude 0");
    }
}
