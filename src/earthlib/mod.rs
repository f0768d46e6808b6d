//! Earth orientation and observer positions
//!
//! Everything needed to put a geodetic observer into the GCRS and to turn a
//! GCRS direction into local horizon coordinates:
//!
//! - Earth rotation angle and Greenwich mean/apparent sidereal time
//! - the combined bias-precession-nutation matrix (GCRS -> true of date)
//! - WGS84 geodetic to Earth-fixed conversion
//!
//! Polar motion and UT1 - UTC are ignored.

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

use crate::constants::{
    AU_M, DAY_S, EARTH_ANGVEL, J2000, JULIAN_CENTURY, WGS84_INVERSE_FLATTENING, WGS84_RADIUS,
};
use crate::nutationlib::Nutation;
use crate::precessionlib::{compute_precession, ICRS_TO_J2000};
use crate::time::Time;

/// Observer coordinates outside the valid ranges
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid observer coordinates: latitude {latitude}, longitude {longitude}, elevation {elevation_m} m")]
pub struct InvalidCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
}

/// Earth rotation angle in fractions of a turn (IAU 2000)
pub fn earth_rotation_angle(jd_ut1: f64, fraction_ut1: f64) -> f64 {
    let th = 0.779_057_273_264_0 + 0.002_737_811_911_354_48 * (jd_ut1 - J2000 + fraction_ut1);
    (th.rem_euclid(1.0) + jd_ut1.rem_euclid(1.0) + fraction_ut1.rem_euclid(1.0)).rem_euclid(1.0)
}

/// Greenwich mean sidereal time in hours (IAU 2006)
pub fn sidereal_time(time: &Time) -> f64 {
    let theta = earth_rotation_angle(time.whole(), time.ut1() - time.whole());
    let t = (time.tdb() - J2000) / JULIAN_CENTURY;

    // Precession-in-RA part of GMST, in arcseconds
    let st = 0.014_506
        + ((((-0.000_000_036_8 * t - 0.000_029_956) * t - 0.000_000_44) * t + 1.391_581_7) * t
            + 4612.156_534)
            * t;

    (st / 54_000.0 + theta * 24.0).rem_euclid(24.0)
}

/// Orientation of the Earth at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct EarthOrientation {
    /// Rotation from GCRS to the true equator and equinox of date
    pub gcrs_to_tod: Matrix3<f64>,
    /// Greenwich mean sidereal time (hours)
    pub gmst: f64,
    /// Greenwich apparent sidereal time (hours)
    pub gast: f64,
}

impl EarthOrientation {
    pub fn at(time: &Time) -> Self {
        let nutation = Nutation::at(time);
        let precession = compute_precession(time.tdb());
        let gcrs_to_tod = nutation.matrix() * precession * *ICRS_TO_J2000;

        let gmst = sidereal_time(time);
        let gast = (gmst + nutation.equation_of_the_equinoxes().to_degrees() / 15.0).rem_euclid(24.0);

        EarthOrientation {
            gcrs_to_tod,
            gmst,
            gast,
        }
    }

    /// Greenwich apparent sidereal time in radians
    pub fn gast_radians(&self) -> f64 {
        (self.gast * 15.0).to_radians()
    }
}

/// A point on the Earth's surface (WGS84)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    latitude: f64,
    longitude: f64,
    elevation_m: f64,
}

impl Observer {
    /// Observer at sea level; latitude in [-90, 90], longitude in [-180, 180] degrees
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        Self::with_elevation(latitude, longitude, 0.0)
    }

    /// Observer at `elevation_m` metres above the ellipsoid
    pub fn with_elevation(
        latitude: f64,
        longitude: f64,
        elevation_m: f64,
    ) -> Result<Self, InvalidCoordinate> {
        let valid = (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
            && elevation_m.is_finite();
        if !valid {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                elevation_m,
            });
        }
        Ok(Observer {
            latitude,
            longitude,
            elevation_m,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn elevation_m(&self) -> f64 {
        self.elevation_m
    }

    /// Earth-fixed position in AU
    pub fn itrs_position(&self) -> Vector3<f64> {
        let f = 1.0 / WGS84_INVERSE_FLATTENING;
        let e2 = f * (2.0 - f);
        let (sin_lat, cos_lat) = self.latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude.to_radians().sin_cos();

        let n = WGS84_RADIUS / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let xy = (n + self.elevation_m) * cos_lat;
        let z = (n * (1.0 - e2) + self.elevation_m) * sin_lat;

        Vector3::new(xy * cos_lon, xy * sin_lon, z) / AU_M
    }

    /// Geocentric position (AU) and velocity (AU/day) in the GCRS
    pub fn gcrs_position_velocity(
        &self,
        orientation: &EarthOrientation,
    ) -> (Vector3<f64>, Vector3<f64>) {
        // Earth-fixed -> true of date is a rotation by GAST about the pole
        let (s, c) = orientation.gast_radians().sin_cos();
        let r = self.itrs_position();
        let tod = Vector3::new(c * r.x - s * r.y, s * r.x + c * r.y, r.z);

        let omega = Vector3::new(0.0, 0.0, EARTH_ANGVEL * DAY_S);
        let tod_velocity = omega.cross(&tod);

        let tod_to_gcrs = orientation.gcrs_to_tod.transpose();
        (tod_to_gcrs * tod, tod_to_gcrs * tod_velocity)
    }

    /// Rotation from true-of-date axes to local (north, east, up) axes
    pub fn horizon_matrix(&self, orientation: &EarthOrientation) -> Matrix3<f64> {
        let last = orientation.gast_radians() + self.longitude.to_radians();
        let (sin_lat, cos_lat) = self.latitude.to_radians().sin_cos();
        let (sin_t, cos_t) = last.sin_cos();

        Matrix3::new(
            -sin_lat * cos_t,
            -sin_lat * sin_t,
            cos_lat,
            -sin_t,
            cos_t,
            0.0,
            cos_lat * cos_t,
            cos_lat * sin_t,
            sin_lat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[test]
    fn test_gmst_at_j2000() {
        // IAU value at 2000-01-01 12h UT1: 18h 41m 50.54841s
        let time = Time::new(Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap());
        assert_relative_eq!(sidereal_time(&time), 18.697_374_558, epsilon = 1e-5);
    }

    #[test]
    fn test_era_advances_one_turn_per_sidereal_day() {
        let era0 = earth_rotation_angle(2_460_000.5, 0.0);
        let era1 = earth_rotation_angle(2_460_000.5, 0.997_269_566_3);
        let turns = (era1 - era0).rem_euclid(1.0);
        assert!(turns < 1e-6 || turns > 1.0 - 1e-6, "advanced {} turns", turns);
    }

    #[test]
    fn test_orientation_matrix_is_a_rotation() {
        let time = Time::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let orientation = EarthOrientation::at(&time);
        let m = orientation.gcrs_to_tod;

        assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-13);
        // GAST - GMST is the equation of the equinoxes, at most about 1.2 s
        let diff_s = (orientation.gast - orientation.gmst) * 3600.0;
        assert!(diff_s.abs() < 1.2, "GAST - GMST = {} s", diff_s);
    }

    #[rstest]
    #[case(-23.5505, -46.6333, 0.0)]
    #[case(90.0, 180.0, 0.0)]
    #[case(-90.0, -180.0, 8848.0)]
    fn test_valid_observers(#[case] lat: f64, #[case] lon: f64, #[case] elevation: f64) {
        let observer = Observer::with_elevation(lat, lon, elevation).unwrap();
        assert_eq!(observer.latitude(), lat);
        assert_eq!(observer.longitude(), lon);
    }

    #[rstest]
    #[case(90.5, 0.0, 0.0)]
    #[case(-91.0, 0.0, 0.0)]
    #[case(0.0, 180.1, 0.0)]
    #[case(0.0, -200.0, 0.0)]
    #[case(f64::NAN, 0.0, 0.0)]
    #[case(0.0, 0.0, f64::INFINITY)]
    fn test_invalid_observers(#[case] lat: f64, #[case] lon: f64, #[case] elevation: f64) {
        assert!(Observer::with_elevation(lat, lon, elevation).is_err());
    }

    #[test]
    fn test_wgs84_positions() {
        let equator = Observer::new(0.0, 0.0).unwrap().itrs_position() * AU_M;
        assert_relative_eq!(equator.x, WGS84_RADIUS, epsilon = 1e-6);
        assert_relative_eq!(equator.y, 0.0, epsilon = 1e-6);

        let pole = Observer::new(90.0, 0.0).unwrap().itrs_position() * AU_M;
        assert_relative_eq!(pole.z, 6_356_752.314, epsilon = 1e-3);

        let high = Observer::with_elevation(0.0, 90.0, 1000.0).unwrap().itrs_position() * AU_M;
        assert_relative_eq!(high.y, WGS84_RADIUS + 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_observer_motion_and_axes() {
        let time = Time::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let orientation = EarthOrientation::at(&time);
        let observer = Observer::new(0.0, 30.0).unwrap();

        let (position, velocity) = observer.gcrs_position_velocity(&orientation);
        assert_relative_eq!(position.norm() * AU_M, WGS84_RADIUS, epsilon = 1e-3);
        // Equatorial rotation speed is about 465 m/s
        assert_relative_eq!(velocity.norm() * AU_M / DAY_S, 465.1, epsilon = 0.1);

        let h = observer.horizon_matrix(&orientation);
        assert_relative_eq!(h * h.transpose(), Matrix3::identity(), epsilon = 1e-14);

        // On the equator the local vertical points away from the geocenter
        let up = (h * orientation.gcrs_to_tod).transpose() * Vector3::z();
        assert_relative_eq!(up, position.normalize(), epsilon = 1e-12);
    }
}
