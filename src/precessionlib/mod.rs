//! Precession of the Earth's mean equator (IAU 2006)
//!
//! Positions from the ephemeris are in the GCRS/ICRS axes. Reaching the mean
//! equator and equinox of date takes the frame bias (ICRS -> J2000 mean
//! equator) followed by the precession matrix built from the Capitaine et al.
//! (2003) angles adopted by the IAU in 2006.

use lazy_static::lazy_static;
use nalgebra::Matrix3;

use crate::constants::{ASEC2RAD, J2000, JULIAN_CENTURY};

/// Obliquity of the ecliptic at J2000.0 in arcseconds (IAU 2006)
pub const EPS0_ARCSEC: f64 = 84_381.406;

lazy_static! {
    /// Frame bias from ICRS to the dynamical mean equator and equinox of J2000.0
    pub static ref ICRS_TO_J2000: Matrix3<f64> = {
        let xi0 = -0.016_617_0 * ASEC2RAD;
        let eta0 = -0.006_819_2 * ASEC2RAD;
        let da0 = -0.014_60 * ASEC2RAD;

        let yx = -da0;
        let zx = xi0;
        let xy = da0;
        let zy = eta0;
        let xz = -xi0;
        let yz = -eta0;

        let xx = 1.0 - 0.5 * (yx * yx + zx * zx);
        let yy = 1.0 - 0.5 * (yx * yx + zy * zy);
        let zz = 1.0 - 0.5 * (zy * zy + zx * zx);

        Matrix3::new(xx, xy, xz, yx, yy, yz, zx, zy, zz)
    };
}

/// Rotation from the J2000 mean equator to the mean equator of date
///
/// `jd_tdb` is the TDB Julian date; TT may be passed instead with no
/// measurable difference.
pub fn compute_precession(jd_tdb: f64) -> Matrix3<f64> {
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;

    let psia = ((((-0.000_000_095_1 * t + 0.000_132_851) * t - 0.001_140_45) * t - 1.079_006_9)
        * t
        + 5038.481_507)
        * t;
    let omegaa = ((((0.000_000_333_7 * t - 0.000_000_467) * t - 0.007_725_03) * t + 0.051_262_3)
        * t
        - 0.025_754)
        * t
        + EPS0_ARCSEC;
    let chia = ((((-0.000_000_056_0 * t + 0.000_170_663) * t - 0.001_211_97) * t - 2.381_429_2)
        * t
        + 10.556_403)
        * t;

    let eps0 = EPS0_ARCSEC * ASEC2RAD;
    let psia = psia * ASEC2RAD;
    let omegaa = omegaa * ASEC2RAD;
    let chia = chia * ASEC2RAD;

    let (sa, ca) = eps0.sin_cos();
    let (sb, cb) = (-psia).sin_cos();
    let (sc, cc) = (-omegaa).sin_cos();
    let (sd, cd) = chia.sin_cos();

    // R3(chi_a) R1(-omega_a) R3(-psi_a) R1(eps_0)
    Matrix3::new(
        cd * cb - sb * sd * cc,
        cd * sb * ca + sd * cc * cb * ca - sa * sd * sc,
        cd * sb * sa + sd * cc * cb * sa + ca * sd * sc,
        -sd * cb - sb * cd * cc,
        -sd * sb * ca + cd * cc * cb * ca - sa * cd * sc,
        -sd * sb * sa + cd * cc * cb * sa + ca * cd * sc,
        sb * sc,
        -sc * cb * ca - sa * cc,
        -sc * cb * sa + cc * ca,
    )
}
