//! Nutation of the Earth's axis
//!
//! A truncated IAU 2000B model: the twenty largest lunisolar terms plus the
//! fixed planetary offsets. The neglected terms stay below about 10 mas,
//! far below what horizon coordinates in hundredths of a degree can show.

use nalgebra::Matrix3;

use crate::constants::{ASEC2RAD, ASEC360, J2000, JULIAN_CENTURY, TAU};
use crate::time::Time;

/// Units of 0.1 microarcsecond, in radians
const U2R: f64 = ASEC2RAD / 1e7;

/// Fixed offsets standing in for the planetary nutation terms (arcseconds)
const DPPLAN: f64 = -0.000_135;
const DEPLAN: f64 = 0.000_388;

/// Lunisolar terms: multipliers of (l, l', F, D, Om), then longitude
/// coefficients (sin, sin*t, cos) and obliquity coefficients (cos, cos*t, sin)
#[rustfmt::skip]
const LUNISOLAR_TERMS: [([i8; 5], [f64; 6]); 20] = [
    ([ 0, 0, 0, 0, 1], [-172_064_161.0, -174_666.0,  33_386.0, 92_052_331.0,  9_086.0, 15_377.0]),
    ([ 0, 0, 2,-2, 2], [ -13_170_906.0,   -1_675.0, -13_696.0,  5_730_336.0, -3_015.0, -4_587.0]),
    ([ 0, 0, 2, 0, 2], [  -2_276_413.0,     -234.0,   2_796.0,    978_459.0,   -485.0,  1_374.0]),
    ([ 0, 0, 0, 0, 2], [   2_074_554.0,      207.0,    -698.0,   -897_492.0,    470.0,   -291.0]),
    ([ 0, 1, 0, 0, 0], [   1_475_877.0,   -3_633.0,  11_817.0,     73_871.0,   -184.0, -1_924.0]),
    ([ 0, 1, 2,-2, 2], [    -516_821.0,    1_226.0,    -524.0,    224_386.0,   -677.0,   -174.0]),
    ([ 1, 0, 0, 0, 0], [     711_159.0,       73.0,    -872.0,     -6_750.0,      0.0,    358.0]),
    ([ 0, 0, 2, 0, 1], [    -387_298.0,     -367.0,     380.0,    200_728.0,     18.0,    318.0]),
    ([ 1, 0, 2, 0, 2], [    -301_461.0,      -36.0,     816.0,    129_025.0,    -63.0,    367.0]),
    ([ 0,-1, 2,-2, 2], [     215_829.0,     -494.0,     111.0,    -95_929.0,    299.0,    132.0]),
    ([ 0, 0, 2,-2, 1], [     128_227.0,      137.0,     181.0,    -68_982.0,     -9.0,     39.0]),
    ([-1, 0, 2, 0, 2], [     123_457.0,       11.0,      19.0,    -53_311.0,     32.0,     -4.0]),
    ([-1, 0, 0, 2, 0], [     156_994.0,       10.0,    -168.0,     -1_235.0,      0.0,     82.0]),
    ([ 1, 0, 0, 0, 1], [      63_110.0,       63.0,      27.0,    -33_228.0,      0.0,     -9.0]),
    ([-1, 0, 0, 0, 1], [     -57_976.0,      -63.0,    -189.0,     31_429.0,      0.0,    -75.0]),
    ([-1, 0, 2, 2, 2], [     -59_641.0,      -11.0,     149.0,     25_543.0,    -11.0,     66.0]),
    ([ 1, 0, 2, 0, 1], [     -51_613.0,      -42.0,     129.0,     26_366.0,      0.0,     78.0]),
    ([-2, 0, 2, 0, 1], [      45_893.0,       50.0,      31.0,    -24_236.0,    -10.0,     20.0]),
    ([ 0, 0, 0, 2, 0], [      63_384.0,       11.0,    -150.0,     -1_220.0,      0.0,     29.0]),
    ([ 0, 0, 2, 2, 2], [     -38_571.0,       -1.0,     158.0,     16_452.0,    -11.0,     68.0]),
];

/// Delaunay arguments (l, l', F, D, Om) in radians, linear in `t`
fn fundamental_arguments(t: f64) -> [f64; 5] {
    let arg = |a: f64, b: f64| (a + b * t).rem_euclid(ASEC360) * ASEC2RAD;
    [
        arg(485_868.249_036, 1_717_915_923.217_8),
        arg(1_287_104.793_05, 129_596_581.048_1),
        arg(335_779.526_232, 1_739_527_262.847_8),
        arg(1_072_260.703_69, 1_602_961_601.209_0),
        arg(450_160.398_036, -6_962_890.543_1),
    ]
}

/// Nutation in longitude and obliquity (radians) at the TT Julian date `jd_tt`
pub fn iau2000b(jd_tt: f64) -> (f64, f64) {
    let t = (jd_tt - J2000) / JULIAN_CENTURY;
    let args = fundamental_arguments(t);

    let mut dpsi = 0.0;
    let mut deps = 0.0;
    // Smallest terms first
    for (multipliers, c) in LUNISOLAR_TERMS.iter().rev() {
        let arg = multipliers
            .iter()
            .zip(args.iter())
            .map(|(&n, &a)| f64::from(n) * a)
            .sum::<f64>()
            .rem_euclid(TAU);
        let (s, co) = arg.sin_cos();
        dpsi += (c[0] + c[1] * t) * s + c[2] * co;
        deps += (c[3] + c[4] * t) * co + c[5] * s;
    }

    (
        dpsi * U2R + DPPLAN * ASEC2RAD,
        deps * U2R + DEPLAN * ASEC2RAD,
    )
}

/// Mean obliquity of the ecliptic (IAU 2006) in radians
pub fn mean_obliquity(jd_tdb: f64) -> f64 {
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;
    let arcsec = (((((-0.000_000_043_4 * t - 0.000_000_576) * t + 0.002_003_40) * t
        - 0.000_183_1)
        * t
        - 46.836_769)
        * t)
        + 84_381.406;
    arcsec * ASEC2RAD
}

/// Rotation from the mean to the true equator and equinox of date
pub fn build_nutation_matrix(mean_obliquity: f64, true_obliquity: f64, psi: f64) -> Matrix3<f64> {
    let (sobm, cobm) = mean_obliquity.sin_cos();
    let (sobt, cobt) = true_obliquity.sin_cos();
    let (spsi, cpsi) = psi.sin_cos();

    Matrix3::new(
        cpsi,
        -spsi * cobm,
        -spsi * sobm,
        spsi * cobt,
        cpsi * cobm * cobt + sobm * sobt,
        cpsi * sobm * cobt - cobm * sobt,
        spsi * sobt,
        cpsi * cobm * sobt - sobm * cobt,
        cpsi * sobm * sobt + cobm * cobt,
    )
}

/// Nutation angles at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutation {
    /// Nutation in longitude (radians)
    pub dpsi: f64,
    /// Nutation in obliquity (radians)
    pub deps: f64,
    /// Mean obliquity of date (radians)
    pub mean_obliquity: f64,
    /// Longitude of the Moon's ascending node (radians), for the equinox equation
    omega: f64,
}

impl Nutation {
    pub fn at(time: &Time) -> Self {
        let (dpsi, deps) = iau2000b(time.tt());
        let t = time.tt_centuries();
        Nutation {
            dpsi,
            deps,
            mean_obliquity: mean_obliquity(time.tdb()),
            omega: fundamental_arguments(t)[4],
        }
    }

    /// True obliquity of date (radians)
    pub fn true_obliquity(&self) -> f64 {
        self.mean_obliquity + self.deps
    }

    /// Mean-of-date to true-of-date rotation
    pub fn matrix(&self) -> Matrix3<f64> {
        build_nutation_matrix(self.mean_obliquity, self.true_obliquity(), self.dpsi)
    }

    /// Equation of the equinoxes (radians): GAST - GMST
    ///
    /// Includes the two largest complementary terms.
    pub fn equation_of_the_equinoxes(&self) -> f64 {
        self.dpsi * self.mean_obliquity.cos()
            + (0.002_640_96 * self.omega.sin() + 0.000_063_52 * (2.0 * self.omega).sin())
                * ASEC2RAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_iau2000b_reference_epoch() {
        // Full IAU 2000B at MJD 53736: dpsi = -9.6326e-6, deps = 4.0632e-5
        let (dpsi, deps) = iau2000b(2_400_000.5 + 53_736.0);
        assert_relative_eq!(dpsi, -0.963_255_229_114_836_3e-5, epsilon = 5e-8);
        assert_relative_eq!(deps, 0.406_319_710_662_115_9e-4, epsilon = 5e-8);
    }

    #[test]
    fn test_nutation_bounds() {
        // Nutation in longitude never exceeds ~17.3", obliquity ~9.3"
        for k in 0..40 {
            let jd = J2000 + k as f64 * 173.0;
            let (dpsi, deps) = iau2000b(jd);
            assert!(dpsi.abs() / ASEC2RAD < 19.0);
            assert!(deps.abs() / ASEC2RAD < 10.5);
        }
    }

    #[test]
    fn test_mean_obliquity_at_j2000() {
        assert_relative_eq!(mean_obliquity(J2000) / ASEC2RAD, 84_381.406, epsilon = 1e-9);
        // Decreasing by about 47" per century
        let later = mean_obliquity(J2000 + JULIAN_CENTURY) / ASEC2RAD;
        assert_relative_eq!(84_381.406 - later, 46.837, epsilon = 0.01);
    }

    #[test]
    fn test_nutation_matrix() {
        let time = Time::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let nutation = Nutation::at(&time);
        let n = nutation.matrix();

        assert_relative_eq!(n * n.transpose(), Matrix3::identity(), epsilon = 1e-14);
        // Close to, but not exactly, the identity
        let offset = (n - Matrix3::identity()).abs().max();
        assert!(offset > 1e-6 && offset < 1e-4);

        // Bounded by the amplitude of dpsi projected on the equator
        let eqeq = nutation.equation_of_the_equinoxes() / ASEC2RAD;
        assert!(eqeq.abs() < 17.5);
        assert_relative_eq!(eqeq, nutation.dpsi.to_degrees() * 3600.0 * 0.917, epsilon = 0.05);
    }
}
