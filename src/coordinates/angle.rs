//! Sexagesimal (degrees, arc-minutes, arc-seconds) rendering of angles
//!
//! `Dms` splits a decimal angle into whole degrees (truncated toward zero),
//! whole arc-minutes and fractional arc-seconds. The sign lives on the degree
//! component only, and is kept even when that component is zero. Display
//! rounds to hundredths of an arc-second and carries a rounded `60.00″` into
//! the minutes and degrees.
//!
//! ```rust
//! use skytrack::coordinates::angle::{to_degrees_minutes_seconds, Dms};
//!
//! assert_eq!(Dms::from_degrees(-23.5505).to_string(), "-23° 33′ 1.80″");
//! assert_eq!(to_degrees_minutes_seconds(-0.5), "-0° 30′ 0.00″");
//! ```

use std::fmt;

/// An angle in degrees, arc-minutes and arc-seconds
///
/// Displays as `{sign}{degrees}° {minutes}′ {seconds:.2}″`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    /// True for angles below zero, including those in (-1, 0)
    pub negative: bool,
    /// Whole degrees, truncated toward zero
    pub degrees: u32,
    /// Whole arc-minutes, 0..=59
    pub minutes: u32,
    /// Remaining arc-seconds
    pub seconds: f64,
}

impl Dms {
    /// Split a decimal angle in degrees
    ///
    /// ```rust
    /// use skytrack::coordinates::angle::Dms;
    ///
    /// let dms = Dms::from_degrees(-46.6333);
    /// assert!(dms.negative);
    /// assert_eq!((dms.degrees, dms.minutes), (46, 37));
    /// assert!((dms.seconds - 59.88).abs() < 1e-6);
    /// ```
    pub fn from_degrees(angle: f64) -> Self {
        let whole = angle.trunc();
        let arcmin = (angle - whole).abs() * 60.0;
        let minutes = arcmin.trunc();
        Dms {
            negative: angle < 0.0,
            degrees: whole.abs() as u32,
            minutes: minutes as u32,
            seconds: (arcmin - minutes) * 60.0,
        }
    }

    /// Reassemble the decimal angle in degrees
    pub fn to_degrees(&self) -> f64 {
        let magnitude =
            f64::from(self.degrees) + f64::from(self.minutes) / 60.0 + self.seconds / 3600.0;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        let (mut degrees, mut minutes) = (self.degrees, self.minutes);
        let mut seconds = (self.seconds * 100.0).round() / 100.0;
        if seconds >= 60.0 {
            seconds -= 60.0;
            minutes += 1;
        }
        if minutes >= 60 {
            minutes -= 60;
            degrees += 1;
        }
        write!(f, "{}{}° {}′ {:.2}″", sign, degrees, minutes, seconds)
    }
}

/// Format a decimal angle as degrees, arc-minutes and arc-seconds
pub fn to_degrees_minutes_seconds(angle: f64) -> String {
    Dms::from_degrees(angle).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(-23.5505, "-23° 33′ 1.80″")]
    #[case(-46.6333, "-46° 37′ 59.88″")]
    #[case(45.5, "45° 30′ 0.00″")]
    #[case(0.0, "0° 0′ 0.00″")]
    #[case(-0.5, "-0° 30′ 0.00″")]
    #[case(-0.0001, "-0° 0′ 0.36″")]
    #[case(359.99, "359° 59′ 24.00″")]
    #[case(90.0, "90° 0′ 0.00″")]
    #[case(10.999999, "11° 0′ 0.00″")]
    #[case(10.5 - 0.001 / 3600.0, "10° 30′ 0.00″")]
    #[case(-0.9999999, "-1° 0′ 0.00″")]
    #[case(12.0 + 59.0 / 60.0 + 59.994 / 3600.0, "12° 59′ 59.99″")]
    fn test_dms_formatting(#[case] angle: f64, #[case] expected: &str) {
        assert_eq!(to_degrees_minutes_seconds(angle), expected);
    }

    #[test]
    fn test_dms_components() {
        let dms = Dms::from_degrees(-23.5505);
        assert!(dms.negative);
        assert_eq!(dms.degrees, 23);
        assert_eq!(dms.minutes, 33);
        assert_relative_eq!(dms.seconds, 1.8, epsilon = 1e-6);

        let small = Dms::from_degrees(-0.25);
        assert!(small.negative);
        assert_eq!(small.degrees, 0);
        assert_eq!(small.minutes, 15);
    }

    #[rstest]
    #[case(-23.5505)]
    #[case(123.456789)]
    #[case(-0.75)]
    #[case(0.0)]
    fn test_dms_reassembles(#[case] angle: f64) {
        assert_relative_eq!(Dms::from_degrees(angle).to_degrees(), angle, epsilon = 1e-12);
    }
}
