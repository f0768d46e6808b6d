//! Julian date to calendar date conversion
//!
//! Proleptic Gregorian calendar throughout; the ephemerides handled here
//! never reach back before 1582.

/// Convert Julian day integer to calendar date (year, month, day)
pub fn compute_calendar_date(jd_integer: i32) -> (i32, i32, i32) {
    // See the Explanatory Supplement to the Astronomical Almanac 15.11.
    let f = jd_integer + 1401 + (4 * jd_integer + 274277) / 146097 * 3 / 4 - 38;
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;
    let day = (h % 153) / 5 + 1;
    let month = (h / 153 + 2) % 12 + 1;
    let year = e / 1461 - 4716 + (12 + 2 - month) / 12;

    (year, month, day)
}

/// Format a Julian date as a calendar date string (YYYY-MM-DD)
pub fn format_date(jd: f64) -> String {
    // Julian days start at noon
    let (year, month, day) = compute_calendar_date((jd + 0.5).floor() as i32);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2451545, (2000, 1, 1))]
    #[case(2458850, (2020, 1, 1))]
    #[case(2440423, (1969, 7, 20))]
    #[case(2415021, (1900, 1, 1))]
    #[case(2460311, (2024, 1, 1))]
    fn test_calendar_date(#[case] jd: i32, #[case] expected: (i32, i32, i32)) {
        assert_eq!(compute_calendar_date(jd), expected);
    }

    #[test]
    fn test_format_date() {
        // DE421 coverage boundaries
        assert_eq!(format_date(2414864.5), "1899-07-29");
        assert_eq!(format_date(2471184.5), "2053-10-09");
        assert_eq!(format_date(2451545.0), "2000-01-01");
    }
}
