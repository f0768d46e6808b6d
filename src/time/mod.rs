//! Time module for astronomical time calculations
//!
//! Instants are anchored to UTC (`chrono::DateTime<Utc>`) and converted on
//! construction to the dynamical time scales the ephemeris and the Earth
//! orientation models need:
//!
//! - TT = TAI + 32.184 s, with TAI - UTC from the leap-second table
//! - TDB from TT with the USNO Circular 179 periodic terms
//! - UT1 is taken equal to UTC from 1972 on (|UT1 - UTC| < 0.9 s); earlier
//!   instants use a polynomial Delta-T model instead

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY, TT_MINUS_TAI_S, UNIX_EPOCH_JD};

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Time out of range: {0}")]
    OutOfRange(String),

    #[error("Parsing error: {0}")]
    ParseError(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// One step of the leap-second table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeapSecond {
    /// UTC Julian date from which the offset applies
    pub utc_jd: f64,
    /// TAI - UTC in seconds from that date on
    pub tai_minus_utc: f64,
}

/// TAI - UTC since the 1972 reform, as published in IERS Bulletin C
const LEAP_SECONDS: &[(f64, f64)] = &[
    (2441317.5, 10.0), // 1972-01-01
    (2441499.5, 11.0), // 1972-07-01
    (2441683.5, 12.0), // 1973-01-01
    (2442048.5, 13.0), // 1974-01-01
    (2442413.5, 14.0), // 1975-01-01
    (2442778.5, 15.0), // 1976-01-01
    (2443144.5, 16.0), // 1977-01-01
    (2443509.5, 17.0), // 1978-01-01
    (2443874.5, 18.0), // 1979-01-01
    (2444239.5, 19.0), // 1980-01-01
    (2444786.5, 20.0), // 1981-07-01
    (2445151.5, 21.0), // 1982-07-01
    (2445516.5, 22.0), // 1983-07-01
    (2446247.5, 23.0), // 1985-07-01
    (2447161.5, 24.0), // 1988-01-01
    (2447892.5, 25.0), // 1990-01-01
    (2448257.5, 26.0), // 1991-01-01
    (2448804.5, 27.0), // 1992-07-01
    (2449169.5, 28.0), // 1993-07-01
    (2449534.5, 29.0), // 1994-07-01
    (2450083.5, 30.0), // 1996-01-01
    (2450630.5, 31.0), // 1997-07-01
    (2451179.5, 32.0), // 1999-01-01
    (2453736.5, 33.0), // 2006-01-01
    (2454832.5, 34.0), // 2009-01-01
    (2456109.5, 35.0), // 2012-07-01
    (2457204.5, 36.0), // 2015-07-01
    (2457754.5, 37.0), // 2017-01-01
];

/// Represents a time scale for astronomical calculations
///
/// Cloning is cheap; the leap-second table is shared.
#[derive(Debug, Clone)]
pub struct Timescale {
    leap_seconds: Arc<[LeapSecond]>,
}

impl Default for Timescale {
    fn default() -> Self {
        let table: Vec<LeapSecond> = LEAP_SECONDS
            .iter()
            .map(|&(utc_jd, tai_minus_utc)| LeapSecond {
                utc_jd,
                tai_minus_utc,
            })
            .collect();
        Self {
            leap_seconds: table.into(),
        }
    }
}

impl Timescale {
    /// Create a timescale from a custom leap-second table
    ///
    /// Entries must be in strictly increasing date order.
    pub fn new(leap_seconds: Vec<LeapSecond>) -> Result<Self> {
        if let Some(pair) = leap_seconds
            .windows(2)
            .find(|pair| pair[1].utc_jd <= pair[0].utc_jd)
        {
            return Err(TimeError::InvalidFormat(format!(
                "leap-second table out of order at JD {}",
                pair[1].utc_jd
            )));
        }
        Ok(Self {
            leap_seconds: leap_seconds.into(),
        })
    }

    /// Get the current time
    pub fn now(&self) -> Time {
        self.from_datetime(Utc::now())
    }

    /// Create a time from a UTC datetime
    pub fn from_datetime(&self, utc: DateTime<Utc>) -> Time {
        let (whole, fraction) = utc_julian_date(&utc);
        let delta_t = self.delta_t(whole + fraction);
        Time {
            ts: self.clone(),
            utc,
            whole,
            ut1_fraction: fraction,
            delta_t,
        }
    }

    /// Create a time from UTC calendar fields
    pub fn utc(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Time> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .map(|dt| self.from_datetime(dt))
            .ok_or_else(|| {
                TimeError::OutOfRange(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02} is not a valid UTC instant",
                    year, month, day, hour, minute, second
                ))
            })
    }

    /// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DDTHH:MM:SS` taken as UTC
    pub fn parse_utc(&self, text: &str) -> Result<Time> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(self.from_datetime(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| self.from_datetime(naive.and_utc()))
            .map_err(|e| TimeError::ParseError(format!("{:?}: {}", text, e)))
    }

    /// TAI - UTC in seconds at a UTC Julian date, `None` before 1972
    pub fn tai_minus_utc(&self, utc_jd: f64) -> Option<f64> {
        let index = self
            .leap_seconds
            .partition_point(|entry| entry.utc_jd <= utc_jd);
        if index == 0 {
            None
        } else {
            Some(self.leap_seconds[index - 1].tai_minus_utc)
        }
    }

    /// Delta-T (TT - UT1) in seconds at a UTC Julian date
    pub fn delta_t(&self, utc_jd: f64) -> f64 {
        match self.tai_minus_utc(utc_jd) {
            Some(leap) => TT_MINUS_TAI_S + leap,
            None => delta_t_approx((utc_jd - 1_721_045.0) / 365.25),
        }
    }
}

/// Split a UTC instant into a Julian day boundary and a day fraction
fn utc_julian_date(utc: &DateTime<Utc>) -> (f64, f64) {
    let seconds = utc.timestamp();
    let days = seconds.div_euclid(86_400);
    let second_of_day = seconds.rem_euclid(86_400) as f64
        + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    (UNIX_EPOCH_JD + days as f64, second_of_day / DAY_S)
}

/// Approximate delta_t calculation based on year
///
/// Polynomial fits from Espenak and Meeus, used only before the leap-second era.
fn delta_t_approx(year: f64) -> f64 {
    if year < -500.0 {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    } else if year < 500.0 {
        let t = year / 100.0;
        10583.6 - 1014.41 * t + 33.78311 * t * t - 5.952053 * t.powi(3) - 0.1798452 * t.powi(4)
            + 0.022174192 * t.powi(5)
            + 0.0090316521 * t.powi(6)
    } else if year < 1600.0 {
        let t = (year - 1000.0) / 100.0;
        1574.2 - 556.01 * t + 71.23472 * t * t + 0.319781 * t.powi(3)
            - 0.8503463 * t.powi(4)
            - 0.005050998 * t.powi(5)
            + 0.0083572073 * t.powi(6)
    } else if year < 1700.0 {
        let t = year - 1600.0;
        120.0 - 0.9808 * t - 0.01532 * t * t + t.powi(3) / 7129.0
    } else if year < 1800.0 {
        let t = year - 1700.0;
        8.83 + 0.1603 * t - 0.0059285 * t * t + 0.00013336 * t.powi(3) - t.powi(4) / 1174000.0
    } else if year < 1860.0 {
        let t = year - 1800.0;
        13.72 - 0.332447 * t + 0.0068612 * t * t + 0.0041116 * t.powi(3)
            - 0.00037436 * t.powi(4)
            + 0.0000121272 * t.powi(5)
            - 0.0000001699 * t.powi(6)
            + 0.000000000875 * t.powi(7)
    } else if year < 1900.0 {
        let t = year - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t * t + 0.01680668 * t.powi(3) - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0
    } else if year < 1920.0 {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t * t + 0.0061966 * t.powi(3) - 0.000197 * t.powi(4)
    } else if year < 1941.0 {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t * t + 0.0020936 * t.powi(3)
    } else if year < 1961.0 {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t * t / 233.0 + t.powi(3) / 2547.0
    } else if year < 1986.0 {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t.powi(3) / 718.0
    } else if year < 2005.0 {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t * t
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if year < 2050.0 {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t * t
    } else if year < 2150.0 {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - year)
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    }
}

/// TDB - TT in seconds (USNO Circular 179, eq. 2.6)
fn tdb_minus_tt(jd_tt: f64) -> f64 {
    let t = (jd_tt - J2000) / JULIAN_CENTURY;

    0.001657 * f64::sin(628.3076 * t + 6.2401)
        + 0.000022 * f64::sin(575.3385 * t + 4.2970)
        + 0.000014 * f64::sin(1256.6152 * t + 6.1969)
        + 0.000005 * f64::sin(606.9777 * t + 4.0212)
        + 0.000005 * f64::sin(52.9691 * t + 0.4444)
        + 0.000002 * f64::sin(21.3299 * t + 5.5431)
        + 0.000010 * t * f64::sin(628.3076 * t + 4.2490)
}

/// An instant in time, UTC-anchored
///
/// Julian dates are kept as a whole part (a UTC day boundary at .5) plus a
/// fraction, so sub-millisecond resolution survives the conversions.
#[derive(Debug, Clone)]
pub struct Time {
    ts: Timescale,
    utc: DateTime<Utc>,
    whole: f64,
    ut1_fraction: f64,
    /// TT - UT1 in seconds
    delta_t: f64,
}

impl Time {
    /// Create a new time from a UTC datetime with the built-in leap-second table
    pub fn new(utc: DateTime<Utc>) -> Self {
        Timescale::default().from_datetime(utc)
    }

    /// Get the current time with the built-in leap-second table
    pub fn now() -> Self {
        Timescale::default().now()
    }

    /// The UTC datetime this instant was built from
    pub fn utc_datetime(&self) -> DateTime<Utc> {
        self.utc
    }

    /// Format UTC time as an ISO 8601 string, whole seconds, `Z` suffix
    pub fn utc_iso(&self) -> String {
        self.utc.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Julian date of the UTC day boundary this instant falls in
    pub fn whole(&self) -> f64 {
        self.whole
    }

    /// Get the UT1 (Universal Time) as Julian date
    pub fn ut1(&self) -> f64 {
        self.whole + self.ut1_fraction
    }

    /// Fraction of a day past `whole()` in TT
    pub fn tt_fraction(&self) -> f64 {
        self.ut1_fraction + self.delta_t / DAY_S
    }

    /// Get the TT (Terrestrial Time) as Julian date
    pub fn tt(&self) -> f64 {
        self.whole + self.tt_fraction()
    }

    /// Fraction of a day past `whole()` in TDB
    pub fn tdb_fraction(&self) -> f64 {
        self.tt_fraction() + tdb_minus_tt(self.tt()) / DAY_S
    }

    /// Get the TDB (Barycentric Dynamical Time) as Julian date
    pub fn tdb(&self) -> f64 {
        self.whole + self.tdb_fraction()
    }

    /// Get Delta-T in seconds (TT - UT1)
    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// TAI - UTC in seconds, `None` before 1972
    pub fn leap_seconds(&self) -> Option<f64> {
        self.ts.tai_minus_utc(self.ut1())
    }

    /// Julian centuries of TT since J2000.0
    pub fn tt_centuries(&self) -> f64 {
        (self.whole - J2000 + self.tt_fraction()) / JULIAN_CENTURY
    }

    /// `self + duration`, or `None` outside the representable range
    pub fn checked_add(&self, duration: Duration) -> Option<Time> {
        self.utc
            .checked_add_signed(duration)
            .map(|utc| self.ts.from_datetime(utc))
    }

    /// `self - duration`, or `None` outside the representable range
    pub fn checked_sub(&self, duration: Duration) -> Option<Time> {
        self.utc
            .checked_sub_signed(duration)
            .map(|utc| self.ts.from_datetime(utc))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.utc_iso())
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, duration: Duration) -> Self::Output {
        self.ts.from_datetime(self.utc + duration)
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, duration: Duration) -> Self::Output {
        self.ts.from_datetime(self.utc - duration)
    }
}

impl Sub<&Time> for &Time {
    type Output = Duration;

    fn sub(self, other: &Time) -> Self::Output {
        self.utc - other.utc
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.utc == other.utc
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utc.cmp(&other.utc)
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Time::new(dt)
    }
}
