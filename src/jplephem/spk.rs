//! Spacecraft Planet Kernel (SPK) format handling
//!
//! This module provides functionality for reading NASA SPICE SPK files which
//! contain position and velocity data for solar system bodies.
//!
//! The SPK format is described in:
//! http://naif.jpl.nasa.gov/pub/naif/toolkit_docs/FORTRAN/req/spk.html
//!
//! Positions are returned in kilometers and velocities in kilometers per day,
//! both relative to the segment's center body in the segment's frame (ICRF
//! for the JPL planetary ephemerides).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use log::debug;
use nalgebra::Vector3;

use crate::constants::{DAY_S, J2000};
use crate::jplephem::chebyshev;
use crate::jplephem::daf::DAF;
use crate::jplephem::errors::{JplephemError, Result};
use crate::jplephem::{calendar, names};

/// Convert seconds since J2000 to Julian date
pub fn seconds_to_jd(seconds: f64) -> f64 {
    J2000 + seconds / DAY_S
}

/// Convert Julian date to seconds since J2000
pub fn jd_to_seconds(jd: f64) -> f64 {
    (jd - J2000) * DAY_S
}

/// Spacecraft Planet Kernel (SPK) file reader
pub struct SPK {
    /// The underlying DAF file
    pub daf: DAF,
    /// List of segments in the file
    pub segments: Vec<Segment>,
    /// Segment indices by (center, target) pair, in file order
    pairs: HashMap<(i32, i32), Vec<usize>>,
}

/// A segment in an SPK file containing position data for a specific body
#[derive(Clone)]
pub struct Segment {
    /// Source of the segment (e.g., "DE-0421LE-0421")
    pub source: String,
    /// Initial epoch in seconds since J2000
    pub start_second: f64,
    /// Final epoch in seconds since J2000
    pub end_second: f64,
    /// Target body ID
    pub target: i32,
    /// Center body ID
    pub center: i32,
    /// Reference frame ID
    pub frame: i32,
    /// Data type (2: position only, 3: position and velocity)
    pub data_type: i32,
    /// Start word address in the file
    pub start_i: usize,
    /// End word address in the file
    pub end_i: usize,
    /// Start Julian date (TDB)
    pub start_jd: f64,
    /// End Julian date (TDB)
    pub end_jd: f64,
    /// Coefficients, read on first use
    data: OnceLock<SegmentData>,
}

/// Chebyshev records of one segment
#[derive(Clone, Debug)]
struct SegmentData {
    /// Initial epoch (TDB seconds past J2000)
    init: f64,
    /// Interval length in seconds covered by each record
    intlen: f64,
    /// Record size in double-precision words
    rsize: usize,
    /// Number of records
    n_records: usize,
    /// Coefficients per component
    n_coeffs: usize,
    /// All records back to back, directory excluded
    coefficients: Vec<f64>,
}

impl SPK {
    /// Open an SPK file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let daf = DAF::open(path)?;
        if daf.locidw != "DAF/SPK" && daf.locidw != "NAIF/DAF" {
            return Err(JplephemError::InvalidFormat(format!(
                "expected an SPK file, found {}",
                daf.locidw
            )));
        }
        if daf.nd != 2 || daf.ni != 6 {
            return Err(JplephemError::InvalidFormat(format!(
                "SPK summaries need ND=2 and NI=6, found ND={} NI={}",
                daf.nd, daf.ni
            )));
        }

        let mut spk = SPK {
            daf,
            segments: Vec::new(),
            pairs: HashMap::new(),
        };
        spk.parse_segments()?;
        debug!(
            "Opened SPK {} with {} segments",
            spk.daf.path.display(),
            spk.segments.len()
        );
        Ok(spk)
    }

    /// Build segment descriptors from the DAF summaries
    fn parse_segments(&mut self) -> Result<()> {
        for summary in self.daf.summaries()? {
            let (start_second, end_second) = (summary.doubles[0], summary.doubles[1]);
            let ints = &summary.integers;
            let (target, center, frame, data_type) = (ints[0], ints[1], ints[2], ints[3]);
            let (start_i, end_i) = (ints[4], ints[5]);

            if start_i <= 0 || end_i < start_i {
                return Err(JplephemError::InvalidFormat(format!(
                    "segment {} -> {} has invalid addresses {}..{}",
                    center, target, start_i, end_i
                )));
            }

            let segment = Segment {
                source: summary.name,
                start_second,
                end_second,
                target,
                center,
                frame,
                data_type,
                start_i: start_i as usize,
                end_i: end_i as usize,
                start_jd: seconds_to_jd(start_second),
                end_jd: seconds_to_jd(end_second),
                data: OnceLock::new(),
            };

            let idx = self.segments.len();
            self.segments.push(segment);
            self.pairs.entry((center, target)).or_default().push(idx);
        }
        Ok(())
    }

    /// Return the first segment for the given center and target body IDs
    pub fn get_segment(&self, center: i32, target: i32) -> Result<&Segment> {
        self.pairs
            .get(&(center, target))
            .and_then(|indices| indices.first())
            .map(|&idx| &self.segments[idx])
            .ok_or(JplephemError::BodyNotFound { center, target })
    }

    /// Center body of the first segment that moves `target`, if any
    pub fn center_of(&self, target: i32) -> Option<i32> {
        self.segments
            .iter()
            .find(|s| s.target == target)
            .map(|s| s.center)
    }

    /// Position (km) and velocity (km/day) of `target` relative to `center`
    ///
    /// When several segments link the same pair, the one covering the epoch wins.
    pub fn compute_and_differentiate(
        &self,
        center: i32,
        target: i32,
        tdb: f64,
        tdb2: f64,
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let indices = self
            .pairs
            .get(&(center, target))
            .ok_or(JplephemError::BodyNotFound { center, target })?;

        let et = jd_to_seconds(tdb) + tdb2 * DAY_S;
        let segment = indices
            .iter()
            .map(|&idx| &self.segments[idx])
            .find(|s| s.covers(et))
            .unwrap_or(&self.segments[indices[0]]);

        segment.compute_and_differentiate(&self.daf, tdb, tdb2)
    }

    /// Read the comments from the SPK file
    pub fn comments(&self) -> Result<String> {
        self.daf.comments()
    }
}

impl Segment {
    fn covers(&self, et: f64) -> bool {
        et >= self.start_second && et <= self.end_second
    }

    fn out_of_range(&self, et: f64) -> JplephemError {
        JplephemError::OutOfRange {
            jd: seconds_to_jd(et),
            start_jd: self.start_jd,
            end_jd: self.end_jd,
        }
    }

    /// Compute position (km) at the TDB Julian date `tdb + tdb2`
    pub fn compute(&self, daf: &DAF, tdb: f64, tdb2: f64) -> Result<Vector3<f64>> {
        self.compute_and_differentiate(daf, tdb, tdb2)
            .map(|(position, _)| position)
    }

    /// Compute position (km) and velocity (km/day) at the TDB Julian date `tdb + tdb2`
    pub fn compute_and_differentiate(
        &self,
        daf: &DAF,
        tdb: f64,
        tdb2: f64,
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let et = jd_to_seconds(tdb) + tdb2 * DAY_S;
        if !self.covers(et) {
            return Err(self.out_of_range(et));
        }

        let data = self.load_data(daf)?;

        // The last record also owns its closing boundary
        let elapsed = et - data.init;
        let mut index = (elapsed / data.intlen).floor().max(0.0) as usize;
        if index >= data.n_records {
            if elapsed <= data.intlen * data.n_records as f64 + 1e-6 {
                index = data.n_records - 1;
            } else {
                return Err(self.out_of_range(et));
            }
        }

        let record = &data.coefficients[index * data.rsize..(index + 1) * data.rsize];
        let (mid, radius) = (record[0], record[1]);
        let x = chebyshev::normalize_time(et, mid, radius)?;
        let component: Vec<&[f64]> = record[2..].chunks_exact(data.n_coeffs).collect();

        let position = Vector3::new(
            chebyshev::evaluate(component[0], x),
            chebyshev::evaluate(component[1], x),
            chebyshev::evaluate(component[2], x),
        );

        let velocity = match self.data_type {
            2 => {
                // d/dx -> d/ds via the record radius, then per day
                let scale = DAY_S / radius;
                Vector3::new(
                    chebyshev::derivative(component[0], x),
                    chebyshev::derivative(component[1], x),
                    chebyshev::derivative(component[2], x),
                ) * scale
            }
            3 => {
                Vector3::new(
                    chebyshev::evaluate(component[3], x),
                    chebyshev::evaluate(component[4], x),
                    chebyshev::evaluate(component[5], x),
                ) * DAY_S
            }
            other => return Err(JplephemError::UnsupportedDataType(other)),
        };

        Ok((position, velocity))
    }

    /// Load the segment coefficients on first use
    fn load_data(&self, daf: &DAF) -> Result<&SegmentData> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }

        let components = match self.data_type {
            2 => 3,
            3 => 6,
            other => return Err(JplephemError::UnsupportedDataType(other)),
        };

        let array = daf.read_array(self.start_i, self.end_i)?;
        if array.len() < 4 {
            return Err(JplephemError::InvalidFormat(format!(
                "segment {} -> {} is too short to hold a directory",
                self.center, self.target
            )));
        }

        // The last four words are the directory: INIT, INTLEN, RSIZE, N
        let n = array.len();
        let init = array[n - 4];
        let intlen = array[n - 3];
        let rsize = array[n - 2] as usize;
        let n_records = array[n - 1] as usize;

        if rsize < 2 + components || (rsize - 2) % components != 0 || n_records == 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "segment {} -> {}: bad record size {} for type {}",
                self.center, self.target, rsize, self.data_type
            )));
        }
        if intlen <= 0.0 {
            return Err(JplephemError::InvalidFormat(format!(
                "segment {} -> {}: non-positive interval length {}",
                self.center, self.target, intlen
            )));
        }
        let expected = n_records * rsize + 4;
        if n != expected {
            return Err(JplephemError::InvalidFormat(format!(
                "Inconsistent array size: expected {}, got {}",
                expected, n
            )));
        }

        debug!(
            "Loaded segment {} -> {}: {} records of {} words",
            self.center, self.target, n_records, rsize
        );

        let data = SegmentData {
            init,
            intlen,
            rsize,
            n_records,
            n_coeffs: (rsize - 2) / components,
            coefficients: array[..n - 4].to_vec(),
        };
        Ok(self.data.get_or_init(|| data))
    }

    /// Return a textual description of the segment
    pub fn describe(&self, verbose: bool) -> String {
        let start = calendar::format_date(self.start_jd);
        let end = calendar::format_date(self.end_jd);
        let center_name = names::target_name(self.center)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown center".to_string());
        let target_name = names::target_name(self.target)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown target".to_string());

        let mut text = format!(
            "{}..{}  Type {}  {} ({}) -> {} ({})",
            start, end, self.data_type, center_name, self.center, target_name, self.target
        );
        if verbose {
            text.push_str(&format!("\n  frame={} source={}", self.frame, self.source));
        }
        text
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(false))
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(true))
    }
}
