//! Tests for the jplephem module
//!
//! Real kernels are tens of megabytes, so these tests build small SPK files
//! on the fly. The writer below lays out a DAF exactly the way NAIF does: a
//! file record, one comment record, one summary/name record pair, then the
//! segment arrays.

use std::path::Path;

use crate::constants::{DAY_S, J2000};
use crate::jplephem::daf::RECORD_SIZE;

/// One segment to be written into a synthetic SPK file
pub(crate) struct FixtureSegment {
    pub center: i32,
    pub target: i32,
    pub data_type: i32,
    pub start_second: f64,
    pub end_second: f64,
    pub init: f64,
    pub intlen: f64,
    pub rsize: usize,
    /// Records back to back: MID, RADIUS, coefficients
    pub records: Vec<f64>,
}

/// A type 2 segment moving in a straight line: `position + velocity * (t - start)`
///
/// Positions in km, velocity in km/s, epochs as TDB Julian dates.
pub(crate) fn linear_segment(
    center: i32,
    target: i32,
    start_jd: f64,
    end_jd: f64,
    n_records: usize,
    position: [f64; 3],
    velocity: [f64; 3],
) -> FixtureSegment {
    let start = (start_jd - J2000) * DAY_S;
    let end = (end_jd - J2000) * DAY_S;
    let intlen = (end - start) / n_records as f64;
    let radius = intlen / 2.0;

    let mut records = Vec::new();
    for i in 0..n_records {
        let mid = start + radius + i as f64 * intlen;
        records.push(mid);
        records.push(radius);
        for k in 0..3 {
            records.push(position[k] + velocity[k] * (mid - start));
            records.push(velocity[k] * radius);
        }
    }

    FixtureSegment {
        center,
        target,
        data_type: 2,
        start_second: start,
        end_second: end,
        init: start,
        intlen,
        rsize: 2 + 3 * 2,
        records,
    }
}

/// A single-record type 3 segment at a fixed position with a fixed velocity (km/s)
pub(crate) fn fixed_type3_segment(
    center: i32,
    target: i32,
    start_jd: f64,
    end_jd: f64,
    position: [f64; 3],
    velocity: [f64; 3],
) -> FixtureSegment {
    let start = (start_jd - J2000) * DAY_S;
    let end = (end_jd - J2000) * DAY_S;
    let radius = (end - start) / 2.0;

    let mut records = vec![start + radius, radius];
    records.extend_from_slice(&position);
    records.extend_from_slice(&velocity);

    FixtureSegment {
        center,
        target,
        data_type: 3,
        start_second: start,
        end_second: end,
        init: start,
        intlen: end - start,
        rsize: 2 + 6,
        records,
    }
}

/// Write a DAF/SPK file containing `segments`
pub(crate) fn write_spk(
    path: &Path,
    comment: &str,
    segments: &[FixtureSegment],
    big_endian: bool,
) -> std::io::Result<()> {
    assert!(segments.len() <= 25, "fixture writer uses a single summary record");

    let f64_bytes = |v: f64| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };
    let i32_bytes = |v: i32| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    // Records: 1 file, 2 comments, 3 summaries, 4 names, 5.. data
    let first_data_word = 4 * (RECORD_SIZE / 8) + 1;
    let mut data: Vec<f64> = Vec::new();
    let mut addresses = Vec::new();
    for segment in segments {
        let start = first_data_word + data.len();
        data.extend_from_slice(&segment.records);
        data.push(segment.init);
        data.push(segment.intlen);
        data.push(segment.rsize as f64);
        data.push((segment.records.len() / segment.rsize) as f64);
        addresses.push((start, first_data_word + data.len() - 1));
    }
    let free = first_data_word + data.len();

    let mut file_record = vec![0u8; RECORD_SIZE];
    file_record[0..8].copy_from_slice(b"DAF/SPK ");
    file_record[8..12].copy_from_slice(&i32_bytes(2));
    file_record[12..16].copy_from_slice(&i32_bytes(6));
    let ifname = format!("{:<60}", "SKYTRACK TEST KERNEL");
    file_record[16..76].copy_from_slice(ifname.as_bytes());
    file_record[76..80].copy_from_slice(&i32_bytes(3));
    file_record[80..84].copy_from_slice(&i32_bytes(3));
    file_record[84..88].copy_from_slice(&i32_bytes(free as i32));
    file_record[88..96].copy_from_slice(if big_endian { b"BIG-IEEE" } else { b"LTL-IEEE" });

    let mut comment_record = vec![b' '; RECORD_SIZE];
    let text = comment.replace('\n', "\0");
    let text = text.as_bytes();
    comment_record[..text.len()].copy_from_slice(text);
    comment_record[text.len()] = 0x04;

    let mut summary_record = vec![0u8; RECORD_SIZE];
    let mut name_record = vec![b' '; RECORD_SIZE];
    summary_record[0..8].copy_from_slice(&f64_bytes(0.0));
    summary_record[8..16].copy_from_slice(&f64_bytes(0.0));
    summary_record[16..24].copy_from_slice(&f64_bytes(segments.len() as f64));
    for (i, (segment, &(start_i, end_i))) in segments.iter().zip(&addresses).enumerate() {
        let base = 24 + i * 40;
        summary_record[base..base + 8].copy_from_slice(&f64_bytes(segment.start_second));
        summary_record[base + 8..base + 16].copy_from_slice(&f64_bytes(segment.end_second));
        let ints = [
            segment.target,
            segment.center,
            1,
            segment.data_type,
            start_i as i32,
            end_i as i32,
        ];
        for (k, value) in ints.iter().enumerate() {
            let pos = base + 16 + k * 4;
            summary_record[pos..pos + 4].copy_from_slice(&i32_bytes(*value));
        }
        let name = format!("{:<40}", format!("TEST {} -> {}", segment.center, segment.target));
        name_record[i * 40..(i + 1) * 40].copy_from_slice(name.as_bytes());
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&file_record);
    bytes.extend_from_slice(&comment_record);
    bytes.extend_from_slice(&summary_record);
    bytes.extend_from_slice(&name_record);
    for value in &data {
        bytes.extend_from_slice(&f64_bytes(*value));
    }
    let padded = bytes.len().div_ceil(RECORD_SIZE) * RECORD_SIZE;
    bytes.resize(padded, 0);

    std::fs::write(path, bytes)
}

#[cfg(test)]
mod spk_tests {
    use super::*;
    use crate::jplephem::daf::{Endian, DAF};
    use crate::jplephem::errors::JplephemError;
    use crate::jplephem::spk::SPK;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    const START: f64 = 2451000.5;
    const END: f64 = 2452000.5;

    fn sample_kernel(dir: &TempDir, big_endian: bool) -> std::path::PathBuf {
        let path = dir.path().join("test.bsp");
        let segments = vec![
            linear_segment(0, 3, START, END, 8, [1.0e8, 2.0e7, -3.0e6], [10.0, -20.0, 5.0]),
            linear_segment(3, 399, START, END, 16, [4000.0, 0.0, 0.0], [0.0, 0.5, 0.0]),
            fixed_type3_segment(3, 301, START, END, [380_000.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        write_spk(&path, "Synthetic kernel\nfor tests", &segments, big_endian).unwrap();
        path
    }

    #[test]
    fn test_daf_header_and_comments() {
        let dir = TempDir::new().unwrap();
        let daf = DAF::open(sample_kernel(&dir, false)).unwrap();

        assert_eq!(daf.locidw, "DAF/SPK");
        assert_eq!(daf.nd, 2);
        assert_eq!(daf.ni, 6);
        assert_eq!(daf.fward, 3);
        assert_eq!(daf.endian, Endian::Little);
        assert_eq!(daf.ifname, "SKYTRACK TEST KERNEL");
        assert_eq!(daf.comments().unwrap(), "Synthetic kernel\nfor tests");

        let summaries = daf.summaries().unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[1].name, "TEST 3 -> 399");
        assert_eq!(summaries[1].integers[0], 399);
        assert_eq!(summaries[1].integers[1], 3);
    }

    #[test]
    fn test_big_endian_kernel_reads_the_same() {
        let dir = TempDir::new().unwrap();
        let little = SPK::open(sample_kernel(&dir, false)).unwrap();
        let other = TempDir::new().unwrap();
        let big = SPK::open(sample_kernel(&other, true)).unwrap();
        assert_eq!(big.daf.endian, Endian::Big);

        let tdb = 2451234.25;
        let (p1, v1) = little.compute_and_differentiate(0, 3, tdb, 0.0).unwrap();
        let (p2, v2) = big.compute_and_differentiate(0, 3, tdb, 0.0).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_segments_are_indexed_by_pair() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        assert_eq!(spk.segments.len(), 3);
        let segment = spk.get_segment(3, 399).unwrap();
        assert_eq!(segment.data_type, 2);
        assert_relative_eq!(segment.start_jd, START, epsilon = 1e-9);
        assert_relative_eq!(segment.end_jd, END, epsilon = 1e-9);
        assert_eq!(spk.center_of(301), Some(3));
        assert_eq!(spk.center_of(10), None);

        match spk.get_segment(0, 10) {
            Err(JplephemError::BodyNotFound { center, target }) => {
                assert_eq!((center, target), (0, 10));
            }
            other => panic!("expected BodyNotFound, got {:?}", other.map(|s| s.target)),
        }
    }

    #[test]
    fn test_type2_linear_motion() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        // Sample inside several different records, including record edges
        for &days in &[0.0, 0.3, 125.0, 333.75, 500.0, 999.9, 1000.0] {
            let dt = days * DAY_S;
            let (position, velocity) = spk
                .compute_and_differentiate(0, 3, START, days)
                .unwrap();
            assert_relative_eq!(position.x, 1.0e8 + 10.0 * dt, max_relative = 1e-11);
            assert_relative_eq!(position.y, 2.0e7 - 20.0 * dt, max_relative = 1e-11);
            assert_relative_eq!(position.z, -3.0e6 + 5.0 * dt, max_relative = 1e-11);
            assert_relative_eq!(velocity.x, 10.0 * DAY_S, max_relative = 1e-9);
            assert_relative_eq!(velocity.y, -20.0 * DAY_S, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_split_julian_date_matches_single_value() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        let (a, _) = spk
            .compute_and_differentiate(3, 399, 2451500.0, 0.125)
            .unwrap();
        let (b, _) = spk
            .compute_and_differentiate(3, 399, 2451500.125, 0.0)
            .unwrap();
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_type3_uses_velocity_coefficients() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        let (position, velocity) = spk
            .compute_and_differentiate(3, 301, 2451500.0, 0.0)
            .unwrap();
        assert_relative_eq!(position.x, 380_000.0);
        assert_relative_eq!(velocity.y, DAY_S);
    }

    #[test]
    fn test_out_of_range_epoch() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        let err = spk
            .compute_and_differentiate(0, 3, END + 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, JplephemError::OutOfRange { .. }));

        let err = spk
            .compute_and_differentiate(0, 3, START - 0.5, 0.0)
            .unwrap_err();
        assert!(matches!(err, JplephemError::OutOfRange { .. }));
    }

    #[test]
    fn test_segment_description() {
        let dir = TempDir::new().unwrap();
        let spk = SPK::open(sample_kernel(&dir, false)).unwrap();

        let text = spk.get_segment(3, 399).unwrap().to_string();
        assert_eq!(
            text,
            "1998-07-06..2001-04-01  Type 2  Earth Barycenter (3) -> Earth (399)"
        );
    }

    #[test]
    fn test_rejects_non_daf_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bsp");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();
        assert!(matches!(
            SPK::open(&path),
            Err(JplephemError::InvalidFormat(_))
        ));

        let short = dir.path().join("short.bsp");
        std::fs::write(&short, b"DAF/SPK ").unwrap();
        assert!(matches!(
            SPK::open(&short),
            Err(JplephemError::InvalidFormat(_))
        ));

        assert!(matches!(
            SPK::open(dir.path().join("missing.bsp")),
            Err(JplephemError::FileError { .. })
        ));
    }
}
