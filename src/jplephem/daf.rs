//! Double Array File format module for reading SPICE DAF files
//!
//! This module provides functionality for reading NAIF's Double Array File (DAF)
//! format, which is the container underneath SPK ephemerides.
//!
//! A DAF is a sequence of 1024-byte records. Record 1 is the file record,
//! records 2..FWARD hold free-form comments, and from FWARD onwards a doubly
//! linked list of summary records (each followed by a name record) describes
//! the arrays stored in the rest of the file.

use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};
use memmap2::Mmap;

use crate::jplephem::errors::{io_err, JplephemError, Result};

/// Size of a DAF record (bytes)
pub const RECORD_SIZE: usize = 1024;
/// Size of a double-precision value (bytes)
const DOUBLE_SIZE: usize = 8;
/// Characters of comment text stored in each comment record
const COMMENT_CHARS: usize = 1000;
/// Upper bound on summary records walked, guards against cyclic NEXT pointers
const MAX_SUMMARY_RECORDS: usize = 10_000;

/// DAF file endianness
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    fn read_f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Big => BigEndian::read_f64(buf),
            Endian::Little => LittleEndian::read_f64(buf),
        }
    }

    fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Big => BigEndian::read_i32(buf),
            Endian::Little => LittleEndian::read_i32(buf),
        }
    }
}

/// One array descriptor from a summary record
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Array name from the matching name record, trailing blanks removed
    pub name: String,
    /// The ND double-precision components
    pub doubles: Vec<f64>,
    /// The NI integer components
    pub integers: Vec<i32>,
}

/// Double Array File (DAF) file reader
pub struct DAF {
    /// Path to the DAF file
    pub path: PathBuf,
    /// Read-only mapping of the whole file
    map: Mmap,
    /// File identification word, e.g. "DAF/SPK"
    pub locidw: String,
    /// Number of double-precision components
    pub nd: u32,
    /// Number of integer components
    pub ni: u32,
    /// Forward pointer to first summary record
    pub fward: u32,
    /// Backward pointer to last summary record
    pub bward: u32,
    /// First free address
    pub free: u32,
    /// Internal file name
    pub ifname: String,
    /// Byte order (endianness)
    pub endian: Endian,
}

impl DAF {
    /// Open and memory map a DAF file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| io_err(&path, e))?;
        let len = file.metadata().map_err(|e| io_err(&path, e))?.len();
        if (len as usize) < RECORD_SIZE {
            return Err(JplephemError::InvalidFormat(format!(
                "{} is {} bytes, too short to hold a DAF file record",
                path.display(),
                len
            )));
        }

        // Safety: the mapping is read-only and the file is not modified while open.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| io_err(&path, e))?;

        let header = &map[..RECORD_SIZE];
        let locidw = String::from_utf8_lossy(&header[0..8]).trim_end().to_string();
        if !locidw.starts_with("DAF/") && locidw != "NAIF/DAF" {
            return Err(JplephemError::InvalidFormat(format!(
                "file starts with {:?}, not a DAF identification word",
                locidw
            )));
        }

        let endian = detect_endian(header)?;
        let nd = endian.read_i32(&header[8..12]);
        let ni = endian.read_i32(&header[12..16]);
        let ifname = String::from_utf8_lossy(&header[16..76]).trim_end().to_string();
        let fward = endian.read_i32(&header[76..80]);
        let bward = endian.read_i32(&header[80..84]);
        let free = endian.read_i32(&header[84..88]);

        if nd <= 0 || ni <= 0 || fward <= 0 || bward <= 0 || free <= 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid DAF header: nd={}, ni={}, fward={}, bward={}, free={}",
                nd, ni, fward, bward, free
            )));
        }

        debug!(
            "DAF header: locidw={}, nd={}, ni={}, fward={}, bward={}, free={}, ifname={}, endian={:?}",
            locidw, nd, ni, fward, bward, free, ifname, endian
        );

        Ok(DAF {
            path,
            map,
            locidw,
            nd: nd as u32,
            ni: ni as u32,
            fward: fward as u32,
            bward: bward as u32,
            free: free as u32,
            ifname,
            endian,
        })
    }

    /// Size of one summary in double-precision words
    fn summary_length(&self) -> usize {
        self.nd as usize + (self.ni as usize + 1) / 2
    }

    /// Borrow a record (1024 bytes) by its 1-based record number
    pub fn read_record(&self, record_number: usize) -> Result<&[u8]> {
        if record_number < 1 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid record number: {}",
                record_number
            )));
        }
        let offset = (record_number - 1) * RECORD_SIZE;
        self.map
            .get(offset..offset + RECORD_SIZE)
            .ok_or_else(|| {
                JplephemError::InvalidFormat(format!(
                    "record {} lies beyond the end of {}",
                    record_number,
                    self.path.display()
                ))
            })
    }

    /// Read comments from the comment area of the file
    pub fn comments(&self) -> Result<String> {
        let mut text = String::new();
        for record_number in 2..self.fward as usize {
            let record = self.read_record(record_number)?;
            let chunk = &record[..COMMENT_CHARS];
            // An EOT byte marks the end of the comment area
            match chunk.iter().position(|&b| b == 0x04) {
                Some(end) => {
                    text.push_str(&String::from_utf8_lossy(&chunk[..end]));
                    break;
                }
                None => text.push_str(&String::from_utf8_lossy(chunk)),
            }
        }
        Ok(text.replace('\0', "\n").trim_end().to_string())
    }

    /// Walk the summary record list and return every array descriptor
    pub fn summaries(&self) -> Result<Vec<Summary>> {
        let nd = self.nd as usize;
        let ni = self.ni as usize;
        let step = self.summary_length() * DOUBLE_SIZE;
        let mut result = Vec::new();

        let mut record_number = self.fward as usize;
        let mut visited = 0;
        while record_number > 0 {
            visited += 1;
            if visited > MAX_SUMMARY_RECORDS {
                return Err(JplephemError::InvalidFormat(
                    "summary record chain does not terminate".to_string(),
                ));
            }

            let summary_record = self.read_record(record_number)?;
            let name_record = self.read_record(record_number + 1)?;

            // NEXT, PREV and NSUM are stored as doubles
            let next = self.endian.read_f64(&summary_record[0..8]) as usize;
            let n_summaries = self.endian.read_f64(&summary_record[16..24]) as usize;

            let max_summaries = (RECORD_SIZE - 24) / step;
            if n_summaries > max_summaries {
                return Err(JplephemError::InvalidFormat(format!(
                    "summary record {} claims {} summaries, at most {} fit",
                    record_number, n_summaries, max_summaries
                )));
            }
            debug!(
                "Summary record {}: NEXT={}, NSUM={}",
                record_number, next, n_summaries
            );

            for i in 0..n_summaries {
                let start = 24 + i * step;
                let bytes = &summary_record[start..start + step];

                let doubles = (0..nd)
                    .map(|j| self.endian.read_f64(&bytes[j * 8..j * 8 + 8]))
                    .collect();
                let int_base = nd * DOUBLE_SIZE;
                let integers = (0..ni)
                    .map(|j| {
                        let pos = int_base + j * 4;
                        self.endian.read_i32(&bytes[pos..pos + 4])
                    })
                    .collect();

                let name_bytes = &name_record[i * step..(i + 1) * step];
                let name = String::from_utf8_lossy(name_bytes)
                    .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string();

                result.push(Summary {
                    name,
                    doubles,
                    integers,
                });
            }

            if next == record_number {
                warn!(
                    "summary record {} of {} points at itself",
                    record_number,
                    self.path.display()
                );
                break;
            }
            record_number = next;
        }

        Ok(result)
    }

    /// Read the doubles at 1-based word addresses `start..=end`
    pub fn read_array(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start < 1 || end < start {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid array bounds: start={}, end={}",
                start, end
            )));
        }

        let from = (start - 1) * DOUBLE_SIZE;
        let to = end * DOUBLE_SIZE;
        let bytes = self.map.get(from..to).ok_or_else(|| {
            JplephemError::InvalidFormat(format!(
                "array {}..{} extends past the end of {}",
                start,
                end,
                self.path.display()
            ))
        })?;

        Ok(bytes
            .chunks_exact(DOUBLE_SIZE)
            .map(|chunk| self.endian.read_f64(chunk))
            .collect())
    }
}

/// Work out the byte order from LOCFMT, falling back on plausible ND/NI values
fn detect_endian(header: &[u8]) -> Result<Endian> {
    let locfmt = &header[88..96];
    if locfmt == b"LTL-IEEE" {
        return Ok(Endian::Little);
    }
    if locfmt == b"BIG-IEEE" {
        return Ok(Endian::Big);
    }

    // Pre-1995 files carry no format string
    let plausible = |nd: i32, ni: i32| (1..=124).contains(&nd) && (2..=250).contains(&ni);
    if plausible(
        LittleEndian::read_i32(&header[8..12]),
        LittleEndian::read_i32(&header[12..16]),
    ) {
        Ok(Endian::Little)
    } else if plausible(
        BigEndian::read_i32(&header[8..12]),
        BigEndian::read_i32(&header[12..16]),
    ) {
        Ok(Endian::Big)
    } else {
        Err(JplephemError::InvalidFormat(
            "cannot determine DAF byte order".to_string(),
        ))
    }
}
