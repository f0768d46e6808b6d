//! Error types for the jplephem module

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading DAF/SPK files or evaluating their segments
#[derive(Error, Debug)]
pub enum JplephemError {
    /// A file could not be opened or mapped
    #[error("File I/O error on {path:?}: {source}")]
    FileError {
        /// The path of the file that caused the error
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// An epoch falls outside the span covered by a segment
    #[error("Date {jd} is outside ephemeris range ({start_jd}..{end_jd})")]
    OutOfRange {
        /// The requested TDB Julian date
        jd: f64,
        /// First Julian date covered
        start_jd: f64,
        /// Last Julian date covered
        end_jd: f64,
    },

    /// The file is not a DAF we understand, or its contents are inconsistent
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// No segment links the two bodies
    #[error("Body not found: center={center}, target={target}")]
    BodyNotFound {
        /// The center body ID
        center: i32,
        /// The target body ID
        target: i32,
    },

    /// Only SPK types 2 and 3 are evaluated
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(i32),
}

/// Result type for jplephem operations
pub type Result<T> = std::result::Result<T, JplephemError>;

/// Wrap an I/O error together with the path that produced it
pub fn io_err(path: impl Into<PathBuf>, err: std::io::Error) -> JplephemError {
    JplephemError::FileError {
        path: path.into(),
        source: err,
    }
}
