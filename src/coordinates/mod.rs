//! Sexagesimal angle formatting

pub mod angle;

pub use angle::{to_degrees_minutes_seconds, Dms};
