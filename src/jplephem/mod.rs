//! JPL Ephemeris module for high-precision planetary positions
//!
//! This module reads JPL Development Ephemerides (DE) distributed as binary
//! SPK (Spacecraft Planet Kernel) files in the NAIF SPICE format.
//!
//! # Main Components
//!
//! - `daf`: Double Array File format reader (underlying format of SPK files)
//! - `spk`: Spacecraft Planet Kernel reader and Chebyshev segment evaluation
//! - `chebyshev`: Clenshaw evaluation of Chebyshev series and their derivatives
//! - `names`: Mappings between celestial body names and ID numbers
//! - `calendar`: Julian date helpers used when describing segments

pub mod calendar;
pub mod chebyshev;
pub mod daf;
pub mod errors;
pub mod names;
pub mod spk;

#[cfg(test)]
pub(crate) mod tests;

pub use self::errors::JplephemError;
pub use self::spk::SPK;
