//! Standard SPICE target names and ID numbers
//!
//! Display names for the NAIF ID numbers used in the JPL planetary
//! ephemerides.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Map from target ID numbers to canonical names (first name listed wins)
    static ref TARGET_NAMES: HashMap<i32, &'static str> = {
        let mut m = HashMap::new();
        for &(id, name) in TARGET_NAME_PAIRS.iter() {
            m.entry(id).or_insert(name);
        }
        m
    };
}

/// Get the name of a target given its ID number
pub fn target_name(id: i32) -> Option<&'static str> {
    TARGET_NAMES.get(&id).copied()
}

/// Title-case a target name, leaving acronyms such as "SSB" alone
pub fn titlecase(name: &str) -> String {
    if matches!(name, "SSB" | "EMB") {
        return name.to_string();
    }
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Pairs of (id, name) for the bodies found in the DE4xx planetary kernels
const TARGET_NAME_PAIRS: &[(i32, &str)] = &[
    (0, "SOLAR SYSTEM BARYCENTER"),
    (0, "SSB"),
    (1, "MERCURY BARYCENTER"),
    (2, "VENUS BARYCENTER"),
    (3, "EARTH BARYCENTER"),
    (3, "EMB"),
    (3, "EARTH MOON BARYCENTER"),
    (4, "MARS BARYCENTER"),
    (5, "JUPITER BARYCENTER"),
    (6, "SATURN BARYCENTER"),
    (7, "URANUS BARYCENTER"),
    (8, "NEPTUNE BARYCENTER"),
    (9, "PLUTO BARYCENTER"),
    (10, "SUN"),
    (199, "MERCURY"),
    (299, "VENUS"),
    (301, "MOON"),
    (399, "EARTH"),
    (401, "PHOBOS"),
    (402, "DEIMOS"),
    (499, "MARS"),
    (599, "JUPITER"),
    (699, "SATURN"),
    (799, "URANUS"),
    (899, "NEPTUNE"),
    (999, "PLUTO"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names() {
        assert_eq!(target_name(399), Some("EARTH"));
        assert_eq!(target_name(3), Some("EARTH BARYCENTER"));
        assert_eq!(target_name(0), Some("SOLAR SYSTEM BARYCENTER"));
        assert_eq!(target_name(-82), None);
    }

    #[test]
    fn test_titlecase() {
        assert_eq!(titlecase("EARTH BARYCENTER"), "Earth Barycenter");
        assert_eq!(titlecase("SSB"), "SSB");
        assert_eq!(titlecase("MOON"), "Moon");
    }
}
