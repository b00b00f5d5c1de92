//! # Specimen Metadata
//!
//! Derives specimen identity from the file name and directory layout the test
//! rig produces:
//!
//! ```text
//! data/
//! └── group_A/                      <- specimen group
//!     └── 10in/                     <- gauge length in inches
//!         └── test--line-crimp-21--3.csv
//!                  │    │     │    └── run index
//!                  │    │     └────── diameter class
//!                  │    └──────────── construction type
//!                  └───────────────── tag
//! ```
//!
//! Resolution never fails. Anything that does not match the convention falls
//! back to the defaults below so a badly named file still gets analyzed.
//!
//! ## Example
//!
//! ```rust
//! use tensile_core::specimen::resolve;
//!
//! let meta = resolve("data/group_A/5in/test--line-knot-30--2.csv");
//! assert_eq!(meta.diameter_mm, 30.0);
//! assert_eq!(meta.construction_type, "knot");
//! assert_eq!(meta.run_index, 2);
//! assert_eq!(meta.gauge_length_mm, 127.0);
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::units::{Inches, Millimeters};

/// Diameter class used when the file name carries none
pub const DEFAULT_DIAMETER_MM: f64 = 21.0;

/// Construction type used when the file name carries none
pub const DEFAULT_CONSTRUCTION: &str = "crimp";

/// Gauge length used when no `<n>in` directory is found (10 in)
pub const DEFAULT_GAUGE_LENGTH_MM: f64 = 254.0;

/// Identity and geometry of one tested specimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenMetadata {
    /// Path of the file the specimen was loaded from
    pub source_path: String,

    /// Line diameter in millimetres
    pub diameter_mm: f64,

    /// Construction type (e.g. "crimp", "knot")
    pub construction_type: String,

    /// Test run index within the set
    pub run_index: i64,

    /// Free length between the grips in millimetres
    pub gauge_length_mm: f64,
}

impl SpecimenMetadata {
    /// Gauge length rounded down to whole inches, as used in plot file names
    pub fn gauge_length_inches(&self) -> i64 {
        let inches: Inches = Millimeters(self.gauge_length_mm).into();
        inches.0 as i64
    }

    /// Diameter as the integer class printed in file names and reports
    pub fn size_class(&self) -> i64 {
        self.diameter_mm as i64
    }
}

/// Resolve specimen metadata from a file path.
pub fn resolve(path: impl AsRef<Path>) -> SpecimenMetadata {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (diameter_mm, construction_type, run_index) = parse_file_name(&file_name);
    let gauge_length_mm = path
        .parent()
        .and_then(gauge_length_from_dirs)
        .unwrap_or(DEFAULT_GAUGE_LENGTH_MM);

    SpecimenMetadata {
        source_path: path.display().to_string(),
        diameter_mm,
        construction_type,
        run_index,
        gauge_length_mm,
    }
}

/// Parse `<prefix>--<tag>-<construction>-<diameter>--<run>.csv`.
fn parse_file_name(file_name: &str) -> (f64, String, i64) {
    let slugs: Vec<&str> = file_name.split("--").collect();
    if slugs.len() < 3 {
        return (DEFAULT_DIAMETER_MM, DEFAULT_CONSTRUCTION.to_string(), 0);
    }

    let size_parts: Vec<&str> = slugs[1].split('-').collect();
    let (diameter_mm, construction_type) = match size_parts.as_slice() {
        [_, construction, diameter, ..] => match diameter.trim().parse::<i64>() {
            Ok(diameter) => (diameter as f64, construction.to_string()),
            Err(_) => (DEFAULT_DIAMETER_MM, DEFAULT_CONSTRUCTION.to_string()),
        },
        _ => (DEFAULT_DIAMETER_MM, DEFAULT_CONSTRUCTION.to_string()),
    };

    let run_index = slugs[2]
        .split('.')
        .next()
        .and_then(|run| run.trim().parse::<i64>().ok())
        .unwrap_or(0);

    (diameter_mm, construction_type, run_index)
}

/// Directory components in path order, as text.
fn dir_components(dir: &Path) -> impl Iterator<Item = String> + '_ {
    dir.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    })
}

/// First `<n>in` directory component converted to millimetres.
fn gauge_length_from_dirs(dir: &Path) -> Option<f64> {
    dir_components(dir).find_map(|part| {
        if !part.contains("in") || !part.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        let inches = part.replace("in", "").trim().parse::<i64>().ok()?;
        let length: Millimeters = Inches(inches as f64).into();
        Some(length.0)
    })
}

/// Group label (`group_<x>` component) of a specimen path.
pub fn group_label(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    dir_components(path)
        .find(|part| part.starts_with("group_"))
        .unwrap_or_else(|| "unknown_group".to_string())
}

/// Gauge-length label (`<n>in` component) of a specimen path.
pub fn length_label(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    dir_components(path)
        .find(|part| part.ends_with("in") && part.chars().any(|c| c.is_ascii_digit()))
        .unwrap_or_else(|| "unknown_length".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_file_name() {
        let meta = resolve("data/group_1/5in/test--line-crimp-21--0.csv");
        assert_eq!(meta.diameter_mm, 21.0);
        assert_eq!(meta.construction_type, "crimp");
        assert_eq!(meta.run_index, 0);
        assert_eq!(meta.gauge_length_mm, 127.0);
        assert_eq!(meta.source_path, "data/group_1/5in/test--line-crimp-21--0.csv");
    }

    #[test]
    fn test_malformed_name_uses_defaults() {
        let meta = resolve("some/dir/completely_different_format.csv");
        assert_eq!(meta.diameter_mm, 21.0);
        assert_eq!(meta.construction_type, "crimp");
        assert_eq!(meta.run_index, 0);
        assert_eq!(meta.gauge_length_mm, 254.0);
    }

    #[test]
    fn test_short_middle_segment_defaults_size_only() {
        let meta = resolve("x--line-30--7.csv");
        assert_eq!(meta.diameter_mm, 21.0);
        assert_eq!(meta.construction_type, "crimp");
        assert_eq!(meta.run_index, 7);
    }

    #[test]
    fn test_unparsable_run_is_zero() {
        let meta = resolve("x--line-knot-25--abc.csv");
        assert_eq!(meta.diameter_mm, 25.0);
        assert_eq!(meta.construction_type, "knot");
        assert_eq!(meta.run_index, 0);
    }

    #[test]
    fn test_fixture_directories() {
        assert_eq!(resolve("d/5in/a.csv").gauge_length_mm, 127.0);
        assert_eq!(resolve("d/10in/a.csv").gauge_length_mm, 254.0);
        assert_eq!(resolve("d/20in/a.csv").gauge_length_mm, 508.0);
    }

    #[test]
    fn test_first_length_component_wins() {
        assert_eq!(resolve("5in/20in/a.csv").gauge_length_mm, 127.0);
    }

    #[test]
    fn test_non_numeric_in_component_is_skipped() {
        // "main1" contains "in" and a digit but is not an inch label
        assert_eq!(resolve("main1/20in/a.csv").gauge_length_mm, 508.0);
        assert_eq!(resolve("inbox/a.csv").gauge_length_mm, 254.0);
    }

    #[test]
    fn test_labels() {
        let path = "data/group_B/20in/test--line-crimp-21--1.csv";
        assert_eq!(group_label(path), "group_B");
        assert_eq!(length_label(path), "20in");
        assert_eq!(group_label("a.csv"), "unknown_group");
        assert_eq!(length_label("a.csv"), "unknown_length");
    }

    #[test]
    fn test_plot_name_helpers() {
        let meta = resolve("d/20in/test--line-crimp-21--1.csv");
        assert_eq!(meta.gauge_length_inches(), 20);
        assert_eq!(meta.size_class(), 21);
    }
}
