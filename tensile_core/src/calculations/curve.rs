//! # Stress-Strain Transform
//!
//! Converts raw force/stroke samples into engineering stress and strain using
//! the specimen geometry.
//!
//! ## Formulas
//!
//! ```text
//! A         = π/4 · (d · 1e-3)²                  [m²]
//! stress[i] = (F[i] − min F) / A                 [Pa]
//! strain[i] = (s[i] − min s) / L₀                [mm/mm]
//! ```
//!
//! Both series are zero-floored: the smallest force and stroke in the file
//! are taken as the unloaded baseline.
//!
//! ## Example
//!
//! ```rust
//! use tensile_core::calculations::curve::transform;
//! use tensile_core::specimen::resolve;
//! use tensile_core::table::{RawSample, RawTable};
//!
//! let meta = resolve("data/group_A/10in/test--line-crimp-21--1.csv");
//! let table = RawTable::new(
//!     &meta.source_path,
//!     vec![
//!         RawSample { time: Some(0.0), force: 0.5, stroke: 1.0 },
//!         RawSample { time: Some(0.1), force: 10.5, stroke: 3.54 },
//!     ],
//! );
//! let curve = transform(&table, &meta).unwrap();
//! assert_eq!(curve.stress[0], 0.0);
//! assert!((curve.strain[1] - 0.01).abs() < 1e-12);
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calculations::fit::{first_argmax, max_value, min_value};
use crate::errors::{TensileError, TensileResult};
use crate::specimen::SpecimenMetadata;
use crate::table::RawTable;
use crate::units::{Meters, Millimeters};

/// Circular cross-section area in m² for a diameter in mm.
pub fn cross_section_area_m2(diameter_mm: f64) -> f64 {
    let d: Meters = Millimeters(diameter_mm).into();
    PI * 0.25 * d.0.powi(2)
}

/// Index-aligned stress-strain curve of one specimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressStrainCurve {
    /// Acquisition time in seconds (when recorded)
    pub time: Vec<Option<f64>>,
    /// Force in newtons
    pub force: Vec<f64>,
    /// Stroke in millimetres
    pub stroke: Vec<f64>,
    /// Engineering stress in pascals
    pub stress: Vec<f64>,
    /// Engineering strain (dimensionless)
    pub strain: Vec<f64>,
    /// Cross-section area the stress was computed with, m²
    pub area_m2: f64,
    /// Gauge length the strain was normalized with, mm
    pub gauge_length_mm: f64,
}

impl StressStrainCurve {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.stress.len()
    }

    /// True when the curve has no samples
    pub fn is_empty(&self) -> bool {
        self.stress.is_empty()
    }

    /// Largest stress (0 for an empty curve)
    pub fn max_stress(&self) -> f64 {
        max_value(&self.stress).unwrap_or(0.0)
    }

    /// Largest strain (0 for an empty curve)
    pub fn max_strain(&self) -> f64 {
        max_value(&self.strain).unwrap_or(0.0)
    }

    /// Largest force (0 for an empty curve)
    pub fn max_force(&self) -> f64 {
        max_value(&self.force).unwrap_or(0.0)
    }

    /// Index of the first sample at maximum stress
    pub fn peak_index(&self) -> Option<usize> {
        first_argmax(&self.stress)
    }

    /// Values of one channel, e.g. for plotting.
    ///
    /// Missing time stamps fall back to the sample index.
    pub fn channel(&self, channel: Channel) -> Vec<f64> {
        match channel {
            Channel::Time => self
                .time
                .iter()
                .enumerate()
                .map(|(i, t)| t.unwrap_or(i as f64))
                .collect(),
            Channel::Force => self.force.clone(),
            Channel::Stroke => self.stroke.clone(),
            Channel::Stress => self.stress.clone(),
            Channel::Strain => self.strain.clone(),
        }
    }
}

/// Plottable per-sample quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Time,
    Force,
    Stroke,
    Stress,
    Strain,
}

impl Channel {
    /// Axis label with unit
    pub fn axis_label(self) -> &'static str {
        match self {
            Channel::Time => "Time (sec)",
            Channel::Force => "Force (N)",
            Channel::Stroke => "Stroke (mm)",
            Channel::Stress => "Stress (Pa)",
            Channel::Strain => "Strain (mm/mm)",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Time => "Time",
            Channel::Force => "Force",
            Channel::Stroke => "Stroke",
            Channel::Stress => "Stress",
            Channel::Strain => "Strain",
        };
        f.write_str(name)
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Time" => Ok(Channel::Time),
            "Force" => Ok(Channel::Force),
            "Stroke" => Ok(Channel::Stroke),
            "Stress" => Ok(Channel::Stress),
            "Strain" => Ok(Channel::Strain),
            other => Err(format!("unknown channel '{}'", other)),
        }
    }
}

/// Convert cleaned raw samples into a stress-strain curve.
///
/// # Errors
///
/// * `InvalidGeometry` - diameter gives a non-positive area, or gauge length is not positive
/// * `EmptyData` - the table has no samples
pub fn transform(raw: &RawTable, meta: &SpecimenMetadata) -> TensileResult<StressStrainCurve> {
    let area_m2 = cross_section_area_m2(meta.diameter_mm);
    if meta.diameter_mm <= 0.0 || area_m2 <= 0.0 || !area_m2.is_finite() {
        return Err(TensileError::invalid_geometry(
            "diameter_mm",
            meta.diameter_mm.to_string(),
            format!("Invalid area {} m² from size {}", area_m2, meta.diameter_mm),
        ));
    }
    if meta.gauge_length_mm <= 0.0 || !meta.gauge_length_mm.is_finite() {
        return Err(TensileError::invalid_geometry(
            "gauge_length_mm",
            meta.gauge_length_mm.to_string(),
            "Gauge length must be positive",
        ));
    }
    if raw.is_empty() {
        return Err(TensileError::empty_data(&raw.source_path));
    }

    let force: Vec<f64> = raw.samples.iter().map(|s| s.force).collect();
    let stroke: Vec<f64> = raw.samples.iter().map(|s| s.stroke).collect();
    let time: Vec<Option<f64>> = raw.samples.iter().map(|s| s.time).collect();

    let force_min = min_value(&force).unwrap_or(0.0);
    let stroke_min = min_value(&stroke).unwrap_or(0.0);

    let stress = force.iter().map(|f| (f - force_min) / area_m2).collect();
    let strain = stroke
        .iter()
        .map(|s| (s - stroke_min) / meta.gauge_length_mm)
        .collect();

    tracing::debug!(
        path = %raw.source_path,
        area_m2,
        gauge_length_mm = meta.gauge_length_mm,
        "stress-strain transform"
    );

    Ok(StressStrainCurve {
        time,
        force,
        stroke,
        stress,
        strain,
        area_m2,
        gauge_length_mm: meta.gauge_length_mm,
    })
}
