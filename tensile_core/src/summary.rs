//! # Aggregation
//!
//! Mean and population standard deviation of specimen properties over a set
//! of runs that share a group and gauge length.
//!
//! Inputs carry explicit presence: a specimen that never produced a modulus
//! simply contributes nothing to the modulus statistics, while still counting
//! towards `sample_count`.
//!
//! ## Example
//!
//! ```rust
//! use tensile_core::summary::{summarize, SpecimenStats};
//!
//! let runs = [
//!     SpecimenStats { modulus_pa: Some(1.0e9), ..Default::default() },
//!     SpecimenStats { modulus_pa: Some(3.0e9), ..Default::default() },
//! ];
//! let summary = summarize(&runs);
//! assert_eq!(summary.sample_count, 2);
//! assert_eq!(summary.modulus_avg, 2.0e9);
//! assert_eq!(summary.modulus_std, 1.0e9);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzedSpecimen;
use crate::calculations::fit::{mean, population_std};
use crate::specimen::{DEFAULT_CONSTRUCTION, DEFAULT_DIAMETER_MM, DEFAULT_GAUGE_LENGTH_MM};

/// Aggregator input for one specimen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecimenStats {
    pub modulus_pa: Option<f64>,
    pub yield_stress_pa: Option<f64>,
    pub max_force_n: Option<f64>,
    pub gauge_length_mm: Option<f64>,
    pub diameter_mm: Option<f64>,
    pub construction_type: Option<String>,
}

impl From<&AnalyzedSpecimen> for SpecimenStats {
    fn from(specimen: &AnalyzedSpecimen) -> Self {
        SpecimenStats {
            modulus_pa: Some(specimen.properties.modulus_pa),
            yield_stress_pa: Some(specimen.properties.yield_stress_pa),
            max_force_n: Some(specimen.properties.max_force_n),
            gauge_length_mm: Some(specimen.metadata.gauge_length_mm),
            diameter_mm: Some(specimen.metadata.diameter_mm),
            construction_type: Some(specimen.metadata.construction_type.clone()),
        }
    }
}

/// Statistics of one (group, gauge length) set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub sample_count: usize,
    pub modulus_avg: f64,
    pub modulus_std: f64,
    pub yield_stress_avg: f64,
    pub yield_stress_std: f64,
    pub max_force_avg: f64,
    pub max_force_std: f64,
    /// Gauge length of the first specimen, mm
    pub length_mm: f64,
    /// Diameter class of the first specimen
    pub size_mm: f64,
    /// Construction type of the first specimen
    pub construction_type: String,
}

impl Default for GroupSummary {
    fn default() -> Self {
        GroupSummary {
            sample_count: 0,
            modulus_avg: 0.0,
            modulus_std: 0.0,
            yield_stress_avg: 0.0,
            yield_stress_std: 0.0,
            max_force_avg: 0.0,
            max_force_std: 0.0,
            length_mm: DEFAULT_GAUGE_LENGTH_MM,
            size_mm: DEFAULT_DIAMETER_MM,
            construction_type: DEFAULT_CONSTRUCTION.to_string(),
        }
    }
}

impl GroupSummary {
    /// True for the summary of an empty set
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Summaries keyed by group label, then gauge-length label.
pub type BatchSummary = BTreeMap<String, BTreeMap<String, GroupSummary>>;

/// Mean and population standard deviation of the present values; (0, 0) when
/// none are present.
fn mean_and_std(values: impl Iterator<Item = Option<f64>>) -> (f64, f64) {
    let present: Vec<f64> = values.flatten().collect();
    (
        mean(&present).unwrap_or(0.0),
        population_std(&present).unwrap_or(0.0),
    )
}

/// Aggregate a set of specimens.
pub fn summarize(specimens: &[SpecimenStats]) -> GroupSummary {
    let Some(first) = specimens.first() else {
        return GroupSummary::default();
    };

    let (modulus_avg, modulus_std) = mean_and_std(specimens.iter().map(|s| s.modulus_pa));
    let (yield_stress_avg, yield_stress_std) =
        mean_and_std(specimens.iter().map(|s| s.yield_stress_pa));
    let (max_force_avg, max_force_std) = mean_and_std(specimens.iter().map(|s| s.max_force_n));

    GroupSummary {
        sample_count: specimens.len(),
        modulus_avg,
        modulus_std,
        yield_stress_avg,
        yield_stress_std,
        max_force_avg,
        max_force_std,
        length_mm: first.gauge_length_mm.unwrap_or(DEFAULT_GAUGE_LENGTH_MM),
        size_mm: first.diameter_mm.unwrap_or(DEFAULT_DIAMETER_MM),
        construction_type: first
            .construction_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONSTRUCTION.to_string()),
    }
}

/// Aggregate analyzed specimens.
pub fn summarize_specimens(specimens: &[AnalyzedSpecimen]) -> GroupSummary {
    let stats: Vec<SpecimenStats> = specimens.iter().map(SpecimenStats::from).collect();
    summarize(&stats)
}

/// Averages over the runs of one multi-trace analysis, including the energy
/// figures that the group summary leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRunSummary {
    pub group: GroupSummary,
    pub kinetic_energy_avg: f64,
    pub kinetic_energy_std: f64,
    pub velocity_avg: f64,
    pub velocity_std: f64,
}

impl MultiRunSummary {
    /// Aggregate analyzed specimens; `None` for an empty set.
    pub fn from_specimens(specimens: &[AnalyzedSpecimen]) -> Option<Self> {
        if specimens.is_empty() {
            return None;
        }
        let (kinetic_energy_avg, kinetic_energy_std) =
            mean_and_std(specimens.iter().map(|s| Some(s.properties.kinetic_energy_j)));
        let (velocity_avg, velocity_std) =
            mean_and_std(specimens.iter().map(|s| Some(s.properties.velocity_m_s)));

        Some(MultiRunSummary {
            group: summarize_specimens(specimens),
            kinetic_energy_avg,
            kinetic_energy_std,
            velocity_avg,
            velocity_std,
        })
    }
}
