//! # Reports
//!
//! Tabular and text outputs of an analysis run:
//!
//! | File                     | Content                              | Mode   |
//! |--------------------------|--------------------------------------|--------|
//! | `individual_results.csv` | one row per analyzed specimen        | append |
//! | `multi_run_averages.csv` | one row per multi-trace analysis     | append |
//! | `summary_report.txt`     | per group / per length statistics    | atomic |
//!
//! CSV column names keep their unit suffixes (`max_force_N`, `modulus_MPa`)
//! so the files read unambiguously in a spreadsheet.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzedSpecimen;
use crate::errors::TensileResult;
use crate::file_io::{append_csv_rows, ensure_dir, write_atomic};
use crate::summary::{BatchSummary, MultiRunSummary};
use crate::units::{Megapascals, Pascals};

pub const INDIVIDUAL_RESULTS_FILE: &str = "individual_results.csv";
pub const MULTI_RUN_AVERAGES_FILE: &str = "multi_run_averages.csv";
pub const SUMMARY_REPORT_FILE: &str = "summary_report.txt";

/// One row of `individual_results.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRow {
    pub file: String,
    pub group: String,
    pub length: String,
    #[serde(rename = "max_force_N")]
    pub max_force_n: f64,
    #[serde(rename = "modulus_MPa")]
    pub modulus_mpa: f64,
    #[serde(rename = "yield_stress_MPa")]
    pub yield_stress_mpa: f64,
    #[serde(rename = "kinetic_energy_J")]
    pub kinetic_energy_j: f64,
    pub velocity_m_s: f64,
    pub length_mm: f64,
    pub diameter_mm: i64,
}

impl From<&AnalyzedSpecimen> for IndividualRow {
    fn from(specimen: &AnalyzedSpecimen) -> Self {
        let props = &specimen.properties;
        IndividualRow {
            file: specimen.metadata.source_path.clone(),
            group: specimen.group(),
            length: specimen.length(),
            max_force_n: props.max_force_n,
            modulus_mpa: props.modulus_mpa(),
            yield_stress_mpa: props.yield_stress_mpa(),
            kinetic_energy_j: props.kinetic_energy_j,
            velocity_m_s: props.velocity_m_s,
            length_mm: specimen.metadata.gauge_length_mm,
            diameter_mm: specimen.metadata.size_class(),
        }
    }
}

/// One row of `multi_run_averages.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRunRow {
    pub group: String,
    pub length: String,
    pub sample_count: usize,
    #[serde(rename = "avg_max_force_N")]
    pub avg_max_force_n: f64,
    #[serde(rename = "std_max_force_N")]
    pub std_max_force_n: f64,
    #[serde(rename = "avg_modulus_MPa")]
    pub avg_modulus_mpa: f64,
    #[serde(rename = "std_modulus_MPa")]
    pub std_modulus_mpa: f64,
    #[serde(rename = "avg_yield_stress_MPa")]
    pub avg_yield_stress_mpa: f64,
    #[serde(rename = "std_yield_stress_MPa")]
    pub std_yield_stress_mpa: f64,
    #[serde(rename = "avg_kinetic_energy_J")]
    pub avg_kinetic_energy_j: f64,
    #[serde(rename = "std_kinetic_energy_J")]
    pub std_kinetic_energy_j: f64,
    pub avg_velocity_m_s: f64,
    pub std_velocity_m_s: f64,
    pub length_mm: f64,
    pub diameter_mm: i64,
}

impl MultiRunRow {
    /// Row for a multi-trace analysis; group and length come from the first
    /// specimen's path.
    pub fn new(first: &AnalyzedSpecimen, summary: &MultiRunSummary) -> Self {
        let mpa = |pa: f64| Megapascals::from(Pascals(pa)).0;
        let group = &summary.group;
        MultiRunRow {
            group: first.group(),
            length: first.length(),
            sample_count: group.sample_count,
            avg_max_force_n: group.max_force_avg,
            std_max_force_n: group.max_force_std,
            avg_modulus_mpa: mpa(group.modulus_avg),
            std_modulus_mpa: mpa(group.modulus_std),
            avg_yield_stress_mpa: mpa(group.yield_stress_avg),
            std_yield_stress_mpa: mpa(group.yield_stress_std),
            avg_kinetic_energy_j: summary.kinetic_energy_avg,
            std_kinetic_energy_j: summary.kinetic_energy_std,
            avg_velocity_m_s: summary.velocity_avg,
            std_velocity_m_s: summary.velocity_std,
            length_mm: first.metadata.gauge_length_mm,
            diameter_mm: first.metadata.size_class(),
        }
    }
}

/// Rows for `individual_results.csv`, in input order.
pub fn individual_rows(specimens: &[AnalyzedSpecimen]) -> Vec<IndividualRow> {
    specimens.iter().map(IndividualRow::from).collect()
}

/// Append specimens to `<output_dir>/individual_results.csv`.
pub fn append_individual_results(
    output_dir: &Path,
    specimens: &[AnalyzedSpecimen],
) -> TensileResult<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(INDIVIDUAL_RESULTS_FILE);
    append_csv_rows(&path, &individual_rows(specimens))?;
    tracing::info!(path = %path.display(), rows = specimens.len(), "individual results saved");
    Ok(path)
}

/// Append one averages row to `<output_dir>/multi_run_averages.csv`.
pub fn append_multi_run_averages(output_dir: &Path, row: &MultiRunRow) -> TensileResult<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(MULTI_RUN_AVERAGES_FILE);
    append_csv_rows(&path, std::slice::from_ref(row))?;
    tracing::info!(path = %path.display(), "multi-run averages saved");
    Ok(path)
}

/// Scientific notation with two decimals and a signed two-digit exponent,
/// e.g. `1.23e+09`.
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{:.2e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}

/// Text of `summary_report.txt`.
pub fn render_summary_report(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str("Fishing Line Material Properties Analysis Summary\n");
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for (group, lengths) in summary {
        let _ = writeln!(out, "Group: {}", group);
        out.push_str(&"-".repeat(30));
        out.push('\n');

        for (length, stats) in lengths {
            let _ = writeln!(out, "  Length: {}", length);
            let _ = writeln!(out, "    Sample Count: {}", stats.sample_count);
            let _ = writeln!(
                out,
                "    Modulus: {} ± {} Pa",
                format_scientific(stats.modulus_avg),
                format_scientific(stats.modulus_std)
            );
            let _ = writeln!(
                out,
                "    Yield Stress: {} ± {} Pa",
                format_scientific(stats.yield_stress_avg),
                format_scientific(stats.yield_stress_std)
            );
            let _ = writeln!(
                out,
                "    Max Force: {:.2} ± {:.2} N",
                stats.max_force_avg, stats.max_force_std
            );
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Write `<output_dir>/summary_report.txt` atomically.
pub fn write_summary_report(output_dir: &Path, summary: &BatchSummary) -> TensileResult<PathBuf> {
    ensure_dir(output_dir)?;
    let path = output_dir.join(SUMMARY_REPORT_FILE);
    write_atomic(&path, render_summary_report(summary).as_bytes())?;
    tracing::info!(path = %path.display(), "summary report saved");
    Ok(path)
}

/// One-line console summary of a specimen.
pub fn render_specimen_line(specimen: &AnalyzedSpecimen) -> String {
    let props = &specimen.properties;
    format!(
        "File: {} | Force: {:.2}N | Modulus: {:.2}MPa | Yield: {:.2}MPa | KE: {:.4}J | \
         Velocity: {:.2}m/s | Length: {:.1}mm | Diameter: {}mm",
        specimen.metadata.source_path,
        props.max_force_n,
        props.modulus_mpa(),
        props.yield_stress_mpa(),
        props.kinetic_energy_j,
        props.velocity_m_s,
        specimen.metadata.gauge_length_mm,
        specimen.metadata.size_class(),
    )
}

/// One-line console summary of a multi-trace analysis.
pub fn render_multi_line(summary: &MultiRunSummary) -> String {
    format!(
        "Multi-sample | Samples: {} | Avg KE: {:.4}±{:.4}J | Avg V: {:.2}±{:.2}m/s | \
         Avg Force: {:.2}±{:.2}N",
        summary.group.sample_count,
        summary.kinetic_energy_avg,
        summary.kinetic_energy_std,
        summary.velocity_avg,
        summary.velocity_std,
        summary.group.max_force_avg,
        summary.group.max_force_std,
    )
}
