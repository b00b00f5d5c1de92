//! # Batch Processing
//!
//! Analyzes a whole data tree in one go:
//!
//! ```text
//! <data_dir>/
//! ├── group_A/
//! │   ├── 5in/*.csv
//! │   └── 10in/*.csv
//! └── group_B/
//!     └── 20in/*.csv
//! ```
//!
//! The files of each (group, length) set are analyzed in parallel. A file
//! that fails to load or transform is logged and skipped; its siblings are
//! still analyzed and aggregated. Every run leaves a `batch_manifest.json`
//! recording what was analyzed and what was skipped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{analyze_file, AnalyzedSpecimen};
use crate::calculations::curve::Channel;
use crate::errors::{TensileError, TensileResult};
use crate::file_io::{ensure_dir, write_atomic};
use crate::plot::{plot_multi_trace, plot_summary_comparison};
use crate::report::write_summary_report;
use crate::settings::OutputSettings;
use crate::summary::{summarize_specimens, BatchSummary};

pub const MANIFEST_FILE: &str = "batch_manifest.json";

/// CSV files of one (group, gauge length) directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecimenSet {
    pub group: String,
    pub length: String,
    pub files: Vec<PathBuf>,
}

/// A `group_*` directory and the non-empty sets below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDir {
    pub name: String,
    pub sets: Vec<SpecimenSet>,
}

/// A file the batch could not analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub error: TensileError,
}

/// Record of one batch run, written next to the outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub generated_at: DateTime<Utc>,
    pub data_dir: String,
    pub output_dir: String,
    pub analyzed: usize,
    pub skipped: Vec<SkippedFile>,
    pub summary: BatchSummary,
}

/// Result of [`run_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    pub analyzed: usize,
    pub skipped: Vec<SkippedFile>,
    pub manifest_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

/// Sorted subdirectories (or files) of `dir` whose name passes `keep`.
fn sorted_entries(
    dir: &Path,
    want_dirs: bool,
    keep: impl Fn(&str) -> bool,
) -> TensileResult<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        TensileError::file_error("read directory", dir.display().to_string(), e.to_string())
    })?;

    let mut found: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() == want_dirs)
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            keep(&name).then_some((name, path))
        })
        .collect();
    found.sort();
    Ok(found)
}

/// Find `group_*/<n>in/*.csv` files under `data_dir`, sorted by name at
/// every level.
///
/// # Errors
///
/// `FileError` when `data_dir` does not exist or cannot be read.
pub fn discover(data_dir: &Path) -> TensileResult<Vec<GroupDir>> {
    if !data_dir.is_dir() {
        return Err(TensileError::file_error(
            "read data directory",
            data_dir.display().to_string(),
            "Data directory does not exist",
        ));
    }

    let mut groups = Vec::new();
    let group_dirs = sorted_entries(data_dir, true, |name| name.starts_with("group_"))?;
    for (group, group_path) in group_dirs {
        let mut sets = Vec::new();
        let length_dirs = sorted_entries(&group_path, true, |name| name.ends_with("in"))?;
        for (length, length_path) in length_dirs {
            let files: Vec<PathBuf> =
                sorted_entries(&length_path, false, |name| name.ends_with(".csv"))?
                    .into_iter()
                    .map(|(_, path)| path)
                    .collect();
            if !files.is_empty() {
                sets.push(SpecimenSet {
                    group: group.clone(),
                    length,
                    files,
                });
            }
        }
        groups.push(GroupDir { name: group, sets });
    }
    Ok(groups)
}

/// Analyze every file of a set in parallel; failures are returned alongside
/// the successes, both in file order.
pub fn analyze_set(set: &SpecimenSet) -> (Vec<AnalyzedSpecimen>, Vec<SkippedFile>) {
    let results: Vec<(String, TensileResult<AnalyzedSpecimen>)> = set
        .files
        .par_iter()
        .map(|path| (path.display().to_string(), analyze_file(path)))
        .collect();

    let mut specimens = Vec::new();
    let mut skipped = Vec::new();
    for (path, result) in results {
        match result {
            Ok(specimen) => specimens.push(specimen),
            Err(error) => {
                if error.is_file_level() {
                    tracing::warn!(
                        path = %path,
                        code = error.error_code(),
                        "skipping file: {}",
                        error
                    );
                } else {
                    tracing::error!(
                        path = %path,
                        code = error.error_code(),
                        "skipping unreadable file: {}",
                        error
                    );
                }
                skipped.push(SkippedFile { path, error });
            }
        }
    }
    (specimens, skipped)
}

/// Analyze a data tree, aggregate per (group, length) and write the outputs.
///
/// Writes a multi-trace stress-strain plot per set (when plots are enabled)
/// and the manifest. With `write_summary`, also writes `summary_report.txt`
/// and the comparison plot.
pub fn run_batch(
    data_dir: &Path,
    settings: &OutputSettings,
    write_summary: bool,
) -> TensileResult<BatchOutcome> {
    let groups = discover(data_dir)?;
    ensure_dir(&settings.output_dir)?;

    let mut summary = BatchSummary::new();
    let mut analyzed = 0;
    let mut skipped = Vec::new();

    for group in &groups {
        tracing::info!(group = %group.name, "processing group");
        let lengths = summary.entry(group.name.clone()).or_default();

        for set in &group.sets {
            tracing::info!(
                group = %set.group,
                length = %set.length,
                files = set.files.len(),
                "processing set"
            );
            let (specimens, failed) = analyze_set(set);
            skipped.extend(failed);
            if specimens.is_empty() {
                continue;
            }
            analyzed += specimens.len();

            if settings.write_plots {
                let suffix = format!("{}_{}", set.group, set.length);
                plot_multi_trace(
                    &specimens,
                    Channel::Strain,
                    Channel::Stress,
                    Some(&suffix),
                    settings,
                )?;
            }
            lengths.insert(set.length.clone(), summarize_specimens(&specimens));
        }
    }

    let report_path = if write_summary {
        if settings.write_plots {
            plot_summary_comparison(&summary, settings)?;
        }
        Some(write_summary_report(&settings.output_dir, &summary)?)
    } else {
        None
    };

    let manifest = BatchManifest {
        generated_at: Utc::now(),
        data_dir: data_dir.display().to_string(),
        output_dir: settings.output_dir.display().to_string(),
        analyzed,
        skipped: skipped.clone(),
        summary: summary.clone(),
    };
    let manifest_path = settings.output_dir.join(MANIFEST_FILE);
    write_atomic(&manifest_path, &serde_json::to_vec_pretty(&manifest)?)?;

    tracing::info!(
        analyzed,
        skipped = skipped.len(),
        output = %settings.output_dir.display(),
        "batch processing complete"
    );

    Ok(BatchOutcome {
        summary,
        analyzed,
        skipped,
        manifest_path,
        report_path,
    })
}
