//! # Specimen Analysis Pipeline
//!
//! Runs the full per-file pipeline:
//!
//! ```text
//! path ─► resolve ─► load_table ─► transform ─► detect_yield ─► estimate
//!           │            │              │              │             │
//!      metadata      RawTable   StressStrainCurve  yield strain  DerivedProperties
//! ```
//!
//! Each file is analyzed independently; nothing is shared between calls, so
//! callers are free to fan files out across threads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tensile_core::analysis::analyze_file;
//!
//! let specimen = analyze_file("data/group_A/10in/test--line-crimp-21--1.csv")?;
//! println!("modulus {:.2} MPa", specimen.properties.modulus_mpa());
//! # Ok::<(), tensile_core::errors::TensileError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calculations::curve::{transform, StressStrainCurve};
use crate::calculations::properties::{estimate, DerivedProperties};
use crate::calculations::yield_point::detect_yield_with_method;
use crate::errors::TensileResult;
use crate::file_io::load_table;
use crate::specimen::{group_label, length_label, resolve, SpecimenMetadata};
use crate::table::RawTable;

/// Everything known about one analyzed specimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSpecimen {
    pub metadata: SpecimenMetadata,
    pub curve: StressStrainCurve,
    pub properties: DerivedProperties,
}

impl AnalyzedSpecimen {
    /// File name of the source CSV (without directories)
    pub fn file_name(&self) -> String {
        Path::new(&self.metadata.source_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.metadata.source_path.clone())
    }

    /// `group_<x>` label of the source path
    pub fn group(&self) -> String {
        group_label(&self.metadata.source_path)
    }

    /// `<n>in` label of the source path
    pub fn length(&self) -> String {
        length_label(&self.metadata.source_path)
    }
}

/// Load and analyze one rig export.
///
/// # Errors
///
/// Any file-level [`TensileError`](crate::errors::TensileError) from loading
/// or transforming the file. Yield detection and estimation never fail.
pub fn analyze_file(path: impl AsRef<Path>) -> TensileResult<AnalyzedSpecimen> {
    let table = load_table(path.as_ref())?;
    analyze_table(&table)
}

/// Analyze already-loaded samples. Metadata is resolved from the table's
/// source path.
pub fn analyze_table(table: &RawTable) -> TensileResult<AnalyzedSpecimen> {
    let metadata = resolve(&table.source_path);
    let curve = transform(table, &metadata)?;

    let detection = detect_yield_with_method(&curve);
    let properties = estimate(&curve, &metadata, detection.map(|d| d.strain));

    tracing::info!(
        path = %metadata.source_path,
        yield_method = ?detection.map(|d| d.method),
        modulus_mpa = properties.modulus_mpa(),
        max_force_n = properties.max_force_n,
        "specimen analyzed"
    );

    Ok(AnalyzedSpecimen {
        metadata,
        curve,
        properties,
    })
}
