//! # Raw Measurement Table
//!
//! One row per acquisition sample, in acquisition order. Row order is the
//! loading history of the specimen and is never changed.
//!
//! Text cells are coerced to numbers here. A column may carry the odd blank
//! or garbled cell (rig hiccups); when more than half of `Force` or `Stroke`
//! is unusable the file is rejected as [`TensileError::InvalidData`].

use serde::{Deserialize, Serialize};

use crate::errors::{TensileError, TensileResult};

/// Largest fraction of unparsable cells tolerated in a required column
pub const MAX_INVALID_FRACTION: f64 = 0.5;

/// One measurement row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Acquisition time in seconds, when the file has a `Time` column
    pub time: Option<f64>,
    /// Force in newtons
    pub force: f64,
    /// Crosshead stroke in millimetres
    pub stroke: f64,
}

/// Cleaned samples of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Path the samples were read from
    pub source_path: String,
    /// Samples in acquisition order
    pub samples: Vec<RawSample>,
}

impl RawTable {
    /// Build a table from already-numeric samples.
    pub fn new(source_path: impl Into<String>, samples: Vec<RawSample>) -> Self {
        RawTable {
            source_path: source_path.into(),
            samples,
        }
    }

    /// Coerce text columns into a cleaned table.
    ///
    /// `time` may be `None` when the file has no `Time` column. Columns must
    /// have the same length.
    pub fn from_cells(
        source_path: impl Into<String>,
        time: Option<&[String]>,
        force: &[String],
        stroke: &[String],
    ) -> TensileResult<Self> {
        let source_path = source_path.into();
        if force.len() != stroke.len() {
            return Err(TensileError::format_error(
                source_path,
                format!(
                    "Force and Stroke columns differ in length ({} vs {})",
                    force.len(),
                    stroke.len()
                ),
            ));
        }

        let force: Vec<Option<f64>> = force.iter().map(|cell| coerce(cell)).collect();
        let stroke: Vec<Option<f64>> = stroke.iter().map(|cell| coerce(cell)).collect();

        check_invalid_fraction("Force", &force)?;
        check_invalid_fraction("Stroke", &stroke)?;

        let samples: Vec<RawSample> = force
            .iter()
            .zip(&stroke)
            .enumerate()
            .filter_map(|(i, (force, stroke))| {
                Some(RawSample {
                    time: time.and_then(|t| t.get(i)).and_then(|cell| coerce(cell)),
                    force: (*force)?,
                    stroke: (*stroke)?,
                })
            })
            .collect();

        if samples.is_empty() {
            return Err(TensileError::empty_data(source_path));
        }

        Ok(RawTable {
            source_path,
            samples,
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the table holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Parse a cell as a number; blanks, text and non-finite values count as missing.
fn coerce(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn check_invalid_fraction(column: &str, values: &[Option<f64>]) -> TensileResult<()> {
    if values.is_empty() {
        return Ok(());
    }
    let invalid = values.iter().filter(|v| v.is_none()).count();
    let fraction = invalid as f64 / values.len() as f64;
    if fraction > MAX_INVALID_FRACTION {
        return Err(TensileError::invalid_data(
            column,
            format!(
                "Too many invalid {} values in the data ({} of {})",
                column,
                invalid,
                values.len()
            ),
        ));
    }
    Ok(())
}
