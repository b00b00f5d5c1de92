//! # Error Types
//!
//! Structured error types for tensile_core. Every variant carries enough
//! context to tell which file, column or geometry value caused the failure,
//! so batch runs can report a skipped specimen without re-reading the file.
//!
//! ## Example
//!
//! ```rust
//! use tensile_core::errors::{TensileError, TensileResult};
//!
//! fn validate_diameter(diameter_mm: f64) -> TensileResult<()> {
//!     if diameter_mm <= 0.0 {
//!         return Err(TensileError::invalid_geometry(
//!             "diameter_mm",
//!             diameter_mm.to_string(),
//!             "Diameter must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tensile_core operations
pub type TensileResult<T> = Result<T, TensileError>;

/// Structured error type for loading and analysis operations.
///
/// `FormatError`, `InvalidGeometry`, `InvalidData` and `EmptyData` are
/// file-level: they abort one specimen, never a whole batch.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum TensileError {
    /// Input is not the expected tabular format
    #[error("Format error in '{path}': {reason}")]
    FormatError { path: String, reason: String },

    /// Specimen geometry yields a non-positive cross-section or gauge length
    #[error("Invalid geometry for '{field}': {value} - {reason}")]
    InvalidGeometry {
        field: String,
        value: String,
        reason: String,
    },

    /// Too many unparsable values in a required column
    #[error("Invalid data in column '{column}': {reason}")]
    InvalidData { column: String, reason: String },

    /// No usable rows remain after cleaning
    #[error("No valid data rows after cleaning: {path}")]
    EmptyData { path: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// CSV/JSON serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Plot rendering failed
    #[error("Plot error: {reason}")]
    PlotError { reason: String },
}

impl TensileError {
    /// Create a FormatError
    pub fn format_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TensileError::FormatError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidGeometry error
    pub fn invalid_geometry(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TensileError::InvalidGeometry {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidData error
    pub fn invalid_data(column: impl Into<String>, reason: impl Into<String>) -> Self {
        TensileError::InvalidData {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create an EmptyData error
    pub fn empty_data(path: impl Into<String>) -> Self {
        TensileError::EmptyData { path: path.into() }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TensileError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a PlotError
    pub fn plot_error(reason: impl ToString) -> Self {
        TensileError::PlotError {
            reason: reason.to_string(),
        }
    }

    /// True for errors that only invalidate the specimen being loaded
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            TensileError::FormatError { .. }
                | TensileError::InvalidGeometry { .. }
                | TensileError::InvalidData { .. }
                | TensileError::EmptyData { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TensileError::FormatError { .. } => "FORMAT_ERROR",
            TensileError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            TensileError::InvalidData { .. } => "INVALID_DATA",
            TensileError::EmptyData { .. } => "EMPTY_DATA",
            TensileError::FileError { .. } => "FILE_ERROR",
            TensileError::SerializationError { .. } => "SERIALIZATION_ERROR",
            TensileError::PlotError { .. } => "PLOT_ERROR",
        }
    }
}

impl From<csv::Error> for TensileError {
    fn from(err: csv::Error) -> Self {
        TensileError::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TensileError {
    fn from(err: serde_json::Error) -> Self {
        TensileError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error =
            TensileError::invalid_geometry("diameter_mm", "-1", "Diameter must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidGeometry\""));
        let roundtrip: TensileError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TensileError::empty_data("a.csv").error_code(), "EMPTY_DATA");
        assert_eq!(
            TensileError::invalid_data("Force", "too many").error_code(),
            "INVALID_DATA"
        );
    }

    #[test]
    fn test_file_level_classification() {
        assert!(TensileError::format_error("a.txt", "not csv").is_file_level());
        assert!(TensileError::empty_data("a.csv").is_file_level());
        assert!(!TensileError::file_error("write", "out", "denied").is_file_level());
        assert!(!TensileError::plot_error("backend").is_file_level());
    }
}
