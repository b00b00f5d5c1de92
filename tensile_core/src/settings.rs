//! # Output Settings
//!
//! Where results go and how plots are rendered. Settings can come from a JSON
//! file; every field is optional there and unknown fields are rejected:
//!
//! ```json
//! {
//!   "output_dir": "results",
//!   "plot_width": 1600,
//!   "write_plots": false
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{TensileError, TensileResult};

/// Output configuration shared by analyze and batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Root directory for CSVs, reports and plots
    pub output_dir: PathBuf,

    /// Plot width in pixels
    pub plot_width: u32,

    /// Plot height in pixels
    pub plot_height: u32,

    /// Render SVG plots alongside the CSV/text outputs
    pub write_plots: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            output_dir: PathBuf::from("out"),
            plot_width: 1200,
            plot_height: 800,
            write_plots: true,
        }
    }
}

impl OutputSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> TensileResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TensileError::file_error("read settings", path.display().to_string(), e.to_string())
        })?;
        let settings: OutputSettings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject zero-sized plots.
    pub fn validate(&self) -> TensileResult<()> {
        if self.plot_width == 0 || self.plot_height == 0 {
            return Err(TensileError::SerializationError {
                reason: format!(
                    "plot size must be positive, got {}x{}",
                    self.plot_width, self.plot_height
                ),
            });
        }
        Ok(())
    }

    /// Plot size as a (width, height) pair
    pub fn plot_size(&self) -> (u32, u32) {
        (self.plot_width, self.plot_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "output_dir": "results", "write_plots": false }"#).unwrap();

        let settings = OutputSettings::load(&path).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("results"));
        assert!(!settings.write_plots);
        assert_eq!(settings.plot_size(), (1200, 800));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "dpi": 300 }"#).unwrap();

        let err = OutputSettings::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_zero_plot_size_is_rejected() {
        let settings = OutputSettings {
            plot_width: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = OutputSettings::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
