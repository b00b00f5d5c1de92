//! # tensile_core - Fishing-Line Tensile Test Analysis Engine
//!
//! `tensile_core` turns the CSV exports of a tensile test rig into material
//! properties of fishing-line specimens: stress-strain curves, yield point,
//! Young's modulus, stored elastic energy and the launch velocity that energy
//! corresponds to. Results are aggregated per specimen group and gauge length
//! and written as CSV, text reports and SVG plots.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every stage is a pure function of its inputs
//! - **Typed records**: metadata, curves and properties are plain serde structs
//! - **Rich Errors**: structured error types, not just strings
//! - **Forgiving batches**: a bad file is skipped, never the whole run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tensile_core::analysis::analyze_file;
//! use tensile_core::report::render_specimen_line;
//!
//! let specimen = analyze_file("data/group_A/10in/test--line-crimp-21--1.csv")?;
//! println!("{}", render_specimen_line(&specimen));
//! # Ok::<(), tensile_core::errors::TensileError>(())
//! ```
//!
//! ## Modules
//!
//! - [`specimen`] - Specimen metadata from file and directory names
//! - [`table`] - Cleaned raw measurement rows
//! - [`calculations`] - Stress-strain transform, yield detection, properties
//! - [`analysis`] - The per-file pipeline
//! - [`summary`] - Aggregation per group and gauge length
//! - [`report`] - CSV and text outputs
//! - [`plot`] - SVG charts
//! - [`batch`] - Whole data-tree processing
//! - [`settings`] - Output configuration
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - CSV loading, atomic writes and locked appends

pub mod analysis;
pub mod batch;
pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod plot;
pub mod report;
pub mod settings;
pub mod specimen;
pub mod summary;
pub mod table;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use analysis::{analyze_file, analyze_table, AnalyzedSpecimen};
pub use calculations::{Channel, DerivedProperties, StressStrainCurve};
pub use errors::{TensileError, TensileResult};
pub use settings::OutputSettings;
pub use specimen::{resolve, SpecimenMetadata};
pub use summary::{summarize, BatchSummary, GroupSummary, MultiRunSummary, SpecimenStats};
