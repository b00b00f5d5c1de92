//! # Tensile Calculations
//!
//! The numeric stages of a specimen analysis. Each stage is a pure function
//! over typed records:
//!
//! - [`curve::transform`] - raw samples + geometry → stress-strain curve
//! - [`yield_point::detect_yield`] - curve → yield strain
//! - [`properties::estimate`] - curve + yield strain → derived properties
//!
//! ## Supporting Modules
//!
//! - [`fit`] - least-squares line fit, trapezoid rule, summary statistics
//! - [`knee`] - Kneedle knee search used by the yield detector

pub mod curve;
pub mod fit;
pub mod knee;
pub mod properties;
pub mod yield_point;

// Re-export commonly used types
pub use curve::{transform, Channel, StressStrainCurve};
pub use properties::{estimate, DerivedProperties, ASSUMED_MASS_KG};
pub use yield_point::{detect_yield, detect_yield_with_method, YieldDetection, YieldMethod};
