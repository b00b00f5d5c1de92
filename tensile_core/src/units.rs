//! # Unit Types
//!
//! Type-safe wrappers for the handful of units a tensile test moves between.
//! They are plain f64 newtypes so JSON output stays clean (just numbers).
//!
//! ## Units in Play
//!
//! - Length: the rig reports stroke in millimetres, fixtures are labelled in
//!   inches (`5in`, `10in`), cross-sections are computed in metres
//! - Stress: pascals internally, megapascals in reports and plots
//!
//! ## Example
//!
//! ```rust
//! use tensile_core::units::{Inches, Millimeters, Megapascals, Pascals};
//!
//! let gauge: Millimeters = Inches(10.0).into();
//! assert_eq!(gauge.0, 254.0);
//!
//! let stress: Megapascals = Pascals(2.5e8).into();
//! assert_eq!(stress.0, 250.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

// ============================================================================
// Length Units
// ============================================================================

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Inches> for Millimeters {
    fn from(inches: Inches) -> Self {
        Millimeters(inches.0 * MM_PER_INCH)
    }
}

impl From<Millimeters> for Inches {
    fn from(mm: Millimeters) -> Self {
        Inches(mm.0 / MM_PER_INCH)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 * 1e-3)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress in pascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pascals(pub f64);

/// Stress in megapascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megapascals(pub f64);

impl From<Pascals> for Megapascals {
    fn from(pa: Pascals) -> Self {
        Megapascals(pa.0 * 1e-6)
    }
}

impl From<Megapascals> for Pascals {
    fn from(mpa: Megapascals) -> Self {
        Pascals(mpa.0 * 1e6)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Inches);
impl_arithmetic!(Millimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Pascals);
impl_arithmetic!(Megapascals);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_lengths_are_exact() {
        let five: Millimeters = Inches(5.0).into();
        let ten: Millimeters = Inches(10.0).into();
        let twenty: Millimeters = Inches(20.0).into();
        assert_eq!(five.0, 127.0);
        assert_eq!(ten.0, 254.0);
        assert_eq!(twenty.0, 508.0);
    }

    #[test]
    fn test_millimeters_to_meters() {
        let m: Meters = Millimeters(0.5).into();
        assert!((m.0 - 0.0005).abs() < 1e-15);
    }

    #[test]
    fn test_pascals_to_megapascals() {
        let mpa: Megapascals = Pascals(1.5e6).into();
        assert!((mpa.0 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic() {
        let a = Millimeters(10.0);
        let b = Millimeters(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let mm = Millimeters(127.0);
        let json = serde_json::to_string(&mm).unwrap();
        assert_eq!(json, "127.0");

        let roundtrip: Millimeters = serde_json::from_str(&json).unwrap();
        assert_eq!(mm, roundtrip);
    }
}
