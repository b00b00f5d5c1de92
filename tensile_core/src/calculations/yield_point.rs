//! # Yield-Point Detection
//!
//! Locates the strain at which a line specimen stops behaving elastically.
//!
//! Detection runs an ordered list of strategies over the loading region
//! between 40% and 85% of the peak-stress index; the first strategy that
//! produces a plausible value wins:
//!
//! | Order | Method            | Accepts                                   |
//! |-------|-------------------|-------------------------------------------|
//! | 1     | `ShortWindow`     | region shorter than 20 samples → 0.7·ε_max |
//! | 2     | `Knee`            | Kneedle knee (S = 50), if plausible       |
//! | 3     | `RollingModulus`  | first 30% drop of the local slope         |
//! | 4     | `Heuristic`       | 0.65·ε_max (ε_max > 0.4) or 0.75·ε_max    |
//! | -     | `Fallback`        | non-finite data → 0.7·ε_max               |
//!
//! A value is plausible when `0.15 < ε < 0.9·ε_max`. The lower bound is an
//! absolute strain, not a fraction of ε_max.
//!
//! Strategies that fault are logged and skipped; detection itself never
//! fails.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculations::curve::StressStrainCurve;
use crate::calculations::fit::linear_fit;
use crate::calculations::knee::find_knee_concave_increasing;

/// Kneedle sensitivity for the knee strategy
pub const KNEE_SENSITIVITY: f64 = 50.0;
/// Smallest loading region the search strategies run on
pub const MIN_WINDOW_SAMPLES: usize = 20;
/// Absolute lower bound of a plausible yield strain
pub const MIN_PLAUSIBLE_STRAIN: f64 = 0.15;
/// Upper bound of a plausible yield strain, as a fraction of the max strain
pub const MAX_PLAUSIBLE_FRACTION: f64 = 0.9;
/// Slope ratio that counts as the end of the elastic region
pub const MODULUS_DROP_RATIO: f64 = 0.7;

/// Strategy that produced a yield strain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YieldMethod {
    ShortWindow,
    Knee,
    RollingModulus,
    Heuristic,
    Fallback,
}

impl fmt::Display for YieldMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YieldMethod::ShortWindow => "short-window",
            YieldMethod::Knee => "knee",
            YieldMethod::RollingModulus => "rolling-modulus",
            YieldMethod::Heuristic => "heuristic",
            YieldMethod::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Detected yield strain and the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldDetection {
    pub strain: f64,
    pub method: YieldMethod,
}

/// Loading region handed to the search strategies.
struct Region<'a> {
    strain: &'a [f64],
    stress: &'a [f64],
}

type Strategy = fn(&Region<'_>) -> Result<Option<f64>, String>;

const SEARCH_STRATEGIES: [(YieldMethod, Strategy); 2] = [
    (YieldMethod::Knee, knee_strategy),
    (YieldMethod::RollingModulus, rolling_modulus_strategy),
];

/// Yield strain of a curve; `None` only for an empty curve.
pub fn detect_yield(curve: &StressStrainCurve) -> Option<f64> {
    detect_yield_with_method(curve).map(|d| d.strain)
}

/// Yield strain together with the strategy that produced it.
pub fn detect_yield_with_method(curve: &StressStrainCurve) -> Option<YieldDetection> {
    let peak = curve.peak_index()?;
    let max_strain = curve.max_strain();

    let finite = curve.strain.iter().chain(&curve.stress).all(|v| v.is_finite());
    let detection = if finite {
        run_strategies(curve, peak, max_strain)
    } else {
        tracing::warn!("Yield detection failed: non-finite stress or strain values");
        YieldDetection {
            strain: max_strain * 0.7,
            method: YieldMethod::Fallback,
        }
    };

    tracing::debug!(
        strain = detection.strain,
        method = %detection.method,
        "yield point detected"
    );
    Some(detection)
}

fn run_strategies(curve: &StressStrainCurve, peak: usize, max_strain: f64) -> YieldDetection {
    let start = (peak as f64 * 0.4) as usize;
    let end = (peak as f64 * 0.85) as usize;

    if end.saturating_sub(start) < MIN_WINDOW_SAMPLES {
        return YieldDetection {
            strain: max_strain * 0.7,
            method: YieldMethod::ShortWindow,
        };
    }

    let region = Region {
        strain: &curve.strain[start..end],
        stress: &curve.stress[start..end],
    };

    for (method, strategy) in SEARCH_STRATEGIES {
        match strategy(&region) {
            Ok(Some(strain)) if is_plausible(strain, max_strain) => {
                return YieldDetection { strain, method };
            }
            Ok(_) => {}
            Err(reason) => tracing::warn!(%method, "Failed to find yield point: {}", reason),
        }
    }

    let fraction = if max_strain > 0.4 { 0.65 } else { 0.75 };
    YieldDetection {
        strain: max_strain * fraction,
        method: YieldMethod::Heuristic,
    }
}

/// True when `strain` lies strictly inside `(0.15, 0.9·max_strain)`.
pub fn is_plausible(strain: f64, max_strain: f64) -> bool {
    strain > MIN_PLAUSIBLE_STRAIN && strain < max_strain * MAX_PLAUSIBLE_FRACTION
}

fn knee_strategy(region: &Region<'_>) -> Result<Option<f64>, String> {
    find_knee_concave_increasing(region.strain, region.stress, KNEE_SENSITIVITY)
        .map_err(|fault| format!("knee search aborted: {:?}", fault))
}

fn rolling_modulus_strategy(region: &Region<'_>) -> Result<Option<f64>, String> {
    rolling_modulus_drop(region.strain, region.stress)
}

/// Strain at the first window whose slope drops below 70% of the initial
/// slope.
///
/// Windows have half-width `max(5, n/20)` and are centred on each sample that
/// has a full window. At least 11 windows are needed; the baseline is the
/// mean slope of the first five.
pub fn rolling_modulus_drop(strain: &[f64], stress: &[f64]) -> Result<Option<f64>, String> {
    let n = stress.len().min(strain.len());
    let half_width = (n / 20).max(5);

    let mut slopes = Vec::new();
    for i in half_width..n.saturating_sub(half_width) {
        let window = i - half_width..i + half_width;
        let fit = linear_fit(&strain[window.clone()], &stress[window])
            .ok_or_else(|| format!("degenerate window around sample {}", i))?;
        slopes.push((strain[i], fit.slope));
    }

    if slopes.len() <= 10 {
        return Ok(None);
    }

    let baseline = slopes[..5].iter().map(|(_, slope)| slope).sum::<f64>() / 5.0;
    let threshold = baseline * MODULUS_DROP_RATIO;
    Ok(slopes
        .iter()
        .find(|(_, slope)| *slope < threshold)
        .map(|(strain, _)| *strain))
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: f64 = 1.0e8;

    /// Elastic up to sample `knee`, then 2% of the elastic slope. Peak at the last sample.
    fn bilinear(samples: usize, step: f64, knee: usize) -> StressStrainCurve {
        let strain: Vec<f64> = (0..samples).map(|i| i as f64 * step).collect();
        let knee_strain = strain[knee];
        let stress: Vec<f64> = strain
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                if i <= knee {
                    E * s
                } else {
                    E * knee_strain + 0.02 * E * (s - knee_strain)
                }
            })
            .collect();
        curve(strain, stress)
    }

    fn curve(strain: Vec<f64>, stress: Vec<f64>) -> StressStrainCurve {
        let n = strain.len();
        StressStrainCurve {
            time: vec![None; n],
            force: stress.iter().map(|s| s * 1e-4).collect(),
            stroke: strain.iter().map(|s| s * 254.0).collect(),
            stress,
            strain,
            area_m2: 1e-4,
            gauge_length_mm: 254.0,
        }
    }

    #[test]
    fn test_empty_curve_has_no_yield() {
        assert_eq!(detect_yield(&curve(vec![], vec![])), None);
    }

    #[test]
    fn test_short_loading_region() {
        // Peak at index 40: region 16..34 is shorter than 20 samples
        let c = bilinear(41, 0.01, 20);
        let detection = detect_yield_with_method(&c).unwrap();
        assert_eq!(detection.method, YieldMethod::ShortWindow);
        assert!((detection.strain - 0.7 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_knee_found_in_loading_region() {
        let c = bilinear(401, 0.005, 200);
        let detection = detect_yield_with_method(&c).unwrap();
        assert_eq!(detection.method, YieldMethod::Knee);
        assert!((detection.strain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_knee_below_absolute_bound_falls_to_heuristic() {
        // Knee at strain 0.1 is below 0.15, and so is the slope drop
        let c = bilinear(401, 0.0005, 200);
        let detection = detect_yield_with_method(&c).unwrap();
        assert_eq!(detection.method, YieldMethod::Heuristic);
        assert!((detection.strain - 0.75 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_knee_scales_with_strain() {
        let mut c = bilinear(401, 0.0005, 200);
        c.strain.iter_mut().for_each(|s| *s *= 3.0);
        // Knee at 0.3 now; accepted by the knee strategy
        let detection = detect_yield_with_method(&c).unwrap();
        assert_eq!(detection.method, YieldMethod::Knee);
        assert!((detection.strain - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_heuristic_for_long_curves() {
        // Early knee at 0.1, then the crosshead speeds up to a max strain of 0.6
        let strain: Vec<f64> = (0..401)
            .map(|i| {
                if i <= 200 {
                    i as f64 * 0.0005
                } else {
                    0.1 + (i - 200) as f64 * 0.0025
                }
            })
            .collect();
        let stress = strain
            .iter()
            .map(|&s| if s <= 0.1 { E * s } else { E * 0.1 + 0.02 * E * (s - 0.1) })
            .collect();
        let detection = detect_yield_with_method(&curve(strain, stress)).unwrap();
        assert_eq!(detection.method, YieldMethod::Heuristic);
        assert!((detection.strain - 0.65 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_late_inflection_is_not_a_knee() {
        // Break at 380 of 400 samples: 0.95 of max strain, past the loading region
        let c = bilinear(400, 0.0025, 380);
        assert!((c.strain[380] / c.max_strain() - 0.95).abs() < 0.005);

        let detection = detect_yield_with_method(&c).unwrap();
        assert_ne!(detection.method, YieldMethod::Knee);
        assert_eq!(detection.method, YieldMethod::Heuristic);
        assert!((detection.strain - 0.65 * c.max_strain()).abs() < 1e-12);
    }

    #[test]
    fn test_plausibility_band() {
        assert!(is_plausible(0.5, 1.0));
        assert!(!is_plausible(0.95, 1.0));
        assert!(!is_plausible(0.9, 1.0));
        assert!(!is_plausible(0.15, 1.0));
        // Absolute lower bound regardless of max strain
        assert!(!is_plausible(0.12, 0.2));
    }

    #[test]
    fn test_rolling_modulus_drop() {
        let c = bilinear(401, 0.005, 200);
        let found = rolling_modulus_drop(&c.strain[160..340], &c.stress[160..340])
            .unwrap()
            .unwrap();
        assert!(found > 0.95 && found < 1.05, "drop at {found}");
    }

    #[test]
    fn test_rolling_modulus_needs_enough_windows() {
        let strain: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(rolling_modulus_drop(&strain, &strain).unwrap(), None);
    }

    #[test]
    fn test_non_finite_values_use_fallback() {
        let mut c = bilinear(401, 0.005, 200);
        c.stress[10] = f64::NAN;
        let detection = detect_yield_with_method(&c).unwrap();
        assert_eq!(detection.method, YieldMethod::Fallback);
        assert!((detection.strain - 0.7 * c.max_strain()).abs() < 1e-12);
    }
}
