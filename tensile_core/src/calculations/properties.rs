//! # Modulus & Energy Estimator
//!
//! Derives the material properties of one specimen from its stress-strain
//! curve and detected yield strain.
//!
//! ## Modulus
//!
//! Least-squares slope of stress over strain in the elastic region (all
//! samples with `ε ≤ ε_y`). When that region has five samples or fewer, or no
//! yield strain exists, the slope is taken over the first 20% of the samples
//! leading up to peak stress instead.
//!
//! ## Energy
//!
//! ```text
//! KE = ∫₀^ε_y σ dε · A · L₀      [J]
//! v  = √(2·KE / m)              [m/s], m = 0.045 kg
//! ```
//!
//! ## Note
//!
//! `yield_stress_pa` is the maximum stress of the whole test, not the stress
//! at the detected yield strain. That value is kept separately as
//! `yield_point_stress_pa` and only drives the plot marker.

use serde::{Deserialize, Serialize};

use crate::calculations::curve::StressStrainCurve;
use crate::calculations::fit::{linear_fit, trapezoid};
use crate::specimen::SpecimenMetadata;
use crate::units::{Megapascals, Meters, Millimeters, Pascals};

/// Projectile mass the launch velocity is computed for, kg
pub const ASSUMED_MASS_KG: f64 = 0.045;

/// Fewest elastic-region samples for a direct modulus fit (exclusive)
const MIN_ELASTIC_SAMPLES: usize = 5;

/// Fraction of the samples before peak stress used by the fallback fit
const PEAK_FALLBACK_FRACTION: f64 = 0.2;

/// Material properties of one specimen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedProperties {
    /// Young's modulus, Pa (0 when no fit was possible)
    pub modulus_pa: f64,
    /// Maximum stress of the test, Pa
    pub yield_stress_pa: f64,
    /// Detected yield strain
    pub yield_strain: Option<f64>,
    /// Stress at the sample closest to the yield strain, Pa
    pub yield_point_stress_pa: Option<f64>,
    /// Maximum force, N
    pub max_force_n: f64,
    /// Elastic energy up to the yield strain, J
    pub kinetic_energy_j: f64,
    /// Launch velocity of [`ASSUMED_MASS_KG`] carrying that energy, m/s
    pub velocity_m_s: f64,
}

impl DerivedProperties {
    /// Modulus in MPa
    pub fn modulus_mpa(&self) -> f64 {
        Megapascals::from(Pascals(self.modulus_pa)).0
    }

    /// Yield stress in MPa
    pub fn yield_stress_mpa(&self) -> f64 {
        Megapascals::from(Pascals(self.yield_stress_pa)).0
    }
}

/// Velocity of [`ASSUMED_MASS_KG`] carrying `energy_j`.
pub fn launch_velocity(energy_j: f64) -> f64 {
    (2.0 * energy_j / ASSUMED_MASS_KG).sqrt()
}

/// Estimate modulus, energy and peak values of a specimen.
pub fn estimate(
    curve: &StressStrainCurve,
    meta: &SpecimenMetadata,
    yield_strain: Option<f64>,
) -> DerivedProperties {
    let (elastic_strain, elastic_stress): (Vec<f64>, Vec<f64>) = match yield_strain {
        Some(limit) => curve
            .strain
            .iter()
            .zip(&curve.stress)
            .filter(|(&strain, _)| strain <= limit)
            .map(|(&strain, &stress)| (strain, stress))
            .unzip(),
        None => (Vec::new(), Vec::new()),
    };

    let modulus_pa = if yield_strain.is_some() && elastic_strain.len() > MIN_ELASTIC_SAMPLES {
        linear_fit(&elastic_strain, &elastic_stress)
            .map(|fit| fit.slope)
            .unwrap_or(0.0)
    } else {
        peak_fallback_modulus(curve)
    };

    let (kinetic_energy_j, velocity_m_s) = if yield_strain.is_some() && elastic_strain.len() > 1 {
        let length: Meters = Millimeters(meta.gauge_length_mm).into();
        let energy = trapezoid(&elastic_stress, &elastic_strain) * curve.area_m2 * length.0;
        (energy, launch_velocity(energy))
    } else {
        (0.0, 0.0)
    };

    let yield_point_stress_pa = yield_strain.and_then(|target| stress_near_strain(curve, target));

    tracing::debug!(
        modulus_pa,
        kinetic_energy_j,
        elastic_samples = elastic_strain.len(),
        "properties estimated"
    );

    DerivedProperties {
        modulus_pa,
        yield_stress_pa: curve.max_stress(),
        yield_strain,
        yield_point_stress_pa,
        max_force_n: curve.max_force(),
        kinetic_energy_j,
        velocity_m_s,
    }
}

/// Slope over the first 20% of the samples up to peak stress; 0 when that
/// window has fewer than two samples.
fn peak_fallback_modulus(curve: &StressStrainCurve) -> f64 {
    let Some(peak) = curve.peak_index() else {
        return 0.0;
    };
    let fit_max = (peak as f64 * PEAK_FALLBACK_FRACTION) as usize;
    if fit_max <= 1 {
        return 0.0;
    }
    linear_fit(&curve.strain[..fit_max], &curve.stress[..fit_max])
        .map(|fit| fit.slope)
        .unwrap_or(0.0)
}

/// Stress of the first sample whose strain is closest to `target`.
fn stress_near_strain(curve: &StressStrainCurve, target: f64) -> Option<f64> {
    let mut best: Option<(usize, f64)> = None;
    for (i, strain) in curve.strain.iter().enumerate() {
        let distance = (strain - target).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| curve.stress[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::resolve;

    const E: f64 = 2.0e9;

    fn meta() -> SpecimenMetadata {
        resolve("data/group_A/10in/pull--line-crimp-21--1.csv")
    }

    fn curve(strain: Vec<f64>, stress: Vec<f64>) -> StressStrainCurve {
        let n = strain.len();
        StressStrainCurve {
            time: vec![None; n],
            force: stress.iter().map(|s| s * 3.0e-4).collect(),
            stroke: strain.iter().map(|s| s * 254.0).collect(),
            stress,
            strain,
            area_m2: 3.0e-4,
            gauge_length_mm: 254.0,
        }
    }

    /// 200 samples: slope E up to strain 0.5, then 10% of E, peak at the end.
    fn elastic_plastic() -> StressStrainCurve {
        let strain: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let stress = strain
            .iter()
            .map(|&s| if s <= 0.5 { E * s } else { E * 0.5 + 0.1 * E * (s - 0.5) })
            .collect();
        curve(strain, stress)
    }

    #[test]
    fn test_yield_stress_is_peak_stress() {
        let c = elastic_plastic();
        let props = estimate(&c, &meta(), Some(0.5));
        assert_eq!(props.yield_stress_pa, c.max_stress());
        assert_eq!(props.max_force_n, c.max_force());
    }

    #[test]
    fn test_modulus_from_elastic_region() {
        let props = estimate(&elastic_plastic(), &meta(), Some(0.5));
        assert!((props.modulus_pa - E).abs() / E < 1e-9);
        assert!((props.modulus_mpa() - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_early_yield_uses_peak_fallback() {
        // Yield strain at sample 3 leaves only four elastic samples
        let c = elastic_plastic();
        let props = estimate(&c, &meta(), Some(c.strain[3]));
        // Peak at 199, so the fallback fits samples 0..39
        let expected = linear_fit(&c.strain[..39], &c.stress[..39]).unwrap().slope;
        assert_eq!(props.modulus_pa, expected);
        assert!(props.kinetic_energy_j > 0.0);
    }

    #[test]
    fn test_no_yield_uses_peak_fallback_and_zero_energy() {
        let c = elastic_plastic();
        let props = estimate(&c, &meta(), None);
        assert!((props.modulus_pa - E).abs() / E < 1e-9);
        assert_eq!(props.kinetic_energy_j, 0.0);
        assert_eq!(props.velocity_m_s, 0.0);
        assert_eq!(props.yield_point_stress_pa, None);
    }

    #[test]
    fn test_energy_zero_with_single_elastic_sample() {
        let props = estimate(&elastic_plastic(), &meta(), Some(0.0));
        assert_eq!(props.kinetic_energy_j, 0.0);
        assert_eq!(props.velocity_m_s, 0.0);

        let props = estimate(&elastic_plastic(), &meta(), Some(-1.0));
        assert_eq!(props.kinetic_energy_j, 0.0);
        assert_eq!(props.velocity_m_s, 0.0);
    }

    #[test]
    fn test_energy_and_velocity() {
        let props = estimate(&elastic_plastic(), &meta(), Some(0.5));
        // ∫ E·ε dε from 0 to 0.5 = E/8, exact under the trapezoid rule
        let expected = E / 8.0 * 3.0e-4 * 0.254;
        assert!((props.kinetic_energy_j - expected).abs() / expected < 1e-9);
        let v = (2.0 * props.kinetic_energy_j / ASSUMED_MASS_KG).sqrt();
        assert_eq!(props.velocity_m_s, v);
    }

    #[test]
    fn test_peak_too_early_leaves_modulus_zero() {
        // Peak at index 5: fallback window of one sample
        let c = curve(
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 1.0],
        );
        let props = estimate(&c, &meta(), None);
        assert_eq!(props.modulus_pa, 0.0);
    }

    #[test]
    fn test_yield_point_stress_is_nearest_sample() {
        let c = elastic_plastic();
        let props = estimate(&c, &meta(), Some(0.503));
        assert_eq!(props.yield_point_stress_pa, Some(c.stress[50]));
    }
}
