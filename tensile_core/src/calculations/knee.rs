//! # Knee Search (Kneedle)
//!
//! Offline Kneedle knee detection for a concave, increasing curve, as in
//! Satopää et al., "Finding a 'Kneedle' in a Haystack" (2011).
//!
//! ## Steps
//!
//! 1. Normalize x and y to [0, 1]
//! 2. Difference curve `d = y_n − x_n`
//! 3. Local maxima / minima of `d` (plateaus count, edges compare to one side)
//! 4. Threshold per maximum: `T = d_max − S · mean(Δx_n)`
//! 5. Walk right from the first maximum; the first time `d` drops below the
//!    active threshold, the active maximum is the knee. Reaching a minimum
//!    resets the threshold to 0.
//!
//! The sensitivity `S` trades detection for robustness: large values only
//! accept pronounced knees.

/// Difference-curve peaks at or below this are numerical noise.
const ROUND_OFF: f64 = 1e-9;

/// Outcome of a knee search that could not run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KneeFault {
    /// Fewer than two points, or x/y lengths differ
    TooFewPoints,
    /// x or y span is zero or not finite
    Degenerate,
    /// The walk ran off the end of the curve
    OutOfRange,
}

/// Kneedle search for a concave, increasing curve.
///
/// Returns `Ok(Some(x))` with the x coordinate of the first knee,
/// `Ok(None)` when the curve has no knee at this sensitivity, and `Err` when
/// the input cannot be searched.
pub fn find_knee_concave_increasing(
    x: &[f64],
    y: &[f64],
    sensitivity: f64,
) -> Result<Option<f64>, KneeFault> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(KneeFault::TooFewPoints);
    }

    let x_norm = normalize(x).ok_or(KneeFault::Degenerate)?;
    let y_norm = normalize(y).ok_or(KneeFault::Degenerate)?;

    let difference: Vec<f64> = y_norm.iter().zip(&x_norm).map(|(y, x)| y - x).collect();

    // A straight line leaves only round-off in the difference curve
    let peak = difference.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak <= ROUND_OFF {
        return Ok(None);
    }

    let maxima = relative_extrema(&difference, |a, b| a >= b);
    let minima = relative_extrema(&difference, |a, b| a <= b);
    let Some(&first_maximum) = maxima.first() else {
        return Ok(None);
    };

    let mean_step =
        x_norm.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (x_norm.len() - 1) as f64;
    let thresholds: Vec<f64> = maxima
        .iter()
        .map(|&i| difference[i] - sensitivity * mean_step.abs())
        .collect();

    let mut maxima_seen = 0usize;
    let mut threshold = 0.0;
    let mut threshold_index = first_maximum;

    for (i, &xn) in x_norm.iter().enumerate().skip(first_maximum) {
        if xn == 1.0 {
            break;
        }

        if maxima.binary_search(&i).is_ok() {
            threshold = thresholds[maxima_seen];
            threshold_index = i;
            maxima_seen += 1;
        }
        if minima.binary_search(&i).is_ok() {
            threshold = 0.0;
        }

        let next = *difference.get(i + 1).ok_or(KneeFault::OutOfRange)?;
        if next < threshold {
            return Ok(Some(x[threshold_index]));
        }
    }

    Ok(None)
}

/// Min-max normalize to [0, 1]; `None` for a zero or non-finite span.
fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| (v - min) / span).collect())
}

/// Indices where `cmp(v[i], v[i-1]) && cmp(v[i], v[i+1])`, with the
/// neighbours of the first and last element clipped to the element itself.
fn relative_extrema(values: &[f64], cmp: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let last = values.len().saturating_sub(1);
    (0..values.len())
        .filter(|&i| {
            let prev = values[i.saturating_sub(1)];
            let next = values[(i + 1).min(last)];
            cmp(values[i], prev) && cmp(values[i], next)
        })
        .collect()
}
