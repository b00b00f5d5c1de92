//! # Numeric Helpers
//!
//! Least-squares line fits, trapezoidal integration and the summary
//! statistics the rest of the crate is built on. All functions are pure and
//! deterministic.

/// Straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line
    pub slope: f64,
    /// Value at x = 0
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// First-degree least-squares fit of `y` on `x`.
///
/// Returns `None` for fewer than two points, mismatched lengths, or a
/// degenerate `x` (all values equal).
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxy + dx * (yi - y_mean), sxx + dx * dx)
        });

    if sxx <= 0.0 || !sxx.is_finite() {
        return None;
    }
    let slope = sxy / sxx;
    if !slope.is_finite() {
        return None;
    }
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Trapezoidal integral of `y` over `x`, in sample order.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N); `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Largest value; `None` for an empty slice.
pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Smallest value; `None` for an empty slice.
pub fn min_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Index of the first occurrence of the largest value.
pub fn first_argmax(values: &[f64]) -> Option<usize> {
    let max = max_value(values)?;
    values.iter().position(|&v| v == max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fit_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_fit(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.at(4.0) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_least_squares() {
        // Best fit through (0,0), (1,1), (2,1): slope 0.5, intercept 1/6
        let fit = linear_fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 1.0]).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.intercept - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(linear_fit(&[1.0], &[1.0]).is_none());
        assert!(linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(linear_fit(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_trapezoid() {
        // Area under y = x from 0 to 2
        let x = [0.0, 1.0, 2.0];
        assert!((trapezoid(&x, &x) - 2.0).abs() < 1e-12);
        assert_eq!(trapezoid(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert!((population_std(&values).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(population_std(&[]), None);
    }

    #[test]
    fn test_first_argmax_takes_first_tie() {
        assert_eq!(first_argmax(&[1.0, 3.0, 2.0, 3.0]), Some(1));
        assert_eq!(first_argmax(&[]), None);
    }
}
