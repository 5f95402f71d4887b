//! Ordinary least-squares fit over an indexed series
//!
//! x is the position in the series (0, 1, 2, ...), not elapsed time.

use serde::Serialize;

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line to `values` indexed by position.
    ///
    /// Returns `None` for fewer than two values.
    pub fn from_indexed(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        let n = values.len() as f64;
        let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
        let sum_y: f64 = values.iter().sum();
        let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
        let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

        // Never zero for n >= 2 distinct indices
        let denominator = n * sum_x2 - sum_x.powi(2);
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        Some(Self { slope, intercept })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Fitted values at indices `0..len`
    pub fn line(&self, len: usize) -> Vec<f64> {
        (0..len).map(|i| self.predict(i as f64)).collect()
    }
}

/// Fitted trend line for `values`, empty when fewer than two values
pub fn trend_line(values: &[f64]) -> Vec<f64> {
    LinearFit::from_indexed(values)
        .map(|fit| fit.line(values.len()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let fit = LinearFit::from_indexed(&[10.0, 12.0, 14.0, 16.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 10.0).abs() < 1e-12);
        assert_eq!(trend_line(&[10.0, 12.0, 14.0]), vec![10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_noisy_series() {
        // y = 80, 79, 79.5, 78 -> slope -0.55, intercept 79.95
        let fit = LinearFit::from_indexed(&[80.0, 79.0, 79.5, 78.0]).unwrap();
        assert!((fit.slope + 0.55).abs() < 1e-9);
        assert!((fit.intercept - 79.95).abs() < 1e-9);
    }

    #[test]
    fn test_too_short() {
        assert!(LinearFit::from_indexed(&[]).is_none());
        assert!(LinearFit::from_indexed(&[70.0]).is_none());
        assert!(trend_line(&[70.0]).is_empty());
    }
}
