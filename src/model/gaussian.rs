//! Diagonal-covariance Gaussian emission density

use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;

/// Gaussian with independent features (diagonal covariance).
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalGaussian {
    /// Mean vector
    pub mean: Array1<f64>,
    /// Per-feature variance (the covariance diagonal)
    pub variance: Array1<f64>,
    /// `-0.5 * (d * ln(2π) + Σ ln σ²)`, refreshed whenever the variance changes
    log_norm: f64,
}

impl DiagonalGaussian {
    /// Create a density; `variance` must be strictly positive.
    pub fn new(mean: Array1<f64>, variance: Array1<f64>) -> Self {
        let mut gaussian = Self {
            mean,
            variance,
            log_norm: 0.0,
        };
        gaussian.update_cache();
        gaussian
    }

    /// Dimension of the distribution
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    fn update_cache(&mut self) {
        let d = self.dim() as f64;
        let log_det: f64 = self.variance.iter().map(|v| v.ln()).sum();
        self.log_norm = -0.5 * (d * (2.0 * PI).ln() + log_det);
    }

    /// Log probability density at `x`.
    pub fn log_pdf(&self, x: ArrayView1<'_, f64>) -> f64 {
        let quad_form: f64 = x
            .iter()
            .zip(self.mean.iter())
            .zip(self.variance.iter())
            .map(|((xi, mi), vi)| (xi - mi).powi(2) / vi)
            .sum();
        self.log_norm - 0.5 * quad_form
    }

    /// Replace the parameters, e.g. after an EM maximisation step.
    pub fn set_params(&mut self, mean: Array1<f64>, variance: Array1<f64>) {
        self.mean = mean;
        self.variance = variance;
        self.update_cache();
    }
}
