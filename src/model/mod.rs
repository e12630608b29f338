//! Sequence models
//!
//! Selection and recognition only need two capabilities from a model
//! backend: fit a topology to a corpus, and score a corpus against a fitted
//! model. [`GaussianHmmTrainer`] is the bundled backend.

mod algorithms;
mod gaussian;
mod hmm;

use ndarray::ArrayView2;

use crate::error::{FitFailure, ScoreFailure};

pub use algorithms::log_sum_exp;
pub use gaussian::DiagonalGaussian;
pub use hmm::{GaussianHmm, GaussianHmmTrainer};

/// A trained model of some topology.
pub trait SequenceModel {
    /// Hidden-state count.
    fn n_states(&self) -> usize;

    /// Total log-likelihood of the sequences in `matrix`, delimited by
    /// `lengths`.
    fn score(&self, matrix: ArrayView2<'_, f64>, lengths: &[usize]) -> Result<f64, ScoreFailure>;
}

/// Fits models of a requested topology.
pub trait ModelFitter {
    type Model: SequenceModel;

    fn fit(
        &self,
        matrix: ArrayView2<'_, f64>,
        lengths: &[usize],
        n_states: usize,
        seed: u64,
    ) -> Result<Self::Model, FitFailure>;
}
