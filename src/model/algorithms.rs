//! Log-space HMM recursions: forward, backward and emission tables.
//!
//! Every quantity is a natural logarithm so long sequences never underflow.

use super::gaussian::DiagonalGaussian;
use ndarray::{s, Array1, Array2, ArrayView2};

/// Numerically stable `ln(Σ exp(x))`; negative infinity for an empty slice
/// or when every term is negative infinity.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// Split a concatenated matrix into per-sequence views.
///
/// The caller guarantees that `lengths` sums to the row count.
/// Views borrow from `matrix` only, so they may outlive `lengths`.
pub fn split_sequences<'a, 'b>(
    matrix: ArrayView2<'a, f64>,
    lengths: &'b [usize],
) -> impl Iterator<Item = ArrayView2<'a, f64>> + 'b
where
    'a: 'b,
{
    lengths.iter().scan(0usize, move |start, &len| {
        let begin = *start;
        *start += len;
        Some(matrix.slice_move(s![begin..begin + len, ..]))
    })
}

/// Emission log-densities, `T x N`.
pub fn emission_log_probs(observations: ArrayView2<'_, f64>, emissions: &[DiagonalGaussian]) -> Array2<f64> {
    let mut log_b = Array2::zeros((observations.nrows(), emissions.len()));
    for (t, obs) in observations.rows().into_iter().enumerate() {
        for (j, emission) in emissions.iter().enumerate() {
            log_b[[t, j]] = emission.log_pdf(obs);
        }
    }
    log_b
}

/// Forward pass.
///
/// # Returns
/// Log forward variables (`T x N`) and the sequence log-likelihood.
/// An empty sequence has log-likelihood zero.
pub fn forward(log_start: &Array1<f64>, log_trans: &Array2<f64>, log_b: &Array2<f64>) -> (Array2<f64>, f64) {
    let (t_len, n) = log_b.dim();
    let mut alpha = Array2::from_elem((t_len, n), f64::NEG_INFINITY);
    if t_len == 0 {
        return (alpha, 0.0);
    }

    for j in 0..n {
        alpha[[0, j]] = log_start[j] + log_b[[0, j]];
    }

    let mut buf = vec![0.0; n];
    for t in 1..t_len {
        for j in 0..n {
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = alpha[[t - 1, i]] + log_trans[[i, j]];
            }
            alpha[[t, j]] = log_sum_exp(&buf) + log_b[[t, j]];
        }
    }

    let log_likelihood = log_sum_exp(&alpha.row(t_len - 1).to_vec());
    (alpha, log_likelihood)
}

/// Backward pass; log backward variables (`T x N`), zero in the last row.
pub fn backward(log_trans: &Array2<f64>, log_b: &Array2<f64>) -> Array2<f64> {
    let (t_len, n) = log_b.dim();
    let mut beta = Array2::zeros((t_len, n));
    if t_len < 2 {
        return beta;
    }

    let mut buf = vec![0.0; n];
    for t in (0..t_len - 1).rev() {
        for i in 0..n {
            for (j, slot) in buf.iter_mut().enumerate() {
                *slot = log_trans[[i, j]] + log_b[[t + 1, j]] + beta[[t + 1, j]];
            }
            beta[[t, i]] = log_sum_exp(&buf);
        }
    }
    beta
}
