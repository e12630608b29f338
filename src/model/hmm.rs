//! Gaussian Hidden Markov Model with diagonal covariances

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use super::algorithms::{backward, emission_log_probs, forward, split_sequences};
use super::gaussian::DiagonalGaussian;
use super::{ModelFitter, SequenceModel};
use crate::config::GaussianHmmConfig;
use crate::error::{FitFailure, ScoreFailure};

/// States whose expected occupancy drops below this keep their emission.
const OCCUPANCY_FLOOR: f64 = 1e-10;
const KMEANS_ITERATIONS: usize = 10;

/// Fitted Gaussian HMM
#[derive(Debug, Clone)]
pub struct GaussianHmm {
    start_probs: Array1<f64>,
    transition: Array2<f64>,
    emissions: Vec<DiagonalGaussian>,
    n_features: usize,
    /// Training log-likelihood per EM iteration
    pub log_likelihood_history: Vec<f64>,
}

impl GaussianHmm {
    /// Assemble a model from known parameters.
    pub fn from_parts(start_probs: Array1<f64>, transition: Array2<f64>, emissions: Vec<DiagonalGaussian>) -> Self {
        let n_features = emissions.first().map_or(0, DiagonalGaussian::dim);
        Self {
            start_probs,
            transition,
            emissions,
            n_features,
            log_likelihood_history: Vec::new(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn start_probs(&self) -> &Array1<f64> {
        &self.start_probs
    }

    pub fn transition_matrix(&self) -> &Array2<f64> {
        &self.transition
    }

    /// Emission mean of each state
    pub fn means(&self) -> Vec<Array1<f64>> {
        self.emissions.iter().map(|e| e.mean.clone()).collect()
    }

    /// Emission variance of each state
    pub fn variances(&self) -> Vec<Array1<f64>> {
        self.emissions.iter().map(|e| e.variance.clone()).collect()
    }

    fn log_params(&self) -> (Array1<f64>, Array2<f64>) {
        (self.start_probs.mapv(f64::ln), self.transition.mapv(f64::ln))
    }

    /// Uniform start/transition probabilities, k-means emission means and the
    /// pooled data variance for every state.
    fn initialise(observations: ArrayView2<'_, f64>, n_states: usize, min_covar: f64, rng: &mut StdRng) -> Self {
        let uniform = 1.0 / n_states as f64;
        let start_probs = Array1::from_elem(n_states, uniform);
        let transition = Array2::from_elem((n_states, n_states), uniform);

        let variance = observations.var_axis(Axis(0), 0.0) + min_covar;
        let emissions = kmeans(observations, n_states, rng)
            .into_iter()
            .map(|center| DiagonalGaussian::new(center, variance.clone()))
            .collect();

        Self::from_parts(start_probs, transition, emissions)
    }

    /// E-step: expected sufficient statistics over all sequences.
    fn accumulate(&self, observations: ArrayView2<'_, f64>, lengths: &[usize]) -> Statistics {
        let n = self.n_states();
        let d = self.n_features;
        let (log_start, log_trans) = self.log_params();
        let mut stats = Statistics::zeros(n, d);

        for seq in split_sequences(observations, lengths) {
            let log_b = emission_log_probs(seq, &self.emissions);
            let (alpha, ll) = forward(&log_start, &log_trans, &log_b);
            stats.log_likelihood += ll;
            if !ll.is_finite() {
                continue;
            }
            let beta = backward(&log_trans, &log_b);
            let t_len = seq.nrows();

            for (t, x) in seq.rows().into_iter().enumerate() {
                for j in 0..n {
                    let gamma = (alpha[[t, j]] + beta[[t, j]] - ll).exp();
                    if t == 0 {
                        stats.start[j] += gamma;
                    }
                    stats.post[j] += gamma;
                    for (k, &value) in x.iter().enumerate() {
                        stats.obs[[j, k]] += gamma * value;
                        stats.obs_sq[[j, k]] += gamma * value * value;
                    }
                }
            }

            for t in 0..t_len.saturating_sub(1) {
                for i in 0..n {
                    for j in 0..n {
                        stats.trans[[i, j]] +=
                            (alpha[[t, i]] + log_trans[[i, j]] + log_b[[t + 1, j]] + beta[[t + 1, j]] - ll).exp();
                    }
                }
            }
        }

        stats
    }

    /// M-step: re-estimate parameters from expected statistics.
    fn maximise(&mut self, stats: &Statistics, min_covar: f64) {
        let start_total = stats.start.sum();
        if start_total > 0.0 {
            self.start_probs = &stats.start / start_total;
        }

        for i in 0..self.n_states() {
            let row_total = stats.trans.row(i).sum();
            if row_total > 0.0 {
                let row = stats.trans.row(i).mapv(|v| v / row_total);
                self.transition.row_mut(i).assign(&row);
            }
        }

        let d = self.n_features;
        for (j, emission) in self.emissions.iter_mut().enumerate() {
            let weight = stats.post[j];
            if weight < OCCUPANCY_FLOOR {
                continue;
            }
            let mean = stats.obs.row(j).mapv(|v| v / weight);
            let variance = Array1::from_shape_fn(d, |k| {
                (stats.obs_sq[[j, k]] / weight - mean[k] * mean[k]).max(0.0) + min_covar
            });
            emission.set_params(mean, variance);
        }
    }
}

impl SequenceModel for GaussianHmm {
    fn n_states(&self) -> usize {
        self.emissions.len()
    }

    fn score(&self, matrix: ArrayView2<'_, f64>, lengths: &[usize]) -> Result<f64, ScoreFailure> {
        if matrix.ncols() != self.n_features {
            return Err(ScoreFailure::DimensionMismatch {
                expected: self.n_features,
                found: matrix.ncols(),
            });
        }
        if lengths.is_empty() || lengths.contains(&0) {
            return Err(ScoreFailure::EmptySequence);
        }
        let total: usize = lengths.iter().sum();
        if total != matrix.nrows() {
            return Err(ScoreFailure::LengthMismatch {
                rows: matrix.nrows(),
                total,
            });
        }

        let (log_start, log_trans) = self.log_params();
        let log_likelihood: f64 = split_sequences(matrix, lengths)
            .map(|seq| {
                let log_b = emission_log_probs(seq, &self.emissions);
                forward(&log_start, &log_trans, &log_b).1
            })
            .sum();

        if log_likelihood.is_finite() {
            Ok(log_likelihood)
        } else {
            Err(ScoreFailure::NonFinite(log_likelihood))
        }
    }
}

/// Expected sufficient statistics of one E-step
struct Statistics {
    start: Array1<f64>,
    trans: Array2<f64>,
    post: Array1<f64>,
    obs: Array2<f64>,
    obs_sq: Array2<f64>,
    log_likelihood: f64,
}

impl Statistics {
    fn zeros(n_states: usize, n_features: usize) -> Self {
        Self {
            start: Array1::zeros(n_states),
            trans: Array2::zeros((n_states, n_states)),
            post: Array1::zeros(n_states),
            obs: Array2::zeros((n_states, n_features)),
            obs_sq: Array2::zeros((n_states, n_features)),
            log_likelihood: 0.0,
        }
    }
}

/// Lloyd's k-means seeded with `k` distinct random rows.
fn kmeans(observations: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Vec<Array1<f64>> {
    let n = observations.nrows();
    let d = observations.ncols();
    let mut centers: Vec<Array1<f64>> = sample(rng, n, k)
        .into_iter()
        .map(|i| observations.row(i).to_owned())
        .collect();

    for _ in 0..KMEANS_ITERATIONS {
        let mut sums = Array2::<f64>::zeros((k, d));
        let mut counts = vec![0usize; k];

        for row in observations.rows() {
            let nearest = centers
                .iter()
                .enumerate()
                .map(|(j, center)| {
                    let dist: f64 = row.iter().zip(center.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                    (j, dist)
                })
                .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
                .0;
            let mut acc = sums.row_mut(nearest);
            acc += &row;
            counts[nearest] += 1;
        }

        let mut moved = false;
        for (j, center) in centers.iter_mut().enumerate() {
            if counts[j] == 0 {
                continue;
            }
            let updated = sums.row(j).mapv(|v| v / counts[j] as f64);
            if updated != *center {
                moved = true;
                *center = updated;
            }
        }
        if !moved {
            break;
        }
    }

    centers
}

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

/// Fits [`GaussianHmm`]s with multi-sequence Baum–Welch.
#[derive(Debug, Clone, Default)]
pub struct GaussianHmmTrainer {
    pub config: GaussianHmmConfig,
}

impl GaussianHmmTrainer {
    pub fn new(config: GaussianHmmConfig) -> Self {
        Self { config }
    }
}

impl ModelFitter for GaussianHmmTrainer {
    type Model = GaussianHmm;

    fn fit(
        &self,
        matrix: ArrayView2<'_, f64>,
        lengths: &[usize],
        n_states: usize,
        seed: u64,
    ) -> Result<GaussianHmm, FitFailure> {
        if n_states == 0 {
            return Err(FitFailure::ZeroStates);
        }
        if matrix.ncols() == 0 {
            return Err(FitFailure::InvalidCorpus("observations have no features".into()));
        }
        if lengths.is_empty() || lengths.contains(&0) {
            return Err(FitFailure::InvalidCorpus("empty sequence".into()));
        }
        let total: usize = lengths.iter().sum();
        if total != matrix.nrows() {
            return Err(FitFailure::InvalidCorpus(format!(
                "lengths sum to {total} but the matrix has {} rows",
                matrix.nrows()
            )));
        }
        if matrix.nrows() < n_states {
            return Err(FitFailure::InsufficientData {
                n_states,
                needed: n_states,
                available: matrix.nrows(),
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut model = GaussianHmm::initialise(matrix, n_states, self.config.min_covar, &mut rng);
        let mut prev_ll = f64::NEG_INFINITY;

        for iteration in 0..self.config.n_iter {
            let stats = model.accumulate(matrix, lengths);
            let log_ll = stats.log_likelihood;
            if !log_ll.is_finite() {
                return Err(FitFailure::Diverged { iteration });
            }

            model.maximise(&stats, self.config.min_covar);
            model.log_likelihood_history.push(log_ll);

            if log_ll - prev_ll < self.config.tol {
                log::trace!("{n_states}-state HMM converged after {} iterations", iteration + 1);
                break;
            }
            prev_ll = log_ll;
        }

        Ok(model)
    }
}
