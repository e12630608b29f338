use super::{Candidate, Goal, ModelSelector};
use crate::error::CandidateFailure;
use crate::model::{ModelFitter, SequenceModel};

/// Free parameters of a `n_states`-state model over `n_features` features:
/// transition degrees of freedom plus a mean and variance per state and
/// feature, minus one normalisation constraint.
pub fn free_parameters(n_states: usize, n_features: usize) -> usize {
    (n_states * n_states + 2 * n_features * n_states).saturating_sub(1)
}

/// `BIC = -2·logL + p·ln(N)`; lower is better.
pub fn bic_score(log_likelihood: f64, n_states: usize, n_features: usize, n_observations: usize) -> f64 {
    let p = free_parameters(n_states, n_features) as f64;
    -2.0 * log_likelihood + p * (n_observations as f64).ln()
}

impl<F: ModelFitter> ModelSelector<'_, F> {
    /// Fit `n_states` on the label corpus and compute its BIC.
    pub fn evaluate_bic(&self, n_states: usize) -> Result<Candidate<F::Model>, CandidateFailure> {
        let corpus = self.corpus;
        let model = self.fit(corpus.matrix(), corpus.lengths(), n_states)?;
        let log_l = model.score(corpus.matrix(), corpus.lengths())?;
        let score = bic_score(log_l, n_states, corpus.n_features(), corpus.n_observations());
        Ok(Candidate {
            n_states,
            score,
            model,
        })
    }

    /// The topology with the lowest BIC.
    pub fn select_bic(&self) -> Option<F::Model> {
        match self.best_in_range("BIC", Goal::Minimise, |n| self.evaluate_bic(n)) {
            Some(best) => Some(best.model),
            None => self.fallback(),
        }
    }
}
