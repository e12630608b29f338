use super::{Candidate, Goal, ModelSelector};
use crate::error::CandidateFailure;
use crate::model::{ModelFitter, SequenceModel};

/// `DIC = logL(self) - mean(logL(others))`; higher is better.
///
/// `None` when there is no competing score to average.
pub fn dic_score(self_log_likelihood: f64, competing: &[f64]) -> Option<f64> {
    if competing.is_empty() {
        return None;
    }
    let mean = competing.iter().sum::<f64>() / competing.len() as f64;
    Some(self_log_likelihood - mean)
}

impl<F: ModelFitter> ModelSelector<'_, F> {
    /// Fit `n_states` on the label corpus, then cross-score every other label.
    ///
    /// A competing label that fails to score, or scores a non-finite value,
    /// is left out of the mean rather than dropping the candidate.
    pub fn evaluate_dic(&self, n_states: usize) -> Result<Candidate<F::Model>, CandidateFailure> {
        let corpus = self.corpus;
        let model = self.fit(corpus.matrix(), corpus.lengths(), n_states)?;
        let self_log_l = model.score(corpus.matrix(), corpus.lengths())?;

        let competing: Vec<f64> = self
            .corpora
            .iter()
            .filter(|(label, _)| label.as_str() != self.this_label)
            .filter_map(|(label, other)| match model.score(other.matrix(), other.lengths()) {
                Ok(log_l) if log_l.is_finite() => Some(log_l),
                Ok(log_l) => {
                    log::debug!("DIC ignores {label} for {}: log-likelihood {log_l}", self.this_label);
                    None
                }
                Err(err) => {
                    log::debug!("DIC ignores {label} for {}: {err}", self.this_label);
                    None
                }
            })
            .collect();

        let score = dic_score(self_log_l, &competing).ok_or(CandidateFailure::NoCompetitors)?;
        Ok(Candidate {
            n_states,
            score,
            model,
        })
    }

    /// The topology with the highest DIC.
    pub fn select_dic(&self) -> Option<F::Model> {
        match self.best_in_range("DIC", Goal::Maximise, |n| self.evaluate_dic(n)) {
            Some(best) => Some(best.model),
            None => self.fallback(),
        }
    }
}
