use super::{Candidate, Goal, ModelSelector};
use crate::data::folds::{combine_sequences, kfold_split};
use crate::error::CandidateFailure;
use crate::model::{ModelFitter, SequenceModel};

/// Upper bound on cross-validation folds.
pub const CV_MAX_FOLDS: usize = 3;

/// Folds used for a corpus of `n_sequences`; never more folds than sequences.
pub fn cv_fold_count(n_sequences: usize) -> usize {
    n_sequences.min(CV_MAX_FOLDS)
}

impl<F: ModelFitter> ModelSelector<'_, F> {
    /// Mean held-out log-likelihood of `n_states` over whole-sequence folds.
    ///
    /// Any fold that fails to fit or score disqualifies the topology. The
    /// returned candidate carries the last fold's model.
    pub fn evaluate_cv(&self, n_states: usize) -> Result<Candidate<F::Model>, CandidateFailure> {
        let corpus = self.corpus;
        let n_sequences = corpus.n_sequences();
        let n_folds = cv_fold_count(n_sequences);
        if n_folds < 2 {
            return Err(CandidateFailure::TooFewSequences(n_sequences));
        }

        let mut held_out = Vec::with_capacity(n_folds);
        let mut last_model = None;
        for fold in kfold_split(n_sequences, n_folds) {
            let (train_x, train_lengths) = combine_sequences(&fold.train, corpus);
            let (test_x, test_lengths) = combine_sequences(&fold.test, corpus);

            let model = self.fit(train_x.view(), &train_lengths, n_states)?;
            held_out.push(model.score(test_x.view(), &test_lengths)?);
            last_model = Some(model);
        }

        let model = last_model.ok_or(CandidateFailure::TooFewSequences(n_sequences))?;
        let score = held_out.iter().sum::<f64>() / held_out.len() as f64;
        Ok(Candidate {
            n_states,
            score,
            model,
        })
    }

    /// The topology with the highest mean held-out log-likelihood, refit on
    /// the whole label corpus.
    pub fn select_cv(&self) -> Option<F::Model> {
        let Some(best) = self.best_in_range("CV", Goal::Maximise, |n| self.evaluate_cv(n)) else {
            return self.fallback();
        };
        match self.fit(self.corpus.matrix(), self.corpus.lengths(), best.n_states) {
            Ok(model) => Some(model),
            Err(err) => {
                log::warn!(
                    "refit of {} states on all of {} failed ({err}), keeping the last fold's model",
                    best.n_states,
                    self.this_label
                );
                Some(best.model)
            }
        }
    }
}
