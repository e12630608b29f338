//! Topology selection
//!
//! Each strategy fits every hidden-state count in
//! `min_states..=max_states` to one label's corpus, scores the fits with its
//! criterion and keeps the best one:
//!
//! ```text
//!  strategy   criterion                               goal
//!  ────────   ─────────────────────────────────────   ────────
//!  constant   none, fit at constant_states            -
//!  bic        -2·logL + p·ln(N)                       minimise
//!  dic        logL(self) - mean logL(other labels)    maximise
//!  cv         mean held-out logL over k folds         maximise
//! ```
//!
//! Fit and score failures only remove the affected candidate. When no
//! candidate survives, the strategy falls back to the constant fit.

mod bic;
mod constant;
mod cv;
mod dic;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::Level;
use ndarray::ArrayView2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SelectorConfig;
use crate::data::model::{LabeledCorpusSet, SequenceCorpus};
use crate::error::{CandidateFailure, FitFailure};
use crate::model::ModelFitter;

pub use bic::{bic_score, free_parameters};
pub use cv::{cv_fold_count, CV_MAX_FOLDS};
pub use dic::dic_score;

/// Selected model per label. Labels whose every fit failed are absent.
pub type ModelBank<M> = BTreeMap<String, M>;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// The four selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Constant,
    Bic,
    Dic,
    Cv,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::Constant, Strategy::Bic, Strategy::Dic, Strategy::Cv];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Constant => "constant",
            Strategy::Bic => "bic",
            Strategy::Dic => "dic",
            Strategy::Cv => "cv",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy '{s}' (expected constant, bic, dic or cv)"))
    }
}

// ---------------------------------------------------------------------------
// Candidates and the arg-best reduction
// ---------------------------------------------------------------------------

/// One successfully evaluated topology.
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    pub n_states: usize,
    pub score: f64,
    pub model: M,
}

/// Direction of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Minimise,
    Maximise,
}

impl Goal {
    /// Score every real candidate beats.
    pub fn worst(self) -> f64 {
        match self {
            Goal::Minimise => f64::INFINITY,
            Goal::Maximise => f64::NEG_INFINITY,
        }
    }

    /// Strict improvement; NaN never improves.
    pub fn improves(self, score: f64, incumbent: f64) -> bool {
        match self {
            Goal::Minimise => score < incumbent,
            Goal::Maximise => score > incumbent,
        }
    }
}

/// Fold candidates into the best one, seeded with [`Goal::worst`]. On ties
/// the earlier candidate stays.
pub fn best_candidate<M>(candidates: impl IntoIterator<Item = Candidate<M>>, goal: Goal) -> Option<Candidate<M>> {
    candidates.into_iter().fold(None, |best, candidate| {
        let incumbent = best.as_ref().map_or(goal.worst(), |b: &Candidate<M>| b.score);
        if goal.improves(candidate.score, incumbent) {
            Some(candidate)
        } else {
            best
        }
    })
}

// ---------------------------------------------------------------------------
// ModelSelector
// ---------------------------------------------------------------------------

/// Selects a topology for one label.
pub struct ModelSelector<'a, F: ModelFitter> {
    fitter: &'a F,
    corpora: &'a LabeledCorpusSet,
    this_label: &'a str,
    corpus: &'a SequenceCorpus,
    config: &'a SelectorConfig,
}

impl<'a, F: ModelFitter> ModelSelector<'a, F> {
    /// Returns `None` when `this_label` has no corpus in `corpora`.
    pub fn new(
        fitter: &'a F,
        corpora: &'a LabeledCorpusSet,
        this_label: &'a str,
        config: &'a SelectorConfig,
    ) -> Option<Self> {
        let corpus = corpora.get(this_label)?;
        Some(Self {
            fitter,
            corpora,
            this_label,
            corpus,
            config,
        })
    }

    pub fn label(&self) -> &str {
        self.this_label
    }

    /// Run `strategy`; `None` when not even the constant fallback fits.
    pub fn select(&self, strategy: Strategy) -> Option<F::Model> {
        match strategy {
            Strategy::Constant => self.select_constant(),
            Strategy::Bic => self.select_bic(),
            Strategy::Dic => self.select_dic(),
            Strategy::Cv => self.select_cv(),
        }
    }

    /// Fit `n_states` on the whole label corpus, logging the outcome.
    pub fn base_model(&self, n_states: usize) -> Option<F::Model> {
        match self.fit(self.corpus.matrix(), self.corpus.lengths(), n_states) {
            Ok(model) => {
                log::log!(self.level(), "model created for {} with {} states", self.this_label, n_states);
                Some(model)
            }
            Err(err) => {
                log::log!(self.level(), "failure on {} with {} states: {}", self.this_label, n_states, err);
                None
            }
        }
    }

    fn fit(&self, matrix: ArrayView2<'_, f64>, lengths: &[usize], n_states: usize) -> Result<F::Model, FitFailure> {
        self.fitter.fit(matrix, lengths, n_states, self.config.random_state)
    }

    fn level(&self) -> Level {
        if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// Evaluate every topology in range and keep the best.
    fn best_in_range<E>(&self, criterion: &str, goal: Goal, evaluate: E) -> Option<Candidate<F::Model>>
    where
        E: Fn(usize) -> Result<Candidate<F::Model>, CandidateFailure>,
    {
        let candidates = self.config.state_range().filter_map(|n_states| match evaluate(n_states) {
            Ok(candidate) if candidate.score.is_nan() => {
                log::log!(
                    self.level(),
                    "{} skipped for {} with {} states: {}",
                    criterion,
                    self.this_label,
                    n_states,
                    CandidateFailure::NotANumber
                );
                None
            }
            Ok(candidate) => {
                log::log!(
                    self.level(),
                    "{} = {:.4} for {} with {} states",
                    criterion,
                    candidate.score,
                    self.this_label,
                    n_states
                );
                Some(candidate)
            }
            Err(err) => {
                log::log!(
                    self.level(),
                    "{} skipped for {} with {} states: {}",
                    criterion,
                    self.this_label,
                    n_states,
                    err
                );
                None
            }
        });

        let best = best_candidate(candidates, goal);
        if let Some(best) = &best {
            log::debug!(
                "{} picked {} states for {} ({} = {:.4})",
                criterion,
                best.n_states,
                self.this_label,
                criterion,
                best.score
            );
        }
        best
    }

    fn fallback(&self) -> Option<F::Model> {
        log::warn!(
            "no topology in {}..={} survived for {}, falling back to {} states",
            self.config.min_states,
            self.config.max_states,
            self.this_label,
            self.config.constant_states
        );
        self.base_model(self.config.constant_states)
    }
}

// ---------------------------------------------------------------------------
// Batch training
// ---------------------------------------------------------------------------

/// Run `strategy` for every label in parallel and collect the survivors.
pub fn train_all<F>(
    fitter: &F,
    corpora: &LabeledCorpusSet,
    config: &SelectorConfig,
    strategy: Strategy,
) -> ModelBank<F::Model>
where
    F: ModelFitter + Sync,
    F::Model: Send,
{
    corpora
        .par_iter()
        .filter_map(|(label, _)| {
            let selector = ModelSelector::new(fitter, corpora, label, config)?;
            match selector.select(strategy) {
                Some(model) => Some((label.clone(), model)),
                None => {
                    log::warn!(
                        "{strategy}: no model could be fit for {}, leaving it out of the bank",
                        selector.label()
                    );
                    None
                }
            }
        })
        .collect()
}
