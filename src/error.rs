//! Typed failures for corpus construction, model fitting and scoring.

use thiserror::Error;

/// A topology could not be fit to a corpus.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    #[error("requested topology has zero hidden states")]
    ZeroStates,

    #[error("invalid training corpus: {0}")]
    InvalidCorpus(String),

    #[error("{n_states} states need at least {needed} observations, got {available}")]
    InsufficientData {
        n_states: usize,
        needed: usize,
        available: usize,
    },

    #[error("log-likelihood became non-finite at iteration {iteration}")]
    Diverged { iteration: usize },
}

/// A fitted model could not be evaluated against a corpus.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreFailure {
    #[error("model expects {expected} features, observations have {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("sequence lengths sum to {total} but the matrix has {rows} rows")]
    LengthMismatch { rows: usize, total: usize },

    #[error("zero-length sequence")]
    EmptySequence,

    #[error("log-likelihood is not finite ({0})")]
    NonFinite(f64),
}

/// A [`crate::data::model::SequenceCorpus`] violated one of its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorpusError {
    #[error("sequence {index} has zero length")]
    EmptySequence { index: usize },

    #[error("sequence lengths sum to {total} but the matrix has {rows} rows")]
    LengthMismatch { rows: usize, total: usize },

    #[error("sequence {index} has {found} features, expected {expected}")]
    RaggedFeatures {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("corpus contains no sequences")]
    NoSequences,
}

/// Why one candidate topology did not take part in selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateFailure {
    #[error("fit failed: {0}")]
    Fit(#[from] FitFailure),

    #[error("scoring failed: {0}")]
    Score(#[from] ScoreFailure),

    #[error("no competing label could be scored")]
    NoCompetitors,

    #[error("{0} sequences are too few for cross-validation")]
    TooFewSequences(usize),

    #[error("criterion evaluated to NaN")]
    NotANumber,
}

/// Invalid selector or model settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("min_states must be at least 1")]
    ZeroMinStates,

    #[error("constant_states must be at least 1")]
    ZeroConstantStates,

    #[error("min_states ({min}) exceeds max_states ({max})")]
    InvertedRange { min: usize, max: usize },

    #[error("{0} must be positive")]
    NonPositive(&'static str),
}
