//! Per-label hidden-Markov topology selection and sequence recognition.
//!
//! For every label of a training vocabulary a [`selector::ModelSelector`]
//! picks a hidden-state count under one of four strategies (constant, BIC,
//! DIC, cross-validation). The resulting [`selector::ModelBank`] is then used
//! by [`recognizer::recognize`] to label unseen sequences.

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod recognizer;
pub mod report;
pub mod selector;

#[cfg(test)]
mod test_support;

pub use config::{GaussianHmmConfig, RecognizerConfig, SelectorConfig};
pub use data::model::{LabeledCorpusSet, SequenceCorpus, TestCorpus, TestItem};
pub use error::{CandidateFailure, ConfigError, CorpusError, FitFailure, ScoreFailure};
pub use model::{GaussianHmm, GaussianHmmTrainer, ModelFitter, SequenceModel};
pub use recognizer::{recognize, Recognition, ScoreRow};
pub use report::ErrorReport;
pub use selector::{train_all, ModelBank, ModelSelector, Strategy};
