//! Scripted model backend whose fit failures and scores are fully controlled.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use ndarray::{Array2, ArrayView2};

use crate::data::model::{LabeledCorpusSet, SequenceCorpus};
use crate::error::{FitFailure, ScoreFailure};
use crate::model::{ModelFitter, SequenceModel};

/// Model remembering the column-0 mean of its training rows.
///
/// `score = bonus - Σ (x₀ - center)²`, so self-scores are high and scores of
/// distant corpora low.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedModel {
    pub n_states: usize,
    pub n_features: usize,
    pub center: f64,
    pub bonus: f64,
    /// First column-0 value of every training sequence.
    pub trained_on: Vec<f64>,
}

impl SequenceModel for ScriptedModel {
    fn n_states(&self) -> usize {
        self.n_states
    }

    fn score(&self, matrix: ArrayView2<'_, f64>, lengths: &[usize]) -> Result<f64, ScoreFailure> {
        if matrix.ncols() != self.n_features {
            return Err(ScoreFailure::DimensionMismatch {
                expected: self.n_features,
                found: matrix.ncols(),
            });
        }
        let total: usize = lengths.iter().sum();
        if total != matrix.nrows() {
            return Err(ScoreFailure::LengthMismatch {
                rows: matrix.nrows(),
                total,
            });
        }
        let sq: f64 = matrix.column(0).iter().map(|x| (x - self.center).powi(2)).sum();
        Ok(self.bonus - sq)
    }
}

/// Fitter that fails for chosen topologies and records every fit.
#[derive(Debug, Default)]
pub struct ScriptedFitter {
    pub failing: BTreeSet<usize>,
    pub bonus: BTreeMap<usize, f64>,
    pub fits: Mutex<Vec<ScriptedModel>>,
}

impl ScriptedFitter {
    pub fn failing(states: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing: states.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_bonus(mut self, n_states: usize, bonus: f64) -> Self {
        self.bonus.insert(n_states, bonus);
        self
    }

    pub fn recorded(&self) -> Vec<ScriptedModel> {
        self.fits.lock().map(|fits| fits.clone()).unwrap_or_default()
    }
}

impl ModelFitter for ScriptedFitter {
    type Model = ScriptedModel;

    fn fit(
        &self,
        matrix: ArrayView2<'_, f64>,
        lengths: &[usize],
        n_states: usize,
        _seed: u64,
    ) -> Result<ScriptedModel, FitFailure> {
        if self.failing.contains(&n_states) {
            return Err(FitFailure::Diverged { iteration: 0 });
        }
        let column = matrix.column(0);
        let center = column.sum() / column.len().max(1) as f64;
        let trained_on = lengths
            .iter()
            .scan(0usize, |start, &len| {
                let first = column[*start];
                *start += len;
                Some(first)
            })
            .collect();

        let model = ScriptedModel {
            n_states,
            n_features: matrix.ncols(),
            center,
            bonus: self.bonus.get(&n_states).copied().unwrap_or(0.0),
            trained_on,
        };
        if let Ok(mut fits) = self.fits.lock() {
            fits.push(model.clone());
        }
        Ok(model)
    }
}

/// `count` one-feature sequences of length 3; sequence `i` starts at
/// `base + i`.
pub fn corpus_around(base: f64, count: usize) -> SequenceCorpus {
    let sequences: Vec<Array2<f64>> = (0..count)
        .map(|i| {
            let start = base + i as f64;
            Array2::from_shape_fn((3, 1), |(t, _)| start + 0.1 * t as f64)
        })
        .collect();
    SequenceCorpus::from_sequences(&sequences).expect("valid corpus")
}

/// Three well separated labels: A near 0, B near 10, C near 20.
pub fn three_labels() -> LabeledCorpusSet {
    [
        ("A".to_string(), corpus_around(0.0, 4)),
        ("B".to_string(), corpus_around(10.0, 4)),
        ("C".to_string(), corpus_around(20.0, 4)),
    ]
    .into_iter()
    .collect()
}
