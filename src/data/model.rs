use std::collections::BTreeMap;

use ndarray::{concatenate, s, Array2, ArrayView2, Axis};

use crate::error::CorpusError;

// ---------------------------------------------------------------------------
// SequenceCorpus – all sequences of one label
// ---------------------------------------------------------------------------

/// Variable-length multivariate sequences stored as one concatenated matrix.
///
/// Rows are time steps across all sequences, columns are features. `lengths`
/// delimits the sequences; every length is positive and they sum to the row
/// count.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceCorpus {
    matrix: Array2<f64>,
    lengths: Vec<usize>,
    /// Row offset of each sequence (prefix sums of `lengths`).
    offsets: Vec<usize>,
}

impl SequenceCorpus {
    /// Wrap an already concatenated matrix, checking the length invariants.
    pub fn new(matrix: Array2<f64>, lengths: Vec<usize>) -> Result<Self, CorpusError> {
        if lengths.is_empty() {
            return Err(CorpusError::NoSequences);
        }
        if let Some(index) = lengths.iter().position(|&len| len == 0) {
            return Err(CorpusError::EmptySequence { index });
        }
        let total: usize = lengths.iter().sum();
        if total != matrix.nrows() {
            return Err(CorpusError::LengthMismatch {
                rows: matrix.nrows(),
                total,
            });
        }

        let offsets = lengths
            .iter()
            .scan(0, |acc, &len| {
                let start = *acc;
                *acc += len;
                Some(start)
            })
            .collect();

        Ok(SequenceCorpus {
            matrix,
            lengths,
            offsets,
        })
    }

    /// Concatenate individual `(time steps × features)` sequences.
    pub fn from_sequences(sequences: &[Array2<f64>]) -> Result<Self, CorpusError> {
        let first = sequences.first().ok_or(CorpusError::NoSequences)?;
        let n_features = first.ncols();

        for (index, seq) in sequences.iter().enumerate() {
            if seq.nrows() == 0 {
                return Err(CorpusError::EmptySequence { index });
            }
            if seq.ncols() != n_features {
                return Err(CorpusError::RaggedFeatures {
                    index,
                    expected: n_features,
                    found: seq.ncols(),
                });
            }
        }

        let views: Vec<ArrayView2<f64>> = sequences.iter().map(|s| s.view()).collect();
        let matrix = concatenate(Axis(0), &views).map_err(|_| CorpusError::RaggedFeatures {
            index: 0,
            expected: n_features,
            found: 0,
        })?;
        let lengths = sequences.iter().map(|s| s.nrows()).collect();

        Self::new(matrix, lengths)
    }

    /// The concatenated observation matrix.
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    /// Per-sequence lengths, in sequence order.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Rows belonging to sequence `index`.
    ///
    /// # Panics
    /// If `index >= self.n_sequences()`.
    pub fn sequence(&self, index: usize) -> ArrayView2<'_, f64> {
        let start = self.offsets[index];
        let end = start + self.lengths[index];
        self.matrix.slice(s![start..end, ..])
    }

    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// Total number of time steps across all sequences.
    pub fn n_observations(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }
}

// ---------------------------------------------------------------------------
// LabeledCorpusSet – the training vocabulary
// ---------------------------------------------------------------------------

/// Every label in the vocabulary mapped to its training sequences.
pub type LabeledCorpusSet = BTreeMap<String, SequenceCorpus>;

// ---------------------------------------------------------------------------
// TestCorpus – unseen items to recognise
// ---------------------------------------------------------------------------

/// One unseen item: a single sequence plus its true label when known.
#[derive(Debug, Clone, PartialEq)]
pub struct TestItem {
    pub matrix: Array2<f64>,
    pub lengths: Vec<usize>,
    pub label: Option<String>,
}

impl TestItem {
    pub fn new(matrix: Array2<f64>, label: Option<String>) -> Self {
        let lengths = vec![matrix.nrows()];
        TestItem {
            matrix,
            lengths,
            label,
        }
    }
}

/// Test items keyed by item id. Iteration is in ascending id order, which is
/// the canonical order of recognition output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCorpus {
    items: BTreeMap<usize, TestItem>,
}

impl TestCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the item with the given id.
    pub fn insert(&mut self, id: usize, item: TestItem) {
        self.items.insert(id, item);
    }

    /// All items in ascending id order.
    pub fn items(&self) -> impl Iterator<Item = (usize, &TestItem)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn get(&self, id: usize) -> Option<&TestItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(usize, TestItem)> for TestCorpus {
    fn from_iter<I: IntoIterator<Item = (usize, TestItem)>>(iter: I) -> Self {
        TestCorpus {
            items: iter.into_iter().collect(),
        }
    }
}
