use ndarray::{s, Array2};

use super::model::SequenceCorpus;

// ---------------------------------------------------------------------------
// Cross-validation folds over whole sequences
// ---------------------------------------------------------------------------

/// One train/test partition of sequence indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `n_sequences` sequence indices into `n_folds` contiguous, unshuffled
/// folds. The first `n_sequences % n_folds` folds hold one extra sequence.
///
/// Returns no folds when `n_folds` is zero or exceeds `n_sequences`.
pub fn kfold_split(n_sequences: usize, n_folds: usize) -> Vec<Fold> {
    if n_folds == 0 || n_folds > n_sequences {
        return Vec::new();
    }

    let base = n_sequences / n_folds;
    let extra = n_sequences % n_folds;

    let mut folds = Vec::with_capacity(n_folds);
    let mut start = 0;
    for k in 0..n_folds {
        let size = base + usize::from(k < extra);
        let end = start + size;
        let test: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n_sequences).collect();
        folds.push(Fold { train, test });
        start = end;
    }
    folds
}

/// Concatenate the selected sequences of `corpus`, in index order, into a
/// matrix and its per-sequence lengths.
///
/// # Panics
/// If any index is out of range.
pub fn combine_sequences(indices: &[usize], corpus: &SequenceCorpus) -> (Array2<f64>, Vec<usize>) {
    let lengths: Vec<usize> = indices.iter().map(|&i| corpus.lengths()[i]).collect();
    let mut matrix = Array2::zeros((lengths.iter().sum::<usize>(), corpus.n_features()));

    let mut start = 0;
    for &i in indices {
        let sequence = corpus.sequence(i);
        let end = start + sequence.nrows();
        matrix.slice_mut(s![start..end, ..]).assign(&sequence);
        start = end;
    }
    (matrix, lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::BTreeSet;

    #[test]
    fn test_kfold_sizes_follow_remainder_rule() {
        let folds = kfold_split(7, 3);
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        assert_eq!(folds[1].test, vec![3, 4]);
        assert_eq!(folds[1].train, vec![0, 1, 2, 5, 6]);
    }

    #[test]
    fn test_kfold_train_and_test_never_overlap() {
        for n in 2..12 {
            for k in 2..=n.min(5) {
                let folds = kfold_split(n, k);
                assert_eq!(folds.len(), k);

                let mut seen_in_test = BTreeSet::new();
                for fold in &folds {
                    let train: BTreeSet<_> = fold.train.iter().copied().collect();
                    let test: BTreeSet<_> = fold.test.iter().copied().collect();
                    assert!(!test.is_empty());
                    assert!(train.is_disjoint(&test));
                    assert_eq!(train.len() + test.len(), n);
                    seen_in_test.extend(test);
                }
                assert_eq!(seen_in_test.len(), n);
            }
        }
    }

    #[test]
    fn test_kfold_rejects_impossible_splits() {
        assert!(kfold_split(2, 3).is_empty());
        assert!(kfold_split(5, 0).is_empty());
    }

    #[test]
    fn test_combine_sequences_preserves_boundaries() {
        let corpus = SequenceCorpus::from_sequences(&[
            array![[0.0], [0.1]],
            array![[1.0]],
            array![[2.0], [2.1], [2.2]],
        ])
        .unwrap();

        let (matrix, lengths) = combine_sequences(&[2, 0], &corpus);
        assert_eq!(lengths, vec![3, 2]);
        assert_eq!(matrix, array![[2.0], [2.1], [2.2], [0.0], [0.1]]);

        let (empty, no_lengths) = combine_sequences(&[], &corpus);
        assert_eq!(empty.dim(), (0, 1));
        assert!(no_lengths.is_empty());
    }

    #[test]
    fn test_combined_rows_match_lengths() {
        let corpus = SequenceCorpus::from_sequences(&[
            array![[0.0, 1.0], [0.5, 1.5]],
            array![[2.0, 3.0]],
            array![[4.0, 5.0], [4.5, 5.5], [4.8, 5.8]],
            array![[6.0, 7.0]],
        ])
        .unwrap();

        for fold in kfold_split(corpus.n_sequences(), 3) {
            for indices in [&fold.train, &fold.test] {
                let (matrix, lengths) = combine_sequences(indices, &corpus);
                assert_eq!(matrix.nrows(), lengths.iter().sum::<usize>());
                assert_eq!(matrix.ncols(), 2);
                let rebuilt = SequenceCorpus::new(matrix, lengths).unwrap();
                for (k, &i) in indices.iter().enumerate() {
                    assert_eq!(rebuilt.sequence(k), corpus.sequence(i));
                }
            }
        }
    }
}
