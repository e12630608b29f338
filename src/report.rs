use std::fmt;

use serde::Serialize;

use crate::data::model::TestCorpus;
use crate::recognizer::Recognition;

// ---------------------------------------------------------------------------
// Word error rate
// ---------------------------------------------------------------------------

/// One item recognised as the wrong label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misrecognition {
    pub item_id: usize,
    pub guess: Option<String>,
    pub expected: String,
}

/// Recognition accuracy over the items whose true label is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Items with a known label.
    pub total: usize,
    pub errors: Vec<Misrecognition>,
}

impl ErrorReport {
    /// Compare each guess with the test corpus's true label. Items without a
    /// label are not counted.
    pub fn evaluate(recognition: &Recognition, test_set: &TestCorpus) -> Self {
        let mut report = ErrorReport::default();
        for (&item_id, guess) in recognition.item_ids.iter().zip(&recognition.guesses) {
            let Some(expected) = test_set.get(item_id).and_then(|item| item.label.as_ref()) else {
                continue;
            };
            report.total += 1;
            if guess.as_ref() != Some(expected) {
                report.errors.push(Misrecognition {
                    item_id,
                    guess: guess.clone(),
                    expected: expected.clone(),
                });
            }
        }
        report
    }

    /// Fraction of labelled items recognised wrongly; zero when none are labelled.
    pub fn word_error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.errors.len() as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "WER = {:.4}", self.word_error_rate())?;
        writeln!(f, "Total correct: {} out of {}", self.total - self.errors.len(), self.total)?;
        for miss in &self.errors {
            let guess = miss.guess.as_deref().unwrap_or("<none>");
            writeln!(f, "  {}: {} (expected {})", miss.item_id, guess, miss.expected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TestItem;
    use ndarray::array;

    fn labelled(entries: &[(usize, Option<&str>)]) -> TestCorpus {
        entries
            .iter()
            .map(|&(id, label)| (id, TestItem::new(array![[0.0]], label.map(str::to_string))))
            .collect()
    }

    fn recognition(guesses: &[(usize, Option<&str>)]) -> Recognition {
        Recognition {
            item_ids: guesses.iter().map(|g| g.0).collect(),
            probabilities: vec![Default::default(); guesses.len()],
            guesses: guesses.iter().map(|g| g.1.map(str::to_string)).collect(),
        }
    }

    #[test]
    fn test_counts_errors_over_labelled_items() {
        let test_set = labelled(&[(0, Some("A")), (1, Some("B")), (2, None), (3, Some("A"))]);
        let out = recognition(&[(0, Some("A")), (1, Some("A")), (2, Some("B")), (3, None)]);

        let report = ErrorReport::evaluate(&out, &test_set);
        assert_eq!(report.total, 3);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].item_id, 1);
        assert!((report.word_error_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_display_lists_misses() {
        let test_set = labelled(&[(4, Some("BOOK"))]);
        let report = ErrorReport::evaluate(&recognition(&[(4, Some("CAR"))]), &test_set);
        let text = report.to_string();
        assert!(text.starts_with("WER = 1.0000"));
        assert!(text.contains("4: CAR (expected BOOK)"));
    }

    #[test]
    fn test_no_labels_means_zero_rate() {
        let report = ErrorReport::evaluate(&recognition(&[(0, Some("A"))]), &labelled(&[(0, None)]));
        assert_eq!(report.total, 0);
        assert_eq!(report.word_error_rate(), 0.0);
    }
}
