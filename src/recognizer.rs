//! Recognition: score unseen items against every label's model.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::data::model::{TestCorpus, TestItem};
use crate::model::SequenceModel;
use crate::selector::ModelBank;

/// Log-likelihood of one test item under each label's model.
pub type ScoreRow = BTreeMap<String, f64>;

/// Output of [`recognize`], both lists in ascending item-id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recognition {
    pub item_ids: Vec<usize>,
    pub probabilities: Vec<ScoreRow>,
    /// Arg-max label per item; `None` only when the bank is empty.
    pub guesses: Vec<Option<String>>,
}

impl Recognition {
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}

/// Score every test item against every model in `bank` and guess the label
/// with the highest log-likelihood.
///
/// A failed or NaN score counts as negative infinity for that label. Ties go
/// to the first label in iteration order, which is the lexicographically
/// smallest one.
pub fn recognize<M>(bank: &ModelBank<M>, test_set: &TestCorpus) -> Recognition
where
    M: SequenceModel + Sync,
{
    let items: Vec<(usize, &TestItem)> = test_set.items().collect();
    let rows: Vec<(usize, ScoreRow, Option<String>)> = items
        .into_par_iter()
        .map(|(id, item)| {
            let row = score_item(bank, id, item);
            let guess = best_label(&row);
            (id, row, guess)
        })
        .collect();

    let mut recognition = Recognition::default();
    for (id, row, guess) in rows {
        recognition.item_ids.push(id);
        recognition.probabilities.push(row);
        recognition.guesses.push(guess);
    }
    recognition
}

fn score_item<M: SequenceModel>(bank: &ModelBank<M>, id: usize, item: &TestItem) -> ScoreRow {
    bank.iter()
        .map(|(label, model)| {
            let log_l = match model.score(item.matrix.view(), &item.lengths) {
                Ok(log_l) if !log_l.is_nan() => log_l,
                Ok(_) => {
                    log::debug!("item {id}: {label} scored NaN");
                    f64::NEG_INFINITY
                }
                Err(err) => {
                    log::debug!("item {id}: {label} failed to score: {err}");
                    f64::NEG_INFINITY
                }
            };
            (label.clone(), log_l)
        })
        .collect()
}

/// Arg-max of a score row; the first maximum wins.
pub fn best_label(row: &ScoreRow) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (label, &score) in row {
        match best {
            Some((_, incumbent)) if score <= incumbent => {}
            _ => best = Some((label, score)),
        }
    }
    best.map(|(label, _)| label.clone())
}
