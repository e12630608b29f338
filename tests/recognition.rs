//! End-to-end: select a topology per label with the Gaussian HMM backend,
//! then recognise held-out sequences.

use hmm_recognizer::{
    recognize, train_all, GaussianHmmConfig, GaussianHmmTrainer, LabeledCorpusSet, SelectorConfig, SequenceCorpus,
    SequenceModel, Strategy, TestCorpus, TestItem,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noisy_walk(poses: &[(f64, f64)], rng: &mut StdRng) -> Array2<f64> {
    let mut rows = Vec::new();
    for &(x, y) in poses {
        let dwell = rng.gen_range(4..=6);
        for _ in 0..dwell {
            rows.push([x + rng.gen_range(-0.3..0.3), y + rng.gen_range(-0.3..0.3)]);
        }
    }
    Array2::from_shape_fn((rows.len(), 2), |(r, c)| rows[r][c])
}

const UP: [(f64, f64); 2] = [(0.0, 0.0), (4.0, 4.0)];
const ACROSS: [(f64, f64); 2] = [(4.0, -4.0), (-4.0, 0.0)];

fn fixture() -> (LabeledCorpusSet, TestCorpus) {
    let mut rng = StdRng::seed_from_u64(7);
    let up: Vec<Array2<f64>> = (0..8).map(|_| noisy_walk(&UP, &mut rng)).collect();
    let across: Vec<Array2<f64>> = (0..8).map(|_| noisy_walk(&ACROSS, &mut rng)).collect();

    let mut corpora = LabeledCorpusSet::new();
    corpora.insert("ACROSS".into(), SequenceCorpus::from_sequences(&across).unwrap());
    corpora.insert("UP".into(), SequenceCorpus::from_sequences(&up).unwrap());
    // A single frame: too little data for any topology of two or more states.
    corpora.insert("TINY".into(), SequenceCorpus::from_sequences(&[Array2::zeros((1, 2))]).unwrap());

    let mut test_set = TestCorpus::new();
    for id in 0..6 {
        let (poses, label) = if id % 2 == 0 { (&UP, "UP") } else { (&ACROSS, "ACROSS") };
        test_set.insert(id, TestItem::new(noisy_walk(poses, &mut rng), Some(label.into())));
    }
    (corpora, test_set)
}

fn settings() -> (GaussianHmmTrainer, SelectorConfig) {
    let trainer = GaussianHmmTrainer::new(GaussianHmmConfig {
        n_iter: 50,
        ..GaussianHmmConfig::default()
    });
    let config = SelectorConfig {
        min_states: 2,
        max_states: 3,
        constant_states: 2,
        ..SelectorConfig::default()
    };
    (trainer, config)
}

#[test]
fn every_strategy_recognises_separable_labels() {
    let (corpora, test_set) = fixture();
    let (trainer, config) = settings();

    for strategy in Strategy::ALL {
        let bank = train_all(&trainer, &corpora, &config, strategy);

        assert_eq!(bank.keys().collect::<Vec<_>>(), vec!["ACROSS", "UP"], "{strategy}");
        for model in bank.values() {
            assert!((2..=3).contains(&model.n_states()), "{strategy}");
        }

        let out = recognize(&bank, &test_set);
        assert_eq!(out.item_ids, (0..6).collect::<Vec<_>>());
        assert_eq!(out.probabilities.len(), test_set.len());
        for row in &out.probabilities {
            assert_eq!(row.keys().collect::<Vec<_>>(), vec!["ACROSS", "UP"]);
        }
        let expected: Vec<Option<String>> = test_set.items().map(|(_, item)| item.label.clone()).collect();
        assert_eq!(out.guesses, expected, "{strategy}");
    }
}

#[test]
fn missing_label_is_never_guessed() {
    let (corpora, test_set) = fixture();
    let (trainer, config) = settings();
    let bank = train_all(&trainer, &corpora, &config, Strategy::Constant);

    assert!(!bank.contains_key("TINY"));

    let mut with_tiny_item = test_set.clone();
    with_tiny_item.insert(99, TestItem::new(Array2::zeros((1, 2)), Some("TINY".into())));
    let out = recognize(&bank, &with_tiny_item);

    assert_eq!(out.len(), with_tiny_item.len());
    assert!(out.guesses.iter().all(|g| g.as_deref() != Some("TINY")));
}

#[test]
fn recognition_is_repeatable() {
    let (corpora, test_set) = fixture();
    let (trainer, config) = settings();

    let first_bank = train_all(&trainer, &corpora, &config, Strategy::Bic);
    let second_bank = train_all(&trainer, &corpora, &config, Strategy::Bic);

    let first = recognize(&first_bank, &test_set);
    assert_eq!(first, recognize(&first_bank, &test_set));
    assert_eq!(first, recognize(&second_bank, &test_set));
}
