/// Data layer: corpora, loading, and cross-validation folds.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SequenceRecord per sequence
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────────────────┐
///   │ LabeledCorpusSet / TestCorpus│  per-label SequenceCorpus, items by id
///   └─────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  folds    │  whole-sequence k-fold splits → train/test matrices
///   └──────────┘
/// ```

pub mod folds;
pub mod loader;
pub mod model;
