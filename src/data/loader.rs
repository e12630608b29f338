use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use serde::Deserialize;

use super::model::{LabeledCorpusSet, SequenceCorpus, TestCorpus, TestItem};

// ---------------------------------------------------------------------------
// SequenceRecord – one sequence as stored on disk
// ---------------------------------------------------------------------------

/// A labelled sequence: `frames[t]` holds the features at time step `t`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SequenceRecord {
    pub sequence: usize,
    pub label: String,
    pub frames: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load sequence records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – one row per frame, `sequence` and `label` columns plus one
///   numeric column per feature
/// * `.json` – `[{ "sequence": 0, "label": "A", "frames": [[...], ...] }, ...]`
pub fn load_file(path: &Path) -> Result<Vec<SequenceRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load a training file and group its sequences by label.
pub fn load_training_set(path: &Path) -> Result<LabeledCorpusSet> {
    let records = load_file(path)?;
    training_set(&records).with_context(|| format!("building training set from {}", path.display()))
}

/// Load a test file; every sequence becomes one item keyed by its id.
pub fn load_test_corpus(path: &Path) -> Result<TestCorpus> {
    let records = load_file(path)?;
    test_corpus(&records).with_context(|| format!("building test corpus from {}", path.display()))
}

/// Group records by label, keeping file order within each label.
pub fn training_set(records: &[SequenceRecord]) -> Result<LabeledCorpusSet> {
    let mut grouped: BTreeMap<String, Vec<Array2<f64>>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.label.clone())
            .or_default()
            .push(frames_to_matrix(&record.frames, record.sequence)?);
    }

    grouped
        .into_iter()
        .map(|(label, sequences)| -> Result<(String, SequenceCorpus)> {
            let corpus = SequenceCorpus::from_sequences(&sequences)
                .with_context(|| format!("label '{label}'"))?;
            Ok((label, corpus))
        })
        .collect()
}

/// One test item per record; the record label becomes the item's true label.
pub fn test_corpus(records: &[SequenceRecord]) -> Result<TestCorpus> {
    let mut corpus = TestCorpus::new();
    for record in records {
        if corpus.get(record.sequence).is_some() {
            bail!("Duplicate sequence id {}", record.sequence);
        }
        let matrix = frames_to_matrix(&record.frames, record.sequence)?;
        let label = Some(record.label.clone()).filter(|l| !l.is_empty());
        corpus.insert(record.sequence, TestItem::new(matrix, label));
    }
    Ok(corpus)
}

fn frames_to_matrix(frames: &[Vec<f64>], sequence: usize) -> Result<Array2<f64>> {
    let Some(first) = frames.first() else {
        bail!("Sequence {sequence} has no frames");
    };
    let n_features = first.len();
    if n_features == 0 {
        bail!("Sequence {sequence} has no features");
    }
    if let Some(t) = frames.iter().position(|f| f.len() != n_features) {
        bail!(
            "Sequence {sequence}, frame {t}: {} features, expected {n_features}",
            frames[t].len()
        );
    }

    let flat: Vec<f64> = frames.iter().flatten().copied().collect();
    Array2::from_shape_vec((frames.len(), n_features), flat)
        .with_context(|| format!("Sequence {sequence}: shaping frames"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<SequenceRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON sequence records")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
/// `sequence` holds an integer id, `label` the label; every other column is a
/// feature, in header order. Frames of one sequence appear in time order.
fn load_csv(path: &Path) -> Result<Vec<SequenceRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let seq_idx = headers
        .iter()
        .position(|h| h == "sequence")
        .context("CSV missing 'sequence' column")?;
    let label_idx = headers
        .iter()
        .position(|h| h == "label")
        .context("CSV missing 'label' column")?;
    let feature_cols: Vec<usize> = (0..headers.len())
        .filter(|&i| i != seq_idx && i != label_idx)
        .collect();
    if feature_cols.is_empty() {
        bail!("CSV has no feature columns");
    }

    let mut records: Vec<SequenceRecord> = Vec::new();
    let mut position: BTreeMap<usize, usize> = BTreeMap::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let seq_text = record.get(seq_idx).unwrap_or("").trim();
        let sequence: usize = seq_text
            .parse()
            .with_context(|| format!("Row {row_no}: sequence id '{seq_text}' is not an integer"))?;
        let label = record.get(label_idx).unwrap_or("").trim();

        let frame = feature_cols
            .iter()
            .map(|&col| {
                let tok = record.get(col).unwrap_or("").trim();
                tok.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, {}: '{tok}' is not a number", headers[col]))
            })
            .collect::<Result<Vec<f64>>>()?;

        match position.get(&sequence) {
            Some(&idx) => {
                let existing = &mut records[idx];
                if existing.label != label {
                    bail!(
                        "Row {row_no}: sequence {sequence} labelled '{label}', earlier rows say '{}'",
                        existing.label
                    );
                }
                existing.frames.push(frame);
            }
            None => {
                position.insert(sequence, records.len());
                records.push(SequenceRecord {
                    sequence,
                    label: label.to_string(),
                    frames: vec![frame],
                });
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const CSV: &str = "\
sequence,label,x,y
0,HELLO,0.0,1.0
0,HELLO,0.5,1.5
1,BYE,9.0,9.0
2,HELLO,0.2,1.2
1,BYE,8.0,8.5
";

    #[test]
    fn test_csv_groups_frames_by_sequence() {
        let file = write_temp(".csv", CSV);
        let records = load_file(file.path()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].frames, vec![vec![0.0, 1.0], vec![0.5, 1.5]]);
        assert_eq!(records[1].label, "BYE");
        assert_eq!(records[1].frames.len(), 2);
    }

    #[test]
    fn test_training_set_groups_by_label() {
        let file = write_temp(".csv", CSV);
        let set = load_training_set(file.path()).unwrap();

        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["BYE", "HELLO"]);
        assert_eq!(set["HELLO"].lengths(), &[2, 1]);
        assert_eq!(set["HELLO"].n_features(), 2);
        assert_eq!(set["BYE"].n_observations(), 2);
    }

    #[test]
    fn test_test_corpus_keeps_ids_and_labels() {
        let file = write_temp(".csv", CSV);
        let corpus = load_test_corpus(file.path()).unwrap();

        assert_eq!(corpus.len(), 3);
        let item = corpus.get(1).unwrap();
        assert_eq!(item.label.as_deref(), Some("BYE"));
        assert_eq!(item.lengths, vec![2]);
    }

    #[test]
    fn test_json_records() {
        let file = write_temp(
            ".json",
            r#"[{"sequence": 4, "label": "A", "frames": [[1.0], [2.0]]},
                {"sequence": 5, "label": "B", "frames": [[3.0]]}]"#,
        );
        let set = load_training_set(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set["A"].lengths(), &[2]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let ragged = write_temp(".json", r#"[{"sequence": 0, "label": "A", "frames": [[1.0, 2.0], [3.0]]}]"#);
        assert!(load_training_set(ragged.path()).is_err());

        let conflicting = write_temp(".csv", "sequence,label,x\n0,A,1.0\n0,B,2.0\n");
        assert!(load_file(conflicting.path()).is_err());

        let not_a_number = write_temp(".csv", "sequence,label,x\n0,A,abc\n");
        assert!(load_file(not_a_number.path()).is_err());

        let unknown = write_temp(".parquet", "");
        assert!(load_file(unknown.path()).is_err());
    }
}
