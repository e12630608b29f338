//! Generate a synthetic gesture corpus for trying out `hmm-recognizer`.
//!
//! Writes `sample_train.csv` and `sample_test.csv` (or into the directory given
//! as the first argument). Each label is a left-to-right walk through a few
//! 2-D "poses"; every frame is the current pose plus Gaussian noise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TRAIN_PER_LABEL: usize = 15;
const TEST_PER_LABEL: usize = 5;
const NOISE: f64 = 0.4;

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn generate_sequence(poses: &[(f64, f64)], rng: &mut StdRng) -> Vec<[f64; 2]> {
    let mut frames = Vec::new();
    for &(x, y) in poses {
        let dwell = rng.gen_range(3..=7);
        for _ in 0..dwell {
            frames.push([gauss(rng, x, NOISE), gauss(rng, y, NOISE)]);
        }
    }
    frames
}

fn write_corpus(path: &Path, sequences: &[(usize, &str, Vec<[f64; 2]>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["sequence", "label", "x", "y"])?;
    for (id, label, frames) in sequences {
        for frame in frames {
            writer.write_record([id.to_string(), label.to_string(), frame[0].to_string(), frame[1].to_string()])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let out_dir = std::env::args().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);
    let mut rng = StdRng::seed_from_u64(42);

    let gestures: Vec<(&str, Vec<(f64, f64)>)> = vec![
        ("HELLO", vec![(0.0, 0.0), (3.0, 1.0), (6.0, 0.0)]),
        ("THANKS", vec![(0.0, 4.0), (0.0, 0.0)]),
        ("YES", vec![(2.0, 2.0), (2.0, -2.0), (2.0, 2.0), (2.0, -2.0)]),
        ("NO", vec![(-3.0, 1.0), (3.0, 1.0), (-3.0, 1.0)]),
    ];

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (label, poses) in &gestures {
        for _ in 0..TRAIN_PER_LABEL {
            train.push((train.len(), *label, generate_sequence(poses, &mut rng)));
        }
    }
    // Interleave labels so test ids do not follow label order.
    for _ in 0..TEST_PER_LABEL {
        for (label, poses) in &gestures {
            test.push((test.len(), *label, generate_sequence(poses, &mut rng)));
        }
    }

    let train_path = out_dir.join("sample_train.csv");
    let test_path = out_dir.join("sample_test.csv");
    write_corpus(&train_path, &train)?;
    write_corpus(&test_path, &test)?;

    log::info!("seed 42, noise {NOISE}");
    println!(
        "Wrote {} training and {} test sequences for {} labels to {} and {}",
        train.len(),
        test.len(),
        gestures.len(),
        train_path.display(),
        test_path.display()
    );
    Ok(())
}
