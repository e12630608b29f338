use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use hmm_recognizer::data::loader::{load_test_corpus, load_training_set};
use hmm_recognizer::{
    recognize, train_all, ErrorReport, GaussianHmmTrainer, Recognition, RecognizerConfig, SequenceModel, Strategy,
};

#[derive(Parser)]
#[command(name = "hmm-recognizer")]
#[command(about = "Select an HMM topology per label, then recognise unseen sequences")]
struct Cli {
    /// Training sequences (.csv or .json)
    #[arg(long)]
    train: PathBuf,

    /// Test sequences to recognise (.csv or .json)
    #[arg(long)]
    test: Option<PathBuf>,

    /// Selection strategy: constant, bic, dic or cv
    #[arg(short, long, default_value = "bic")]
    strategy: Strategy,

    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_states: Option<usize>,

    #[arg(long)]
    max_states: Option<usize>,

    #[arg(long)]
    constant_states: Option<usize>,

    /// Random seed for every fit
    #[arg(long)]
    seed: Option<u64>,

    /// Log per-topology progress
    #[arg(short, long)]
    verbose: bool,

    /// Write score rows, guesses and the error report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    strategy: Strategy,
    selected_states: BTreeMap<&'a str, usize>,
    recognition: &'a Recognition,
    report: &'a ErrorReport,
}

fn build_config(cli: &Cli) -> Result<RecognizerConfig> {
    let mut config = match &cli.config {
        Some(path) => RecognizerConfig::load(path)?,
        None => RecognizerConfig::default(),
    };

    let selector = &mut config.selector;
    if let Some(v) = cli.min_states {
        selector.min_states = v;
    }
    if let Some(v) = cli.max_states {
        selector.max_states = v;
    }
    if let Some(v) = cli.constant_states {
        selector.constant_states = v;
    }
    if let Some(v) = cli.seed {
        selector.random_state = v;
    }
    selector.verbose |= cli.verbose;

    config.validate().context("invalid settings")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = build_config(&cli)?;
    let corpora = load_training_set(&cli.train)?;
    log::info!(
        "loaded {} labels from {}, selecting with {}",
        corpora.len(),
        cli.train.display(),
        cli.strategy
    );

    let trainer = GaussianHmmTrainer::new(config.hmm.clone());
    let bank = train_all(&trainer, &corpora, &config.selector, cli.strategy);

    let selected_states: BTreeMap<&str, usize> =
        bank.iter().map(|(label, model)| (label.as_str(), model.n_states())).collect();
    for label in corpora.keys() {
        match selected_states.get(label.as_str()) {
            Some(n) => println!("{label}: {n} states"),
            None => println!("{label}: no model"),
        }
    }

    let Some(test_path) = &cli.test else {
        return Ok(());
    };
    let test_set = load_test_corpus(test_path)?;
    let recognition = recognize(&bank, &test_set);
    let report = ErrorReport::evaluate(&recognition, &test_set);
    print!("{report}");

    if let Some(output) = &cli.output {
        let summary = RunSummary {
            strategy: cli.strategy,
            selected_states,
            recognition: &recognition,
            report: &report,
        };
        let json = serde_json::to_string_pretty(&summary).context("serialising results")?;
        std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    }

    Ok(())
}
