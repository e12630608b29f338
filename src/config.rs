use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Selector settings
// ---------------------------------------------------------------------------

/// Settings shared by every selection strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Topology of the constant strategy, and the fallback of the others.
    pub constant_states: usize,
    /// Smallest hidden-state count tried (inclusive).
    pub min_states: usize,
    /// Largest hidden-state count tried (inclusive).
    pub max_states: usize,
    /// Seed handed to every fit.
    pub random_state: u64,
    /// Log per-topology progress at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            constant_states: 3,
            min_states: 2,
            max_states: 10,
            random_state: 14,
            verbose: false,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_states == 0 {
            return Err(ConfigError::ZeroMinStates);
        }
        if self.constant_states == 0 {
            return Err(ConfigError::ZeroConstantStates);
        }
        if self.min_states > self.max_states {
            return Err(ConfigError::InvertedRange {
                min: self.min_states,
                max: self.max_states,
            });
        }
        Ok(())
    }

    /// Candidate topologies, `min_states..=max_states`.
    pub fn state_range(&self) -> std::ops::RangeInclusive<usize> {
        self.min_states..=self.max_states
    }
}

// ---------------------------------------------------------------------------
// Gaussian HMM training settings
// ---------------------------------------------------------------------------

/// Baum–Welch settings for [`crate::model::GaussianHmmTrainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianHmmConfig {
    /// Maximum EM iterations.
    pub n_iter: usize,
    /// Stop once the log-likelihood gain falls below this.
    pub tol: f64,
    /// Floor added to every variance.
    pub min_covar: f64,
}

impl Default for GaussianHmmConfig {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            tol: 1e-2,
            min_covar: 1e-3,
        }
    }
}

impl GaussianHmmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_iter == 0 {
            return Err(ConfigError::NonPositive("n_iter"));
        }
        if !(self.tol > 0.0) {
            return Err(ConfigError::NonPositive("tol"));
        }
        if !(self.min_covar > 0.0) {
            return Err(ConfigError::NonPositive("min_covar"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-level configuration
// ---------------------------------------------------------------------------

/// Everything the driver needs; every field may be omitted from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub selector: SelectorConfig,
    pub hmm: GaussianHmmConfig,
}

impl RecognizerConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: RecognizerConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector.validate()?;
        self.hmm.validate()
    }
}
