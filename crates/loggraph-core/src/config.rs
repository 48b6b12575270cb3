//! # Conversion Configuration
//!
//! One immutable value passed to every stage's entry point. The binary fills
//! it from `loggraph.toml` and command-line flags.

use crate::LoggraphError;
use crate::primitives::DEFAULT_MAX_GRAPH_NODES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the model should predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Classify the severity of the excised statement.
    #[default]
    Severity,
    /// Generate the message of the excised statement.
    Statement,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Severity => f.write_str("severity"),
            Self::Statement => f.write_str("statement"),
        }
    }
}

impl FromStr for Mode {
    type Err = LoggraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "severity" => Ok(Self::Severity),
            "statement" => Ok(Self::Statement),
            other => Err(LoggraphError::InvalidConfig(format!(
                "unknown mode '{}' (expected severity or statement)",
                other
            ))),
        }
    }
}

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub mode: Mode,
    /// Fraction of the corpus placed before the test cut.
    pub train_fraction: f64,
    /// Fraction used for the validation cut (see [`crate::partition::cut_points`]).
    pub validation_fraction: f64,
    /// Keep only the first `limit` occurrences.
    pub limit: Option<usize>,
    /// Worker threads; 0 means one per logical core.
    pub workers: usize,
    /// Gzip the output files and remove the plain ones.
    pub compress: bool,
    /// Keep at most one occurrence per source file group.
    pub disallow_same_class: bool,
    /// Graphs with more nodes are rejected per item.
    pub max_graph_nodes: usize,
    /// Seed for the partition shuffle; random when absent.
    pub seed: Option<u64>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Severity,
            train_fraction: 0.8,
            validation_fraction: 0.2,
            limit: None,
            workers: 0,
            compress: false,
            disallow_same_class: false,
            max_graph_nodes: DEFAULT_MAX_GRAPH_NODES,
            seed: None,
        }
    }
}

impl ConvertConfig {
    /// Reject fractions outside `[0, 1]` and a zero node limit.
    pub fn validate(&self) -> Result<(), LoggraphError> {
        check_fraction("train_fraction", self.train_fraction)?;
        check_fraction("validation_fraction", self.validation_fraction)?;
        if self.max_graph_nodes == 0 {
            return Err(LoggraphError::InvalidConfig(
                "max_graph_nodes must be positive".to_string(),
            ));
        }
        if self.limit == Some(0) {
            return Err(LoggraphError::InvalidConfig(
                "limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Worker count with `0` resolved to the number of logical cores.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), LoggraphError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LoggraphError::InvalidFraction { name, value })
    }
}
