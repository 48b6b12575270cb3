//! # Settings
//!
//! Optional `loggraph.toml` file. Values set on the command line override
//! values from the file.
//!
//! ```toml
//! corpus = "/data/corpus/extracted"
//!
//! [convert]
//! mode = "statement"
//! workers = 8
//! compress = true
//! seed = 42
//! ```

use loggraph_core::{ConvertConfig, LoggraphError, Mode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "loggraph.toml";

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default corpus root for `convert`.
    pub corpus: Option<PathBuf>,
    pub convert: ConvertConfig,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, LoggraphError> {
        toml::from_str(text)
            .map_err(|e| LoggraphError::InvalidConfig(format!("Invalid config file: {}", e)))
    }

    /// Load `explicit`, or `loggraph.toml` from the working directory when it
    /// exists, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LoggraphError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            LoggraphError::InvalidConfig(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LoggraphError::InvalidConfig(format!(
                "Config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            LoggraphError::InvalidConfig(format!("Cannot read config '{}': {}", path.display(), e))
        })?;

        tracing::debug!(config = %path.display(), "loaded settings");
        Self::from_toml(&text)
    }
}

/// Conversion values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConvertOverrides {
    pub train_fraction: Option<f64>,
    pub validation_fraction: Option<f64>,
    pub mode: Option<Mode>,
    pub limit: Option<usize>,
    pub workers: Option<usize>,
    pub compress: bool,
    pub disallow_same_class: bool,
    pub max_graph_nodes: Option<usize>,
    pub seed: Option<u64>,
}

impl ConvertOverrides {
    /// Layer these values over `base`. Switches can only turn a setting on.
    #[must_use]
    pub fn apply(&self, base: &ConvertConfig) -> ConvertConfig {
        let mut config = base.clone();
        if let Some(fraction) = self.train_fraction {
            config.train_fraction = fraction;
        }
        if let Some(fraction) = self.validation_fraction {
            config.validation_fraction = fraction;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.compress |= self.compress;
        config.disallow_same_class |= self.disallow_same_class;
        if let Some(nodes) = self.max_graph_nodes {
            config.max_graph_nodes = nodes;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}
