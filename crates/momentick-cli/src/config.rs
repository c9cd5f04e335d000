//! Application config file.
//!
//! Loaded from `--config` when given, else from the first of
//! [`CONFIG_PATHS`] that exists, else built-in defaults. Command-line flags
//! override file values.

use std::fs;
use std::path::{Path, PathBuf};

use momentick_core::{default_indices, ConfigError, EngineConfig, IndexSpec};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const CONFIG_PATHS: [&str; 2] = ["momentick.json", "config/momentick.json"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Workbook with one sheet per index.
    #[serde(default)]
    pub workbook: Option<PathBuf>,
    /// Index table in display order.
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    String::from("info")
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            workbook: None,
            indices: default_indices(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads the effective config and the file it came from, if any.
    ///
    /// An explicit path must exist; search-path files are optional.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        for candidate in CONFIG_PATHS {
            let path = Path::new(candidate);
            if path.exists() {
                return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(workbook) = &cli.universe {
            self.universe.workbook = Some(workbook.clone());
        }
        if let Some(concurrency) = cli.concurrency {
            self.engine.max_concurrency = concurrency;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.engine.fetch_timeout_ms = timeout_ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.universe.indices.is_empty() {
            return Err(ConfigError::Invalid {
                field: "universe.indices",
                reason: String::from("at least one index is required"),
            });
        }
        Ok(())
    }
}
