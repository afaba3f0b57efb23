//! Configuration loading and parsing.
//!
//! Parses `matx.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [history]
//! strategy = "delta"        # or "snapshot"
//! capacity = 64             # entries per stack
//! coalesce_threshold = 5    # snapshot strategy: changes per checkpoint
//! suppress_echo = true      # swallow the UI's echo of a programmatic apply
//!
//! [search]
//! case_sensitive = false
//! whole_word = false
//! ```
//!
//! Unknown fields are ignored so older binaries tolerate newer files. A file
//! that fails to parse falls back to defaults with a warning; a missing file is
//! not an error.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, io, path::PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_HISTORY_CAPACITY: usize = 64;
pub const DEFAULT_COALESCE_THRESHOLD: usize = 5;
/// Upper bound for `history.capacity`; larger values are clamped.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Which undo representation a session records.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Positional insert/delete deltas.
    #[default]
    Delta,
    /// Coalesced full-text checkpoints.
    Snapshot,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default = "HistoryConfig::default_capacity")]
    pub capacity: usize,
    #[serde(default = "HistoryConfig::default_coalesce_threshold")]
    pub coalesce_threshold: usize,
    #[serde(default = "HistoryConfig::default_suppress_echo")]
    pub suppress_echo: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            capacity: Self::default_capacity(),
            coalesce_threshold: Self::default_coalesce_threshold(),
            suppress_echo: Self::default_suppress_echo(),
        }
    }
}

impl HistoryConfig {
    const fn default_capacity() -> usize {
        DEFAULT_HISTORY_CAPACITY
    }
    const fn default_coalesce_threshold() -> usize {
        DEFAULT_COALESCE_THRESHOLD
    }
    const fn default_suppress_echo() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub whole_word: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,    // original file string (optional)
    pub file: ConfigFile,       // parsed (or default) data
    pub source: Option<PathBuf>, // path the data came from, if any
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("matx.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("matx").join("matx.toml");
    }
    PathBuf::from("matx.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target: "config", path = %path.display(), "config_not_found_using_defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), strategy = ?file.history.strategy, "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
                source: Some(path),
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_error_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// History settings with zero capacities/thresholds raised to 1 and the
    /// capacity capped at `MAX_HISTORY_CAPACITY`.
    pub fn effective_history(&self) -> HistoryConfig {
        let raw = &self.file.history;
        let capacity = raw.capacity.clamp(1, MAX_HISTORY_CAPACITY);
        let coalesce_threshold = raw.coalesce_threshold.max(1);
        if capacity != raw.capacity || coalesce_threshold != raw.coalesce_threshold {
            info!(
                target: "config",
                raw_capacity = raw.capacity,
                capacity,
                raw_threshold = raw.coalesce_threshold,
                coalesce_threshold,
                "history_limits_clamped"
            );
        }
        HistoryConfig {
            strategy: raw.strategy,
            capacity,
            coalesce_threshold,
            suppress_echo: raw.suppress_echo,
        }
    }

    pub fn search(&self) -> SearchConfig {
        self.file.search
    }
}
