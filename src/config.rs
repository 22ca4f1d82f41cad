//! Configuration types and parsing for the recovery engine

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Search ordering over the candidate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Shortest lengths first
    Ascending,
    /// Longest lengths first
    Descending,
    /// Shuffled global indices
    Random,
}

impl FromStr for SearchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" => Ok(SearchMode::Ascending),
            "descending" => Ok(SearchMode::Descending),
            "random" => Ok(SearchMode::Random),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Ascending => "ascending",
            SearchMode::Descending => "descending",
            SearchMode::Random => "random",
        };
        f.write_str(name)
    }
}

/// Main configuration structure for a recovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Ordered alphabet the candidates are drawn from
    pub charset: String,

    /// Shortest candidate length to try
    pub min_length: u32,

    /// Longest candidate length to try
    pub max_length: u32,

    /// Path to the encrypted archive under test
    pub archive: PathBuf,

    /// Ordering of the search
    pub mode: SearchMode,

    /// Optional wildcard template constraining the candidates
    #[serde(default)]
    pub pattern: String,

    /// Skip filter file; `None` disables the filter subsystem
    #[serde(default)]
    pub skip_file: Option<PathBuf>,

    /// Seconds between periodic filter checkpoints (0 disables them)
    #[serde(default)]
    pub checkpoint_interval_secs: u64,

    /// Number of worker threads
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Draw a progress bar on stderr
    #[serde(default)]
    pub show_progress: bool,
}

fn default_threads() -> usize {
    num_cpus::get().max(1)
}

impl RecoveryConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RecoveryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.charset.is_empty() {
            return Err(ConfigError::EmptyCharset);
        }

        let mut seen = [false; 256];
        for ch in self.charset.chars() {
            if !ch.is_ascii() {
                return Err(ConfigError::MultiByteCharsetChar(ch));
            }
            let byte = ch as usize;
            if seen[byte] {
                return Err(ConfigError::DuplicateCharsetChar(ch));
            }
            seen[byte] = true;
        }

        if self.min_length == 0 || self.min_length > self.max_length {
            return Err(ConfigError::InvalidLengthBounds {
                min: self.min_length,
                max: self.max_length,
            });
        }

        Ok(())
    }

    /// Alphabet as an ordered character sequence
    pub fn alphabet(&self) -> Vec<char> {
        self.charset.chars().collect()
    }
}
