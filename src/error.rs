//! Error types for the archive password recovery engine

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Skip filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Charset must not be empty")]
    EmptyCharset,

    #[error("Charset character '{0}' is not a single byte")]
    MultiByteCharsetChar(char),

    #[error("Charset character '{0}' appears more than once")]
    DuplicateCharsetChar(char),

    #[error("Invalid length bounds: min {min}, max {max}. Require 1 <= min <= max")]
    InvalidLengthBounds { min: u32, max: u32 },

    #[error("Unknown search mode: '{0}'. Use 'ascending', 'descending', or 'random'")]
    UnknownMode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while probing the host environment
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Archive tester executable '{name}' not found (searched: {searched})")]
    VerifierNotFound { name: String, searched: String },

    #[error("Archive tester path is not an executable file: {0}")]
    VerifierNotAFile(PathBuf),
}

/// Skip filter construction and persistence errors
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter is in the invalid state")]
    Invalid,

    #[error("Bad magic number {0:#010x} in filter file")]
    BadMagic(u32),

    #[error("Unsupported filter file version {0}")]
    UnsupportedVersion(u16),

    #[error("Invalid filter parameters: {bits} bits, {hashes} hashes")]
    InvalidParameters { bits: u64, hashes: u32 },

    #[error("Trailing data after the bit payload")]
    TrailingData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Candidate indexing errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    #[error("combination count overflows the 64-bit range")]
    Overflow,

    #[error("index is outside the candidate space")]
    OutOfRange,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Convert anyhow::Error to RecoveryError
impl From<anyhow::Error> for RecoveryError {
    fn from(err: anyhow::Error) -> Self {
        RecoveryError::Internal(err.to_string())
    }
}
