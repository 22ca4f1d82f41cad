//! Archive Password Recovery
//!
//! A parallel, resumable brute-force engine for recovering the password of an
//! encrypted archive. Candidates are enumerated through an indexed bijection
//! (optionally constrained by a wildcard template), partitioned across worker
//! threads, and checked by an external archive tester; a persistent Bloom
//! filter skips candidates already rejected by earlier runs.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod monitor;
pub mod pattern;
pub mod status;
pub mod verifier;
pub mod worker;

pub use config::{RecoveryConfig, SearchMode};
pub use engine::{RecoveryEngine, RecoveryOutcome};
pub use error::*;
pub use filter::{fnv1a64, SkipFilter};
pub use indexer::CandidateIndexer;
pub use pattern::{Pattern, PatternInfo, Segment};
pub use status::{MemorySink, StatusSink, StdoutSink};
pub use verifier::{SevenZipVerifier, Verifier};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{RecoveryConfig, SearchMode};
    pub use crate::engine::{RecoveryEngine, RecoveryOutcome};
    pub use crate::error::*;
    pub use crate::filter::SkipFilter;
    pub use crate::indexer::CandidateIndexer;
    pub use crate::pattern::Pattern;
    pub use crate::status::{StatusSink, StdoutSink};
    pub use crate::verifier::{SevenZipVerifier, Verifier};
    pub use anyhow::{Context, Result};
}


/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
