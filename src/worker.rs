//! Shared run state and the generic worker loop
//!
//! The four worker roles (sequential, pattern-by-length, shuffled plain,
//! shuffled pattern) differ only in how an index becomes a candidate, so one
//! loop takes that mapping as a closure. Every iteration re-checks the found
//! and stop flags; the stop-flag file is polled once per 1000 iterations.

use crate::error::IndexError;
use crate::filter::SkipFilter;
use crate::monitor::ProgressTracker;
use crate::status::StatusSink;
use crate::verifier::Verifier;
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// How many loop iterations pass between stop-flag file polls
pub const STOP_POLL_INTERVAL: u64 = 1000;

/// Cross-thread state for one recovery run
pub struct RunState {
    found: AtomicBool,
    stop_requested: AtomicBool,
    found_password: Mutex<String>,
}

impl RunState {
    pub fn new() -> Self {
        RunState {
            found: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            found_password: Mutex::new(String::new()),
        }
    }

    pub fn found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// First caller wins: flips `found` and records the password. Losers get
    /// `false` and must not touch the string.
    pub fn announce_found(&self, candidate: &str) -> bool {
        if self
            .found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Ok(mut password) = self.found_password.lock() {
                *password = candidate.to_string();
            }
            true
        } else {
            false
        }
    }

    pub fn password(&self) -> String {
        self.found_password
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a worker borrows from the orchestrator
#[derive(Clone, Copy)]
pub struct WorkerCtx<'a> {
    pub run: &'a RunState,
    pub filter: Option<&'a SkipFilter>,
    pub verifier: &'a dyn Verifier,
    pub archive: &'a Path,
    pub stop_flag: Option<&'a Path>,
    pub sink: &'a dyn StatusSink,
    pub progress: &'a ProgressTracker,
}

impl<'a> WorkerCtx<'a> {
    fn stop_flag_present(&self) -> bool {
        self.stop_flag.is_some_and(|path| path.exists())
    }
}

/// Drive one half-open index range through the verifier.
///
/// `candidate_at` maps an index to its candidate; an `Err` skips that index
/// with a warning. Misses are inserted into the filter, filter hits skip the
/// verifier entirely, and the first verified hit announces itself and ends
/// the worker.
pub fn run_range<F>(ctx: WorkerCtx<'_>, range: Range<u64>, mut candidate_at: F)
where
    F: FnMut(u64) -> Result<String, IndexError>,
{
    let mut iterations: u64 = 0;
    for index in range {
        if ctx.run.found() || ctx.run.stop_requested() {
            break;
        }
        if iterations % STOP_POLL_INTERVAL == 0 && ctx.stop_flag_present() {
            ctx.sink.info("Stop flag detected by worker.");
            ctx.run.request_stop();
            break;
        }
        iterations += 1;

        let candidate = match candidate_at(index) {
            Ok(candidate) => candidate,
            Err(err) => {
                ctx.sink
                    .warn(&format!("Candidate generation failed at index {index}: {err}"));
                continue;
            }
        };

        if let Some(filter) = ctx.filter {
            if filter.contains(candidate.as_bytes()) {
                ctx.progress.record_skip();
                continue;
            }
        }

        ctx.progress.record_attempt();
        if ctx.verifier.verify(&candidate, ctx.archive) {
            ctx.run.announce_found(&candidate);
            return;
        } else if let Some(filter) = ctx.filter {
            filter.insert(candidate.as_bytes());
        }
    }
}
