//! Orchestration of a recovery run
//!
//! The engine owns the plan: it validates the configuration, bootstraps the
//! skip filter, picks the ordering, carves each stage's index range into one
//! chunk per worker thread, and joins the workers between length stages so a
//! stage is always complete before the next begins. Checkpoints and the final
//! filter save happen only here.

use crate::config::{RecoveryConfig, SearchMode};
use crate::error::{IndexError, Result};
use crate::filter::{SkipFilter, MAX_FILTER_BITS};
use crate::indexer::CandidateIndexer;
use crate::monitor::{format_count, format_duration, ProgressTracker};
use crate::pattern::Pattern;
use crate::status::StatusSink;
use crate::verifier::Verifier;
use crate::worker::{run_range, RunState, WorkerCtx};
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Target false-positive rate for freshly created skip filters
pub const DEFAULT_FP_RATE: f64 = 0.01;

/// Cap on the shuffled index vector, in bytes
pub const MAX_INDEX_VEC_BYTES: u64 = 4 * 1024 * 1024 * 1024;

const MAX_INDEX_VEC_ELEMS: u64 = MAX_INDEX_VEC_BYTES / 8;

/// Final disposition of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The verifier accepted this candidate
    Found(String),
    /// The search space was exhausted
    NotFound,
    /// A cooperative stop ended the run early
    Stopped,
}

/// Drives a full recovery run over injected collaborators
pub struct RecoveryEngine {
    config: RecoveryConfig,
    verifier: Arc<dyn Verifier>,
    sink: Arc<dyn StatusSink>,
}

impl RecoveryEngine {
    pub fn new(
        config: RecoveryConfig,
        verifier: Arc<dyn Verifier>,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(RecoveryEngine {
            config,
            verifier,
            sink,
        })
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Run the search to completion, a found password, or a stop request
    pub fn run(&self) -> Result<RecoveryOutcome> {
        let started = Instant::now();
        let indexer = CandidateIndexer::new(&self.config.charset);
        let threads = self.config.threads.max(1);
        self.sink.info(&format!("Using {threads} worker threads."));

        let (filter, filter_path) = self.prepare_filter(&indexer);
        let stop_flag = filter_path.as_deref().map(stop_flag_path);

        let progress = ProgressTracker::new(
            self.planned_candidates(&indexer),
            self.config.show_progress,
        );
        let run = RunState::new();

        let mut session = Session {
            engine: self,
            indexer: &indexer,
            run: &run,
            filter: filter.as_ref(),
            filter_path: filter_path.as_deref(),
            stop_flag: stop_flag.as_deref(),
            progress: &progress,
            threads,
            last_checkpoint: Instant::now(),
            panicked: false,
        };

        if self.config.pattern.is_empty() {
            session.run_plain();
        } else {
            let pattern = Pattern::parse(&self.config.pattern);
            if pattern.is_empty() {
                session.run_plain();
            } else {
                session.run_pattern(&pattern);
            }
        }

        progress.finish();
        Ok(session.finalize(started))
    }

    /// Load or create the skip filter; `None` disables the subsystem
    fn prepare_filter(&self, indexer: &CandidateIndexer) -> (Option<SkipFilter>, Option<PathBuf>) {
        let Some(path) = &self.config.skip_file else {
            self.sink.info("Skip filter not requested.");
            return (None, None);
        };

        self.sink
            .info(&format!("Skip filter enabled. File: {}", path.display()));
        if self.config.checkpoint_interval_secs > 0 {
            self.sink.info(&format!(
                "Checkpoint interval: {} seconds.",
                self.config.checkpoint_interval_secs
            ));
        } else {
            self.sink
                .info("Periodic checkpointing disabled (final save only).");
        }

        if path.exists() {
            match SkipFilter::load(path) {
                Ok(filter) => {
                    self.sink.info(&format!(
                        "Loaded existing skip filter state. Bits: {}, hashes: {}.",
                        filter.num_bits(),
                        filter.num_hashes()
                    ));
                    return (Some(filter), Some(path.clone()));
                }
                Err(err) => {
                    self.sink.warn(&format!(
                        "Existing skip filter file was invalid ({err}). Creating a new one."
                    ));
                }
            }
        } else {
            self.sink
                .info("No existing skip filter found. Creating a new one.");
        }

        let estimated = match indexer.total_in_range(self.config.min_length, self.config.max_length)
        {
            Ok(0) => {
                self.sink
                    .warn("Candidate estimate is zero. Disabling the skip filter for this run.");
                return (None, None);
            }
            Ok(estimated) => estimated,
            Err(_) => {
                self.sink.error(
                    "Overflow estimating the candidate count. Disabling the skip filter for this run.",
                );
                return (None, None);
            }
        };

        let required_bits = SkipFilter::required_bits(estimated, DEFAULT_FP_RATE);
        if required_bits > MAX_FILTER_BITS {
            let required_mib = required_bits / 8 / (1024 * 1024);
            let cap_mib = MAX_FILTER_BITS / 8 / (1024 * 1024);
            self.sink.error(&format!(
                "Required skip filter size ({required_mib} MiB for {required_bits} bits) \
                 exceeds the {cap_mib} MiB cap. Disabling the skip filter."
            ));
            return (None, None);
        }

        let required_mib = required_bits.div_ceil(8) / (1024 * 1024);
        self.sink.info(&format!(
            "Initializing new skip filter for about {} items at false-positive rate {} (about {required_mib} MiB).",
            format_count(estimated),
            DEFAULT_FP_RATE
        ));
        let filter = SkipFilter::with_params(estimated, DEFAULT_FP_RATE);
        self.sink.info(&format!(
            "New filter created. Bits: {}, hashes: {}.",
            filter.num_bits(),
            filter.num_hashes()
        ));
        (Some(filter), Some(path.clone()))
    }

    /// Best-effort candidate count for progress reporting; 0 when unknown
    fn planned_candidates(&self, indexer: &CandidateIndexer) -> u64 {
        if self.config.pattern.is_empty() {
            return indexer
                .total_in_range(self.config.min_length, self.config.max_length)
                .unwrap_or(0);
        }
        let pattern = Pattern::parse(&self.config.pattern);
        let sigma = indexer.alphabet_size();
        let mut total: u64 = 0;
        for length in self.config.min_length..=self.config.max_length.max(pattern.info().fixed_len)
        {
            match pattern.combinations(sigma, length) {
                Some(count) => total = total.saturating_add(count),
                None => return 0,
            }
        }
        total
    }
}

/// Mutable per-run orchestration state
struct Session<'a> {
    engine: &'a RecoveryEngine,
    indexer: &'a CandidateIndexer,
    run: &'a RunState,
    filter: Option<&'a SkipFilter>,
    filter_path: Option<&'a Path>,
    stop_flag: Option<&'a Path>,
    progress: &'a ProgressTracker,
    threads: usize,
    last_checkpoint: Instant,
    panicked: bool,
}

enum RandomPlan {
    Done,
    FallBackToAscending,
}

impl<'a> Session<'a> {
    fn sink(&self) -> &dyn StatusSink {
        self.engine.sink.as_ref()
    }

    fn worker_ctx(&self) -> WorkerCtx<'a> {
        WorkerCtx {
            run: self.run,
            filter: self.filter,
            verifier: self.engine.verifier.as_ref(),
            archive: &self.engine.config.archive,
            stop_flag: self.stop_flag,
            sink: self.engine.sink.as_ref(),
            progress: self.progress,
        }
    }

    /// Poll the stop-flag file, latch the atomic, and report the latched state
    fn check_stop(&self) -> bool {
        if let Some(flag) = self.stop_flag {
            if flag.exists() {
                if !self.run.stop_requested() {
                    self.sink().info("Stop flag file detected.");
                }
                self.run.request_stop();
            }
        }
        self.run.stop_requested()
    }

    /// Partition `[0, total)` across the worker threads and join them all
    fn run_stage<F>(&mut self, total: u64, candidate_at: F)
    where
        F: Fn(u64) -> std::result::Result<String, IndexError> + Sync,
    {
        if total == 0 {
            return;
        }
        let chunk = total.div_ceil(self.threads as u64).max(1);
        let ctx = self.worker_ctx();

        let panicked = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.threads);
            let mut start = 0u64;
            while start < total {
                if self.check_stop() {
                    break;
                }
                let end = (start + chunk).min(total);
                let mapper = &candidate_at;
                handles.push(scope.spawn(move || run_range(ctx, start..end, |i| mapper(i))));
                start = end;
            }
            let mut any_panic = false;
            for handle in handles {
                if handle.join().is_err() {
                    any_panic = true;
                }
            }
            any_panic
        });

        if panicked {
            self.panicked = true;
        }
    }

    /// Persist the filter when the configured interval has elapsed
    fn maybe_checkpoint(&mut self) {
        let interval = self.engine.config.checkpoint_interval_secs;
        if interval == 0 || self.run.stop_requested() {
            return;
        }
        let (Some(filter), Some(path)) = (self.filter, self.filter_path) else {
            return;
        };
        if !filter.is_valid() || self.last_checkpoint.elapsed().as_secs() < interval {
            return;
        }

        self.sink()
            .info("Checkpoint interval reached. Saving skip filter state...");
        match filter.save(path) {
            Ok(()) => self.sink().info(&format!(
                "Skip filter checkpoint saved to: {}",
                path.display()
            )),
            Err(err) => self
                .sink()
                .error(&format!("Failed to save skip filter checkpoint: {err}")),
        }
        self.last_checkpoint = Instant::now();
    }

    fn stage_lengths(&self, min: u32, max: u32, mode: SearchMode) -> Vec<u32> {
        let range = min..=max;
        match mode {
            SearchMode::Descending => range.rev().collect(),
            _ => range.collect(),
        }
    }

    fn run_plain(&mut self) {
        let config = &self.engine.config;
        match config.mode {
            SearchMode::Ascending | SearchMode::Descending => {
                for length in
                    self.stage_lengths(config.min_length, config.max_length, config.mode)
                {
                    if self.run.found() || self.check_stop() || self.panicked {
                        break;
                    }
                    let total = match self.indexer.combinations(length) {
                        Ok(total) => total,
                        Err(_) => {
                            self.sink().warn(&format!(
                                "Combination count overflow for length {length}. Skipping."
                            ));
                            continue;
                        }
                    };
                    if total == 0 {
                        continue;
                    }
                    self.sink().info(&format!(
                        "Testing passwords of length {length} (combinations: {}).",
                        format_count(total)
                    ));
                    let indexer = self.indexer;
                    self.run_stage(total, move |i| {
                        Ok(indexer.candidate_within_length(i, length))
                    });
                    self.sink()
                        .info(&format!("Worker threads joined for length {length}."));
                    self.maybe_checkpoint();
                }
            }
            SearchMode::Random => self.run_plain_random(),
        }
    }

    fn run_plain_random(&mut self) {
        let config = &self.engine.config;
        self.sink()
            .info("Calculating total combinations for random mode...");

        let prefix = match self.indexer.prefix_count(config.min_length) {
            Ok(prefix) => prefix,
            Err(_) => {
                self.sink()
                    .error("Overflow computing the prefix candidate count. Random plan refused.");
                return;
            }
        };
        let total = match self
            .indexer
            .total_in_range(config.min_length, config.max_length)
        {
            Ok(total) => total,
            Err(_) => {
                self.sink()
                    .error("Overflow computing the total candidate count. Random plan refused.");
                return;
            }
        };
        if total == 0 {
            self.sink()
                .warn("Target length range holds no candidates.");
            return;
        }
        self.sink().info(&format!(
            "Total passwords to test (lengths {} to {}): {}",
            config.min_length,
            config.max_length,
            format_count(total)
        ));

        if total > MAX_INDEX_VEC_ELEMS || usize::try_from(total).is_err() {
            let needed_mib = total.saturating_mul(8) / (1024 * 1024);
            let cap_mib = MAX_INDEX_VEC_BYTES / (1024 * 1024);
            self.sink().error(&format!(
                "Index space needs {needed_mib} MiB, beyond the {cap_mib} MiB cap. Random plan refused."
            ));
            return;
        }
        if self.check_stop() {
            return;
        }

        self.sink().info(&format!(
            "Generating and shuffling {} target indices...",
            format_count(total)
        ));
        let mut indices: Vec<u64> = (0..total).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(shuffle_seed()));
        self.sink().info("Index vector generated and shuffled.");
        if self.check_stop() {
            return;
        }

        let indexer = self.indexer;
        let max_length = config.max_length;
        let shuffled = &indices;
        self.run_stage(total, move |vec_idx| {
            let global = shuffled[vec_idx as usize]
                .checked_add(prefix)
                .ok_or(IndexError::Overflow)?;
            indexer.candidate_at(global, max_length)
        });
        self.sink().info("Shuffled index worker threads joined.");
        self.maybe_checkpoint();
    }

    fn run_pattern(&mut self, pattern: &Pattern) {
        self.sink().info("Pattern matching mode enabled.");
        let info = pattern.info();
        let config = &self.engine.config;

        let mut min = config.min_length;
        let mut max = config.max_length;
        if min < info.fixed_len {
            self.sink().info(&format!(
                "Adjusted minimum length from {min} to pattern minimum {}.",
                info.fixed_len
            ));
            min = info.fixed_len;
        }
        if info.stars == 0 {
            if min != info.fixed_len || max != info.fixed_len {
                self.sink().info(&format!(
                    "Pattern has fixed length {}; testing that length only.",
                    info.fixed_len
                ));
            }
            min = info.fixed_len;
            max = info.fixed_len;
        }
        if max < min {
            self.sink()
                .info(&format!("Corrected maximum length to {min}."));
            max = min;
        }

        let mut mode = config.mode;
        if mode == SearchMode::Random {
            if info.stars > 1 {
                self.sink().warn(
                    "Random order does not support templates with multiple '*' wildcards. \
                     Falling back to ascending order.",
                );
                mode = SearchMode::Ascending;
            } else {
                match self.run_pattern_random(pattern, min, max) {
                    RandomPlan::Done => return,
                    RandomPlan::FallBackToAscending => mode = SearchMode::Ascending,
                }
            }
        }

        let sigma = self.indexer.alphabet_size();
        for length in self.stage_lengths(min, max, mode) {
            if self.run.found() || self.check_stop() || self.panicked {
                break;
            }
            let Some(total) = pattern.combinations(sigma, length) else {
                self.sink().warn(&format!(
                    "Cannot count pattern combinations for length {length}. Skipping."
                ));
                continue;
            };
            if total == 0 {
                continue;
            }
            self.sink().info(&format!(
                "Testing pattern passwords of length {length} (combinations: {}).",
                format_count(total)
            ));
            let indexer = self.indexer;
            self.run_stage(total, move |j| {
                indexer.pattern_candidate_at(j, pattern, length)
            });
            self.sink().info(&format!(
                "Pattern worker threads joined for length {length}."
            ));
            self.maybe_checkpoint();
        }
    }

    fn run_pattern_random(&mut self, pattern: &Pattern, min: u32, max: u32) -> RandomPlan {
        self.sink()
            .info("Calculating total combinations for random pattern mode...");
        let sigma = self.indexer.alphabet_size();

        let mut counts = BTreeMap::new();
        let mut total: u64 = 0;
        for length in min..=max {
            if self.check_stop() {
                return RandomPlan::Done;
            }
            let Some(count) = pattern.combinations(sigma, length) else {
                self.sink().error(&format!(
                    "Pattern combination count overflowed for length {length}. \
                     Falling back to ascending order."
                ));
                return RandomPlan::FallBackToAscending;
            };
            if count == 0 {
                continue;
            }
            let Some(new_total) = total.checked_add(count) else {
                self.sink().error(
                    "Total pattern combination count overflowed. Falling back to ascending order.",
                );
                return RandomPlan::FallBackToAscending;
            };
            counts.insert(length, count);
            total = new_total;
        }

        if total == 0 {
            self.sink()
                .info("Pattern generates no candidates in the requested length range.");
            return RandomPlan::Done;
        }
        self.sink().info(&format!(
            "Total pattern combinations in range: {}",
            format_count(total)
        ));

        if total > MAX_INDEX_VEC_ELEMS || usize::try_from(total).is_err() {
            let needed_mib = total.saturating_mul(8) / (1024 * 1024);
            self.sink().error(&format!(
                "Pattern space too large for random mode ({needed_mib} MiB of indices needed). \
                 Falling back to ascending order."
            ));
            return RandomPlan::FallBackToAscending;
        }
        if self.check_stop() {
            return RandomPlan::Done;
        }

        self.sink().info(&format!(
            "Generating and shuffling {} pattern indices...",
            format_count(total)
        ));
        let mut indices: Vec<u64> = (0..total).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(shuffle_seed()));
        self.sink().info("Pattern indices shuffled.");
        if self.check_stop() {
            return RandomPlan::Done;
        }

        let indexer = self.indexer;
        let counts = &counts;
        let shuffled = &indices;
        self.run_stage(total, move |vec_idx| {
            indexer.pattern_candidate_global(shuffled[vec_idx as usize], pattern, counts)
        });
        self.sink().info("Shuffled pattern worker threads joined.");
        self.maybe_checkpoint();
        RandomPlan::Done
    }

    /// Final save policy, the `FOUND:` marker, and the closing status lines
    fn finalize(&mut self, started: Instant) -> RecoveryOutcome {
        let found = self.run.found();
        let stopped = self.run.stop_requested();
        let password = found.then(|| self.run.password());

        if let Some(password) = &password {
            self.sink().found(password);
        }

        self.sink().info(&format!(
            "Search processing finished in {}.",
            format_duration(started.elapsed())
        ));
        self.sink().info(&format!(
            "Verifier attempts: {}, filter skips: {} ({:.0} attempts/sec).",
            format_count(self.progress.attempted()),
            format_count(self.progress.skipped()),
            self.progress.rate()
        ));

        if self.panicked && !found {
            self.sink()
                .fatal("A worker thread panicked; aborting the run.");
            self.save_filter_now("Attempting final save of skip filter state after error...");
            return RecoveryOutcome::NotFound;
        }

        // An exhaustive negative run leaves nothing worth persisting: every
        // candidate in range is already recorded or the range is complete.
        if found || stopped {
            self.save_filter_now("Performing final save of skip filter state...");
        } else if self.filter.is_some() {
            self.sink().info(
                "Final skip filter save skipped (search finished normally without a match or stop).",
            );
        }

        if let Some(password) = password {
            self.sink().info("Password found.");
            RecoveryOutcome::Found(password)
        } else if stopped {
            self.sink().info("Process stopped by request.");
            RecoveryOutcome::Stopped
        } else {
            self.sink()
                .info("Exhausted search space without finding the password.");
            RecoveryOutcome::NotFound
        }
    }

    fn save_filter_now(&self, announce: &str) {
        let (Some(filter), Some(path)) = (self.filter, self.filter_path) else {
            return;
        };
        if !filter.is_valid() {
            self.sink()
                .info("Final skip filter save skipped (filter became invalid during the run).");
            return;
        }
        self.sink().info(announce);
        match filter.save(path) {
            Ok(()) => self.sink().info(&format!(
                "Skip filter state saved to: {}",
                path.display()
            )),
            Err(err) => self
                .sink()
                .error(&format!("Failed to save skip filter state: {err}")),
        }
    }
}

/// Stop requests arrive as a file next to the filter file
pub fn stop_flag_path(filter_path: &Path) -> PathBuf {
    let mut name = filter_path.as_os_str().to_os_string();
    name.push(".stop");
    PathBuf::from(name)
}

/// 64-bit shuffle seed: two entropy draws, or the clock when entropy fails.
/// The shuffle is not required to be reproducible across runs.
fn shuffle_seed() -> u64 {
    let mut high = [0u8; 4];
    let mut low = [0u8; 4];
    if OsRng.try_fill_bytes(&mut high).is_ok() && OsRng.try_fill_bytes(&mut low).is_ok() {
        (u64::from(u32::from_le_bytes(high)) << 32) | u64::from(u32::from_le_bytes(low))
    } else {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0x9e37_79b9_7f4a_7c15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemorySink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingVerifier {
        hit: Option<String>,
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl RecordingVerifier {
        fn misses() -> Self {
            RecordingVerifier {
                hit: None,
                seen: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Verifier for RecordingVerifier {
        fn verify(&self, candidate: &str, _archive: &Path) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(candidate.to_string());
            }
            self.hit.as_deref() == Some(candidate)
        }
    }

    fn config(charset: &str, min: u32, max: u32, mode: SearchMode) -> RecoveryConfig {
        RecoveryConfig {
            charset: charset.to_string(),
            min_length: min,
            max_length: max,
            archive: PathBuf::from("archive.7z"),
            mode,
            pattern: String::new(),
            skip_file: None,
            checkpoint_interval_secs: 0,
            threads: 1,
            show_progress: false,
        }
    }

    #[test]
    fn test_stop_flag_path_appends_suffix() {
        assert_eq!(
            stop_flag_path(Path::new("/tmp/tried.blf")),
            PathBuf::from("/tmp/tried.blf.stop")
        );
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let verifier = Arc::new(RecordingVerifier::misses());
        let sink = Arc::new(MemorySink::new());
        let cfg = config("ab", 2, 1, SearchMode::Ascending);
        assert!(RecoveryEngine::new(cfg, verifier, sink).is_err());
    }

    #[test]
    fn test_ascending_exhausts_in_order() {
        let verifier = Arc::new(RecordingVerifier::misses());
        let sink = Arc::new(MemorySink::new());
        let engine = RecoveryEngine::new(
            config("ab", 1, 2, SearchMode::Ascending),
            verifier.clone(),
            sink,
        )
        .unwrap();

        assert_eq!(engine.run().unwrap(), RecoveryOutcome::NotFound);
        let seen = verifier.seen.lock().unwrap().clone();
        assert_eq!(seen, ["a", "b", "aa", "ab", "ba", "bb"]);
    }

    #[test]
    fn test_descending_runs_longest_first() {
        let verifier = Arc::new(RecordingVerifier::misses());
        let sink = Arc::new(MemorySink::new());
        let engine = RecoveryEngine::new(
            config("ab", 1, 2, SearchMode::Descending),
            verifier.clone(),
            sink,
        )
        .unwrap();

        assert_eq!(engine.run().unwrap(), RecoveryOutcome::NotFound);
        let seen = verifier.seen.lock().unwrap().clone();
        assert_eq!(seen, ["aa", "ab", "ba", "bb", "a", "b"]);
    }

    #[test]
    fn test_found_short_circuits() {
        let verifier = Arc::new(RecordingVerifier {
            hit: Some("ba".to_string()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        });
        let sink = Arc::new(MemorySink::new());
        let engine = RecoveryEngine::new(
            config("ab", 1, 3, SearchMode::Ascending),
            verifier.clone(),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(
            engine.run().unwrap(),
            RecoveryOutcome::Found("ba".to_string())
        );
        // Nothing after the hit inside the stage, and no length-3 stage.
        let seen = verifier.seen.lock().unwrap().clone();
        assert_eq!(seen.last().map(String::as_str), Some("ba"));
        assert!(seen.len() <= 5);
        let found_lines: Vec<_> = sink
            .lines()
            .into_iter()
            .filter(|line| line.starts_with("FOUND:"))
            .collect();
        assert_eq!(found_lines, ["FOUND:ba"]);
    }

    #[test]
    fn test_overflow_length_skipped_with_warning() {
        let verifier = Arc::new(RecordingVerifier::misses());
        let sink = Arc::new(MemorySink::new());
        // sigma^40 overflows; both lengths are skipped and the run exhausts.
        let engine = RecoveryEngine::new(
            config("0123456789abcdef", 40, 41, SearchMode::Ascending),
            verifier.clone(),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(engine.run().unwrap(), RecoveryOutcome::NotFound);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert!(sink
            .lines()
            .iter()
            .any(|line| line.starts_with("WARN:") && line.contains("overflow")));
    }

    #[test]
    fn test_random_plan_refused_over_cap() {
        let verifier = Arc::new(RecordingVerifier::misses());
        let sink = Arc::new(MemorySink::new());
        // 16^9 = 6.9e10 > 2^29 index cap, but still within u64.
        let engine = RecoveryEngine::new(
            config("0123456789abcdef", 1, 9, SearchMode::Random),
            verifier.clone(),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(engine.run().unwrap(), RecoveryOutcome::NotFound);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert!(sink
            .lines()
            .iter()
            .any(|line| line.starts_with("ERROR:") && line.contains("Random plan refused")));
    }
}
