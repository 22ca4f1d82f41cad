//! Progress accounting across worker threads

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared counters the workers bump and the orchestrator reports from
pub struct ProgressTracker {
    total: u64,
    attempted: AtomicU64,
    skipped: AtomicU64,
    started: Instant,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// `total` is the planned candidate count; pass 0 when it is unknown.
    /// The bar draws on stderr so the stdout status stream stays clean.
    pub fn new(total: u64, show_bar: bool) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            Some(bar)
        } else {
            None
        };
        ProgressTracker {
            total,
            attempted: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            started: Instant::now(),
            bar,
        }
    }

    /// One candidate handed to the verifier
    pub fn record_attempt(&self) {
        let done = self.attempted.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(bar) = &self.bar {
            bar.inc(1);
            if done % 1000 == 0 {
                bar.set_message(format!("{:.0}/s", self.rate()));
            }
        }
    }

    /// One candidate skipped because the filter already held it
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Verification attempts per second since the run started
    pub fn rate(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.attempted() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        debug!(
            attempted = self.attempted(),
            skipped = self.skipped(),
            "progress tracker finished"
        );
    }
}

/// Format a duration as `1h 2m 3s` / `2m 3s` / `3s`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Format a count with thousands separators
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
