//! Append-only status stream toward the host
//!
//! The host (GUI or wrapper script) reads line-oriented UTF-8 from the
//! engine. Lines carry a severity prefix; the single `FOUND:<password>` line
//! is the machine-readable success marker. This stream is distinct from the
//! developer log.

use std::io::Write;
use std::sync::Mutex;

/// Receives the engine's textual status lines
pub trait StatusSink: Send + Sync {
    fn emit(&self, line: &str);

    fn info(&self, message: &str) {
        self.emit(&format!("INFO: {message}"));
    }

    fn warn(&self, message: &str) {
        self.emit(&format!("WARN: {message}"));
    }

    fn error(&self, message: &str) {
        self.emit(&format!("ERROR: {message}"));
    }

    fn fatal(&self, message: &str) {
        self.emit(&format!("FATAL ERROR: {message}"));
    }

    fn found(&self, password: &str) {
        self.emit(&format!("FOUND:{password}"));
    }
}

/// Writes each line to stdout and flushes, so a pipe-connected host sees
/// messages as they happen
pub struct StdoutSink;

impl StatusSink for StdoutSink {
    fn emit(&self, line: &str) {
        println!("{line}");
        let _ = std::io::stdout().flush();
    }
}

/// Captures lines in memory; used by embedders and the test suite
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        let sink = MemorySink::new();
        sink.info("starting");
        sink.warn("odd length");
        sink.error("too big");
        sink.fatal("worker died");
        sink.found("hunter2");
        assert_eq!(
            sink.lines(),
            [
                "INFO: starting",
                "WARN: odd length",
                "ERROR: too big",
                "FATAL ERROR: worker died",
                "FOUND:hunter2",
            ]
        );
    }
}
