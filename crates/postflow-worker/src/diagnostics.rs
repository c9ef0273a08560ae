//! Per-run diagnostics log.

use std::time::Instant;

/// Ordered trace of one pipeline run, returned to the caller.
///
/// A fresh log is created for every run and passed by `&mut` through
/// each step, so concurrent runs never share entries.
#[derive(Debug)]
pub struct RunLog {
    started: Instant,
    entries: Vec<String>,
}

impl RunLog {
    /// Start an empty log.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    /// Append an entry, prefixed with the milliseconds since the run began.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "postflow::run", "{}", message);
        self.entries
            .push(format!("[+{}ms] {}", self.started.elapsed().as_millis(), message));
    }

    /// Entries recorded so far, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the log, yielding its entries.
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}
