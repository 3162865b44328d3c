//! Completion counter shared across concurrent dispatches

use parking_lot::Mutex;
use std::time::Duration;

/// Counts finished requests (successful or failed) for progress lines
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: Mutex<usize>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
        }
    }

    /// Record one finished request and return the new count
    pub fn increment(&self) -> usize {
        let mut completed = self.completed.lock();
        *completed += 1;
        *completed
    }

    pub fn completed(&self) -> usize {
        *self.completed.lock()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count a successful request and log it
    pub fn complete(&self, question_id: i64, elapsed: Duration) {
        let current = self.increment();
        tracing::info!(
            "Request [{}/{}] completed in {:.1}s (q_id: {})",
            current,
            self.total,
            elapsed.as_secs_f64(),
            question_id
        );
    }

    /// Count a failed request and log it
    pub fn fail(&self, question_id: i64, error: &dyn std::fmt::Display) {
        let current = self.increment();
        tracing::warn!(
            "Request [{}/{}] FAILED for question {}: {}",
            current,
            self.total,
            question_id,
            error
        );
    }
}
