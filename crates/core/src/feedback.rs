//! Progress and diagnostic reporting.
//!
//! The pipeline reports human-readable progress messages and warnings
//! through a [`Feedback`] sink. This channel is advisory: nothing in the
//! functional contract depends on it, but backend fallback notices and
//! computed quantile boundaries are surfaced here.

use std::sync::Mutex;

/// Sink for progress messages and warnings.
pub trait Feedback {
    /// Report a progress message.
    fn info(&self, message: &str);

    /// Report a non-fatal warning.
    fn warning(&self, message: &str);
}

/// Feedback sink that discards everything.
#[derive(Debug, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
}

/// Feedback sink that forwards to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Feedback sink that buffers messages in memory.
///
/// Mainly useful in tests to assert that a particular notice (e.g. a
/// calculator backend fallback) was reported.
#[derive(Debug, Default)]
pub struct BufferedFeedback {
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl BufferedFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// All info messages reported so far.
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    /// All warnings reported so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    /// Whether any buffered message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.infos().iter().chain(self.warnings().iter()).any(|m| m.contains(needle))
    }
}

impl Feedback for BufferedFeedback {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
