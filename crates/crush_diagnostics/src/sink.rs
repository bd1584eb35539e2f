//! Thread-safe message accumulator that mirrors into `tracing`.

use crate::message::Message;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// A thread-safe accumulator for messages emitted while managing the cache.
///
/// The error count is tracked atomically for fast `has_errors` checks without
/// locking the message vector.
pub struct DiagnosticSink {
    messages: Mutex<Vec<Message>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a message into the sink and forwards it to `tracing`.
    pub fn emit(&self, msg: Message) {
        forward(&msg);
        if msg.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.push(msg);
    }

    /// Emits a debug message.
    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Message::debug(message));
    }

    /// Emits a notice message.
    pub fn notice(&self, message: impl Into<String>) {
        self.emit(Message::notice(message));
    }

    /// Emits a warning message.
    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Message::warning(message));
    }

    /// Emits an error message.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(Message::error(message));
    }

    /// Returns `true` if any error-severity messages have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity messages emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns `true` if a message with exactly this text was emitted.
    pub fn contains(&self, text: &str) -> bool {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.iter().any(|m| m.message == text)
    }

    /// Takes all accumulated messages, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Message> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *messages)
    }

    /// Returns a snapshot of all accumulated messages without draining.
    pub fn messages(&self) -> Vec<Message> {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

fn forward(msg: &Message) {
    let notes = msg.notes.join("; ");
    match msg.severity {
        Severity::Debug => tracing::debug!(target: "crush", notes = %notes, "{}", msg.message),
        Severity::Notice => tracing::info!(target: "crush", notes = %notes, "{}", msg.message),
        Severity::Warning => tracing::warn!(target: "crush", notes = %notes, "{}", msg.message),
        Severity::Error => tracing::error!(target: "crush", notes = %notes, "{}", msg.message),
    }
}
