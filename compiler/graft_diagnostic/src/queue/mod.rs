//! Diagnostic sinks.
//!
//! Features:
//! - `DiagnosticSink`, the fire-and-forget reporting seam
//! - `DiagnosticQueue`, a thread-safe collecting sink with error limits and
//!   deduplication
//! - `TracingSink`, which forwards diagnostics to `tracing`
//! - `NullSink`, which drops everything

use parking_lot::Mutex;

use crate::{Diagnostic, Severity};

/// Receiver for diagnostics.
///
/// Reporting never fails and never affects the caller's control flow.
/// Sinks are shared between threads processing different classes.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that drops every diagnostic.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Sink that turns diagnostics into `tracing` events.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let class = diagnostic.class.as_deref().unwrap_or("-");
        let member = diagnostic.member.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Error => tracing::error!(code = %diagnostic.code, class, member, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code = %diagnostic.code, class, member, "{}", diagnostic.message),
        }
    }
}

/// Configuration for diagnostic collection.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited).
    pub error_limit: usize,
    /// Drop diagnostics identical to one already collected.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 100,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Create a config with no limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    dropped: usize,
}

/// Thread-safe collecting sink.
///
/// # Example
///
/// ```text
/// let queue = DiagnosticQueue::new();
/// session.process_class(name, &mut tree, &queue)?;
/// for diag in queue.flush() { ... }
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticQueue {
    state: Mutex<QueueState>,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            state: Mutex::new(QueueState::default()),
            config,
        }
    }

    /// Number of errors collected so far.
    pub fn error_count(&self) -> usize {
        self.state.lock().error_count
    }

    /// Number of diagnostics dropped by the error limit.
    pub fn dropped(&self) -> usize {
        self.state.lock().dropped
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Clone of everything collected so far, in report order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.state.lock().diagnostics.clone()
    }

    /// Take everything collected so far, errors first, then warnings, then notes.
    ///
    /// Ordering within a severity is report order.
    pub fn flush(&self) -> Vec<Diagnostic> {
        let mut state = self.state.lock();
        state.error_count = 0;
        let mut out = std::mem::take(&mut state.diagnostics);
        out.sort_by_key(|d| d.severity == Severity::Warning);
        out
    }
}

impl DiagnosticSink for DiagnosticQueue {
    fn report(&self, diagnostic: Diagnostic) {
        let mut state = self.state.lock();

        if diagnostic.is_error()
            && self.config.error_limit > 0
            && state.error_count >= self.config.error_limit
        {
            state.dropped += 1;
            return;
        }

        if self.config.deduplicate && state.diagnostics.contains(&diagnostic) {
            return;
        }

        if diagnostic.is_error() {
            state.error_count += 1;
        }
        state.diagnostics.push(diagnostic);
    }
}
