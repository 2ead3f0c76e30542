//! Diagnostic system for merge reporting.
//!
//! Every user-facing problem the merge engine finds is a [`Diagnostic`]:
//! - Error codes for searchability (`graftc explain G1003`)
//! - A message saying what went wrong
//! - The class and member it concerns
//! - Notes and suggestions
//!
//! Diagnostics flow into a [`DiagnosticSink`]. Sinks are fire-and-forget:
//! reporting never fails and never changes control flow in the engine.

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue, DiagnosticSink, NullSink, TracingSink};
