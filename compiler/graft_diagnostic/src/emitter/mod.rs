//! Terminal emitter.
//!
//! Human-readable diagnostic output with optional ANSI color support.

use std::io::Write;

use crate::{Diagnostic, Severity};

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const WARNING: &str = "\x1b[1;33m"; // Bold yellow
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Returns "s" for plural counts, "" for singular.
#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Terminal emitter with optional color support.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, colors: bool) -> Self {
        TerminalEmitter { writer, colors }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_colored(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    /// Emit a single diagnostic.
    ///
    /// ```text
    /// error[G1003]: shadow field `count:I` not found in target
    ///   --> demo/Foo (overlay demo/mixin/FooMixin, member count:I)
    ///    = note: ...
    ///    = help: ...
    /// ```
    pub fn emit(&mut self, diagnostic: &Diagnostic) {
        let color = match diagnostic.severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
        };
        let head = format!("{}[{}]", diagnostic.severity, diagnostic.code);
        self.write_colored(&head, color);
        self.write_colored(&format!(": {}", diagnostic.message), colors::BOLD);
        let _ = writeln!(self.writer);

        if let Some(class) = &diagnostic.class {
            let _ = write!(self.writer, "  --> {class}");
            match (&diagnostic.overlay, &diagnostic.member) {
                (Some(overlay), Some(member)) => {
                    let _ = write!(self.writer, " (overlay {overlay}, member {member})");
                }
                (Some(overlay), None) => {
                    let _ = write!(self.writer, " (overlay {overlay})");
                }
                (None, Some(member)) => {
                    let _ = write!(self.writer, " (member {member})");
                }
                (None, None) => {}
            }
            let _ = writeln!(self.writer);
        }

        for note in &diagnostic.notes {
            let _ = writeln!(self.writer, "   = note: {note}");
        }
        for suggestion in &diagnostic.suggestions {
            let _ = writeln!(self.writer, "   = help: {suggestion}");
        }
    }

    pub fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    /// Emit a summary of errors/warnings.
    pub fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count > 0 {
            let text = format!("{error_count} error{} reported", plural_s(error_count));
            self.write_colored(&text, colors::ERROR);
            let _ = writeln!(self.writer);
        }
        if warning_count > 0 {
            let text = format!("{warning_count} warning{} reported", plural_s(warning_count));
            self.write_colored(&text, colors::WARNING);
            let _ = writeln!(self.writer);
        }
    }

    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}
