//! Non-fatal parse diagnostics.

use core::fmt;

use heapless::String;

/// Why a word or line was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A numeric literal could not be parsed; the whole line was skipped.
    MalformedNumber,
    /// A word letter this interpreter does not handle; the word was ignored.
    UnsupportedWord,
    /// A G code this interpreter does not handle; the word was ignored.
    UnsupportedCode,
    /// An axis outside the active axis set; the word was ignored.
    AxisNotInSet,
    /// Axis words with no motion mode established; the line was skipped.
    NoMotionMode,
    /// A command lacked a required word; the line was skipped.
    MissingWord,
}

impl DiagnosticKind {
    /// Short name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            DiagnosticKind::MalformedNumber => "malformed number",
            DiagnosticKind::UnsupportedWord => "unsupported word",
            DiagnosticKind::UnsupportedCode => "unsupported code",
            DiagnosticKind::AxisNotInSet => "axis not in set",
            DiagnosticKind::NoMotionMode => "no motion mode",
            DiagnosticKind::MissingWord => "missing word",
        }
    }

    /// Whether the whole line was dropped.
    pub const fn skips_line(self) -> bool {
        matches!(
            self,
            DiagnosticKind::MalformedNumber | DiagnosticKind::NoMotionMode | DiagnosticKind::MissingWord
        )
    }
}

/// A diagnostic tied to a program line (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// Line number.
    pub line: usize,
    /// Reason.
    pub kind: DiagnosticKind,
    /// Offending word.
    pub text: String<32>,
}

impl ParseDiagnostic {
    /// Create a diagnostic, truncating the word if needed.
    pub fn new(line: usize, kind: DiagnosticKind, text: &str) -> Self {
        Self {
            line,
            kind,
            text: crate::error::truncated(text),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} '{}'", self.line, self.kind.name(), self.text)
    }
}
