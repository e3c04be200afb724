//! Core diagnostic types.

use std::fmt;

use luma_ir::Loc;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Diagnostic taxonomy. Warnings share these kinds at lower severity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagnosticKind {
    SyntaxError,
    TypeError,
    UndefinedSymbol,
    DuplicateDefinition,
    InvalidAssignment,
    IncompatibleTypes,
    PrivateAccess,
    /// Compile-time, when the index is a constant.
    IndexOutOfRange,
    MissingField,
    UnknownModule,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::TypeError => "TypeError",
            DiagnosticKind::UndefinedSymbol => "UndefinedSymbol",
            DiagnosticKind::DuplicateDefinition => "DuplicateDefinition",
            DiagnosticKind::InvalidAssignment => "InvalidAssignment",
            DiagnosticKind::IncompatibleTypes => "IncompatibleTypes",
            DiagnosticKind::PrivateAccess => "PrivateAccess",
            DiagnosticKind::IndexOutOfRange => "IndexOutOfRange",
            DiagnosticKind::MissingField => "MissingField",
            DiagnosticKind::UnknownModule => "UnknownModule",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A structured diagnostic.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Source file path the diagnostic points into.
    pub file: String,
    pub message: String,
    pub line: u32,
    pub col: u32,
    /// Length in characters of the offending token or span.
    pub span_len: u32,
    /// Optional "Help:" text rendered on a second line.
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(
        kind: DiagnosticKind,
        file: impl Into<String>,
        message: impl Into<String>,
        loc: Loc,
        span_len: u32,
    ) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Error,
            file: file.into(),
            message: message.into(),
            line: loc.line,
            col: loc.col,
            span_len,
            help: None,
        }
    }

    /// Create a warning with the same shape.
    pub fn warning(
        kind: DiagnosticKind,
        file: impl Into<String>,
        message: impl Into<String>,
        loc: Loc,
        span_len: u32,
    ) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Self::error(kind, file, message, loc, span_len)
        }
    }

    /// Attach help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_carries_location() {
        let d = Diagnostic::error(
            DiagnosticKind::SyntaxError,
            "main.lx",
            "expected `;`",
            Loc::new(3, 14),
            1,
        );
        assert_eq!(d.line, 3);
        assert_eq!(d.col, 14);
        assert!(d.is_error());
        assert_eq!(d.help, None);
    }

    #[test]
    fn warning_shares_shape() {
        let d = Diagnostic::warning(
            DiagnosticKind::UnknownModule,
            "main.lx",
            "module imports itself",
            Loc::new(1, 1),
            4,
        )
        .with_help("remove the self-import");
        assert_eq!(d.severity, Severity::Warning);
        assert!(d.help.is_some());
    }
}
