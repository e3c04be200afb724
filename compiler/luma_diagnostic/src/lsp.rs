//! Conversion to language-server diagnostics.
//!
//! LSP positions are zero-based; the sink's are one-based. Severity maps
//! Error/Warning/Info to the protocol's 1/2/3.

use crate::{Diagnostic, Severity};

/// Zero-based line/character position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LspPosition {
    pub line: u32,
    pub character: u32,
}

/// Half-open position range.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LspRange {
    pub start: LspPosition,
    pub end: LspPosition,
}

/// Protocol severity values.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LspSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
}

/// A diagnostic in the language server's shape.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LspDiagnostic {
    pub range: LspRange,
    pub severity: LspSeverity,
    pub code: &'static str,
    pub message: String,
}

impl From<&Diagnostic> for LspDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        let line = d.line.saturating_sub(1);
        let character = d.col.saturating_sub(1);
        let start = LspPosition { line, character };
        let end = LspPosition {
            line,
            character: character + d.span_len.max(1),
        };
        let severity = match d.severity {
            Severity::Error => LspSeverity::Error,
            Severity::Warning => LspSeverity::Warning,
            Severity::Info => LspSeverity::Information,
        };
        let message = match &d.help {
            Some(help) => format!("{}\nHelp: {help}", d.message),
            None => d.message.clone(),
        };
        LspDiagnostic {
            range: LspRange { start, end },
            severity,
            code: d.kind.name(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticKind;
    use luma_ir::Loc;
    use pretty_assertions::assert_eq;

    #[test]
    fn positions_become_zero_based() {
        let d = Diagnostic::error(
            DiagnosticKind::SyntaxError,
            "main.lx",
            "expected `)`",
            Loc::new(4, 10),
            2,
        );
        let lsp = LspDiagnostic::from(&d);
        assert_eq!(lsp.range.start, LspPosition { line: 3, character: 9 });
        assert_eq!(lsp.range.end, LspPosition { line: 3, character: 11 });
        assert_eq!(lsp.severity, LspSeverity::Error);
        assert_eq!(lsp.code, "SyntaxError");
    }

    #[test]
    fn zero_span_still_covers_one_character() {
        let d = Diagnostic::error(
            DiagnosticKind::SyntaxError,
            "main.lx",
            "unexpected end of input",
            Loc::new(1, 1),
            0,
        );
        let lsp = LspDiagnostic::from(&d);
        assert_eq!(lsp.range.end.character, 1);
    }
}
