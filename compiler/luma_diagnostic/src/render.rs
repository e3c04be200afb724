//! Terminal rendering.
//!
//! Errors print as `file:line:col: severity[Kind]: message`, with an
//! optional second `Help:` line. Colorization is the terminal layer's
//! concern and stays out of this crate.

use std::fmt::Write as _;

use crate::Diagnostic;

/// Render one diagnostic to its user-visible text.
pub fn render(diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}:{}:{}: {}[{}]: {}",
        diagnostic.file,
        diagnostic.line,
        diagnostic.col,
        diagnostic.severity,
        diagnostic.kind,
        diagnostic.message
    );
    if let Some(help) = &diagnostic.help {
        let _ = write!(out, "\nHelp: {help}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticKind;
    use luma_ir::Loc;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_position_prefix() {
        let d = Diagnostic::error(
            DiagnosticKind::UndefinedSymbol,
            "src/main.lx",
            "undefined identifier `foo`",
            Loc::new(7, 3),
            3,
        );
        assert_eq!(
            render(&d),
            "src/main.lx:7:3: error[UndefinedSymbol]: undefined identifier `foo`"
        );
    }

    #[test]
    fn renders_help_on_second_line() {
        let d = Diagnostic::error(
            DiagnosticKind::TypeError,
            "a.lx",
            "`m` is a module",
            Loc::new(2, 5),
            1,
        )
        .with_help("use `m::item` instead of `m.item`");
        let text = render(&d);
        assert!(text.ends_with("\nHelp: use `m::item` instead of `m.item`"));
    }
}
