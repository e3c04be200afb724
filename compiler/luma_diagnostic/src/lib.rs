//! Diagnostic system for the Luma compiler.
//!
//! Every phase reports problems as structured [`Diagnostic`] values —
//! {kind, file, message, line, column, span length, optional help} — into
//! a context-passed [`DiagnosticSink`]. Nothing aborts the process: handlers
//! signal failure to their caller and the driver checks the sink at each
//! phase boundary before proceeding.

mod diagnostic;
mod lsp;
mod render;
mod sink;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use lsp::{LspDiagnostic, LspPosition, LspRange, LspSeverity};
pub use render::render;
pub use sink::DiagnosticSink;
