//! Parser for the Luma compiler.
//!
//! Produces the arena-backed IR tree for one source file: a Pratt parser
//! with a binding-power table for expressions, recursive descent for
//! statements and types. The parser never mutates tokens; it advances a
//! [`Cursor`] and allocates nodes into a shared [`AstArena`].
//!
//! On a required-token mismatch it records a `SyntaxError` diagnostic,
//! skips to the next statement boundary, and continues, so callers see
//! multiple errors per file.

mod cursor;
mod grammar;

pub use cursor::Cursor;

use luma_diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use luma_ir::{AstArena, Loc, StmtId, StringInterner, Token, TokenKind, TokenList};

/// Parser state for one source file.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: &'a mut AstArena,
    interner: &'a mut StringInterner,
    sink: &'a mut DiagnosticSink,
    file: &'a str,
}

/// Parse one file's token stream into a `Program` statement.
///
/// Always returns a program node; parse errors are reported through the
/// sink and the affected statements are dropped.
pub fn parse(
    tokens: &TokenList,
    file: &str,
    arena: &mut AstArena,
    interner: &mut StringInterner,
    sink: &mut DiagnosticSink,
) -> StmtId {
    tracing::debug!(file, tokens = tokens.len(), "parsing");
    Parser::new(tokens, file, arena, interner, sink).parse_program()
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: &'a TokenList,
        file: &'a str,
        arena: &'a mut AstArena,
        interner: &'a mut StringInterner,
        sink: &'a mut DiagnosticSink,
    ) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            arena,
            interner,
            sink,
            file,
        }
    }

    // -- Shared helpers --

    /// Character length of a token's text, for diagnostic spans.
    pub(crate) fn token_len(&self, token: &Token) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let len = self.interner.lookup(token.text).chars().count() as u32;
        if len == 0 {
            1
        } else {
            len
        }
    }

    /// Record a syntax error at the current token.
    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        let token = self.cursor.current();
        let len = self.token_len(token);
        self.sink.push(Diagnostic::error(
            DiagnosticKind::SyntaxError,
            self.file,
            message,
            token.loc,
            len,
        ));
    }

    /// Record a syntax error at an explicit location.
    pub(crate) fn error_at(&mut self, loc: Loc, len: u32, message: impl Into<String>) {
        self.sink.push(Diagnostic::error(
            DiagnosticKind::SyntaxError,
            self.file,
            message,
            loc,
            len,
        ));
    }

    /// Record an "expected X, found Y" error at the current token.
    pub(crate) fn error_expected(&mut self, what: &str) {
        let found = self.cursor.kind().describe();
        self.error_here(format!("expected {what}, found {found}"));
    }

    /// Consume a required token or report and fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<&'a Token> {
        if self.cursor.check(kind) {
            Some(self.cursor.advance())
        } else {
            self.error_expected(kind.describe());
            None
        }
    }

    /// Skip to the next statement boundary after an error.
    ///
    /// Advances until just past a `;`, or until a token that can start a
    /// statement (or close the current block) is reached.
    pub(crate) fn sync_statement(&mut self) {
        while !self.cursor.is_at_end() {
            if self.cursor.eat(TokenKind::Semicolon) {
                return;
            }
            if matches!(
                self.cursor.kind(),
                TokenKind::RBrace
                    | TokenKind::Const
                    | TokenKind::Let
                    | TokenKind::Var
                    | TokenKind::Pub
                    | TokenKind::Priv
                    | TokenKind::Return
                    | TokenKind::If
                    | TokenKind::Loop
                    | TokenKind::Switch
                    | TokenKind::Break
                    | TokenKind::Continue
                    | TokenKind::Defer
                    | TokenKind::AtModule
                    | TokenKind::AtUse
                    | TokenKind::AtPrint
                    | TokenKind::AtPrintln
            ) {
                return;
            }
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests;
