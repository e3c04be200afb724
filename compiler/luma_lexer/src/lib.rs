//! Lexer for the Luma compiler.
//!
//! A thin collaborator: recognizes tokens with a [`logos`]-derived state
//! machine, converts byte offsets to line/column once, and hands the parser
//! a flat [`TokenList`] with kind, text, line, column. String and char
//! literals keep their escapes raw; emission processes them.

use logos::Logos;

use luma_diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use luma_ir::{Loc, StringInterner, Token, TokenKind, TokenList};

mod raw;

use raw::RawToken;

/// Byte-offset to line/column conversion table.
struct LineIndex {
    /// Byte offset of each line start; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                #[allow(clippy::cast_possible_truncation)]
                line_starts.push((i + 1) as u32);
            }
        }
        LineIndex { line_starts }
    }

    /// One-based line/column for a byte offset.
    fn loc(&self, offset: u32) -> Loc {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        #[allow(clippy::cast_possible_truncation)]
        let line_number = line as u32 + 1;
        Loc::new(line_number, offset - self.line_starts[line] + 1)
    }
}

/// Tokenize one source file.
///
/// Unknown characters produce a `SyntaxError` diagnostic and are skipped;
/// lexing continues so the caller sees every bad character. The returned
/// list always ends with an `Eof` token.
pub fn lex(
    source: &str,
    file: &str,
    interner: &mut StringInterner,
    sink: &mut DiagnosticSink,
) -> TokenList {
    let index = LineIndex::new(source);
    let mut tokens = TokenList::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        #[allow(clippy::cast_possible_truncation)]
        let loc = index.loc(span.start as u32);
        match result {
            Ok(raw) => {
                let kind = raw.kind();
                let text = match kind {
                    // Strip the surrounding quotes; escapes stay raw.
                    TokenKind::Str | TokenKind::Char => {
                        interner.intern(&lexer.slice()[1..lexer.slice().len() - 1])
                    }
                    _ => interner.intern(lexer.slice()),
                };
                tokens.push(Token::new(kind, text, loc));
            }
            Err(()) => {
                #[allow(clippy::cast_possible_truncation)]
                let len = (span.end - span.start) as u32;
                sink.push(Diagnostic::error(
                    DiagnosticKind::SyntaxError,
                    file,
                    format!("unexpected character `{}`", lexer.slice()),
                    loc,
                    len,
                ));
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let eof_loc = index.loc(source.len() as u32);
    tokens.push(Token::new(TokenKind::Eof, luma_ir::Name::EMPTY, eof_loc));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let mut interner = StringInterner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = lex(source, "test.lx", &mut interner, &mut sink);
        assert!(!sink.has_errors(), "unexpected lex errors");
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_function_header() {
        let kinds = lex_kinds("pub const main -> fn () int { return 42; }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Pub,
                TokenKind::Const,
                TokenKind::Ident,
                TokenKind::Arrow,
                TokenKind::Fn,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::TyInt,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_directives() {
        let kinds = lex_kinds("@module \"m\"\n@use \"m\" as m");
        assert_eq!(
            kinds,
            vec![
                TokenKind::AtModule,
                TokenKind::Str,
                TokenKind::AtUse,
                TokenKind::Str,
                TokenKind::As,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_dotdot_from_float() {
        assert_eq!(
            lex_kinds("1..2"),
            vec![TokenKind::Int, TokenKind::DotDot, TokenKind::Int, TokenKind::Eof]
        );
        assert_eq!(lex_kinds("1.5"), vec![TokenKind::Float, TokenKind::Eof]);
    }

    #[test]
    fn distinguishes_coloncolon_from_colon() {
        assert_eq!(
            lex_kinds("a::b: c"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_lines_and_columns() {
        let mut interner = StringInterner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = lex("let x\n  = 1;", "test.lx", &mut interner, &mut sink);
        assert_eq!(tokens[0].loc, Loc::new(1, 1)); // let
        assert_eq!(tokens[1].loc, Loc::new(1, 5)); // x
        assert_eq!(tokens[2].loc, Loc::new(2, 3)); // =
        assert_eq!(tokens[3].loc, Loc::new(2, 5)); // 1
    }

    #[test]
    fn string_text_keeps_escapes_raw() {
        let mut interner = StringInterner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = lex(r#""a\nb""#, "test.lx", &mut interner, &mut sink);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(interner.lookup(tokens[0].text), r"a\nb");
    }

    #[test]
    fn skips_comments() {
        let kinds = lex_kinds("1 // line\n/* block\nstill */ 2");
        assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]);
    }

    #[test]
    fn reports_unknown_characters() {
        let mut interner = StringInterner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = lex("let $ = 1;", "test.lx", &mut interner, &mut sink);
        assert!(sink.has_errors());
        // Lexing continues past the bad character.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Assign));
    }
}
