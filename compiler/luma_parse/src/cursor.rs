//! Token cursor for navigating the token stream.
//!
//! Low-level token access, lookahead, and consumption. Never mutates the
//! tokens; only advances a position.

use luma_ir::{Loc, Token, TokenKind, TokenList};

/// Cursor over a [`TokenList`].
///
/// Invariant: the position is always valid (`0..tokens.len()`); the last
/// token is always [`TokenKind::Eof`] and the cursor never advances past it.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of the stream.
    ///
    /// # Panics
    /// Panics if `tokens` is empty (a lexed list always carries `Eof`).
    pub fn new(tokens: &'a TokenList) -> Self {
        assert!(!tokens.is_empty(), "token stream must end with Eof");
        Cursor { tokens, pos: 0 }
    }

    /// Current position, for progress checks.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The current token.
    #[inline]
    pub fn current(&self) -> &'a Token {
        &self.tokens[self.pos]
    }

    /// The current token's kind.
    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// The current token's location.
    #[inline]
    pub fn loc(&self) -> Loc {
        self.current().loc
    }

    /// One-token lookahead. Returns the `Eof` token at the end.
    #[inline]
    pub fn peek(&self) -> &'a Token {
        self.tokens
            .get(self.pos + 1)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    /// Check the current token's kind.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Whether the cursor reached the end of input.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    /// Advance past the current token and return it.
    ///
    /// At `Eof` the cursor stays put and keeps returning the `Eof` token.
    pub fn advance(&mut self) -> &'a Token {
        let token = &self.tokens[self.pos];
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luma_ir::Name;
    use pretty_assertions::assert_eq;

    fn token_list(kinds: &[TokenKind]) -> TokenList {
        let mut list = TokenList::new();
        for (i, &kind) in kinds.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            list.push(Token::new(kind, Name::EMPTY, Loc::new(1, i as u32 + 1)));
        }
        list.push(Token::new(
            TokenKind::Eof,
            Name::EMPTY,
            Loc::new(1, kinds.len() as u32 + 1),
        ));
        list
    }

    #[test]
    fn advance_stops_at_eof() {
        let tokens = token_list(&[TokenKind::Let]);
        let mut cursor = Cursor::new(&tokens);
        assert_eq!(cursor.advance().kind, TokenKind::Let);
        assert_eq!(cursor.advance().kind, TokenKind::Eof);
        assert_eq!(cursor.advance().kind, TokenKind::Eof);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn eat_consumes_only_on_match() {
        let tokens = token_list(&[TokenKind::Plus, TokenKind::Minus]);
        let mut cursor = Cursor::new(&tokens);
        assert!(!cursor.eat(TokenKind::Minus));
        assert!(cursor.eat(TokenKind::Plus));
        assert_eq!(cursor.kind(), TokenKind::Minus);
    }

    #[test]
    fn peek_returns_eof_at_end() {
        let tokens = token_list(&[]);
        let cursor = Cursor::new(&tokens);
        assert_eq!(cursor.peek().kind, TokenKind::Eof);
    }
}
