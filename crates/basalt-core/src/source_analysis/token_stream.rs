// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A cursor over the lexer's token sequence.
//!
//! The parser consumes tokens through a [`TokenStream`]: an immutable
//! token vector plus a mutable cursor. Speculative parsing takes a
//! [`RestorePoint`] before trying a candidate interpretation and rewinds
//! the cursor on rejection; restore points are opaque snapshots, so a
//! speculation cannot leave the stream in a half-advanced state.

use super::{Token, TokenKind};

/// An opaque snapshot of a [`TokenStream`] cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePoint(usize);

/// An immutable token sequence with a mutable cursor.
///
/// Reads past the end are clamped: `current` then returns a synthetic
/// end-of-file token positioned after the last real token, so the parser
/// never observes an absent token.
///
/// # Examples
///
/// ```
/// use basalt_core::source_analysis::{Diagnostics, Lexer, SourceText, TokenKind};
///
/// let source = SourceText::from("a b");
/// let mut diagnostics = Diagnostics::new();
/// let mut stream = Lexer::new(&source, &mut diagnostics).tokenize();
///
/// let point = stream.create_restore_point();
/// stream.advance();
/// assert_eq!(stream.current().text(), "b");
/// stream.restore(point);
/// assert_eq!(stream.current().text(), "a");
/// ```
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    /// Fallback token for reads past the end of the sequence.
    end_of_file: Token,
}

impl TokenStream {
    /// Creates a stream over the given tokens.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        let end_of_file = match tokens.last() {
            Some(last) => Token::new(TokenKind::EndOfFile, "", last.end_position() + 1),
            None => Token::new(TokenKind::EndOfFile, "", 0),
        };
        Self {
            tokens,
            position: 0,
            end_of_file,
        }
    }

    /// Returns the token at the cursor.
    #[must_use]
    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Returns the token one past the cursor.
    #[must_use]
    pub fn lookahead(&self) -> &Token {
        self.peek(1)
    }

    /// Returns the token before the cursor, if the cursor has moved.
    #[must_use]
    pub fn previous(&self) -> Option<&Token> {
        self.position.checked_sub(1).map(|index| &self.tokens[index])
    }

    /// Returns the token `offset` positions past the cursor, clamped to
    /// the synthetic end-of-file.
    #[must_use]
    pub fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .unwrap_or(&self.end_of_file)
    }

    /// Moves the cursor forward by one token.
    pub fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Returns the cursor position as an opaque snapshot.
    #[must_use]
    pub fn create_restore_point(&self) -> RestorePoint {
        RestorePoint(self.position)
    }

    /// Rewinds the cursor to a previously created restore point.
    pub fn restore(&mut self, point: RestorePoint) {
        self.position = point.0;
    }

    /// Returns `true` if the cursor is at the end-of-file token (or past
    /// the end of the sequence).
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.current().kind() == TokenKind::EndOfFile
    }

    /// Returns the number of tokens in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the stream holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the underlying token sequence.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Consumes the stream and returns the token sequence.
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}
