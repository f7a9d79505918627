// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Basalt source code.
//!
//! This module converts source text into a stream of [`Token`]s. The
//! lexer is hand-written for maximum control over error recovery and
//! trivia handling.
//!
//! # Design Principles
//!
//! - **Error recovery**: Never panic on malformed input; unknown
//!   characters become [`TokenKind::Unknown`] tokens and malformed
//!   literals still produce tokens.
//! - **Trivia preservation**: Whitespace, newlines, and comments attach
//!   to tokens, so the token sequence reproduces the source exactly.
//! - **Precise positions**: Every token and diagnostic carries its byte
//!   offset.
//!
//! # Example
//!
//! ```
//! use basalt_core::source_analysis::{Diagnostics, Lexer, SourceText, TokenKind};
//!
//! let source = SourceText::from("int x;");
//! let mut diagnostics = Diagnostics::new();
//! let stream = Lexer::new(&source, &mut diagnostics).tokenize();
//! assert_eq!(stream.current().kind(), TokenKind::Int);
//! assert!(diagnostics.is_empty());
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{Diagnostics, SourceText, Span, Token, TokenKind, TokenStream, TokenValue, Trivia, TriviaKind};

/// The integer/real suffix attached to a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericSuffix {
    None,
    Long,
    Unsigned,
    UnsignedLong,
    Single,
    Double,
    Decimal,
}

impl NumericSuffix {
    const fn is_real(self) -> bool {
        matches!(self, Self::Single | Self::Double | Self::Decimal)
    }
}

/// A lexer that tokenizes Basalt source code.
///
/// The lexer produces one token at a time by scanning leading trivia,
/// the token itself, then trailing trivia (which stops after one
/// end-of-line). It never fails: lexical errors are reported to the
/// diagnostic log and a token is produced regardless.
pub struct Lexer<'s, 'd> {
    /// The source being lexed.
    source: &'s SourceText,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'s>>,
    /// Current byte position in source.
    position: usize,
    /// Pending trivia to attach to the next token.
    pending_trivia: Vec<Trivia>,
    /// The diagnostic log lexical errors are reported to.
    diagnostics: &'d mut Diagnostics,
}

impl std::fmt::Debug for Lexer<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field(
                "remaining",
                &self.source.as_str().get(self.position..).unwrap_or(""),
            )
            .finish()
    }
}

impl<'s, 'd> Lexer<'s, 'd> {
    /// Creates a new lexer over the given source.
    #[must_use]
    pub fn new(source: &'s SourceText, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            source,
            chars: source.as_str().char_indices().peekable(),
            position: 0,
            pending_trivia: Vec::new(),
            diagnostics,
        }
    }

    /// Runs the lexer to completion, producing a [`TokenStream`].
    ///
    /// The final token is always a single [`TokenKind::EndOfFile`]
    /// carrying any dangling trivia as leading trivia.
    #[must_use]
    pub fn tokenize(mut self) -> TokenStream {
        let mut tokens = Vec::new();
        loop {
            let token = self.lex_token();
            let done = token.kind() == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        TokenStream::new(tokens)
    }

    // ========================================================================
    // Character cursor
    // ========================================================================

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is the same as
    /// `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a span from start to the current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'s str {
        &self.source.as_str()[span.as_range()]
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Scans one piece of trivia into the pending buffer.
    ///
    /// Returns `None` when the next character starts a token, otherwise
    /// whether the scanned piece was an end-of-line.
    fn scan_trivia_piece(&mut self) -> Option<bool> {
        let start = self.current_position();
        match self.peek_char() {
            Some('\n') => {
                self.advance();
                let text = self.text_for(self.span_from(start));
                self.pending_trivia
                    .push(Trivia::new(TriviaKind::EndOfLine(text.into()), start));
                Some(true)
            }
            Some(c) if c.is_whitespace() => {
                self.advance_while(|c| c.is_whitespace() && c != '\n');
                let text = self.text_for(self.span_from(start));
                self.pending_trivia
                    .push(Trivia::new(TriviaKind::Whitespace(text.into()), start));
                Some(false)
            }
            Some('/') if self.peek_char_n(1) == Some('/') => {
                self.advance_while(|c| c != '\n');
                let text = self.text_for(self.span_from(start));
                self.pending_trivia
                    .push(Trivia::new(TriviaKind::SingleLineComment(text.into()), start));
                Some(false)
            }
            Some('/') if self.peek_char_n(1) == Some('*') => {
                self.scan_multi_line_comment(start);
                Some(false)
            }
            _ => None,
        }
    }

    /// Scans a `/* ... */` comment. An unterminated comment extends to
    /// the end of the file and is reported at the opening position.
    fn scan_multi_line_comment(&mut self, start: u32) {
        self.advance(); // /
        self.advance(); // *

        let mut terminated = false;
        while let Some(c) = self.peek_char() {
            if c == '*' && self.peek_char_n(1) == Some('/') {
                self.advance();
                self.advance();
                terminated = true;
                break;
            }
            self.advance();
        }

        if !terminated {
            self.diagnostics.report_error(
                Span::new(start, start + 2),
                "End-of-file found, '*/' expected",
            );
        }

        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::new(TriviaKind::MultiLineComment(text.into()), start));
    }

    /// Scans all trivia preceding the next token.
    fn scan_leading_trivia(&mut self) {
        while self.scan_trivia_piece().is_some() {}
    }

    /// Scans trailing trivia: everything up to and including one
    /// end-of-line.
    fn scan_trailing_trivia(&mut self) {
        while let Some(was_end_of_line) = self.scan_trivia_piece() {
            if was_end_of_line {
                break;
            }
        }
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Lexes the next token with its leading and trailing trivia.
    fn lex_token(&mut self) -> Token {
        self.scan_leading_trivia();
        let leading_trivia = std::mem::take(&mut self.pending_trivia);

        let start = self.current_position();
        let (kind, value) = match self.peek_char() {
            None => (TokenKind::EndOfFile, None),
            Some(c) => self.lex_token_kind(c, start),
        };
        let text = EcoString::from(self.text_for(self.span_from(start)));

        self.scan_trailing_trivia();
        let trailing_trivia = std::mem::take(&mut self.pending_trivia);

        let mut token = match value {
            Some(value) => Token::with_value(kind, text, start, value),
            None => Token::new(kind, text, start),
        };
        token.set_leading_trivia(leading_trivia);
        token.set_trailing_trivia(trailing_trivia);
        token
    }

    /// Dispatches on the first character of a token.
    fn lex_token_kind(&mut self, c: char, start: u32) -> (TokenKind, Option<TokenValue>) {
        match c {
            c if c.is_alphabetic() || c == '_' => (self.lex_identifier_or_keyword(), None),
            '0'..='9' => self.lex_number(start),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number(start)
            }
            '"' => self.lex_string(start),
            '\'' => self.lex_character(start),
            '@' if self.peek_char_n(1) == Some('"') => self.lex_verbatim_string(start),
            '#' => {
                self.advance_while(|c| c != '\n');
                (TokenKind::PreprocessorDirective, None)
            }
            '~' => (self.single(TokenKind::Tilde), None),
            '(' => (self.single(TokenKind::OpenParen), None),
            ')' => (self.single(TokenKind::CloseParen), None),
            '{' => (self.single(TokenKind::OpenBrace), None),
            '}' => (self.single(TokenKind::CloseBrace), None),
            '[' => (self.single(TokenKind::OpenBracket), None),
            ']' => (self.single(TokenKind::CloseBracket), None),
            ';' => (self.single(TokenKind::Semicolon), None),
            ':' => (self.single(TokenKind::Colon), None),
            ',' => (self.single(TokenKind::Comma), None),
            '.' => (self.single(TokenKind::Dot), None),
            '?' => (self.single(TokenKind::Question), None),
            '!' => (self.one_or_eq(TokenKind::Bang, TokenKind::BangEquals), None),
            '%' => (
                self.one_or_eq(TokenKind::Percent, TokenKind::PercentEquals),
                None,
            ),
            '^' => (
                self.one_or_eq(TokenKind::Caret, TokenKind::CaretEquals),
                None,
            ),
            '*' => (
                self.one_or_eq(TokenKind::Asterisk, TokenKind::AsteriskEquals),
                None,
            ),
            '/' => (
                self.one_or_eq(TokenKind::Slash, TokenKind::SlashEquals),
                None,
            ),
            '=' => (
                self.one_or_eq(TokenKind::Equals, TokenKind::EqualsEquals),
                None,
            ),
            '+' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('+') => {
                        self.advance();
                        TokenKind::PlusPlus
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::PlusEquals
                    }
                    _ => TokenKind::Plus,
                };
                (kind, None)
            }
            '-' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('-') => {
                        self.advance();
                        TokenKind::MinusMinus
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::MinusEquals
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::Arrow
                    }
                    _ => TokenKind::Minus,
                };
                (kind, None)
            }
            '&' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('&') => {
                        self.advance();
                        TokenKind::AmpersandAmpersand
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::AmpersandEquals
                    }
                    _ => TokenKind::Ampersand,
                };
                (kind, None)
            }
            '|' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('|') => {
                        self.advance();
                        TokenKind::BarBar
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::BarEquals
                    }
                    _ => TokenKind::Bar,
                };
                (kind, None)
            }
            '<' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('<') => {
                        self.advance();
                        if self.peek_char() == Some('=') {
                            self.advance();
                            TokenKind::LessLessEquals
                        } else {
                            TokenKind::LessLess
                        }
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::LessEquals
                    }
                    _ => TokenKind::Less,
                };
                (kind, None)
            }
            '>' => {
                self.advance();
                let kind = match self.peek_char() {
                    Some('>') => {
                        self.advance();
                        if self.peek_char() == Some('=') {
                            self.advance();
                            TokenKind::GreaterGreaterEquals
                        } else {
                            TokenKind::GreaterGreater
                        }
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::GreaterEquals
                    }
                    _ => TokenKind::Greater,
                };
                (kind, None)
            }
            _ => {
                self.advance();
                (TokenKind::Unknown, None)
            }
        }
    }

    /// Consumes one character and returns the given kind.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Consumes one character, or two if followed by `=`.
    fn one_or_eq(&mut self, plain: TokenKind, with_equals: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some('=') {
            self.advance();
            with_equals
        } else {
            plain
        }
    }

    /// Lexes an identifier or keyword.
    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
        let text = self.text_for(self.span_from(start));
        TokenKind::keyword_from_text(text).unwrap_or(TokenKind::Identifier)
    }

    // ========================================================================
    // Numeric literals
    // ========================================================================

    /// Lexes a numeric literal, decoding its value.
    fn lex_number(&mut self, start: u32) -> (TokenKind, Option<TokenValue>) {
        // Hex literal
        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let digits_start = self.current_position();
            self.advance_while(|c| c.is_ascii_hexdigit());
            let digits = String::from(self.text_for(self.span_from(digits_start)));
            let suffix = self.scan_hex_suffix();

            let value = if digits.is_empty() {
                None
            } else {
                decode_integer(&digits, 16, suffix)
            };
            if value.is_none() {
                self.report_invalid_number(start);
            }
            return (TokenKind::NumericLiteral, value);
        }

        self.advance_while(|c| c.is_ascii_digit());

        let mut is_real = false;
        let mut invalid = false;

        // Fractional part: the dot is only part of the number when a digit
        // follows it (`1.x` is member access on an int literal).
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
            is_real = true;
        }

        // Exponent
        if matches!(self.peek_char(), Some('e' | 'E')) {
            match (self.peek_char_n(1), self.peek_char_n(2)) {
                (Some(d), _) if d.is_ascii_digit() => {
                    self.advance();
                    self.advance_while(|c| c.is_ascii_digit());
                    is_real = true;
                }
                (Some('+' | '-'), Some(d)) if d.is_ascii_digit() => {
                    self.advance();
                    self.advance();
                    self.advance_while(|c| c.is_ascii_digit());
                    is_real = true;
                }
                (Some('+' | '-'), _) => {
                    // Signed exponent with no digits
                    self.advance();
                    self.advance();
                    is_real = true;
                    invalid = true;
                }
                // A bare `e` belongs to a following identifier
                _ => {}
            }
        }

        let literal = String::from(self.text_for(self.span_from(start)));
        let suffix = self.scan_numeric_suffix(is_real);

        let value = if invalid {
            None
        } else if is_real || suffix.is_real() {
            decode_real(&literal, suffix)
        } else {
            decode_integer(&literal, 10, suffix)
        };
        if value.is_none() {
            self.report_invalid_number(start);
        }
        (TokenKind::NumericLiteral, value)
    }

    /// Scans the `u`/`l` suffix combinations after a hex body.
    fn scan_hex_suffix(&mut self) -> NumericSuffix {
        match self.peek_char() {
            Some('l' | 'L') => {
                self.advance();
                if matches!(self.peek_char(), Some('u' | 'U')) {
                    self.advance();
                    NumericSuffix::UnsignedLong
                } else {
                    NumericSuffix::Long
                }
            }
            Some('u' | 'U') => {
                self.advance();
                if matches!(self.peek_char(), Some('l' | 'L')) {
                    self.advance();
                    NumericSuffix::UnsignedLong
                } else {
                    NumericSuffix::Unsigned
                }
            }
            _ => NumericSuffix::None,
        }
    }

    /// Scans a numeric type suffix. Integer suffixes are not consumed
    /// after a real body (`1.0L` lexes as `1.0` followed by `L`).
    fn scan_numeric_suffix(&mut self, is_real: bool) -> NumericSuffix {
        match self.peek_char() {
            Some('f' | 'F') => {
                self.advance();
                NumericSuffix::Single
            }
            Some('d' | 'D') => {
                self.advance();
                NumericSuffix::Double
            }
            Some('m' | 'M') => {
                self.advance();
                NumericSuffix::Decimal
            }
            Some('l' | 'L' | 'u' | 'U') if !is_real => self.scan_hex_suffix(),
            _ => NumericSuffix::None,
        }
    }

    fn report_invalid_number(&mut self, start: u32) {
        self.diagnostics
            .report_error(self.span_from(start), "Invalid number");
    }

    // ========================================================================
    // Character and string literals
    // ========================================================================

    /// Lexes a character literal: `'a'`, `'\n'`, `'\u0041'`.
    fn lex_character(&mut self, start: u32) -> (TokenKind, Option<TokenValue>) {
        self.advance(); // '

        let mut value = '\0';
        match self.peek_char() {
            Some('\'') => {
                self.advance();
                self.diagnostics
                    .report_error(self.span_from(start), "Empty character literal");
                return (TokenKind::CharacterLiteral, Some(TokenValue::Char('\0')));
            }
            None | Some('\n') => {
                self.diagnostics
                    .report_error(self.span_from(start), "Newline in constant");
                return (TokenKind::CharacterLiteral, Some(TokenValue::Char('\0')));
            }
            Some('\\') => {
                if let Some(decoded) = self.scan_escape() {
                    value = decoded;
                }
            }
            Some(c) => {
                self.advance();
                value = c;
            }
        }

        match self.peek_char() {
            Some('\'') => {
                self.advance();
            }
            None | Some('\n') => {
                self.diagnostics
                    .report_error(self.span_from(start), "Newline in constant");
            }
            Some(_) => {
                self.diagnostics.report_error(
                    self.span_from(start),
                    "Too many characters in character literal",
                );
                // Consume up to the closing quote, end of line, or EOF
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                    if c == '\'' {
                        break;
                    }
                }
            }
        }

        (TokenKind::CharacterLiteral, Some(TokenValue::Char(value)))
    }

    /// Lexes a regular string literal with escape processing.
    fn lex_string(&mut self, start: u32) -> (TokenKind, Option<TokenValue>) {
        self.advance(); // "
        let mut decoded = String::new();

        loop {
            match self.peek_char() {
                None => {
                    self.diagnostics.report_error(
                        Span::new(start, start + 1),
                        "Unterminated string literal",
                    );
                    break;
                }
                Some('\n') => {
                    let position = self.current_position();
                    self.diagnostics
                        .report_error(Span::empty(position), "Newline in constant");
                    break;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    if let Some(c) = self.scan_escape() {
                        decoded.push(c);
                    }
                }
                Some(c) => {
                    self.advance();
                    decoded.push(c);
                }
            }
        }

        (
            TokenKind::StringLiteral,
            Some(TokenValue::String(decoded.into())),
        )
    }

    /// Lexes a verbatim string literal: `@"..."` with `""` as an
    /// embedded quote and literal backslashes.
    fn lex_verbatim_string(&mut self, start: u32) -> (TokenKind, Option<TokenValue>) {
        self.advance(); // @
        self.advance(); // "
        let mut decoded = String::new();

        loop {
            match self.peek_char() {
                None => {
                    self.diagnostics.report_error(
                        Span::new(start, start + 2),
                        "Unterminated string literal",
                    );
                    break;
                }
                Some('"') => {
                    self.advance();
                    if self.peek_char() == Some('"') {
                        self.advance();
                        decoded.push('"');
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    decoded.push(c);
                }
            }
        }

        (
            TokenKind::StringLiteral,
            Some(TokenValue::String(decoded.into())),
        )
    }

    /// Decodes an escape sequence, reporting unrecognized ones.
    ///
    /// Supported: `\' \" \\ \0 \a \b \f \n \r \t \v`, `\xH{1,4}`,
    /// `\uHHHH`, and `\UHHHHHHHH` (≤ U+10FFFF).
    fn scan_escape(&mut self) -> Option<char> {
        let escape_start = self.current_position();
        self.advance(); // backslash

        let decoded = match self.advance() {
            Some('\'') => Some('\''),
            Some('"') => Some('"'),
            Some('\\') => Some('\\'),
            Some('0') => Some('\0'),
            Some('a') => Some('\x07'),
            Some('b') => Some('\x08'),
            Some('f') => Some('\x0C'),
            Some('n') => Some('\n'),
            Some('r') => Some('\r'),
            Some('t') => Some('\t'),
            Some('v') => Some('\x0B'),
            Some('x') => self.scan_hex_escape(1, 4),
            Some('u') => self.scan_hex_escape(4, 4),
            Some('U') => self.scan_hex_escape(8, 8),
            _ => None,
        };

        if decoded.is_none() {
            self.diagnostics.report_error(
                self.span_from(escape_start),
                "Unrecognized escape sequence",
            );
        }
        decoded
    }

    /// Scans between `min` and `max` hex digits and converts them to a
    /// character.
    fn scan_hex_escape(&mut self, min: usize, max: usize) -> Option<char> {
        let mut value: u32 = 0;
        let mut count = 0;
        while count < max {
            let Some(digit) = self.peek_char().and_then(|c| c.to_digit(16)) else {
                break;
            };
            self.advance();
            value = value.wrapping_mul(16).wrapping_add(digit);
            count += 1;
        }
        if count < min {
            return None;
        }
        char::from_u32(value)
    }
}

fn decode_integer(digits: &str, radix: u32, suffix: NumericSuffix) -> Option<TokenValue> {
    let value = u64::from_str_radix(digits, radix).ok()?;
    let decoded = match suffix {
        NumericSuffix::None => {
            if let Ok(small) = i32::try_from(value) {
                TokenValue::Int32(small)
            } else if let Ok(medium) = i64::try_from(value) {
                TokenValue::Int64(medium)
            } else {
                TokenValue::UInt64(value)
            }
        }
        NumericSuffix::Long => match i64::try_from(value) {
            Ok(long) => TokenValue::Int64(long),
            Err(_) => TokenValue::UInt64(value),
        },
        NumericSuffix::Unsigned | NumericSuffix::UnsignedLong => TokenValue::UInt64(value),
        NumericSuffix::Single | NumericSuffix::Double | NumericSuffix::Decimal => return None,
    };
    Some(decoded)
}

fn decode_real(literal: &str, suffix: NumericSuffix) -> Option<TokenValue> {
    match suffix {
        NumericSuffix::Single => literal.parse::<f32>().ok().map(TokenValue::Single),
        NumericSuffix::Decimal => literal.parse::<f64>().ok().map(TokenValue::Decimal),
        _ => literal.parse::<f64>().ok().map(TokenValue::Double),
    }
}
