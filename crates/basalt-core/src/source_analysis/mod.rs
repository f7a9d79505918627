// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for Basalt source code.
//!
//! This module contains the source buffer, the diagnostic log, the
//! lexer, the token stream, and the parser.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a [`TokenStream`]. Each token
//! carries its byte position, decoded literal value, and attached trivia
//! (whitespace, newlines, comments), so the token sequence reproduces
//! the source exactly.
//!
//! ```
//! use basalt_core::source_analysis::{Diagnostics, Lexer, SourceText, TokenKind};
//!
//! let source = SourceText::from("x + 1");
//! let mut diagnostics = Diagnostics::new();
//! let stream = Lexer::new(&source, &mut diagnostics).tokenize();
//! assert_eq!(stream.len(), 4); // x, +, 1, end-of-file
//! ```
//!
//! # Parsing
//!
//! The [`Parser`] converts a token stream into a
//! [`CompilationUnit`](crate::syntax_tree::CompilationUnit). It is a
//! context-sensitive recursive-descent parser with mandatory error
//! recovery: missing tokens are synthesized, unexpected tokens are
//! skipped into trivia, and a tree is always produced.
//!
//! # Error Handling
//!
//! Neither the lexer nor the parser ever aborts. Problems are reported
//! to the caller-owned [`Diagnostics`] log; [`SyntaxError`] wraps a
//! [`Diagnostic`] for miette-rendered output.

mod diagnostics;
mod error;
mod lexer;
mod parser;
mod source_text;
mod span;
mod token;
mod token_stream;


pub use diagnostics::{Diagnostic, Diagnostics, Severity, Suppression};
pub use error::SyntaxError;
pub use lexer::Lexer;
pub use parser::{Parser, ParserContext};
pub use source_text::{LinePosition, SourceText};
pub use span::Span;
pub use token::{Token, TokenKind, TokenValue, Trivia, TriviaKind};
pub use token_stream::{RestorePoint, TokenStream};
