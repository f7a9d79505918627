// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The lossless Basalt syntax tree.
//!
//! Every node is a plain record of [`Token`]s and child nodes; families
//! of related nodes (declarations, statements, expressions, types) are
//! tagged unions with one variant per node kind. Nodes are structurally
//! immutable and compare by value.
//!
//! The tree is *lossless*: concatenating the leading trivia, text, and
//! trailing trivia of its terminal tokens - [`SyntaxNode::full_text`] -
//! reproduces the original source byte for byte, even in the presence of
//! syntax errors. Error recovery shows up in the tree as zero-width
//! synthesized tokens and as skipped-token trivia, never as missing
//! structure.
//!
//! # Example
//!
//! ```
//! use basalt_core::syntax_tree::{SyntaxNode, SyntaxTree};
//!
//! let text = "class Point { int x; }";
//! let tree = SyntaxTree::parse(text);
//! assert_eq!(tree.root().full_text(), text);
//! ```

mod declarations;
mod expressions;
mod statements;
mod types;

pub use declarations::*;
pub use expressions::*;
pub use statements::*;
pub use types::*;

use crate::source_analysis::{Diagnostics, Lexer, Parser, SourceText, Span, Token};

/// In-order access to the terminal tokens of a tree node.
///
/// `for_each_token` is the one required method; span and full-text
/// reconstruction derive from it. Tokens are visited in source order,
/// so implementations simply walk their fields in declaration order.
pub trait SyntaxNode {
    /// Calls `f` for every terminal token of this node, in source order.
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token));

    /// Returns the first terminal token of this node.
    fn first_token(&self) -> Option<&Token> {
        let mut first = None;
        self.for_each_token(&mut |token| {
            if first.is_none() {
                first = Some(token);
            }
        });
        first
    }

    /// Returns the last terminal token of this node.
    fn last_token(&self) -> Option<&Token> {
        let mut last = None;
        self.for_each_token(&mut |token| last = Some(token));
        last
    }

    /// Returns the span from the first token's text start to the last
    /// token's text end.
    fn span(&self) -> Span {
        match (self.first_token(), self.last_token()) {
            (Some(first), Some(last)) => Span::new(first.position(), last.end_position()),
            _ => Span::empty(0),
        }
    }

    /// Appends the node's full source text, trivia included, to `out`.
    fn write_full_text(&self, out: &mut String) {
        self.for_each_token(&mut |token| token.write_full_text(out));
    }

    /// Returns the node's full source text, trivia included.
    fn full_text(&self) -> String {
        let mut out = String::new();
        self.write_full_text(&mut out);
        out
    }
}

impl SyntaxNode for Token {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        f(self);
    }
}

impl<T: SyntaxNode> SyntaxNode for Box<T> {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        (**self).for_each_token(f);
    }
}

impl<T: SyntaxNode> SyntaxNode for Option<T> {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        if let Some(node) = self {
            node.for_each_token(f);
        }
    }
}

impl<T: SyntaxNode> SyntaxNode for Vec<T> {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        for node in self {
            node.for_each_token(f);
        }
    }
}

/// A list of syntax elements interleaved with separator tokens.
///
/// The separator count is either one less than the element count or, for
/// productions that permit a trailing separator (enum member lists),
/// equal to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatedList<T> {
    /// The list elements, in source order.
    pub elements: Vec<T>,
    /// The separator tokens between (and possibly after) the elements.
    pub separators: Vec<Token>,
}

impl<T> SeparatedList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            separators: Vec::new(),
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// Returns the separator-count invariant:
    /// `separators ∈ {elements − 1, elements}` (zero for an empty list).
    #[must_use]
    pub fn is_well_separated(&self) -> bool {
        if self.elements.is_empty() {
            self.separators.is_empty()
        } else {
            let elements = self.elements.len();
            self.separators.len() == elements - 1 || self.separators.len() == elements
        }
    }
}

impl<T> Default for SeparatedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a SeparatedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: SyntaxNode> SyntaxNode for SeparatedList<T> {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        for (index, element) in self.elements.iter().enumerate() {
            element.for_each_token(f);
            if let Some(separator) = self.separators.get(index) {
                separator.for_each_token(f);
            }
        }
    }
}

/// A parsed compilation unit: source buffer, tree root, and diagnostics.
///
/// This is the front-end entry point of the crate: it builds the source
/// buffer, runs the lexer to completion, hands the token stream to the
/// parser, and keeps the three results together.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: SourceText,
    root: CompilationUnit,
    diagnostics: Diagnostics,
}

impl SyntaxTree {
    /// Lexes and parses the given source text.
    ///
    /// Always succeeds: syntax errors are reported in
    /// [`diagnostics`](Self::diagnostics) and the tree covers every byte
    /// of the input regardless.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let source = SourceText::from(text);
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new(&source, &mut diagnostics).tokenize();
        let root = Parser::new(tokens, &mut diagnostics).parse();
        Self {
            source,
            root,
            diagnostics,
        }
    }

    /// Returns the source buffer.
    #[must_use]
    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Returns the root compilation unit.
    #[must_use]
    pub fn root(&self) -> &CompilationUnit {
        &self.root
    }

    /// Returns the diagnostics reported while lexing and parsing.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
