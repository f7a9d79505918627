// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Immutable source buffers.
//!
//! [`SourceText`] owns the full text of a compilation unit together with a
//! sorted table of line-start offsets, so byte offsets from [`Span`]s can
//! be mapped to 1-based `(line, column)` positions in O(log n).

use ecow::EcoString;

use super::Span;

/// An immutable source buffer with a line-start index.
///
/// # Examples
///
/// ```
/// use basalt_core::source_analysis::SourceText;
///
/// let source = SourceText::from("class C\n{\n}\n");
/// assert_eq!(source.len(), 12);
/// assert_eq!(source.line_position(8).line, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: EcoString,
    line_starts: Vec<u32>,
}

/// A 1-based line and column position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinePosition {
    /// The 1-based line number.
    pub line: u32,
    /// The 1-based byte column within the line.
    pub column: u32,
}

impl SourceText {
    /// Creates a source buffer from the given text, computing the
    /// line-start table.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    #[must_use]
    pub fn new(text: impl Into<EcoString>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        Self { text, line_starts }
    }

    /// Returns the length of the source in bytes.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    /// Returns true if the source is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the full source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the character starting at the given byte offset, if any.
    #[must_use]
    pub fn char_at(&self, position: u32) -> Option<char> {
        self.text.get(position as usize..)?.chars().next()
    }

    /// Returns the text covered by the given span.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds or does not fall on character
    /// boundaries.
    #[must_use]
    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.as_range()]
    }

    /// Returns the number of lines (at least one, even for empty input).
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the line table is bounded by the 4GB source limit"
    )]
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Returns the 0-based index of the line containing `position`.
    ///
    /// Positions past the end of the source map to the last line.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the line table is bounded by the 4GB source limit"
    )]
    #[must_use]
    pub fn line_index(&self, position: u32) -> u32 {
        let index = match self.line_starts.binary_search(&position) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        index as u32
    }

    /// Returns the byte offset at which the given 0-based line starts.
    #[must_use]
    pub fn line_start(&self, line_index: u32) -> u32 {
        self.line_starts[line_index as usize]
    }

    /// Maps a byte offset to a 1-based `(line, column)` position.
    #[must_use]
    pub fn line_position(&self, position: u32) -> LinePosition {
        let line_index = self.line_index(position);
        let column = position - self.line_starts[line_index as usize] + 1;
        LinePosition {
            line: line_index + 1,
            column,
        }
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for SourceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
