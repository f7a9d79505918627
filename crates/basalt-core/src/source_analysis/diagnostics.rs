// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The diagnostic log.
//!
//! Diagnostics accumulate in an append-only [`Diagnostics`] log owned by
//! the caller and threaded through the lexer and parser. Speculative
//! parses open a [`Suppression`] checkpoint before trying a candidate
//! interpretation; rolling the checkpoint back discards every diagnostic
//! reported since, so a rejected speculation leaves no trace.

use ecow::EcoString;

use super::Span;

/// A diagnostic message (error or warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The source location.
    pub span: Span,
    /// The message text.
    pub message: EcoString,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }

    /// Returns the byte offset the diagnostic points at.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.span.start()
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A warning that should be addressed.
    Warning,
    /// An error that prevents compilation.
    Error,
}

/// An opaque checkpoint over the diagnostic log.
///
/// Created by [`Diagnostics::suppress`]; passing it back to
/// [`Diagnostics::restore`] truncates the log to its length at checkpoint
/// time. Dropping a `Suppression` without restoring commits the
/// diagnostics reported since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suppression(usize);

/// An append-only log of diagnostics with suppression checkpoints.
///
/// # Examples
///
/// ```
/// use basalt_core::source_analysis::{Diagnostics, Span};
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.report_error(Span::empty(0), "Identifier expected");
///
/// let suppression = diagnostics.suppress();
/// diagnostics.report_error(Span::empty(4), "provisional");
/// diagnostics.restore(suppression);
///
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty diagnostic log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error diagnostic.
    pub fn report_error(&mut self, span: Span, message: impl Into<EcoString>) {
        self.items.push(Diagnostic::error(message, span));
    }

    /// Appends a warning diagnostic.
    pub fn report_warning(&mut self, span: Span, message: impl Into<EcoString>) {
        self.items.push(Diagnostic::warning(message, span));
    }

    /// Opens a suppression checkpoint at the current log length.
    #[must_use]
    pub fn suppress(&self) -> Suppression {
        Suppression(self.items.len())
    }

    /// Truncates the log back to the given checkpoint, discarding every
    /// diagnostic reported since.
    pub fn restore(&mut self, suppression: Suppression) {
        self.items.truncate(suppression.0);
    }

    /// Returns the number of diagnostics in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if the log contains at least one error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Iterates over the diagnostics in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Returns the diagnostics as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_and_inspect() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.report_error(Span::new(0, 3), "Type expected");
        diagnostics.report_warning(Span::new(4, 5), "shadowed");

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.iter().next().unwrap().position(), 0);
    }

    #[test]
    fn suppression_restores_log_length() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_error(Span::empty(0), "kept");
        let before = diagnostics.len();

        let suppression = diagnostics.suppress();
        diagnostics.report_error(Span::empty(1), "discarded");
        diagnostics.report_error(Span::empty(2), "also discarded");
        diagnostics.restore(suppression);

        assert_eq!(diagnostics.len(), before);
        assert_eq!(diagnostics.iter().next().unwrap().message, "kept");
    }

    #[test]
    fn dropped_suppression_commits() {
        let mut diagnostics = Diagnostics::new();
        let _suppression = diagnostics.suppress();
        diagnostics.report_error(Span::empty(0), "committed");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn nested_suppressions_restore_in_reverse_order() {
        let mut diagnostics = Diagnostics::new();
        let outer = diagnostics.suppress();
        diagnostics.report_error(Span::empty(0), "a");
        let inner = diagnostics.suppress();
        diagnostics.report_error(Span::empty(1), "b");

        diagnostics.restore(inner);
        assert_eq!(diagnostics.len(), 1);
        diagnostics.restore(outer);
        assert!(diagnostics.is_empty());
    }
}
