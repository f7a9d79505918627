// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Boundary error types.
//!
//! The lexer and parser report plain [`Diagnostic`] values on the hot
//! path; they never abort. [`SyntaxError`] wraps a diagnostic for callers
//! that want [`miette`]-rendered output with source labels.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use super::{Diagnostic, Severity, Span};

/// A syntax diagnostic in renderable form.
///
/// # Examples
///
/// ```
/// use basalt_core::source_analysis::{Diagnostic, Span, SyntaxError};
///
/// let error = SyntaxError::from(Diagnostic::error("Identifier expected", Span::empty(6)));
/// assert_eq!(error.to_string(), "Identifier expected");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("{message}")]
pub struct SyntaxError {
    /// The message text.
    pub message: String,
    /// The severity the diagnostic was reported with.
    pub severity: Severity,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
}

impl From<Diagnostic> for SyntaxError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            message: diagnostic.message.to_string(),
            severity: diagnostic.severity,
            span: diagnostic.span,
        }
    }
}

impl From<&Diagnostic> for SyntaxError {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self::from(diagnostic.clone())
    }
}
