//! Parse errors.
//!
//! Parse failures are reported separately from checker diagnostics: a
//! program that does not parse never reaches the checker, so these are the
//! "checker-invocation failure" channel rather than `Diagnostic` values.

use cairn_common::span::Span;

/// A syntax error with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "syntax error [{}]: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}
