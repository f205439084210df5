//! Parser error types.

use serde::Serialize;

use crate::lexer::Span;

/// Whether a statement failed to match the grammar, or matched a construct
/// that is recognized but not handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// The text does not match the supported grammar.
    Syntax,
    /// The text is valid SQLite but uses a construct this crate does not model.
    Unsupported,
}

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} at position {}..{}", span.start, span.end)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The source text of the token found instead.
    pub found: Option<String>,
    /// Syntax error or unsupported construct.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a new syntax error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
            kind: ParseErrorKind::Syntax,
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        let found: String = found.into();
        Self {
            message: format!("Unexpected token: expected {expected}, found '{found}'"),
            span,
            expected: Some(expected),
            found: Some(found),
            kind: ParseErrorKind::Syntax,
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            message: format!("Unexpected end of input: expected {expected}"),
            span,
            expected: Some(expected),
            found: None,
            kind: ParseErrorKind::Syntax,
        }
    }

    /// Creates an error for a recognized but unhandled construct.
    #[must_use]
    pub fn unsupported(detail: impl Into<String>, span: Span) -> Self {
        Self {
            message: detail.into(),
            span,
            expected: None,
            found: None,
            kind: ParseErrorKind::Unsupported,
        }
    }

    /// Returns true if this error reports an unsupported construct.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.kind == ParseErrorKind::Unsupported
    }
}
