//! Error and diagnostic types
//!
//! Errors are raised as [`FrontendError`] inside the lexer, parser and
//! transformer, and surface to callers as [`Diagnostic`] records. A failed
//! parse returns [`Diagnostics`]; nothing is logged and dropped.

use crate::lexer::{Span, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// FRONTEND ERRORS
// ============================================================================

/// Errors raised while turning source text into an AST.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrontendError {
    /// Invalid character or unterminated token.
    #[error("{message}")]
    Lex { message: String, span: Span },

    /// Token stream does not match any grammar production.
    #[error("{message}")]
    Syntax {
        message: String,
        found: String,
        expected: Vec<String>,
        span: Span,
    },

    /// Post-parse, non-fatal finding.
    #[error("{message}")]
    Structural { message: String, span: Span },

    /// The transformer produced something outside the AST contracts.
    #[error("internal error: {message}")]
    Internal { message: String, span: Span },
}

impl FrontendError {
    /// Syntax error for an unexpected token, listing what would have been accepted.
    pub fn unexpected(token: &Token, expected: &[TokenKind]) -> Self {
        let expected: Vec<String> = expected.iter().map(|k| k.describe().to_string()).collect();
        Self::unexpected_with(token, expected)
    }

    /// Like [`FrontendError::unexpected`] for expectations that are not token kinds
    /// (e.g. contextual identifiers).
    pub fn unexpected_with(token: &Token, expected: Vec<String>) -> Self {
        let found = token.found();
        let message = match expected.len() {
            0 => format!("unexpected {}", found),
            1 => format!("unexpected {}, expected {}", found, expected[0]),
            _ => format!("unexpected {}, expected one of: {}", found, expected.join(", ")),
        };
        FrontendError::Syntax {
            message,
            found,
            expected,
            span: token.span,
        }
    }

    /// Syntax error with a custom message anchored at `token`.
    pub fn syntax(token: &Token, message: impl Into<String>, expected: &[TokenKind]) -> Self {
        FrontendError::Syntax {
            message: message.into(),
            found: token.found(),
            expected: expected.iter().map(|k| k.describe().to_string()).collect(),
            span: token.span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        FrontendError::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        FrontendError::Structural {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            FrontendError::Lex { span, .. }
            | FrontendError::Syntax { span, .. }
            | FrontendError::Structural { span, .. }
            | FrontendError::Internal { span, .. } => *span,
        }
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    LexError,
    SyntaxError,
    StructuralWarning,
    InternalError,
}

/// A structured error or warning with a source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    /// What was found, for syntax errors.
    pub found: Option<String>,
    /// Token kinds that would have been accepted, for syntax errors.
    pub expected: Vec<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<FrontendError> for Diagnostic {
    fn from(err: FrontendError) -> Self {
        let message = err.to_string();
        match err {
            FrontendError::Lex { span, .. } => Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::LexError,
                message,
                span,
                found: None,
                expected: Vec::new(),
            },
            FrontendError::Syntax {
                found,
                expected,
                span,
                ..
            } => Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::SyntaxError,
                message,
                span,
                found: Some(found),
                expected,
            },
            FrontendError::Structural { span, .. } => Diagnostic {
                severity: Severity::Warning,
                kind: DiagnosticKind::StructuralWarning,
                message,
                span,
                found: None,
                expected: Vec::new(),
            },
            FrontendError::Internal { span, .. } => Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::InternalError,
                message,
                span,
                found: None,
                expected: Vec::new(),
            },
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            DiagnosticKind::LexError => "lex error",
            DiagnosticKind::SyntaxError => "syntax error",
            DiagnosticKind::StructuralWarning => "warning",
            DiagnosticKind::InternalError => "internal error",
        };
        write!(
            f,
            "{} at line {}, column {}: {}",
            label, self.span.line, self.span.column, self.message
        )
    }
}

/// The diagnostics of a rejected parse. Always contains at least one error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl From<FrontendError> for Diagnostics {
    fn from(err: FrontendError) -> Self {
        Diagnostics(vec![err.into()])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_string(),
            span: Span {
                start: 4,
                end: 4 + lexeme.len(),
                line: 2,
                column: 5,
            },
        }
    }

    #[test]
    fn test_unexpected_lists_expected_kinds() {
        let err = FrontendError::unexpected(
            &token(TokenKind::Identifier, "foo"),
            &[TokenKind::Colon, TokenKind::Newline],
        );
        let diagnostic = Diagnostic::from(err);

        assert_eq!(diagnostic.kind, DiagnosticKind::SyntaxError);
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.found.as_deref(), Some("identifier `foo`"));
        assert_eq!(diagnostic.expected, vec!["':'", "newline"]);
        assert_eq!(
            diagnostic.message,
            "unexpected identifier `foo`, expected one of: ':', newline"
        );
        assert_eq!(diagnostic.span.line, 2);
    }

    #[test]
    fn test_structural_is_warning() {
        let diagnostic = Diagnostic::from(FrontendError::structural("unused", Span::default()));
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert!(!diagnostic.is_error());
    }

    #[test]
    fn test_diagnostics_display_has_location() {
        let diagnostics = Diagnostics::from(FrontendError::Lex {
            message: "unterminated string literal".to_string(),
            span: Span {
                start: 6,
                end: 19,
                line: 1,
                column: 7,
            },
        });
        assert_eq!(
            diagnostics.to_string(),
            "lex error at line 1, column 7: unterminated string literal"
        );
    }
}
