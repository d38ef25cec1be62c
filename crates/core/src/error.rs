//! Error taxonomy of the front end.
//!
//! Three kinds cover everything translation can report: a recognized
//! structural pattern that failed to match (`Syntax`), a structurally
//! valid construct that breaks a context rule (`Semantic`), and a
//! violated pass invariant (`Internal`). Errors propagate unmodified to
//! the stencil boundary; there is no local recovery.

use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    /// Wrong statement shape, wrong operator, wrong literal kind.
    #[error("syntax error: {message}")]
    Syntax { message: String, span: Option<Span> },
    /// Undeclared name, illegal shadowing, invalid chain qualifier,
    /// illegal nesting, malformed vertical offset.
    #[error("semantic error: {message}")]
    Semantic { message: String, span: Option<Span> },
    /// A pass invariant did not hold; always a front-end bug, never a
    /// user error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TranslationError {
    pub fn syntax(message: impl Into<String>) -> TranslationError {
        TranslationError::Syntax { message: message.into(), span: None }
    }

    pub fn syntax_at(message: impl Into<String>, span: Span) -> TranslationError {
        TranslationError::Syntax { message: message.into(), span: Some(span) }
    }

    pub fn semantic(message: impl Into<String>) -> TranslationError {
        TranslationError::Semantic { message: message.into(), span: None }
    }

    pub fn semantic_at(message: impl Into<String>, span: Span) -> TranslationError {
        TranslationError::Semantic { message: message.into(), span: Some(span) }
    }

    pub fn internal(message: impl Into<String>) -> TranslationError {
        TranslationError::Internal { message: message.into() }
    }

    /// The source range of the offending node, when one was recovered.
    pub fn span(&self) -> Option<Span> {
        match self {
            TranslationError::Syntax { span, .. } | TranslationError::Semantic { span, .. } => {
                *span
            }
            TranslationError::Internal { .. } => None,
        }
    }

    /// Attaches `span` if the error does not already carry one. Used by
    /// enclosing statements/expressions to pin down errors raised deep
    /// inside span-less helpers.
    pub fn with_span(self, span: Span) -> TranslationError {
        match self {
            TranslationError::Syntax { message, span: None } => {
                TranslationError::Syntax { message, span: Some(span) }
            }
            TranslationError::Semantic { message, span: None } => {
                TranslationError::Semantic { message, span: Some(span) }
            }
            other => other,
        }
    }
}
