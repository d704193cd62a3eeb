//! Error types for view template compilation.

use source_map::Span;
use std::fmt;

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// An error that occurred while parsing or validating a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// The span where the error occurred.
    pub span: Span,
    /// The error code.
    pub code: CompileErrorCode,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, span: Span, code: CompileErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// Create a malformed template error.
    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        Self::new(message, span, CompileErrorCode::MalformedTemplate)
    }

    /// Create an unclosed tag error.
    pub fn unclosed_tag(tag: &str, span: Span) -> Self {
        Self::malformed(format!("Unclosed tag: <{}>", tag), span)
    }

    /// Create an unterminated delimiter error.
    pub fn unterminated(opening: &str, closing: &str, span: Span) -> Self {
        Self::malformed(
            format!("Unterminated `{}`: expected a closing `{}`", opening, closing),
            span,
        )
    }

    /// Create an invalid element error naming the offending attribute.
    pub fn invalid_element(attribute: &str, reason: &str, span: Span) -> Self {
        Self::new(
            format!("Invalid `{}` attribute: {}", attribute, reason),
            span,
            CompileErrorCode::ElementWasInvalid,
        )
    }

    /// Check whether this error came from directive validation.
    pub fn is_invalid_element(&self) -> bool {
        self.code == CompileErrorCode::ElementWasInvalid
    }
}

/// Error codes for template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorCode {
    /// Unbalanced tags, unterminated delimiters or an unreadable tag.
    MalformedTemplate,
    /// Illegal directive placement or adjacency.
    ElementWasInvalid,
}

impl CompileErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedTemplate => "malformed-template",
            Self::ElementWasInvalid => "element-was-invalid",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
