//! Errors raised while loading, compiling or rendering views.

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use source_map::Span;
use view_expr::EvalError;
use view_parser::{CompileError, CompileErrorCode};

/// Result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// An error raised by the view engine.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// A path-based template could not be located by the loader.
    #[error("View {path} not found")]
    TemplateNotFound { path: Utf8PathBuf },

    /// Unbalanced tags or unterminated delimiters.
    #[error("Malformed template: {0}")]
    MalformedTemplate(#[source] CompileError),

    /// A directive placed where it cannot apply.
    #[error("Invalid element: {0}")]
    ElementWasInvalid(#[source] CompileError),

    /// A component tag with no registered component.
    #[error("Unknown view component <{name}>")]
    ComponentNotFound { name: SmolStr },

    /// The expression evaluator failed; passed through unchanged.
    #[error(transparent)]
    Expression(#[from] EvalError),

    /// Component expansion nested deeper than the configured limit.
    #[error("View component <{name}> nested more than {depth} levels deep")]
    RecursiveComponent { name: SmolStr, depth: usize },

    /// Elements and components, counted across component boundaries, nested
    /// deeper than the configured limit.
    #[error("<{tag}> is nested more than {depth} levels deep")]
    NestedTooDeeply { tag: SmolStr, depth: usize },

    /// Two application components registered under one name.
    #[error("View component <{name}> is defined twice: in {first} and in {second}")]
    DuplicateComponent {
        name: SmolStr,
        first: String,
        second: String,
    },

    #[error("Failed to read {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ViewError {
    /// The compile error behind a malformed or invalid template.
    pub fn compile_error(&self) -> Option<&CompileError> {
        match self {
            Self::MalformedTemplate(err) | Self::ElementWasInvalid(err) => Some(err),
            _ => None,
        }
    }

    /// Source span of the error, when it points into a template.
    pub fn span(&self) -> Option<Span> {
        self.compile_error().map(|err| err.span)
    }

    /// A short, stable identifier for the kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound { .. } => "template-not-found",
            Self::MalformedTemplate(_) => CompileErrorCode::MalformedTemplate.as_str(),
            Self::ElementWasInvalid(_) => CompileErrorCode::ElementWasInvalid.as_str(),
            Self::ComponentNotFound { .. } => "component-not-found",
            Self::Expression(_) => "expression",
            Self::RecursiveComponent { .. } => "recursive-component",
            Self::NestedTooDeeply { .. } => "nested-too-deeply",
            Self::DuplicateComponent { .. } => "duplicate-component",
            Self::Io { .. } => "io",
        }
    }
}

impl From<CompileError> for ViewError {
    fn from(err: CompileError) -> Self {
        match err.code {
            CompileErrorCode::MalformedTemplate => Self::MalformedTemplate(err),
            CompileErrorCode::ElementWasInvalid => Self::ElementWasInvalid(err),
        }
    }
}
