//! Expression evaluation errors.

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// An error raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The expression could not be parsed.
    #[error("Syntax error in `{expression}` at offset {offset}: {message}")]
    Syntax {
        expression: String,
        offset: usize,
        message: String,
    },

    /// A call to a function missing from the function table.
    #[error("Call to undefined function {name}()")]
    UnknownFunction { name: String },

    /// A function called with the wrong number of arguments.
    #[error("{function}() expects {expected} argument(s), {found} given")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    /// An operator or function applied to a value of the wrong type.
    #[error("{0}")]
    Type(String),

    #[error("Division by zero")]
    DivisionByZero,
}

impl EvalError {
    pub(crate) fn syntax(expression: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            offset,
            message: message.into(),
        }
    }
}
