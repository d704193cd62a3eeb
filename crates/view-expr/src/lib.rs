//! Expressions for view templates.
//!
//! This crate holds the runtime side of template data: the [`Value`] model,
//! chained [`Scope`] frames, and the [`Evaluator`] trait with a default
//! implementation of a small PHP-flavoured expression language.
//!
//! ```
//! use view_expr::{Evaluator, ExpressionEvaluator, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("name", "world");
//!
//! let evaluator = ExpressionEvaluator::new();
//! let value = evaluator.evaluate("strtoupper($name) ?? 'nobody'", &scope).unwrap();
//! assert_eq!(value, Value::from("WORLD"));
//! ```

pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod scope;
pub mod value;

pub use error::{EvalError, EvalResult};
pub use eval::{Evaluator, ExpressionEvaluator, Function};
pub use parser::{parse_expression, Expr};
pub use scope::{Bindings, Scope};
pub use value::{Number, Value};
