//! Expression evaluation.

use crate::error::{EvalError, EvalResult};
use crate::functions;
use crate::ops;
use crate::parser::{parse_expression, ArrayItem, BinaryOp, Expr, UnaryOp};
use crate::scope::Scope;
use crate::value::Value;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Evaluates the expressions found in directives and interpolations.
///
/// Implementations must resolve unbound names to [`Value::Null`] rather than
/// failing, so that `$x ?? 'default'` works for absent variables.
pub trait Evaluator: Send + Sync {
    /// Evaluate `expression` against `scope`.
    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> EvalResult<Value>;
}

/// A function callable from templates.
pub type Function = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

/// The default evaluator.
///
/// Parsed expressions are memoized by source text, so each distinct
/// expression in a template is parsed once.
pub struct ExpressionEvaluator {
    functions: FxHashMap<SmolStr, Function>,
    parsed: RwLock<FxHashMap<String, Arc<Expr>>>,
}

impl ExpressionEvaluator {
    /// Create an evaluator with the built-in function table.
    pub fn new() -> Self {
        let mut evaluator = Self::without_builtins();
        functions::register_builtins(&mut evaluator);
        evaluator
    }

    /// Create an evaluator with no functions at all.
    pub fn without_builtins() -> Self {
        Self {
            functions: FxHashMap::default(),
            parsed: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register (or replace) a function. Names are case-insensitive.
    pub fn register_function<F>(&mut self, name: impl AsRef<str>, function: F)
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        let name = SmolStr::from(name.as_ref().to_ascii_lowercase());
        self.functions.insert(name, Arc::new(function));
    }

    /// Check whether a function is registered.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions
            .contains_key(name.to_ascii_lowercase().as_str())
    }

    /// Parse an expression, reusing an earlier parse of the same source.
    pub fn parse(&self, expression: &str) -> EvalResult<Arc<Expr>> {
        if let Some(expr) = self
            .parsed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(expression)
        {
            return Ok(Arc::clone(expr));
        }

        tracing::trace!(expression, "parsing view expression");
        let expr = Arc::new(parse_expression(expression)?);
        self.parsed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(expression.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    /// Evaluate an already parsed expression.
    pub fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => Ok(scope.get(name)),
            Expr::Property { target, name } => Ok(self.eval(target, scope)?.property(name)),
            Expr::Index { target, index } => {
                let target = self.eval(target, scope)?;
                let index = self.eval(index, scope)?;
                Ok(target.index(&index))
            }
            Expr::Call { function, args } => {
                let callee = self
                    .functions
                    .get(function)
                    .ok_or_else(|| EvalError::UnknownFunction {
                        name: function.to_string(),
                    })?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<EvalResult<Vec<_>>>()?;
                callee(args.as_slice())
            }
            Expr::Array(items) => self.eval_array(items, scope),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Negate => ops::negate(&value),
                }
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.eval(condition, scope)?;
                match (condition.is_truthy(), then) {
                    (true, Some(then)) => self.eval(then, scope),
                    (true, None) => Ok(condition),
                    (false, _) => self.eval(otherwise, scope),
                }
            }
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr, scope: &Scope<'_>) -> EvalResult<Value> {
        // Short-circuiting operators evaluate the right side lazily.
        match op {
            BinaryOp::Coalesce => {
                let left = self.eval(left, scope)?;
                return if left.is_null() {
                    self.eval(right, scope)
                } else {
                    Ok(left)
                };
            }
            BinaryOp::Or => {
                let result = self.eval(left, scope)?.is_truthy() || self.eval(right, scope)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            BinaryOp::And => {
                let result = self.eval(left, scope)?.is_truthy() && self.eval(right, scope)?.is_truthy();
                return Ok(Value::Bool(result));
            }
            _ => {}
        }

        let l = self.eval(left, scope)?;
        let r = self.eval(right, scope)?;
        let value = match op {
            BinaryOp::Equal => Value::Bool(ops::loose_equals(&l, &r)),
            BinaryOp::NotEqual => Value::Bool(!ops::loose_equals(&l, &r)),
            BinaryOp::Identical => Value::Bool(ops::strict_equals(&l, &r)),
            BinaryOp::NotIdentical => Value::Bool(!ops::strict_equals(&l, &r)),
            BinaryOp::Less => Value::Bool(ops::compare(&l, &r).is_lt()),
            BinaryOp::LessEqual => Value::Bool(ops::compare(&l, &r).is_le()),
            BinaryOp::Greater => Value::Bool(ops::compare(&l, &r).is_gt()),
            BinaryOp::GreaterEqual => Value::Bool(ops::compare(&l, &r).is_ge()),
            BinaryOp::Concat => Value::String(format!("{}{}", l, r)),
            _ => ops::arithmetic(op, &l, &r)?,
        };
        Ok(value)
    }

    fn eval_array(&self, items: &[ArrayItem], scope: &Scope<'_>) -> EvalResult<Value> {
        if items.iter().all(|item| item.key.is_none()) {
            let values = items
                .iter()
                .map(|item| self.eval(&item.value, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            return Ok(Value::List(values));
        }

        let mut entries = IndexMap::new();
        let mut next_index = 0i64;
        for item in items {
            let key = match &item.key {
                Some(key) => self.eval(key, scope)?.to_string(),
                None => {
                    let key = next_index.to_string();
                    next_index += 1;
                    key
                }
            };
            entries.insert(key, self.eval(&item.value, scope)?);
        }
        Ok(Value::Map(entries))
    }
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("ExpressionEvaluator")
            .field("functions", &functions)
            .finish_non_exhaustive()
    }
}

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> EvalResult<Value> {
        let expr = self.parse(expression)?;
        self.eval(&expr, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scope() -> Scope<'static> {
        let mut scope = Scope::new();
        scope.set("name", "world");
        scope.set(
            "items",
            Value::from(json!([
                {"name": "A", "show": true},
                {"name": "B", "show": false},
            ])),
        );
        scope.set("html", Value::html("<b>x</b>"));
        scope.set("count", 3);
        scope
    }

    fn eval(source: &str) -> Value {
        ExpressionEvaluator::new().evaluate(source, &scope()).unwrap()
    }

    #[test]
    fn test_variables() {
        assert_eq!(eval("$name"), Value::from("world"));
        assert_eq!(eval("$this->name"), Value::from("world"));
        assert_eq!(eval("$missing"), Value::Null);
        assert_eq!(eval("$missing->deep?->chain[0]"), Value::Null);
    }

    #[test]
    fn test_property_and_index() {
        assert_eq!(eval("$items[1]->name"), Value::from("B"));
        assert_eq!(eval("$items[0]['show']"), Value::Bool(true));
        assert_eq!(eval("$items[5]->name ?? 'none'"), Value::from("none"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(eval("$count * 2 + 1"), Value::Int(7));
        assert_eq!(eval("'Hello, ' . $name . '!'"), Value::from("Hello, world!"));
        assert_eq!(eval("$count > 2 && $name == 'world'"), Value::Bool(true));
        assert_eq!(eval("$missing or false"), Value::Bool(false));
        assert_eq!(eval("$count === '3'"), Value::Bool(false));
        assert_eq!(eval("$count == '3'"), Value::Bool(true));
        assert_eq!(eval("!$items"), Value::Bool(false));
        assert_eq!(eval("-$count"), Value::Int(-3));
        assert_eq!(eval("$missing ?: 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("$count ? 'yes' : 'no'"), Value::from("yes"));
    }

    #[test]
    fn test_exponent_literals() {
        assert_eq!(eval("1e20"), Value::Float(1e20));
        assert_eq!(eval("2.5e-1 < 1"), Value::Bool(true));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval("true || unknown()"), Value::Bool(true));
        assert_eq!(eval("$name ?? 1 / 0"), Value::from("world"));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("strtoupper($name)"), Value::from("WORLD"));
        assert_eq!(eval("ucfirst($name)"), Value::from("World"));
        assert_eq!(eval("count($items)"), Value::Int(2));
        assert_eq!(eval("implode(', ', ['a', 'b'])"), Value::from("a, b"));
        assert_eq!(eval("json_encode(['a' => 1])"), Value::from(r#"{"a":1}"#));
        assert_eq!(eval("isset($name, $missing)"), Value::Bool(false));
        assert_eq!(eval("empty($missing)"), Value::Bool(true));
        assert_eq!(eval("in_array('2', [1, 2])"), Value::Bool(true));
    }

    #[test]
    fn test_html_survives_evaluation() {
        assert_eq!(eval("$html"), Value::html("<b>x</b>"));
        assert_eq!(eval("$html . ''"), Value::from("<b>x</b>"));
    }

    #[test]
    fn test_errors() {
        let evaluator = ExpressionEvaluator::new();
        let scope = scope();
        assert_eq!(
            evaluator.evaluate("nope($name)", &scope),
            Err(EvalError::UnknownFunction {
                name: "nope".to_string()
            })
        );
        assert_eq!(
            evaluator.evaluate("count()", &scope).unwrap_err().to_string(),
            "count() expects 1 argument(s), 0 given"
        );
        assert_eq!(
            evaluator.evaluate("count($name)", &scope).unwrap_err().to_string(),
            "count(): Argument #1 must be of type array, string given"
        );
        assert!(matches!(
            evaluator.evaluate("$name +", &scope),
            Err(EvalError::Syntax { .. })
        ));
    }

    #[test]
    fn test_custom_functions() {
        let mut evaluator = ExpressionEvaluator::without_builtins();
        assert!(!evaluator.has_function("strtoupper"));
        evaluator.register_function("Shout", |args| {
            Ok(Value::String(format!("{}!", args.first().cloned().unwrap_or_default())))
        });
        assert!(evaluator.has_function("shout"));
        assert_eq!(
            evaluator.evaluate("shout($name)", &scope()).unwrap(),
            Value::from("world!")
        );
    }

    #[test]
    fn test_parse_is_memoized() {
        let evaluator = ExpressionEvaluator::new();
        let first = evaluator.parse("$a . $b").unwrap();
        let second = evaluator.parse("$a . $b").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
