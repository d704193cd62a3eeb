//! Built-in template functions.

use crate::error::{EvalError, EvalResult};
use crate::eval::ExpressionEvaluator;
use crate::ops::loose_equals;
use crate::value::Value;
use std::ops::RangeInclusive;

/// Register the default function table.
pub(crate) fn register_builtins(evaluator: &mut ExpressionEvaluator) {
    evaluator.register_function("strtoupper", |args| {
        arity("strtoupper", args, 1..=1)?;
        Ok(Value::String(args[0].to_string().to_uppercase()))
    });
    evaluator.register_function("strtolower", |args| {
        arity("strtolower", args, 1..=1)?;
        Ok(Value::String(args[0].to_string().to_lowercase()))
    });
    evaluator.register_function("ucfirst", |args| {
        arity("ucfirst", args, 1..=1)?;
        Ok(Value::String(map_first_char(&args[0].to_string(), |c| {
            c.to_uppercase().collect()
        })))
    });
    evaluator.register_function("lcfirst", |args| {
        arity("lcfirst", args, 1..=1)?;
        Ok(Value::String(map_first_char(&args[0].to_string(), |c| {
            c.to_lowercase().collect()
        })))
    });
    evaluator.register_function("trim", |args| {
        arity("trim", args, 1..=1)?;
        Ok(Value::String(args[0].to_string().trim().to_string()))
    });
    evaluator.register_function("strlen", |args| {
        arity("strlen", args, 1..=1)?;
        Ok(Value::from(args[0].to_string().len()))
    });
    evaluator.register_function("count", |args| {
        arity("count", args, 1..=1)?;
        match &args[0] {
            Value::List(items) => Ok(Value::from(items.len())),
            Value::Map(entries) => Ok(Value::from(entries.len())),
            other => Err(EvalError::Type(format!(
                "count(): Argument #1 must be of type array, {} given",
                other.type_name()
            ))),
        }
    });
    evaluator.register_function("implode", |args| {
        arity("implode", args, 1..=2)?;
        let (separator, pieces) = match args {
            [separator, pieces] => (separator.to_string(), pieces),
            _ => (String::new(), &args[0]),
        };
        let Some(entries) = pieces.entries() else {
            return Err(EvalError::Type(format!(
                "implode(): Argument must be of type array, {} given",
                pieces.type_name()
            )));
        };
        let joined = entries
            .iter()
            .map(|(_, item)| item.to_string())
            .collect::<Vec<_>>()
            .join(&separator);
        Ok(Value::String(joined))
    });
    evaluator.register_function("json_encode", |args| {
        arity("json_encode", args, 1..=1)?;
        Ok(Value::String(args[0].to_json().to_string()))
    });
    evaluator.register_function("in_array", |args| {
        arity("in_array", args, 2..=2)?;
        let found = args[1]
            .entries()
            .unwrap_or_default()
            .iter()
            .any(|(_, item)| loose_equals(item, &args[0]));
        Ok(Value::Bool(found))
    });
    evaluator.register_function("empty", |args| {
        arity("empty", args, 1..=1)?;
        Ok(Value::Bool(!args[0].is_truthy()))
    });
    evaluator.register_function("isset", |args| {
        arity("isset", args, 1..=usize::MAX)?;
        Ok(Value::Bool(args.iter().all(|arg| !arg.is_null())))
    });
    evaluator.register_function("is_null", |args| {
        arity("is_null", args, 1..=1)?;
        Ok(Value::Bool(args[0].is_null()))
    });
}

/// Check the number of arguments passed to a function.
pub fn arity(function: &str, args: &[Value], expected: RangeInclusive<usize>) -> EvalResult<()> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let expected = match (*expected.start(), *expected.end()) {
        (min, usize::MAX) => format!("at least {}", min),
        (min, max) if min == max => min.to_string(),
        (min, max) => format!("{} to {}", min, max),
    };
    Err(EvalError::ArgumentCount {
        function: function.to_string(),
        expected,
        found: args.len(),
    })
}

fn map_first_char(s: &str, f: impl Fn(char) -> String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}
