//! Directive evaluation: which scopes an element's body renders in.
//!
//! The interaction of a conditional and a loop on one tag follows the order
//! the attributes were written in, as recorded by [`DirectiveOrder`]:
//!
//! - `:if` before `:foreach` gates the whole loop. The condition is
//!   evaluated once, in the scope outside the loop, so the loop variable is
//!   not bound yet. A false condition skips the loop and its `:forelse`.
//! - `:foreach` before `:if` filters each iteration. The condition sees the
//!   loop variable; `:forelse` still fires only for an empty iterable.

use crate::error::ViewResult;
use view_expr::{EvalError, Evaluator, Scope};
use view_parser::{Conditional, DirectiveOrder, DirectiveSet, Foreach};

/// What happened to a loop, as seen by a following `:forelse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The element has no `:foreach`.
    NoLoop,
    /// A preceding condition was false, so the loop never started.
    Gated,
    /// The iterable was empty.
    Empty,
    /// The iterable had at least one item.
    Iterated,
}

/// Result of evaluating one element's directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the element's condition held, for conditional chains. With a
    /// per-item condition this means at least one iteration passed.
    pub matched: bool,
    pub loop_state: LoopState,
}

impl Outcome {
    fn single(matched: bool) -> Self {
        Self {
            matched,
            loop_state: LoopState::NoLoop,
        }
    }
}

/// Evaluate an element's directives and call `body` once for every scope the
/// element should render in, in order.
pub fn expand<F>(
    directives: &DirectiveSet,
    scope: &Scope<'_>,
    evaluator: &dyn Evaluator,
    mut body: F,
) -> ViewResult<Outcome>
where
    F: FnMut(&Scope<'_>) -> ViewResult<()>,
{
    match (directives.order(), &directives.conditional, &directives.foreach) {
        (DirectiveOrder::ConditionOnly, Some(condition), _) => {
            let matched = holds(condition, scope, evaluator)?;
            if matched {
                body(scope)?;
            }
            Ok(Outcome::single(matched))
        }
        (DirectiveOrder::LoopOnly, _, Some(foreach)) => iterate(foreach, None, scope, evaluator, body),
        (DirectiveOrder::ConditionBeforeLoop, Some(condition), Some(foreach)) => {
            if !holds(condition, scope, evaluator)? {
                return Ok(Outcome {
                    matched: false,
                    loop_state: LoopState::Gated,
                });
            }
            let outcome = iterate(foreach, None, scope, evaluator, body)?;
            Ok(Outcome {
                matched: true,
                ..outcome
            })
        }
        (DirectiveOrder::LoopBeforeCondition, Some(condition), Some(foreach)) => {
            iterate(foreach, Some(condition), scope, evaluator, body)
        }
        _ => {
            body(scope)?;
            Ok(Outcome::single(true))
        }
    }
}

/// Evaluate a conditional in `scope`. `:else` always holds.
fn holds(condition: &Conditional, scope: &Scope<'_>, evaluator: &dyn Evaluator) -> ViewResult<bool> {
    match &condition.expression {
        Some(expression) => Ok(evaluator.evaluate(expression, scope)?.is_truthy()),
        None => Ok(true),
    }
}

/// Run a loop, binding each item in a fresh frame on top of `scope`.
fn iterate<F>(
    foreach: &Foreach,
    filter: Option<&Conditional>,
    scope: &Scope<'_>,
    evaluator: &dyn Evaluator,
    mut body: F,
) -> ViewResult<Outcome>
where
    F: FnMut(&Scope<'_>) -> ViewResult<()>,
{
    let iterable = evaluator.evaluate(&foreach.iterable, scope)?;
    let entries = iterable.entries().ok_or_else(|| {
        EvalError::Type(format!(
            "foreach() argument must be of type array, {} given ({})",
            iterable.type_name(),
            foreach.iterable
        ))
    })?;

    if entries.is_empty() {
        return Ok(Outcome {
            matched: false,
            loop_state: LoopState::Empty,
        });
    }

    let mut matched = filter.is_none();
    for (key, item) in entries {
        let mut frame = scope.child();
        if let Some(key_name) = &foreach.key {
            frame.set(key_name.clone(), key);
        }
        frame.set(foreach.binding.clone(), item);

        if let Some(condition) = filter {
            if !holds(condition, &frame, evaluator)? {
                tracing::trace!(binding = %foreach.binding, "iteration filtered out");
                continue;
            }
            matched = true;
        }
        body(&frame)?;
    }

    Ok(Outcome {
        matched,
        loop_state: LoopState::Iterated,
    })
}
