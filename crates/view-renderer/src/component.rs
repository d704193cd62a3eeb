//! Component expansion: props and slots.

use crate::error::ViewResult;
use crate::html::{camelize, is_identifier};
use crate::renderer::interpolate;
use indexmap::IndexMap;
use smol_str::SmolStr;
use view_expr::{Bindings, Evaluator, Scope, Value};
use view_parser::{Attribute, ComponentNode, Node};

/// Bind a component reference's attributes as props.
///
/// Expression attributes are evaluated in the caller's scope, literal ones
/// are interpolated there, and bare attributes bind `true`. Each prop is
/// bound under its camelized name, and under its written name as well when
/// that is already a valid variable name.
pub fn bind_props(attrs: &[Attribute], scope: &Scope<'_>, evaluator: &dyn Evaluator) -> ViewResult<Bindings> {
    let mut props = Bindings::with_capacity(attrs.len());

    for attr in attrs {
        let value = match (&attr.value, attr.is_expression) {
            (Some(expression), true) => evaluator.evaluate(expression, scope)?,
            (Some(text), false) => Value::String(interpolate(text, scope, evaluator)?),
            (None, _) => Value::Bool(true),
        };

        let camelized = camelize(&attr.name);
        if is_identifier(&attr.name) && camelized != attr.name {
            props.insert(attr.name.clone(), value.clone());
        }
        if is_identifier(&camelized) {
            props.insert(SmolStr::from(camelized), value);
        }
    }

    Ok(props)
}

/// Content a component reference hands to the slots of its template.
pub struct SlotContent<'r> {
    default: &'r [Node],
    named: &'r IndexMap<SmolStr, Vec<Node>>,
}

impl<'r> SlotContent<'r> {
    pub fn of(component: &'r ComponentNode) -> Self {
        Self {
            default: &component.children,
            named: &component.named_slots,
        }
    }

    /// Caller content for a slot, or `None` when the caller gave nothing
    /// and the slot's fallback applies.
    pub fn select(&self, name: Option<&str>) -> Option<&'r [Node]> {
        let nodes = match name {
            None | Some("default") => self.default,
            Some(name) => self.named.get(name)?.as_slice(),
        };
        if nodes.iter().all(Node::is_insignificant) {
            None
        } else {
            Some(nodes)
        }
    }
}
