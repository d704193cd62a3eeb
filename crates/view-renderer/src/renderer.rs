//! Tree walking renderer.

use crate::component::{bind_props, SlotContent};
use crate::directives::{self, LoopState};
use crate::engine::ViewEngine;
use crate::error::{ViewError, ViewResult};
use crate::html::{push_attribute_text, push_escaped};
use std::cell::Cell;
use view_expr::{Evaluator, Scope, Value};
use view_parser::{
    Attribute, ChainRole, ComponentNode, ElementNode, ExpressionNode, Node, SlotNode, Template,
};

/// Where slot markers get their content while rendering one template.
#[derive(Clone, Copy)]
struct Frame<'r> {
    slots: Option<&'r SlotFrame<'r>>,
    /// Component nesting depth.
    depth: usize,
}

/// Caller-side state of a component being expanded.
struct SlotFrame<'r> {
    content: SlotContent<'r>,
    /// The scope the component reference was rendered in.
    scope: &'r Scope<'r>,
    /// The caller's own frame, for slot markers inside slot content.
    caller: Frame<'r>,
}

/// Renders compiled templates against a scope.
pub(crate) struct Renderer<'e> {
    engine: &'e ViewEngine,
    /// Elements and components currently open, across component boundaries.
    nesting: Cell<usize>,
}

impl<'e> Renderer<'e> {
    pub(crate) fn new(engine: &'e ViewEngine) -> Self {
        Self {
            engine,
            nesting: Cell::new(0),
        }
    }

    /// Render a whole template.
    pub(crate) fn render(&self, template: &Template, scope: &Scope<'_>) -> ViewResult<String> {
        let mut out = String::with_capacity(template.span.len() as usize);
        let frame = Frame {
            slots: None,
            depth: 0,
        };
        self.render_nodes(&template.children, scope, frame, &mut out)?;
        Ok(out)
    }

    fn evaluator(&self) -> &dyn Evaluator {
        self.engine.evaluator()
    }

    /// Render a sibling list, following conditional chains and loop pairs.
    fn render_nodes(&self, nodes: &[Node], scope: &Scope<'_>, frame: Frame<'_>, out: &mut String) -> ViewResult<()> {
        let mut chain_matched = false;
        let mut previous_loop = LoopState::NoLoop;

        for node in nodes {
            let (directives, links) = match node {
                Node::Text(text) => {
                    out.push_str(&text.content);
                    continue;
                }
                Node::Comment(_) => continue,
                Node::Expression(expr) => {
                    self.render_expression(expr, scope, out)?;
                    continue;
                }
                Node::Slot(slot) => {
                    self.render_slot(slot, scope, frame, out)?;
                    continue;
                }
                Node::Element(el) => (&el.directives, el.links),
                Node::Component(c) => (&c.directives, c.links),
            };

            let loop_before = std::mem::replace(&mut previous_loop, LoopState::NoLoop);
            if links.chain == Some(ChainRole::Head) {
                chain_matched = false;
            }

            if matches!(links.chain, Some(ChainRole::Link | ChainRole::Tail)) && chain_matched {
                continue;
            }
            if directives.forelse.is_some() && loop_before != LoopState::Empty {
                continue;
            }

            let outcome = directives::expand(directives, scope, self.evaluator(), |inner| {
                self.render_single(node, inner, frame, out)
            })?;

            if links.chain.is_some() {
                chain_matched |= outcome.matched;
            }
            previous_loop = outcome.loop_state;
        }

        Ok(())
    }

    /// Render an element or component once, directives already applied.
    fn render_single(&self, node: &Node, scope: &Scope<'_>, frame: Frame<'_>, out: &mut String) -> ViewResult<()> {
        let tag = match node {
            Node::Element(el) => &el.tag,
            Node::Component(c) => &c.name,
            _ => return Ok(()),
        };

        let max_depth = self.engine.options().max_depth;
        let nesting = self.nesting.get();
        if nesting >= max_depth {
            return Err(ViewError::NestedTooDeeply {
                tag: tag.clone(),
                depth: max_depth,
            });
        }

        self.nesting.set(nesting + 1);
        let result = match node {
            Node::Element(el) => self.render_element(el, scope, frame, out),
            Node::Component(c) => self.render_component(c, scope, frame, out),
            _ => Ok(()),
        };
        self.nesting.set(nesting);
        result
    }

    fn render_expression(&self, expr: &ExpressionNode, scope: &Scope<'_>, out: &mut String) -> ViewResult<()> {
        let value = self.evaluator().evaluate(&expr.source, scope)?;
        if expr.escaped {
            push_escaped(&value, out);
        } else {
            out.push_str(&value.to_string());
        }
        Ok(())
    }

    fn render_element(&self, el: &ElementNode, scope: &Scope<'_>, frame: Frame<'_>, out: &mut String) -> ViewResult<()> {
        out.push('<');
        out.push_str(&el.tag);
        self.render_attributes(&el.attrs, scope, out)?;
        out.push('>');

        if el.is_void() {
            return Ok(());
        }

        self.render_nodes(&el.children, scope, frame, out)?;
        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
        Ok(())
    }

    fn render_attributes(&self, attrs: &[Attribute], scope: &Scope<'_>, out: &mut String) -> ViewResult<()> {
        for attr in attrs {
            match (&attr.value, attr.is_expression) {
                (Some(expression), true) => match self.evaluator().evaluate(expression, scope)? {
                    Value::Null | Value::Bool(false) => {}
                    Value::Bool(true) => {
                        out.push(' ');
                        out.push_str(&attr.name);
                    }
                    value => {
                        out.push(' ');
                        out.push_str(&attr.name);
                        out.push_str("=\"");
                        push_escaped(&value, out);
                        out.push('"');
                    }
                },
                (Some(text), false) => {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    push_attribute_text(&interpolate(text, scope, self.evaluator())?, out);
                    out.push('"');
                }
                (None, _) => {
                    out.push(' ');
                    out.push_str(&attr.name);
                }
            }
        }
        Ok(())
    }

    fn render_component(
        &self,
        node: &ComponentNode,
        scope: &Scope<'_>,
        frame: Frame<'_>,
        out: &mut String,
    ) -> ViewResult<()> {
        let max_depth = self.engine.options().max_component_depth;
        let depth = frame.depth + 1;
        if depth > max_depth {
            return Err(ViewError::RecursiveComponent {
                name: node.name.clone(),
                depth: max_depth,
            });
        }

        let template = self.engine.component_template(&node.name)?;
        let props = bind_props(&node.attrs, scope, self.evaluator())?;
        let component_scope = Scope::root(props);

        tracing::debug!(component = %node.name, depth, "expanding view component");

        let slots = SlotFrame {
            content: SlotContent::of(node),
            scope,
            caller: frame,
        };
        let inner = Frame {
            slots: Some(&slots),
            depth,
        };
        self.render_nodes(&template.children, &component_scope, inner, out)
    }

    /// Fill a slot marker with the caller's content, rendered in the caller's
    /// scope, or with the marker's own fallback.
    fn render_slot(&self, slot: &SlotNode, scope: &Scope<'_>, frame: Frame<'_>, out: &mut String) -> ViewResult<()> {
        if let Some(slots) = frame.slots {
            if let Some(nodes) = slots.content.select(slot.name.as_deref()) {
                return self.render_nodes(nodes, slots.scope, slots.caller, out);
            }
        }
        self.render_nodes(&slot.fallback, scope, frame, out)
    }
}

/// Substitute `{{ }}` and `{!! !!}` inside literal attribute text.
///
/// An opening delimiter without a closing one is left as written.
pub(crate) fn interpolate(text: &str, scope: &Scope<'_>, evaluator: &dyn Evaluator) -> ViewResult<String> {
    if !text.contains("{{") && !text.contains("{!!") {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let next = [("{!!", "!!}", false), ("{{", "}}", true)]
            .into_iter()
            .filter_map(|(open, close, escaped)| rest.find(open).map(|at| (at, open, close, escaped)))
            .min_by_key(|(at, ..)| *at);

        let Some((at, open, close, escaped)) = next else {
            break;
        };
        let inner = &rest[at + open.len()..];
        let Some(end) = inner.find(close) else {
            break;
        };

        out.push_str(&rest[..at]);
        let value = evaluator.evaluate(inner[..end].trim(), scope)?;
        if escaped {
            push_escaped(&value, &mut out);
        } else {
            out.push_str(&value.to_string());
        }
        rest = &inner[end + close.len()..];
    }

    out.push_str(rest);
    Ok(out)
}
