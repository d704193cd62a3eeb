//! AST types for view templates.

use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Span;

/// The synthetic root of a parsed template.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    /// Top-level nodes.
    pub children: Vec<Node>,
    /// Source span of the entire template.
    pub span: Span,
}

impl Template {
    /// Create a template with children.
    pub fn with_children(children: Vec<Node>, span: Span) -> Self {
        Self { children, span }
    }

    /// Names of every component referenced anywhere in the tree.
    pub fn component_names(&self) -> Vec<SmolStr> {
        let mut names = Vec::new();
        collect_component_names(&self.children, &mut names);
        names
    }
}

fn collect_component_names(nodes: &[Node], names: &mut Vec<SmolStr>) {
    for node in nodes {
        match node {
            Node::Element(el) => collect_component_names(&el.children, names),
            Node::Component(c) => {
                if !names.contains(&c.name) {
                    names.push(c.name.clone());
                }
                collect_component_names(&c.children, names);
                for slot in c.named_slots.values() {
                    collect_component_names(slot, names);
                }
            }
            Node::Slot(s) => collect_component_names(&s.fallback, names),
            Node::Text(_) | Node::Expression(_) | Node::Comment(_) => {}
        }
    }
}

/// A node in the template AST.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// Literal text, copied verbatim.
    Text(TextNode),
    /// An interpolation (`{{ expr }}` or `{!! expr !!}`).
    Expression(ExpressionNode),
    /// A template comment (`{{-- … --}}`), never emitted.
    Comment(CommentNode),
    /// An HTML element.
    Element(ElementNode),
    /// A reference to a registered component (`<x-name>`).
    Component(ComponentNode),
    /// A slot marker inside a component template (`<x-slot />`).
    Slot(SlotNode),
}

impl Node {
    /// Get the span of this node.
    pub fn span(&self) -> Span {
        match self {
            Self::Text(n) => n.span,
            Self::Expression(n) => n.span,
            Self::Comment(n) => n.span,
            Self::Element(n) => n.span,
            Self::Component(n) => n.span,
            Self::Slot(n) => n.span,
        }
    }

    /// Directives carried by this node, if it can carry any.
    pub fn directives(&self) -> Option<&DirectiveSet> {
        match self {
            Self::Element(n) => Some(&n.directives),
            Self::Component(n) => Some(&n.directives),
            _ => None,
        }
    }

    /// Sibling relationships recorded by the directive resolver.
    pub fn links(&self) -> Option<&SiblingLinks> {
        match self {
            Self::Element(n) => Some(&n.links),
            Self::Component(n) => Some(&n.links),
            _ => None,
        }
    }

    /// Mutable sibling relationships, for the resolver.
    pub(crate) fn links_mut(&mut self) -> Option<&mut SiblingLinks> {
        match self {
            Self::Element(n) => Some(&mut n.links),
            Self::Component(n) => Some(&mut n.links),
            _ => None,
        }
    }

    /// Whether this node produces no meaningful output between siblings:
    /// whitespace-only text or a template comment.
    pub fn is_insignificant(&self) -> bool {
        match self {
            Self::Text(t) => t.content.trim().is_empty(),
            Self::Comment(_) => true,
            _ => false,
        }
    }
}

/// A text node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextNode {
    /// The text content.
    pub content: String,
    /// Source span.
    pub span: Span,
}

/// An interpolation node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpressionNode {
    /// The expression source, trimmed.
    pub source: String,
    /// `true` for `{{ }}`, `false` for `{!! !!}`.
    pub escaped: bool,
    /// Source span.
    pub span: Span,
}

/// A template comment node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentNode {
    /// The comment content.
    pub content: String,
    /// Source span.
    pub span: Span,
}

/// An HTML element.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementNode {
    /// The tag name, as written.
    pub tag: SmolStr,
    /// Non-directive attributes in source order.
    pub attrs: Vec<Attribute>,
    /// Directives extracted from the attribute list.
    pub directives: DirectiveSet,
    /// Relationships to neighbouring siblings.
    pub links: SiblingLinks,
    /// Child nodes.
    pub children: Vec<Node>,
    /// Written as `<tag />`.
    pub self_closing: bool,
    /// Source span.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
}

impl ElementNode {
    /// Whether this is a void element that never has a closing tag.
    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }

    /// Whether whitespace in this element's content is significant.
    pub fn is_preformatted(&self) -> bool {
        self.tag.eq_ignore_ascii_case("pre") || self.tag.eq_ignore_ascii_case("textarea")
    }
}

/// A reference to a component.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentNode {
    /// The component tag name, e.g. `x-base-layout`.
    pub name: SmolStr,
    /// Attributes, bound as props on expansion.
    pub attrs: Vec<Attribute>,
    /// Directives extracted from the attribute list.
    pub directives: DirectiveSet,
    /// Relationships to neighbouring siblings.
    pub links: SiblingLinks,
    /// Default slot content.
    pub children: Vec<Node>,
    /// Named slot content, lifted from direct `<x-slot name="…">` children.
    pub named_slots: IndexMap<SmolStr, Vec<Node>>,
    /// Source span.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
}

/// A slot marker inside a component template.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotNode {
    /// Slot name; `None` for the default slot.
    pub name: Option<SmolStr>,
    /// Content rendered when the caller supplies nothing for this slot.
    pub fallback: Vec<Node>,
    /// Source span.
    pub span: Span,
}

/// An attribute kept for emission (or bound as a prop).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// Attribute name, without the expression marker.
    pub name: SmolStr,
    /// Attribute value; `None` for a bare attribute.
    pub value: Option<String>,
    /// Whether the value is an expression (`:name="expr"`).
    pub is_expression: bool,
    /// Source span.
    pub span: Span,
}

impl Attribute {
    /// Create a literal attribute.
    pub fn literal(name: impl Into<SmolStr>, value: Option<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            value,
            is_expression: false,
            span,
        }
    }

    /// Create an expression-valued attribute.
    pub fn expression(name: impl Into<SmolStr>, value: String, span: Span) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            is_expression: true,
            span,
        }
    }
}

/// The directives written on one tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectiveSet {
    /// `:if`, `:elseif` or `:else`.
    pub conditional: Option<Conditional>,
    /// `:foreach`.
    pub foreach: Option<Foreach>,
    /// `:forelse`.
    pub forelse: Option<Forelse>,
}

impl DirectiveSet {
    /// Check whether no directive is present.
    pub fn is_empty(&self) -> bool {
        self.conditional.is_none() && self.foreach.is_none() && self.forelse.is_none()
    }

    /// The kind of conditional directive, if any.
    pub fn conditional_kind(&self) -> Option<ConditionalKind> {
        self.conditional.as_ref().map(|c| c.kind)
    }

    /// How a conditional and a loop on the same tag interact.
    ///
    /// Decided purely by which attribute was written first.
    pub fn order(&self) -> DirectiveOrder {
        match (&self.conditional, &self.foreach) {
            (Some(cond), Some(foreach)) if cond.position < foreach.position => {
                DirectiveOrder::ConditionBeforeLoop
            }
            (Some(_), Some(_)) => DirectiveOrder::LoopBeforeCondition,
            (Some(_), None) => DirectiveOrder::ConditionOnly,
            (None, Some(_)) => DirectiveOrder::LoopOnly,
            (None, None) => DirectiveOrder::Plain,
        }
    }
}

/// Evaluation order of the directives on one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOrder {
    /// No conditional, no loop.
    Plain,
    /// Only a conditional.
    ConditionOnly,
    /// Only a loop.
    LoopOnly,
    /// The conditional gates the whole loop, evaluated once before it.
    ConditionBeforeLoop,
    /// The conditional filters each iteration.
    LoopBeforeCondition,
}

/// Kind of conditional directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionalKind {
    /// `:if`
    If,
    /// `:elseif`
    ElseIf,
    /// `:else`
    Else,
}

impl ConditionalKind {
    /// The attribute name for this kind.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::If => ":if",
            Self::ElseIf => ":elseif",
            Self::Else => ":else",
        }
    }
}

/// A conditional directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conditional {
    /// Which conditional.
    pub kind: ConditionalKind,
    /// The condition; `None` for `:else`.
    pub expression: Option<String>,
    /// Offset among all attributes written on the tag.
    pub position: usize,
    /// Source span of the attribute.
    pub span: Span,
}

/// A `:foreach="<iterable> as [$key =>] $binding"` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Foreach {
    /// The raw attribute value.
    pub source: String,
    /// The iterable expression.
    pub iterable: String,
    /// Optional key binding name, without `$`.
    pub key: Option<SmolStr>,
    /// Item binding name, without `$`.
    pub binding: SmolStr,
    /// Offset among all attributes written on the tag.
    pub position: usize,
    /// Source span of the attribute.
    pub span: Span,
}

/// A `:forelse` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Forelse {
    /// Offset among all attributes written on the tag.
    pub position: usize,
    /// Source span of the attribute.
    pub span: Span,
}

/// Sibling relationships attached by the directive resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiblingLinks {
    /// Role in a conditional chain.
    pub chain: Option<ChainRole>,
    /// Set on a `:foreach` element whose next sibling is its `:forelse`.
    pub has_fallback: bool,
}

/// Role of an element within a conditional chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainRole {
    /// The `:if` starting the chain.
    Head,
    /// An `:elseif` link.
    Link,
    /// The closing `:else`.
    Tail,
}

/// Check if an element is a void element (never has content).
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if an element's content is raw text (no markup inside).
pub fn is_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}
