//! Parser for view templates.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::lexer::Cursor;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;
use source_map::Span;

/// `<iterable> as [$key =>] $binding`
static FOREACH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^\s*(.+?)\s+as\s+(?:\$([A-Za-z_][A-Za-z0-9_]*)\s*=>\s*)?\$([A-Za-z_][A-Za-z0-9_]*)\s*$",
    )
    .expect("foreach pattern is a valid regex")
});

/// Options controlling how tags are classified.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Tag prefix marking component references (and `<prefix>slot`).
    pub component_prefix: SmolStr,
    /// How deeply elements may nest before the template is rejected.
    pub max_depth: usize,
}

/// Default element nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            component_prefix: SmolStr::new_static("x-"),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse a template with the default options.
pub fn parse_template(source: &str) -> CompileResult<Template> {
    parse_template_with(source, &ParseOptions::default())
}

/// Parse a template.
pub fn parse_template_with(source: &str, options: &ParseOptions) -> CompileResult<Template> {
    let mut parser = TemplateParser::new(source, options);
    parser.parse()
}

/// Parser for view templates.
struct TemplateParser<'a> {
    cursor: Cursor<'a>,
    source: &'a str,
    slot_tag: SmolStr,
    options: &'a ParseOptions,
    /// Elements currently open.
    depth: usize,
}

/// An element waiting for its closing tag.
struct OpenTag<'t> {
    name: &'t str,
    span: Span,
    raw_text: bool,
}

/// Everything between a tag name and the end of the opening tag.
struct TagAttributes {
    attrs: Vec<Attribute>,
    directives: DirectiveSet,
    self_closing: bool,
}

impl<'a> TemplateParser<'a> {
    fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            source,
            slot_tag: SmolStr::from(format!("{}slot", options.component_prefix)),
            options,
            depth: 0,
        }
    }

    fn parse(&mut self) -> CompileResult<Template> {
        let children = self.parse_children(None)?;
        Ok(Template::with_children(
            children,
            Span::from_offsets(0, self.source.len()),
        ))
    }

    /// Parse children until the closing tag of `open`, or EOF at the root.
    fn parse_children(&mut self, open: Option<&OpenTag<'_>>) -> CompileResult<Vec<Node>> {
        let mut children = Vec::new();

        loop {
            if self.cursor.is_eof() {
                return match open {
                    Some(tag) => Err(CompileError::unclosed_tag(tag.name, tag.span)),
                    None => Ok(children),
                };
            }

            if self.cursor.starts_with("</") {
                match open {
                    Some(tag) if self.at_closing_tag(tag.name) => {
                        self.consume_closing_tag(tag.name)?;
                        return Ok(children);
                    }
                    // `</` inside <script> or <style> is just text
                    Some(tag) if tag.raw_text => {}
                    _ => return Err(self.unexpected_closing_tag(open)),
                }
            }

            let raw_text = open.is_some_and(|tag| tag.raw_text);
            children.push(self.parse_node(raw_text)?);
        }
    }

    /// Parse a single node.
    fn parse_node(&mut self, raw_text: bool) -> CompileResult<Node> {
        if self.cursor.starts_with("{{--") {
            return self.parse_comment();
        }
        if self.cursor.starts_with("{!!") {
            return self.parse_interpolation("{!!", "!!}", false);
        }
        if self.cursor.starts_with("{{") {
            return self.parse_interpolation("{{", "}}", true);
        }

        if !raw_text {
            if self.cursor.starts_with("<!--") {
                return self.parse_verbatim("<!--", "-->");
            }
            if self.cursor.starts_with("<!") || self.cursor.starts_with("<?") {
                return self.parse_verbatim("<", ">");
            }
            if self.cursor.starts_with("<")
                && self
                    .cursor
                    .peek_second()
                    .is_some_and(|c| c.is_ascii_alphabetic())
            {
                return self.parse_element();
            }
        }

        Ok(Node::Text(self.parse_text(raw_text)))
    }

    /// Check whether the cursor is at something other than plain text.
    fn at_markup(&self, raw_text: bool) -> bool {
        if self.cursor.starts_with("{{") || self.cursor.starts_with("{!!") {
            return true;
        }
        if self.cursor.starts_with("</") {
            return true;
        }
        !raw_text
            && self.cursor.starts_with("<")
            && self
                .cursor
                .peek_second()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '!' || c == '?')
    }

    fn at_closing_tag(&self, tag: &str) -> bool {
        let prefix = format!("</{}", tag);
        if !self.cursor.starts_with_ignore_case(&prefix) {
            return false;
        }
        matches!(
            self.cursor.remaining()[prefix.len()..].chars().next(),
            Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r')
        )
    }

    fn consume_closing_tag(&mut self, tag: &str) -> CompileResult<()> {
        let start = self.cursor.pos();
        self.cursor.consume("</");
        self.cursor.read_tag_name();
        self.cursor.skip_whitespace();
        if self.cursor.consume(">") {
            Ok(())
        } else {
            Err(CompileError::unterminated(
                &format!("</{}", tag),
                ">",
                self.cursor.span_from(start),
            ))
        }
    }

    fn unexpected_closing_tag(&mut self, open: Option<&OpenTag<'_>>) -> CompileError {
        let start = self.cursor.pos();
        self.cursor.consume("</");
        let name = self.cursor.read_tag_name().unwrap_or_default();
        let span = self.cursor.span_from(start);
        match open {
            Some(tag) => CompileError::malformed(
                format!(
                    "Unexpected closing tag </{}>, expected </{}>",
                    name, tag.name
                ),
                span,
            ),
            None => CompileError::malformed(
                format!("Unexpected closing tag </{}> with no open element", name),
                span,
            ),
        }
    }

    /// Parse a template comment.
    fn parse_comment(&mut self) -> CompileResult<Node> {
        let start = self.cursor.pos();
        self.cursor.consume("{{--");
        let content = self.cursor.consume_through("--}}").ok_or_else(|| {
            CompileError::unterminated("{{--", "--}}", Span::from_offsets(start, start + 4))
        })?;
        Ok(Node::Comment(CommentNode {
            content: content.to_string(),
            span: self.cursor.span_from(start),
        }))
    }

    /// Parse an interpolation.
    fn parse_interpolation(&mut self, open: &str, close: &str, escaped: bool) -> CompileResult<Node> {
        let start = self.cursor.pos();
        self.cursor.consume(open);
        let content = self.cursor.consume_through(close).ok_or_else(|| {
            CompileError::unterminated(open, close, Span::from_offsets(start, start + open.len()))
        })?;
        Ok(Node::Expression(ExpressionNode {
            source: content.trim().to_string(),
            escaped,
            span: self.cursor.span_from(start),
        }))
    }

    /// Parse markup that is passed through untouched (HTML comments, doctype).
    fn parse_verbatim(&mut self, open: &str, close: &str) -> CompileResult<Node> {
        let start = self.cursor.pos();
        self.cursor.consume(open);
        if self.cursor.consume_through(close).is_none() {
            return Err(CompileError::unterminated(
                open,
                close,
                Span::from_offsets(start, start + open.len()),
            ));
        }
        let span = self.cursor.span_from(start);
        Ok(Node::Text(TextNode {
            content: self.source[span.to_range()].to_string(),
            span,
        }))
    }

    /// Parse a text node. Always consumes at least one character.
    fn parse_text(&mut self, raw_text: bool) -> TextNode {
        let start = self.cursor.pos();
        self.cursor.next_char();
        while !self.cursor.is_eof() && !self.at_markup(raw_text) {
            self.cursor.next_char();
        }
        let span = self.cursor.span_from(start);
        TextNode {
            content: self.source[span.to_range()].to_string(),
            span,
        }
    }

    /// Parse an element, component reference or slot marker.
    fn parse_element(&mut self) -> CompileResult<Node> {
        let start = self.cursor.pos();
        self.cursor.consume("<");

        let tag_start = self.cursor.pos();
        let tag = SmolStr::from(self.cursor.read_tag_name().unwrap_or_default());
        let tag_span = self.cursor.span_from(tag_start);

        let TagAttributes {
            attrs,
            directives,
            self_closing,
        } = self.parse_attributes(&tag, start)?;

        let children = if self_closing || is_void_element(&tag) {
            Vec::new()
        } else {
            if self.depth >= self.options.max_depth {
                return Err(CompileError::malformed(
                    format!("Elements nested more than {} levels deep", self.options.max_depth),
                    self.cursor.span_from(start),
                ));
            }
            let open = OpenTag {
                name: &tag,
                span: self.cursor.span_from(start),
                raw_text: is_raw_text_element(&tag),
            };
            self.depth += 1;
            let children = self.parse_children(Some(&open));
            self.depth -= 1;
            children?
        };

        let span = self.cursor.span_from(start);

        if tag == self.slot_tag {
            return build_slot(&tag, attrs, &directives, children, span);
        }

        if tag.starts_with(self.options.component_prefix.as_str()) {
            let (children, named_slots) = lift_named_slots(children);
            return Ok(Node::Component(ComponentNode {
                name: tag,
                attrs,
                directives,
                links: SiblingLinks::default(),
                children,
                named_slots,
                span,
                tag_span,
            }));
        }

        Ok(Node::Element(ElementNode {
            tag,
            attrs,
            directives,
            links: SiblingLinks::default(),
            children,
            self_closing,
            span,
            tag_span,
        }))
    }

    /// Parse attributes up to and including the end of the opening tag.
    fn parse_attributes(&mut self, tag: &str, tag_start: usize) -> CompileResult<TagAttributes> {
        let mut attrs = Vec::new();
        let mut directives = DirectiveSet::default();
        let mut position = 0;

        loop {
            self.cursor.skip_whitespace();

            if self.cursor.is_eof() {
                return Err(CompileError::unterminated(
                    &format!("<{}", tag),
                    ">",
                    self.cursor.span_from(tag_start),
                ));
            }
            if self.cursor.consume("/>") {
                return Ok(TagAttributes {
                    attrs,
                    directives,
                    self_closing: true,
                });
            }
            if self.cursor.consume(">") {
                return Ok(TagAttributes {
                    attrs,
                    directives,
                    self_closing: false,
                });
            }

            let attr_start = self.cursor.pos();
            let name = self.cursor.read_attr_name();

            if name.is_empty() {
                // A stray slash, as in `<br / >`
                if self.cursor.consume("/") {
                    continue;
                }
                let found = self.cursor.peek_char().unwrap_or_default();
                return Err(CompileError::malformed(
                    format!("Unexpected `{}` in <{}> tag", found, tag),
                    Span::from_offsets(attr_start, attr_start + found.len_utf8()),
                ));
            }

            self.cursor.skip_whitespace();

            let value = if self.cursor.consume("=") {
                self.cursor.skip_whitespace();
                Some(self.parse_attribute_value(name, attr_start)?)
            } else {
                None
            };

            let span = self.cursor.span_from(attr_start);
            push_attribute(name, value, span, position, &mut attrs, &mut directives)?;
            position += 1;
        }
    }

    /// Parse an attribute value.
    fn parse_attribute_value(&mut self, name: &str, attr_start: usize) -> CompileResult<String> {
        if self.cursor.starts_with("\"") || self.cursor.starts_with("'") {
            return self
                .cursor
                .read_quoted_string()
                .map(|(value, _)| value.to_string())
                .ok_or_else(|| {
                    CompileError::malformed(
                        format!("Unterminated value for attribute `{}`", name),
                        self.cursor.span_from(attr_start),
                    )
                });
        }

        let (value, _) = self.cursor.read_unquoted_value();
        if value.is_empty() {
            return Err(CompileError::malformed(
                format!("Missing value for attribute `{}`", name),
                self.cursor.span_from(attr_start),
            ));
        }
        Ok(value.to_string())
    }
}

/// Sort one written attribute into the attribute list or the directive set.
fn push_attribute(
    name: &str,
    value: Option<String>,
    span: Span,
    position: usize,
    attrs: &mut Vec<Attribute>,
    directives: &mut DirectiveSet,
) -> CompileResult<()> {
    match name {
        ":if" | ":elseif" | ":else" => {
            let kind = match name {
                ":if" => ConditionalKind::If,
                ":elseif" => ConditionalKind::ElseIf,
                _ => ConditionalKind::Else,
            };
            if directives.conditional.is_some() {
                return Err(CompileError::invalid_element(
                    name,
                    "an element may carry only one of `:if`, `:elseif` and `:else`",
                    span,
                ));
            }
            let expression = match kind {
                ConditionalKind::Else => None,
                _ => Some(require_value(name, value, span)?),
            };
            directives.conditional = Some(Conditional {
                kind,
                expression,
                position,
                span,
            });
        }
        ":foreach" => {
            if directives.foreach.is_some() || directives.forelse.is_some() {
                return Err(CompileError::invalid_element(
                    name,
                    "an element may carry only one of `:foreach` and `:forelse`",
                    span,
                ));
            }
            let value = require_value(name, value, span)?;
            directives.foreach = Some(parse_foreach(&value, position, span)?);
        }
        ":forelse" => {
            if directives.foreach.is_some() || directives.forelse.is_some() {
                return Err(CompileError::invalid_element(
                    name,
                    "an element may carry only one of `:foreach` and `:forelse`",
                    span,
                ));
            }
            directives.forelse = Some(Forelse { position, span });
        }
        _ if name.starts_with("::") => {
            attrs.push(Attribute::literal(&name[1..], value, span));
        }
        _ => match name.strip_prefix(':') {
            Some(bound) => {
                let value = require_value(name, value, span)?;
                attrs.push(Attribute::expression(bound, value, span));
            }
            None => attrs.push(Attribute::literal(name, value, span)),
        },
    }
    Ok(())
}

fn require_value(name: &str, value: Option<String>, span: Span) -> CompileResult<String> {
    value.ok_or_else(|| CompileError::malformed(format!("`{}` requires a value", name), span))
}

/// Parse the value of a `:foreach` attribute.
pub fn parse_foreach(value: &str, position: usize, span: Span) -> CompileResult<Foreach> {
    let captures = FOREACH_PATTERN.captures(value).ok_or_else(|| {
        CompileError::malformed(
            format!(
                "Invalid `:foreach` expression `{}`: expected `<iterable> as $name`",
                value
            ),
            span,
        )
    })?;

    Ok(Foreach {
        source: value.to_string(),
        iterable: captures[1].trim().to_string(),
        key: captures.get(2).map(|m| SmolStr::from(m.as_str())),
        binding: SmolStr::from(&captures[3]),
        position,
        span,
    })
}

fn build_slot(
    tag: &str,
    attrs: Vec<Attribute>,
    directives: &DirectiveSet,
    children: Vec<Node>,
    span: Span,
) -> CompileResult<Node> {
    let directive = directives
        .conditional
        .as_ref()
        .map(|c| (c.kind.attribute(), c.span))
        .or_else(|| directives.foreach.as_ref().map(|f| (":foreach", f.span)))
        .or_else(|| directives.forelse.as_ref().map(|f| (":forelse", f.span)));
    if let Some((attribute, span)) = directive {
        return Err(CompileError::invalid_element(
            attribute,
            &format!("directives are not allowed on <{}>", tag),
            span,
        ));
    }

    let mut name = None;
    for attr in attrs {
        if attr.name == "name" {
            if attr.is_expression {
                return Err(CompileError::malformed(
                    "Slot names must be literal",
                    attr.span,
                ));
            }
            name = attr.value.map(SmolStr::from);
        }
    }

    Ok(Node::Slot(SlotNode {
        name,
        fallback: children,
        span,
    }))
}

/// Split a component's children into default content and named slots.
/// A slot named `default` is part of the default content.
fn lift_named_slots(children: Vec<Node>) -> (Vec<Node>, IndexMap<SmolStr, Vec<Node>>) {
    let mut default = Vec::new();
    let mut named: IndexMap<SmolStr, Vec<Node>> = IndexMap::new();

    for child in children {
        match child {
            Node::Slot(SlotNode {
                name: Some(name),
                fallback,
                ..
            }) if name == "default" => default.extend(fallback),
            Node::Slot(SlotNode {
                name: Some(name),
                fallback,
                ..
            }) => named.entry(name).or_default().extend(fallback),
            other => default.push(other),
        }
    }

    (default, named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    fn single(source: &str) -> Node {
        let mut ast = parse_template(source).unwrap();
        assert_eq!(ast.children.len(), 1, "expected one node in {:?}", source);
        ast.children.remove(0)
    }

    fn element(source: &str) -> ElementNode {
        match single(source) {
            Node::Element(el) => el,
            other => panic!("Expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_interpolations() {
        let ast = parse_template("<h1>{{ $this->foo }}{!! $bar !!}</h1>").unwrap();
        let Node::Element(h1) = &ast.children[0] else {
            panic!("Expected element");
        };
        match (&h1.children[0], &h1.children[1]) {
            (Node::Expression(a), Node::Expression(b)) => {
                assert_eq!(a.source, "$this->foo");
                assert!(a.escaped);
                assert_eq!(b.source, "$bar");
                assert!(!b.escaped);
            }
            other => panic!("Expected expressions, got {:?}", other),
        }
    }

    #[test]
    fn test_template_comment_is_opaque() {
        let ast = parse_template("{{-- <div>{{ $x }}\n <x-y> --}}<p>Hi</p>").unwrap();
        assert_eq!(ast.children.len(), 2);
        match &ast.children[0] {
            Node::Comment(c) => assert_eq!(c.content, " <div>{{ $x }}\n <x-y> "),
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_html_comment_and_doctype_are_text() {
        let ast = parse_template("<!doctype html><!-- note -->").unwrap();
        let texts: Vec<_> = ast
            .children
            .iter()
            .map(|n| match n {
                Node::Text(t) => t.content.as_str(),
                other => panic!("Expected text, got {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["<!doctype html>", "<!-- note -->"]);
    }

    #[test]
    fn test_attribute_positions_and_kinds() {
        let el = element(r#"<a :foreach="$items as $item" class="link" :href="$item->uri" :if="$item->show"></a>"#);
        let foreach = el.directives.foreach.as_ref().unwrap();
        assert_eq!(foreach.position, 0);
        assert_eq!(foreach.iterable, "$items");
        assert_eq!(foreach.binding, "item");
        assert_eq!(el.directives.conditional.as_ref().unwrap().position, 3);
        assert_eq!(el.directives.order(), DirectiveOrder::LoopBeforeCondition);

        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.attrs[0].name, "class");
        assert!(!el.attrs[0].is_expression);
        assert_eq!(el.attrs[1].name, "href");
        assert!(el.attrs[1].is_expression);
    }

    #[test]
    fn test_escaped_colon_attribute_is_literal() {
        let el = element(r#"<div ::escaped="foo"></div>"#);
        assert_eq!(el.attrs[0].name, ":escaped");
        assert!(!el.attrs[0].is_expression);
        assert!(el.directives.is_empty());
    }

    #[test]
    fn test_framework_attributes_are_literal() {
        let el = element(r#"<button @click="foo" x-on:click="bar" disabled>test</button>"#);
        let names: Vec<_> = el.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["@click", "x-on:click", "disabled"]);
        assert_eq!(el.attrs[2].value, None);
    }

    #[test]
    fn test_foreach_with_key() {
        let el = element(r#"<li :foreach="$this->map as $key => $value"></li>"#);
        let foreach = el.directives.foreach.unwrap();
        assert_eq!(foreach.iterable, "$this->map");
        assert_eq!(foreach.key.as_deref(), Some("key"));
        assert_eq!(foreach.binding, "value");
    }

    #[test]
    fn test_invalid_foreach() {
        let err = parse_template(r#"<li :foreach="$items"></li>"#).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::MalformedTemplate);
    }

    #[test]
    fn test_two_conditionals_on_one_tag() {
        let err = parse_template(r#"<div :if="$a" :else></div>"#).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::ElementWasInvalid);
        assert!(err.message.contains("`:else`"));
    }

    #[test]
    fn test_self_closing_component() {
        for source in ["<x-foo/>", "<x-foo />", "<x-foo></x-foo>"] {
            match single(source) {
                Node::Component(c) => {
                    assert_eq!(c.name, "x-foo");
                    assert!(c.children.is_empty());
                }
                other => panic!("Expected component, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_named_slots_are_lifted() {
        let node = single(
            r#"<x-complex-base>Test<x-slot name="scripts">injected</x-slot>Hi</x-complex-base>"#,
        );
        let Node::Component(c) = node else {
            panic!("Expected component");
        };
        assert_eq!(c.children.len(), 2);
        assert_eq!(c.named_slots.len(), 1);
        match &c.named_slots["scripts"][0] {
            Node::Text(t) => assert_eq!(t.content, "injected"),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_slot_named_default_joins_default_content() {
        let node = single(r#"<x-card>a<x-slot name="default">b</x-slot>c</x-card>"#);
        let Node::Component(c) = node else {
            panic!("Expected component");
        };
        assert!(c.named_slots.is_empty());
        let texts: Vec<_> = c
            .children
            .iter()
            .map(|n| match n {
                Node::Text(t) => t.content.as_str(),
                other => panic!("Expected text, got {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_slot_markers() {
        let ast = parse_template(r#"<div><x-slot /><x-slot name="styles">none</x-slot></div>"#).unwrap();
        let Node::Element(div) = &ast.children[0] else {
            panic!("Expected element");
        };
        match (&div.children[0], &div.children[1]) {
            (Node::Slot(a), Node::Slot(b)) => {
                assert_eq!(a.name, None);
                assert_eq!(b.name.as_deref(), Some("styles"));
                assert_eq!(b.fallback.len(), 1);
            }
            other => panic!("Expected slots, got {:?}", other),
        }
    }

    #[test]
    fn test_void_elements_need_no_closing_tag() {
        let ast = parse_template(r#"<head><meta charset="UTF-8"><link href="/main.css" rel="stylesheet"></head>"#).unwrap();
        let Node::Element(head) = &ast.children[0] else {
            panic!("Expected element");
        };
        assert_eq!(head.children.len(), 2);
    }

    #[test]
    fn test_script_content_is_raw_text() {
        let el = element("<script>if (a < b && c) { x(); }</script>");
        assert_eq!(el.children.len(), 1);
        match &el.children[0] {
            Node::Text(t) => assert_eq!(t.content, "if (a < b && c) { x(); }"),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        let el = element("<pre>a\n        <span class=\"hl\">b</span>\n</pre>");
        match &el.children[0] {
            Node::Text(t) => assert_eq!(t.content, "a\n        "),
            other => panic!("Expected text, got {:?}", other),
        }
        assert!(el.is_preformatted());
    }

    #[test]
    fn test_lone_less_than_is_text() {
        let el = element("<p>a < b</p>");
        match &el.children[0] {
            Node::Text(t) => assert_eq!(t.content, "a < b"),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_templates() {
        for source in [
            "<div>",
            "<div></span>",
            "</div>",
            "{{ $a",
            "{!! $a",
            "{{-- never closed",
            "<!-- never closed",
            "<div class=\"x",
            "<div",
        ] {
            let err = parse_template(source).unwrap_err();
            assert_eq!(err.code, CompileErrorCode::MalformedTemplate, "{}", source);
        }
    }

    #[test]
    fn test_unclosed_tag_span() {
        let err = parse_template("<p>ok</p><section>").unwrap_err();
        assert_eq!(err.message, "Unclosed tag: <section>");
        assert_eq!(err.span, Span::new(9, 18));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let options = ParseOptions {
            max_depth: 8,
            ..ParseOptions::default()
        };

        assert!(parse_template_with(&nested(8), &options).is_ok());

        let err = parse_template_with(&nested(9), &options).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::MalformedTemplate);
        assert_eq!(err.message, "Elements nested more than 8 levels deep");
        assert_eq!(err.span, Span::new(40, 45));

        // Void and self-closing elements do not open a level
        let leaf = format!("{}<br><span />{}", "<div>".repeat(8), "</div>".repeat(8));
        assert!(parse_template_with(&leaf, &options).is_ok());
    }

    #[test]
    fn test_default_nesting_limit_fails_cleanly() {
        let depth = DEFAULT_MAX_DEPTH + 1;
        let source = format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let err = parse_template(&source).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::MalformedTemplate);
    }

    #[test]
    fn test_unquoted_value_keeps_trailing_slash() {
        let ast = parse_template("<a href=/x/>t</a>").unwrap();
        let Node::Element(a) = &ast.children[0] else {
            panic!("Expected element");
        };
        assert_eq!(a.attrs[0].value.as_deref(), Some("/x/"));
        assert!(!a.self_closing);
        assert_eq!(a.children.len(), 1);

        let ast = parse_template("<img src=a.png/>").unwrap();
        let Node::Element(img) = &ast.children[0] else {
            panic!("Expected element");
        };
        assert_eq!(img.attrs[0].value.as_deref(), Some("a.png/"));
        assert!(img.children.is_empty());

        let ast = parse_template("<input value=x />").unwrap();
        let Node::Element(input) = &ast.children[0] else {
            panic!("Expected element");
        };
        assert_eq!(input.attrs[0].value.as_deref(), Some("x"));
        assert!(input.self_closing);
    }
}
