//! Directive resolution.
//!
//! Walks every sibling list once after parsing, links conditional chains and
//! loop pairs, and rejects directives that appear where they cannot apply.
//! A template that passes here never fails on adjacency at render time.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};

/// State of the conditional chain ending at the previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    None,
    Open,
    Closed,
}

/// State of the loop pair ending at the previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    None,
    /// A `:foreach` at this index in the resolved list, still unpaired.
    Open(usize),
    Paired,
}

/// Validate directive placement across the whole template and record sibling
/// relationships on each element.
pub fn resolve(mut template: Template) -> CompileResult<Template> {
    template.children = resolve_siblings(std::mem::take(&mut template.children), false)?;
    Ok(template)
}

fn resolve_siblings(nodes: Vec<Node>, preformatted: bool) -> CompileResult<Vec<Node>> {
    let mut resolved = Vec::with_capacity(nodes.len());
    // Whitespace and comments seen since the last element.
    let mut pending = Vec::new();
    let mut chain = ChainState::None;
    let mut pair = PairState::None;

    for mut node in nodes {
        resolve_children(&mut node, preformatted)?;

        let step = match node.directives() {
            Some(directives) => Some((
                step_chain(directives, &mut chain)?,
                step_pair(directives, &mut pair)?,
                directives.foreach.is_some(),
            )),
            None => None,
        };

        let Some((role, fallback_for, has_loop)) = step else {
            if node.is_insignificant() {
                pending.push(node);
            } else {
                chain = ChainState::None;
                pair = PairState::None;
                resolved.append(&mut pending);
                resolved.push(node);
            }
            continue;
        };

        let continues = matches!(role, Some(ChainRole::Link | ChainRole::Tail)) || fallback_for.is_some();
        if continues && !preformatted {
            pending.clear();
        } else {
            resolved.append(&mut pending);
        }

        if let Some(index) = fallback_for {
            if let Some(links) = resolved[index].links_mut() {
                links.has_fallback = true;
            }
        }
        if let Some(links) = node.links_mut() {
            links.chain = role;
        }
        if has_loop {
            pair = PairState::Open(resolved.len());
        }
        resolved.push(node);
    }

    resolved.append(&mut pending);
    Ok(resolved)
}

fn resolve_children(node: &mut Node, preformatted: bool) -> CompileResult<()> {
    match node {
        Node::Element(el) => {
            let preformatted = preformatted || el.is_preformatted();
            el.children = resolve_siblings(std::mem::take(&mut el.children), preformatted)?;
        }
        Node::Component(c) => {
            c.children = resolve_siblings(std::mem::take(&mut c.children), preformatted)?;
            for slot in c.named_slots.values_mut() {
                *slot = resolve_siblings(std::mem::take(slot), preformatted)?;
            }
        }
        Node::Slot(s) => {
            s.fallback = resolve_siblings(std::mem::take(&mut s.fallback), preformatted)?;
        }
        Node::Text(_) | Node::Expression(_) | Node::Comment(_) => {}
    }
    Ok(())
}

/// Advance the chain state machine over one element.
fn step_chain(directives: &DirectiveSet, state: &mut ChainState) -> CompileResult<Option<ChainRole>> {
    let Some(conditional) = &directives.conditional else {
        *state = ChainState::None;
        return Ok(None);
    };

    let attribute = conditional.kind.attribute();
    match (conditional.kind, *state) {
        (ConditionalKind::If, _) => {
            *state = ChainState::Open;
            Ok(Some(ChainRole::Head))
        }
        (ConditionalKind::ElseIf, ChainState::Open) => Ok(Some(ChainRole::Link)),
        (ConditionalKind::Else, ChainState::Open) => {
            *state = ChainState::Closed;
            Ok(Some(ChainRole::Tail))
        }
        (_, ChainState::Closed) => Err(CompileError::invalid_element(
            attribute,
            "the preceding conditional chain is already closed by `:else`",
            conditional.span,
        )),
        (_, ChainState::None) => Err(CompileError::invalid_element(
            attribute,
            "must directly follow an element with `:if` or `:elseif`",
            conditional.span,
        )),
    }
}

/// Advance the loop pair state machine over one element.
///
/// Returns the index of the `:foreach` element this one is the fallback for.
fn step_pair(directives: &DirectiveSet, state: &mut PairState) -> CompileResult<Option<usize>> {
    if directives.foreach.is_some() {
        // The caller opens the pair once it knows the element's index.
        *state = PairState::None;
        return Ok(None);
    }

    let Some(forelse) = &directives.forelse else {
        *state = PairState::None;
        return Ok(None);
    };

    match *state {
        PairState::Open(index) => {
            *state = PairState::Paired;
            Ok(Some(index))
        }
        PairState::Paired => Err(CompileError::invalid_element(
            ":forelse",
            "a `:foreach` may be followed by only one `:forelse`",
            forelse.span,
        )),
        PairState::None => Err(CompileError::invalid_element(
            ":forelse",
            "must directly follow an element with `:foreach`",
            forelse.span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::compile;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    fn roles(nodes: &[Node]) -> Vec<Option<ChainRole>> {
        nodes
            .iter()
            .filter_map(|n| n.links())
            .map(|l| l.chain)
            .collect()
    }

    fn invalid(source: &str) -> String {
        let err = compile(source).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::ElementWasInvalid, "{}", source);
        err.message
    }

    #[test]
    fn test_chain_roles() {
        let ast = compile(
            r#"<div :if="$a">a</div>
            <div :elseif="$b">b</div>
            <div :elseif="$c">c</div>
            <div :else>d</div>"#,
        )
        .unwrap();
        assert_eq!(ast.children.len(), 4);
        assert_eq!(
            roles(&ast.children),
            vec![
                Some(ChainRole::Head),
                Some(ChainRole::Link),
                Some(ChainRole::Link),
                Some(ChainRole::Tail)
            ]
        );
    }

    #[test]
    fn test_comment_between_chain_members_is_dropped() {
        let ast = compile("<a :if=\"$a\"></a> {{-- note --}} <b :else></b>").unwrap();
        assert_eq!(ast.children.len(), 2);
    }

    #[test]
    fn test_whitespace_elsewhere_is_kept() {
        let ast = compile("<a></a>\n<b :if=\"$x\"></b>\n<c></c>").unwrap();
        assert_eq!(ast.children.len(), 5);
    }

    #[test]
    fn test_whitespace_kept_inside_pre() {
        let ast = compile("<pre><a :if=\"$a\"></a>\n<b :else></b></pre>").unwrap();
        let Node::Element(pre) = &ast.children[0] else {
            panic!("Expected element");
        };
        assert_eq!(pre.children.len(), 3);
        assert_eq!(roles(&pre.children), vec![Some(ChainRole::Head), Some(ChainRole::Tail)]);
    }

    #[test]
    fn test_double_else() {
        let message = invalid(r#"<div :if="false"></div><div :else></div><div :else></div>"#);
        assert!(message.contains("`:else`"));
    }

    #[test]
    fn test_elseif_after_else() {
        invalid(r#"<div :if="$a"></div><div :else></div><div :elseif="$b"></div>"#);
    }

    #[test]
    fn test_lone_elseif() {
        let message = invalid(r#"<div :elseif="false"></div>"#);
        assert_eq!(
            message,
            "Invalid `:elseif` attribute: must directly follow an element with `:if` or `:elseif`"
        );
    }

    #[test]
    fn test_text_breaks_chain() {
        invalid(r#"<div :if="$a"></div> text <div :else></div>"#);
        invalid(r#"<div :if="$a"></div>{{ $b }}<div :else></div>"#);
    }

    #[test]
    fn test_plain_element_breaks_chain() {
        invalid(r#"<div :if="$a"></div><p></p><div :else></div>"#);
    }

    #[test]
    fn test_loop_pair() {
        let ast = compile(
            r#"<div :foreach="$items as $foo">{{ $foo }}</div>
            <div :forelse>Empty</div>"#,
        )
        .unwrap();
        assert_eq!(ast.children.len(), 2);
        assert!(ast.children[0].links().unwrap().has_fallback);
        assert!(!ast.children[1].links().unwrap().has_fallback);
    }

    #[test]
    fn test_loop_without_fallback() {
        let ast = compile(r#"<div :foreach="$items as $foo"></div>"#).unwrap();
        assert!(!ast.children[0].links().unwrap().has_fallback);
    }

    #[test]
    fn test_second_forelse() {
        let message = invalid(
            r#"<div :foreach="$items as $foo"></div><div :forelse></div><div :forelse></div>"#,
        );
        assert!(message.contains("only one"));
    }

    #[test]
    fn test_lone_forelse() {
        invalid(r#"<div :forelse>Empty</div>"#);
        invalid(r#"<div :foreach="$a as $b"></div><p></p><div :forelse></div>"#);
    }

    #[test]
    fn test_chain_and_pair_coexist() {
        let ast = compile(
            r#"<ul :if="$show" :foreach="$items as $item"></ul><p :forelse :else>none</p>"#,
        )
        .unwrap();
        assert_eq!(roles(&ast.children), vec![Some(ChainRole::Head), Some(ChainRole::Tail)]);
        assert!(ast.children[0].links().unwrap().has_fallback);
    }

    #[test]
    fn test_validation_reaches_nested_lists() {
        invalid(r#"<section><div><span :else></span></div></section>"#);
        invalid(r#"<x-card><p :elseif="$a"></p></x-card>"#);
        invalid(r#"<x-card><x-slot name="footer"><p :forelse></p></x-slot></x-card>"#);
        invalid(r#"<div><x-slot><b :else></b></x-slot></div>"#);
    }

    #[test]
    fn test_components_join_chains() {
        let ast = compile(r#"<x-a :if="$a" /><x-b :else />"#).unwrap();
        assert_eq!(roles(&ast.children), vec![Some(ChainRole::Head), Some(ChainRole::Tail)]);
    }
}
