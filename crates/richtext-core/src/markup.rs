//! Snapshot markup.
//!
//! An HTML-shaped text format for undo snapshots and trusted content. Void elements are the
//! leaf tags of the document's schema; text and attribute values are entity-escaped.
//!
//! The reader is a small regex tokenizer feeding an element stack. It accepts what the writer
//! produces plus some slack (unclosed elements close at the end of input, self-closing syntax
//! on any tag) but it is not a sanitizer: untrusted markup should go through a host-provided
//! [`Sanitizer`](crate::Sanitizer).

use crate::error::EngineError;
use crate::node::{Attributes, Document, NodeData, NodeId};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--(.*?)-->|</([A-Za-z][A-Za-z0-9:-]*)\s*>|<([A-Za-z][A-Za-z0-9:-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("token pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z]+);").expect("entity pattern is valid")
});

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Decode character references.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Serialize `node` including its own tag.
pub fn serialize(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serialize the children of `node`.
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.data(node) {
        Some(NodeData::Text(text)) => escape_text(text, out),
        Some(NodeData::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeData::Element(el)) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in el.attributes.iter() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');
            if doc.schema().is_leaf_tag(&el.tag) {
                return;
            }
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        Some(NodeData::Fragment) => {
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        None => {}
    }
}

fn parse_attributes(source: &str) -> Attributes {
    ATTRIBUTE
        .captures_iter(source)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Parse markup into a new detached fragment.
pub fn parse_fragment(doc: &mut Document, markup: &str) -> Result<NodeId, EngineError> {
    let frag = doc.create_fragment();
    let mut stack: Vec<NodeId> = vec![frag];
    let mut last = 0;

    for caps in TOKEN.captures_iter(markup) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_text(doc, &stack, &markup[last..whole.start])?;
        last = whole.end;
        let top = *stack.last().unwrap_or(&frag);

        if let Some(comment) = caps.get(1) {
            let node = doc.create_comment(comment.as_str());
            doc.append_child(top, node)?;
        } else if let Some(close) = caps.get(2) {
            let tag = close.as_str().to_ascii_lowercase();
            let depth = stack
                .iter()
                .rposition(|&n| doc.tag(n) == Some(tag.as_str()))
                .ok_or_else(|| EngineError::Markup {
                    position: whole.start,
                    message: format!("unmatched closing tag </{tag}>"),
                })?;
            stack.truncate(depth);
        } else if let Some(open) = caps.get(3) {
            let tag = open.as_str().to_ascii_lowercase();
            let attributes = caps
                .get(4)
                .map(|m| parse_attributes(m.as_str()))
                .unwrap_or_default();
            let self_closing = caps.get(5).is_some_and(|m| !m.as_str().is_empty());
            let node = doc.create_element_with(&tag, attributes);
            doc.append_child(top, node)?;
            if !self_closing && !doc.schema().is_leaf_tag(&tag) {
                stack.push(node);
            }
        }
    }
    push_text(doc, &stack, &markup[last..])?;
    Ok(frag)
}

/// Turns externally supplied markup into a detached fragment that is safe to insert.
///
/// Hosts that accept markup from untrusted sources plug their own cleaner in here; the
/// engine never inspects attributes for script content.
pub trait Sanitizer: Send {
    /// Parse and clean `markup` into a new fragment owned by `doc`.
    fn sanitize(&self, doc: &mut Document, markup: &str) -> Result<NodeId, EngineError>;
}

/// Accepts markup as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedMarkup;

impl Sanitizer for TrustedMarkup {
    fn sanitize(&self, doc: &mut Document, markup: &str) -> Result<NodeId, EngineError> {
        parse_fragment(doc, markup)
    }
}

fn push_text(doc: &mut Document, stack: &[NodeId], raw: &str) -> Result<(), EngineError> {
    if raw.is_empty() {
        return Ok(());
    }
    let Some(&top) = stack.last() else {
        return Ok(());
    };
    let text = doc.create_text(unescape(raw));
    doc.append_child(top, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_nested_elements() {
        let mut doc = Document::new();
        let frag = parse_fragment(&mut doc, "<DIV class=\"x\">a<b>b</b></DIV>c").unwrap();
        let div = doc.first_child(frag).unwrap();
        assert_eq!(doc.tag(div), Some("div"));
        assert_eq!(doc.attribute(div, "class"), Some("x"));
        assert_eq!(doc.length(div), 2);
        assert_eq!(doc.text(doc.child(frag, 1).unwrap()), Some("c"));
    }

    #[test]
    fn test_void_elements_do_not_nest() {
        let mut doc = Document::new();
        let frag = parse_fragment(&mut doc, "<div>a<br>b<img src='x.png'/></div>").unwrap();
        let div = doc.first_child(frag).unwrap();
        assert_eq!(doc.length(div), 4);
        assert_eq!(
            serialize_children(&doc, frag),
            "<div>a<br>b<img src=\"x.png\"></div>"
        );
    }

    #[test]
    fn test_entities_round_trip() {
        let mut doc = Document::new();
        let frag = parse_fragment(
            &mut doc,
            "<span title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &#38; &#x41;</span>",
        )
        .unwrap();
        let span = doc.first_child(frag).unwrap();
        assert_eq!(doc.attribute(span, "title"), Some("a \"b\" & c"));
        assert_eq!(doc.text_content(span), "1 < 2 & A");
        assert_eq!(
            serialize(&doc, span),
            "<span title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; A</span>"
        );
    }

    #[test]
    fn test_comments_are_kept() {
        let mut doc = Document::new();
        let frag = parse_fragment(&mut doc, "a<!-- note -->b").unwrap();
        assert_eq!(doc.length(frag), 3);
        assert_eq!(serialize_children(&doc, frag), "a<!-- note -->b");
    }

    #[test]
    fn test_unmatched_close_is_an_error() {
        let mut doc = Document::new();
        let err = parse_fragment(&mut doc, "<div>a</span>").unwrap_err();
        assert!(matches!(err, EngineError::Markup { position: 6, .. }));
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let mut doc = Document::new();
        let frag = parse_fragment(&mut doc, "<div><b>x").unwrap();
        assert_eq!(serialize_children(&doc, frag), "<div><b>x</b></div>");
    }

    #[test]
    fn test_trusted_markup_parses() {
        let mut doc = Document::new();
        let frag = TrustedMarkup.sanitize(&mut doc, "<div>x</div>").unwrap();
        assert_eq!(serialize_children(&doc, frag), "<div>x</div>");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let mut doc = Document::new();
        let frag = parse_fragment(&mut doc, "a < b").unwrap();
        assert_eq!(doc.text_content(frag), "a < b");
    }
}
