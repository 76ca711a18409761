//! # Markup Parser
//!
//! Turns a small HTML-like markup string into document nodes. Only what the
//! dialogs and templates need is supported:
//!
//! - start/end tags with quoted, unquoted, or bare attributes
//! - void elements (`input`, `br`, `hr`, `img`) and `<tag/>` self-closing
//! - comments (skipped)
//! - the five entities produced by [`escape_html`]
//!
//! Unbalanced end tags are ignored and unclosed elements are closed at the
//! end of input. Whitespace-only text between tags is dropped.

use super::document::{DomError, Document};
use super::node::NodeId;
use regex::Regex;

const VOID_ELEMENTS: [&str; 4] = ["input", "br", "hr", "img"];

/// Escape text for interpolation into markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_html`]. Unknown entities are left as-is.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Parse `markup` and append the resulting nodes to `parent`.
pub fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) -> Result<(), DomError> {
    let tag_re = Regex::new(
        r#"(?s)<!--.*?-->|<(/)?([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+))?)*)\s*(/)?>"#,
    )?;
    let attr_re = Regex::new(r#"([^\s=>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#)?;

    // Stack of (tag, node); the bottom entry is the insertion parent.
    let mut open: Vec<(String, NodeId)> = vec![(String::new(), parent)];
    let mut cursor = 0;

    for caps in tag_re.captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        append_text(doc, current(&open, parent), &markup[cursor..whole.start()])?;
        cursor = whole.end();

        let Some(name) = caps.get(2) else {
            // Comment
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();

        if caps.get(1).is_some() {
            if let Some(pos) = open.iter().rposition(|(t, _)| *t == tag) {
                if pos > 0 {
                    open.truncate(pos);
                }
            }
            continue;
        }

        let element = doc.create_element(&tag);
        if let Some(attrs) = caps.get(3) {
            for attr in attr_re.captures_iter(attrs.as_str()) {
                let Some(key) = attr.get(1) else { continue };
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                doc.set_attribute(element, key.as_str(), &value)?;
            }
        }
        doc.append_child(current(&open, parent), element)?;

        let self_closing = caps.get(4).is_some();
        if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
            open.push((tag, element));
        }
    }
    append_text(doc, current(&open, parent), &markup[cursor..])?;
    Ok(())
}

fn current(open: &[(String, NodeId)], fallback: NodeId) -> NodeId {
    open.last().map(|(_, id)| *id).unwrap_or(fallback)
}

fn append_text(doc: &mut Document, parent: NodeId, raw: &str) -> Result<(), DomError> {
    if raw.trim().is_empty() {
        return Ok(());
    }
    let text = doc.create_text(&decode_entities(raw));
    doc.append_child(parent, text)
}
