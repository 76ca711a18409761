//! # Document Nodes
//!
//! Element and text nodes stored in the [`Document`](super::Document) arena.
//! A [`NodeId`] is an arena index paired with the generation of its slot.
//! It stays valid until the node (or one of its ancestors) is removed. The
//! slot is then reused, and the bumped generation keeps the old id from
//! resolving to the new node.

use std::collections::BTreeMap;

/// Handle to a node in a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Raw arena index, useful for logging.
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Element with a lowercase tag name.
    Element(String),
    Text(String),
}

/// Body content handed to a dialog: either markup to be parsed, or a node
/// that was built ahead of time and is not yet attached anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Markup(String),
    Node(NodeId),
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

/// Input types that do not accept typed text.
const NON_TEXT_INPUT_TYPES: [&str; 8] = [
    "button", "submit", "reset", "checkbox", "radio", "hidden", "file", "image",
];

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) classes: Vec<String>,
    /// Current value of a form control.
    pub(crate) value: String,
    /// `display: none` on this node.
    pub(crate) hidden: bool,
    /// Rendered width/height in cells.
    pub(crate) size: (u16, u16),
}

impl Node {
    pub(crate) fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element(tag.to_ascii_lowercase()),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            value: String::new(),
            hidden: false,
            size: (1, 1),
        }
    }

    pub(crate) fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            value: String::new(),
            hidden: false,
            size: (0, 0),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Tag name for elements, `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Explicit `tabindex`, if present and numeric.
    pub fn tab_index(&self) -> Option<i32> {
        self.attribute("tabindex")
            .and_then(|v| v.trim().parse::<i32>().ok())
    }

    fn is_disabled(&self) -> bool {
        self.has_attribute("disabled")
    }

    /// Matches the interactive-element predicate: links and areas with a
    /// target, enabled form controls (hidden inputs excluded), frames, and
    /// anything with a non-negative explicit tab index.
    ///
    /// Visibility is not considered here; see
    /// [`Document::is_rendered`](super::Document::is_rendered).
    pub fn is_interactive(&self) -> bool {
        let by_tag = match self.tag() {
            Some("a") | Some("area") => self.has_attribute("href"),
            Some("input") => {
                !self.is_disabled()
                    && !self
                        .attribute("type")
                        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
            }
            Some("select") | Some("textarea") | Some("button") => !self.is_disabled(),
            Some("iframe") => true,
            _ => false,
        };
        by_tag || self.tab_index().is_some_and(|i| i >= 0)
    }

    /// Controls that consume printable keys when focused.
    pub fn is_text_input(&self) -> bool {
        match self.tag() {
            Some("input") => {
                let kind = self.attribute("type").unwrap_or("text");
                !NON_TEXT_INPUT_TYPES
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(kind))
            }
            Some("textarea") | Some("select") => true,
            _ => self
                .attribute("contenteditable")
                .is_some_and(|v| v != "false"),
        }
    }
}
