//! # Document Tree
//!
//! An arena-backed element tree standing in for the browser document.
//!
//! ## Overview
//!
//! The [`Document`] owns every node. It tracks the focused element, the
//! document-level scroll lock, and the set of live keyboard listeners. The
//! listener registry does not dispatch anything itself: controllers own
//! their handlers and the application decides the dispatch order, so the
//! registry only records which subscriptions are alive. That makes
//! "listener removed exactly once" observable in tests.
//!
//! ## Layout
//!
//! ```text
//! html (root)
//! └── body
//!     ├── div.app-layout
//!     └── div.modal-overlay      (only while a dialog is open)
//! ```

use super::node::{Node, NodeId, NodeKind};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    Missing(NodeId),
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeId),
    #[error("node {0:?} cannot receive focus")]
    NotFocusable(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("invalid markup pattern: {0}")]
    Pattern(String),
}

impl From<regex::Error> for DomError {
    fn from(err: regex::Error) -> Self {
        DomError::Pattern(err.to_string())
    }
}

/// Handle for a registered document-level key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Who owns a key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// Focus trap bound to a dialog container.
    FocusTrap(NodeId),
    StudyMode,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    scroll_locked: bool,
    listeners: BTreeMap<ListenerId, ListenerScope>,
    next_listener: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with `html` and `body` elements.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId::default(),
            body: NodeId::default(),
            active: None,
            scroll_locked: false,
            listeners: BTreeMap::new(),
            next_listener: 1,
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.root = root;
        doc.body = body;
        if let Ok(node) = doc.get_mut(body) {
            node.parent = Some(root);
        }
        if let Ok(node) = doc.get_mut(root) {
            node.children.push(body);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get(&self, id: NodeId) -> Result<&Node, DomError> {
        self.node(id).ok_or(DomError::Missing(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DomError::Missing(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        let node = self.get_mut(id)?;
        match node.kind {
            NodeKind::Element(_) => Ok(node),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Store `node`, reusing a slot freed by [`Document::remove`] when
    /// there is one.
    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(index) {
                slot.node = Some(node);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        self.nodes.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(Node::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(Node::text(text))
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.get(child)?;
        if self.is_inclusive_ancestor(child, parent) || child == self.root {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.detach(child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.get_mut(node)?.parent.take() {
            if let Ok(parent) = self.get_mut(parent) {
                parent.children.retain(|c| *c != node);
            }
        }
        Ok(())
    }

    /// Remove `node` and its subtree from the document. Their ids become
    /// invalid and their slots are reused; focus is dropped if it was inside
    /// the subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Err(DomError::HierarchyRequest {
                parent: self.root,
                child: node,
            });
        }
        self.detach(node)?;
        let mut doomed = vec![node];
        doomed.extend(self.descendants(node));
        if self.active.is_some_and(|a| doomed.contains(&a)) {
            self.active = None;
        }
        for id in doomed {
            if let Some(slot) = self
                .nodes
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
            {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
        Ok(())
    }

    pub fn clear_children(&mut self, node: NodeId) -> Result<(), DomError> {
        let children = self.get(node)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Whether `node` exists and is reachable from the document root.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some() && self.is_inclusive_ancestor(self.root, node)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(Node::parent);
        }
        false
    }

    /// All descendants of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(node) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            if let Some(n) = self.node(id) {
                out.push(id);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    /// Attached elements carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.has_class(*n, class))
    }

    /// Nearest inclusive ancestor carrying `class`.
    pub fn closest_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            if n.has_class(class) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest_with_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            if n.is_tag(tag) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Attributes, classes, text, values
    // ------------------------------------------------------------------

    /// Set an attribute. `class` replaces the class list and `value` also
    /// sets the control's current value.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let n = self.element_mut(node)?;
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => {
                n.classes = value.split_whitespace().map(str::to_string).collect();
            }
            "value" => {
                n.value = value.to_string();
                n.attributes.insert(name, value.to_string());
            }
            _ => {
                n.attributes.insert(name, value.to_string());
            }
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let n = self.element_mut(node)?;
        if name == "class" {
            let had = !n.classes.is_empty();
            n.classes.clear();
            return Ok(had);
        }
        Ok(n.attributes.remove(name).is_some())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).and_then(|n| n.attribute(name))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).is_some_and(|n| n.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let n = self.element_mut(node)?;
        if !n.has_class(class) {
            n.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    /// Toggle `class`, returning whether it is now present.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool, DomError> {
        let n = self.element_mut(node)?;
        if n.has_class(class) {
            n.classes.retain(|c| c != class);
            Ok(false)
        } else {
            n.classes.push(class.to_string());
            Ok(true)
        }
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.clear_children(node)?;
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(node, child)?;
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(t)) = self.node(node).map(Node::kind) {
            out.push_str(t);
        }
        for id in self.descendants(node) {
            if let Some(NodeKind::Text(t)) = self.node(id).map(Node::kind) {
                out.push_str(t);
            }
        }
        out
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.node(node).map(Node::value).unwrap_or_default()
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?.value = value.to_string();
        Ok(())
    }

    /// Descendant of `form` whose `name` attribute equals `name`.
    pub fn form_field(&self, form: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(form)
            .into_iter()
            .find(|n| self.attribute(*n, "name") == Some(name))
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Toggle `display: none` on an element.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) -> Result<(), DomError> {
        self.element_mut(node)?.hidden = hidden;
        Ok(())
    }

    pub fn set_size(&mut self, node: NodeId, width: u16, height: u16) -> Result<(), DomError> {
        self.element_mut(node)?.size = (width, height);
        Ok(())
    }

    /// Number of layout boxes: one for an attached element with no
    /// `display: none` on itself or any ancestor, zero otherwise.
    pub fn client_rect_count(&self, node: NodeId) -> usize {
        if !self.contains(node) || self.node(node).and_then(Node::tag).is_none() {
            return 0;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            match self.node(id) {
                Some(n) if n.hidden => return 0,
                Some(n) => current = n.parent,
                None => return 0,
            }
        }
        1
    }

    pub fn offset_size(&self, node: NodeId) -> (u16, u16) {
        if self.client_rect_count(node) == 0 {
            return (0, 0);
        }
        self.node(node).map(|n| n.size).unwrap_or((0, 0))
    }

    /// Non-zero rendered size or at least one layout box.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        let (w, h) = self.offset_size(node);
        w > 0 || h > 0 || self.client_rect_count(node) > 0
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Move focus to `node`. Fails if the node is gone, detached, not
    /// rendered, or not focusable; focus is left unchanged on failure.
    pub fn focus(&mut self, node: NodeId) -> Result<(), DomError> {
        let n = self.get(node)?;
        let focusable = n.is_interactive() || n.has_attribute("tabindex");
        if !self.contains(node) {
            return Err(DomError::Detached(node));
        }
        if !focusable || !self.is_rendered(node) {
            return Err(DomError::NotFocusable(node));
        }
        self.active = Some(node);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Sequential navigation over the whole document, as the host would do
    /// when a Tab press is not intercepted. Wraps at both ends.
    pub fn focus_step(&mut self, forward: bool) -> Option<NodeId> {
        let order: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.node(*id).is_some_and(|n| {
                    n.is_interactive() && n.tab_index().is_none_or(|i| i >= 0)
                }) && self.is_rendered(*id)
            })
            .collect();
        if order.is_empty() {
            return None;
        }
        let position = self.active.and_then(|a| order.iter().position(|n| *n == a));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => order.len() - 1,
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
        };
        self.active = Some(order[next]);
        self.active
    }

    // ------------------------------------------------------------------
    // Scroll lock & listeners
    // ------------------------------------------------------------------

    pub fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn subscribe(&mut self, scope: ListenerScope) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, scope);
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners(&self) -> impl Iterator<Item = (&ListenerId, &ListenerScope)> {
        self.listeners.iter()
    }
}
