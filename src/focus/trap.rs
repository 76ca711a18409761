use super::scanner::scan;
use crate::dom::{Document, Key, KeyEvent, KeyOutcome, ListenerId, ListenerScope, NodeId};
use tracing::debug;

/// What a trap did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// Not intercepted; the host's default handling applies.
    PassThrough,
    WrappedToFirst,
    WrappedToLast,
    /// Escape was pressed; the owner should close.
    CloseRequested,
}

impl TrapAction {
    pub fn outcome(self) -> KeyOutcome {
        match self {
            TrapAction::PassThrough => KeyOutcome::Ignored,
            _ => KeyOutcome::Handled,
        }
    }
}

/// Keeps Tab / Shift+Tab cycling inside a container.
///
/// The focusable list is captured once at [`attach`](FocusTrap::attach);
/// content added to the container later is not tracked. Only the two ends
/// of the list are intercepted, so focus on an untracked element follows
/// the document's normal tab order and can leave the container.
#[derive(Debug)]
pub struct FocusTrap {
    container: NodeId,
    nodes: Vec<NodeId>,
    listener: Option<ListenerId>,
}

impl FocusTrap {
    /// Scan `container` and register a key listener for it. With nothing
    /// focusable inside, no listener is registered and the returned trap
    /// is inert.
    pub fn attach(doc: &mut Document, container: NodeId) -> Self {
        let nodes = scan(doc, container);
        if nodes.is_empty() {
            debug!(container = container.index(), "no focusable elements, trap inert");
            return Self {
                container,
                nodes,
                listener: None,
            };
        }
        let listener = doc.subscribe(ListenerScope::FocusTrap(container));
        debug!(
            container = container.index(),
            tracked = nodes.len(),
            "focus trap attached"
        );
        Self {
            container,
            nodes,
            listener: Some(listener),
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Snapshot of the tracked elements.
    pub fn tracked(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    pub fn handle_key(&self, doc: &mut Document, event: &KeyEvent) -> TrapAction {
        if !self.is_active() {
            return TrapAction::PassThrough;
        }
        let (Some(&first), Some(&last)) = (self.nodes.first(), self.nodes.last()) else {
            return TrapAction::PassThrough;
        };
        let active = doc.active_element();

        match event.key {
            Key::Tab if event.shift => {
                if active == Some(first) {
                    let _ = doc.focus(last);
                    TrapAction::WrappedToLast
                } else {
                    TrapAction::PassThrough
                }
            }
            Key::Tab => {
                if active == Some(last) {
                    let _ = doc.focus(first);
                    TrapAction::WrappedToFirst
                } else {
                    TrapAction::PassThrough
                }
            }
            Key::Escape => TrapAction::CloseRequested,
            _ => TrapAction::PassThrough,
        }
    }

    /// Remove the key listener. Safe to call more than once.
    pub fn dispose(&mut self, doc: &mut Document) {
        if let Some(id) = self.listener.take() {
            doc.unsubscribe(id);
            debug!(container = self.container.index(), "focus trap disposed");
        }
    }
}
