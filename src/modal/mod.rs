//! # Modal Dialogs
//!
//! [`ModalController`] owns at most one open dialog.
//!
//! ## Lifecycle
//!
//! ```text
//!            open(options)                 close()
//!  CLOSED ─────────────────▶ OPEN ─────────────────▶ CLOSED
//!    ▲  close(): no-op        │ open(): no-op
//!    └────────────────────────┘
//! ```
//!
//! Opening remembers the focused element (the *opener*), builds the overlay
//! and dialog, hides the application root from assistive tech, locks
//! document scrolling, focuses the first focusable element in the dialog
//! (or its close button), and attaches a [`FocusTrap`]. Closing undoes all
//! of it in reverse and tries to give focus back to the opener; if the
//! opener has disappeared the failure is ignored.
//!
//! Escape (through the trap), clicks on the overlay background, and the
//! built-in close button all route to [`ModalController::close`].

use crate::dom::markup::parse_into;
use crate::dom::{Content, Document, DomError, KeyEvent, KeyOutcome, NodeId};
use crate::focus::{scan, FocusTrap, TrapAction};
use tracing::{debug, info, warn};

pub const OVERLAY_CLASS: &str = "modal-overlay";
pub const DIALOG_CLASS: &str = "modal-dialog";
pub const CONTENT_CLASS: &str = "modal-content";
pub const CLOSE_CLASS: &str = "modal-close";
pub const TITLE_ID: &str = "modal-title";
/// Class of the region hidden from assistive tech while a dialog is open.
pub const APP_ROOT_CLASS: &str = "app-layout";

/// What to show in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
    pub title: Option<String>,
    pub body: Content,
}

impl ModalOptions {
    pub fn new(body: impl Into<Content>) -> Self {
        Self {
            title: None,
            body: body.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open,
}

#[derive(Debug)]
struct ModalSession {
    opener: Option<NodeId>,
    overlay: NodeId,
    dialog: NodeId,
    close_button: NodeId,
    trap: FocusTrap,
}

struct DialogNodes {
    overlay: NodeId,
    dialog: NodeId,
    close_button: NodeId,
}

#[derive(Debug, Default)]
pub struct ModalController {
    session: Option<ModalSession>,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModalState {
        if self.session.is_some() {
            ModalState::Open
        } else {
            ModalState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.overlay)
    }

    pub fn dialog(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.dialog)
    }

    pub fn close_button(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.close_button)
    }

    pub fn opener(&self) -> Option<NodeId> {
        self.session.as_ref().and_then(|s| s.opener)
    }

    /// Open a dialog. Returns `Ok(false)` without touching the document
    /// when one is already open.
    pub fn open(&mut self, doc: &mut Document, options: ModalOptions) -> Result<bool, DomError> {
        if self.session.is_some() {
            debug!("modal already open, ignoring open request");
            return Ok(false);
        }
        let opener = doc.active_element();

        let nodes = build_dialog(doc, &options)?;
        let app_root = doc.first_by_class(APP_ROOT_CLASS);
        let body = doc.body();
        let attached = match app_root {
            Some(root) => doc.set_attribute(root, "aria-hidden", "true"),
            None => Ok(()),
        }
        .and_then(|()| doc.append_child(body, nodes.overlay));
        if let Err(err) = attached {
            let _ = doc.remove(nodes.overlay);
            if let Some(root) = app_root {
                let _ = doc.remove_attribute(root, "aria-hidden");
            }
            return Err(err);
        }
        doc.set_scroll_locked(true);

        let initial = scan(doc, nodes.dialog)
            .first()
            .copied()
            .unwrap_or(nodes.close_button);
        let _ = doc.focus(initial);

        let trap = FocusTrap::attach(doc, nodes.dialog);
        info!(title = options.title.as_deref().unwrap_or(""), "modal opened");
        self.session = Some(ModalSession {
            opener,
            overlay: nodes.overlay,
            dialog: nodes.dialog,
            close_button: nodes.close_button,
            trap,
        });
        Ok(true)
    }

    /// Close the open dialog. Returns `false` if nothing was open.
    pub fn close(&mut self, doc: &mut Document) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        session.trap.dispose(doc);
        if let Err(err) = doc.remove(session.overlay) {
            warn!(error = %err, "failed to remove modal overlay");
        }
        if let Some(app_root) = doc.first_by_class(APP_ROOT_CLASS) {
            let _ = doc.remove_attribute(app_root, "aria-hidden");
        }
        doc.set_scroll_locked(false);

        if let Some(opener) = session.opener {
            if let Err(err) = doc.focus(opener) {
                debug!(error = %err, "could not restore focus to opener");
            }
        }
        info!("modal closed");
        true
    }

    /// Offer a key to the active focus trap. Escape closes the dialog.
    pub fn handle_key(&mut self, doc: &mut Document, event: &KeyEvent) -> KeyOutcome {
        let Some(session) = &self.session else {
            return KeyOutcome::Ignored;
        };
        let action = session.trap.handle_key(doc, event);
        if action == TrapAction::CloseRequested {
            self.close(doc);
        }
        action.outcome()
    }

    /// Route a click. Clicks that land on the overlay itself (outside the
    /// dialog) or on the close button close the dialog.
    pub fn handle_click(&mut self, doc: &mut Document, target: NodeId) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let on_overlay = target == session.overlay;
        let on_close = doc.closest_with_class(target, CLOSE_CLASS) == Some(session.close_button);
        if on_overlay || on_close {
            return self.close(doc);
        }
        false
    }
}

fn build_dialog(doc: &mut Document, options: &ModalOptions) -> Result<DialogNodes, DomError> {
    let overlay = doc.create_element("div");
    let result = populate(doc, overlay, options);
    if result.is_err() {
        let _ = doc.remove(overlay);
    }
    result
}

fn populate(
    doc: &mut Document,
    overlay: NodeId,
    options: &ModalOptions,
) -> Result<DialogNodes, DomError> {
    doc.add_class(overlay, OVERLAY_CLASS)?;

    let dialog = doc.create_element("div");
    doc.add_class(dialog, DIALOG_CLASS)?;
    doc.set_attribute(dialog, "role", "dialog")?;
    doc.set_attribute(dialog, "aria-modal", "true")?;
    doc.append_child(overlay, dialog)?;

    if let Some(title) = options.title.as_deref().filter(|t| !t.is_empty()) {
        let heading = doc.create_element("h2");
        doc.set_attribute(heading, "id", TITLE_ID)?;
        doc.set_text(heading, title)?;
        doc.append_child(dialog, heading)?;
        doc.set_attribute(dialog, "aria-labelledby", TITLE_ID)?;
    }

    let content = doc.create_element("div");
    doc.add_class(content, CONTENT_CLASS)?;
    doc.append_child(dialog, content)?;
    match &options.body {
        Content::Markup(markup) => parse_into(doc, content, markup)?,
        Content::Node(node) if doc.contains(*node) => {
            return Err(DomError::HierarchyRequest {
                parent: content,
                child: *node,
            })
        }
        Content::Node(node) => doc.append_child(content, *node)?,
    }

    let close_button = doc.create_element("button");
    doc.set_attribute(close_button, "type", "button")?;
    doc.add_class(close_button, CLOSE_CLASS)?;
    doc.set_text(close_button, "Close")?;
    doc.append_child(dialog, close_button)?;

    Ok(DialogNodes {
        overlay,
        dialog,
        close_button,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Key;

    struct Fixture {
        doc: Document,
        opener: NodeId,
        app_root: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let app_root = doc.create_element("div");
        doc.add_class(app_root, APP_ROOT_CLASS).unwrap();
        doc.append_child(doc.body(), app_root).unwrap();
        let opener = doc.create_element("button");
        doc.append_child(app_root, opener).unwrap();
        doc.focus(opener).unwrap();
        Fixture {
            doc,
            opener,
            app_root,
        }
    }

    fn form_markup() -> ModalOptions {
        ModalOptions::new(r#"<input name="name"><button type="submit">Create</button>"#)
            .with_title("Create Deck")
    }

    #[test]
    fn test_open_builds_dialog_and_focuses_first_field() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        assert!(modal.open(&mut f.doc, form_markup()).unwrap());
        assert_eq!(modal.state(), ModalState::Open);

        let dialog = modal.dialog().unwrap();
        assert_eq!(f.doc.attribute(dialog, "role"), Some("dialog"));
        assert_eq!(f.doc.attribute(dialog, "aria-modal"), Some("true"));
        assert_eq!(f.doc.attribute(dialog, "aria-labelledby"), Some(TITLE_ID));
        let heading = f.doc.find_by_id(TITLE_ID).unwrap();
        assert_eq!(f.doc.text_content(heading), "Create Deck");

        let input = f.doc.form_field(dialog, "name").unwrap();
        assert_eq!(f.doc.active_element(), Some(input));
        assert_eq!(modal.opener(), Some(f.opener));
    }

    #[test]
    fn test_open_without_title_has_no_label() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal
            .open(&mut f.doc, ModalOptions::new("<p>hi</p>"))
            .unwrap();
        let dialog = modal.dialog().unwrap();
        assert_eq!(f.doc.attribute(dialog, "aria-labelledby"), None);
        assert!(f.doc.find_by_id(TITLE_ID).is_none());
    }

    #[test]
    fn test_focuses_close_button_without_other_focusables() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal
            .open(&mut f.doc, ModalOptions::new("<p>Nothing here</p>"))
            .unwrap();
        assert_eq!(f.doc.active_element(), modal.close_button());
    }

    #[test]
    fn test_second_open_is_noop() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        assert_eq!(f.doc.find_by_class(OVERLAY_CLASS).len(), 1);
        let dialog = modal.dialog();

        assert!(!modal
            .open(&mut f.doc, ModalOptions::new("<p>again</p>"))
            .unwrap());
        assert_eq!(f.doc.find_by_class(OVERLAY_CLASS).len(), 1);
        assert_eq!(modal.dialog(), dialog);
        assert_eq!(f.doc.listener_count(), 1);
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        let before = f.doc.descendants(f.doc.root()).len();
        assert!(!modal.close(&mut f.doc));
        assert_eq!(f.doc.descendants(f.doc.root()).len(), before);
        assert_eq!(f.doc.active_element(), Some(f.opener));
    }

    #[test]
    fn test_close_restores_everything() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        assert_eq!(f.doc.attribute(f.app_root, "aria-hidden"), Some("true"));
        assert!(f.doc.is_scroll_locked());

        assert!(modal.close(&mut f.doc));
        assert_eq!(modal.state(), ModalState::Closed);
        assert_eq!(f.doc.attribute(f.app_root, "aria-hidden"), None);
        assert!(!f.doc.is_scroll_locked());
        assert!(f.doc.find_by_class(OVERLAY_CLASS).is_empty());
        assert_eq!(f.doc.listener_count(), 0);
        assert_eq!(f.doc.active_element(), Some(f.opener));
    }

    #[test]
    fn test_vanished_opener_is_ignored() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        f.doc.remove(f.opener).unwrap();
        assert!(modal.close(&mut f.doc));
        assert_eq!(f.doc.active_element(), None);
    }

    #[test]
    fn test_escape_closes_through_trap() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        let outcome = modal.handle_key(&mut f.doc, &KeyEvent::new(Key::Escape));
        assert!(outcome.is_handled());
        assert!(!modal.is_open());
        assert_eq!(f.doc.active_element(), Some(f.opener));
    }

    #[test]
    fn test_tab_wraps_inside_dialog() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        let dialog = modal.dialog().unwrap();
        let first = f.doc.form_field(dialog, "name").unwrap();
        f.doc.focus(modal.close_button().unwrap()).unwrap();

        let outcome = modal.handle_key(&mut f.doc, &KeyEvent::new(Key::Tab));
        assert!(outcome.is_handled());
        assert_eq!(f.doc.active_element(), Some(first));
    }

    #[test]
    fn test_overlay_click_closes_but_dialog_click_does_not() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        let dialog = modal.dialog().unwrap();
        assert!(!modal.handle_click(&mut f.doc, dialog));
        assert!(modal.is_open());

        let overlay = modal.overlay().unwrap();
        assert!(modal.handle_click(&mut f.doc, overlay));
        assert!(!modal.is_open());
    }

    #[test]
    fn test_close_button_click_closes() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        modal.open(&mut f.doc, form_markup()).unwrap();
        let close = modal.close_button().unwrap();
        assert!(modal.handle_click(&mut f.doc, close));
        assert!(!modal.is_open());
    }

    #[test]
    fn test_prebuilt_node_body() {
        let mut f = fixture();
        let form = f.doc.create_element("form");
        let input = f.doc.create_element("input");
        f.doc.set_attribute(input, "name", "front").unwrap();
        f.doc.append_child(form, input).unwrap();

        let mut modal = ModalController::new();
        modal
            .open(&mut f.doc, ModalOptions::new(form).with_title("New Card"))
            .unwrap();
        assert!(f.doc.contains(form));
        assert_eq!(f.doc.active_element(), Some(input));

        modal.close(&mut f.doc);
        assert!(!f.doc.contains(form));
    }

    #[test]
    fn test_missing_body_node_fails_cleanly() {
        let mut f = fixture();
        let ghost = f.doc.create_element("form");
        f.doc.remove(ghost).unwrap();
        let mut modal = ModalController::new();
        assert!(modal.open(&mut f.doc, ModalOptions::new(ghost)).is_err());
        assert!(!modal.is_open());
        assert!(f.doc.find_by_class(OVERLAY_CLASS).is_empty());
        assert_eq!(f.doc.attribute(f.app_root, "aria-hidden"), None);
    }

    #[test]
    fn test_attached_body_node_is_rejected_without_side_effects() {
        let mut f = fixture();
        let mut modal = ModalController::new();
        let result = modal.open(&mut f.doc, ModalOptions::new(f.opener));
        assert!(matches!(result, Err(DomError::HierarchyRequest { .. })));

        assert!(!modal.is_open());
        assert!(f.doc.contains(f.opener));
        assert!(f.doc.find_by_class(OVERLAY_CLASS).is_empty());
        assert_eq!(f.doc.attribute(f.app_root, "aria-hidden"), None);
        assert!(!f.doc.is_scroll_locked());
        assert_eq!(f.doc.listener_count(), 0);
        assert_eq!(f.doc.active_element(), Some(f.opener));

        assert!(modal.open(&mut f.doc, form_markup()).unwrap());
    }
}
