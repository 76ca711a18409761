//! # Study Mode
//!
//! While studying, a document-level key listener maps:
//!
//! | Key | Action |
//! |-----|--------|
//! | `←` | previous card |
//! | `→` | next card |
//! | `Space` | flip card |
//! | `Esc` | leave study mode |
//!
//! Keys are ignored while a text field has focus. The controller only
//! translates keys into [`StudyAction`]s; the application performs them with
//! the same navigation used by the prev/next buttons.
//!
//! The session carries its own card index so stepping through a deck while
//! studying does not move the deck's resting position.

use crate::deck::DeckId;
use crate::dom::{Document, Key, KeyEvent, ListenerId, ListenerScope};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyAction {
    Previous,
    Next,
    Flip,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    deck_id: DeckId,
    index: usize,
    listener: ListenerId,
}

impl StudySession {
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Default)]
pub struct StudyModeController {
    session: Option<StudySession>,
}

impl StudyModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start studying `deck_id` at `index`. An existing session is ended
    /// first, so at most one study listener is ever registered.
    pub fn enter(&mut self, doc: &mut Document, deck_id: DeckId, index: usize) {
        if self.session.is_some() {
            self.exit(doc);
        }
        let listener = doc.subscribe(ListenerScope::StudyMode);
        info!(deck_id, index, "study mode entered");
        self.session = Some(StudySession {
            deck_id,
            index,
            listener,
        });
    }

    /// End the session and remove its listener. Returns the ended session.
    pub fn exit(&mut self, doc: &mut Document) -> Option<StudySession> {
        let session = self.session.take()?;
        doc.unsubscribe(session.listener);
        info!(deck_id = session.deck_id, "study mode exited");
        Some(session)
    }

    pub fn is_studying(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&StudySession> {
        self.session.as_ref()
    }

    pub fn deck_id(&self) -> Option<DeckId> {
        self.session.as_ref().map(|s| s.deck_id)
    }

    /// Card index of the session, if it is studying `deck_id`.
    pub fn index_for(&self, deck_id: DeckId) -> Option<usize> {
        self.session
            .as_ref()
            .filter(|s| s.deck_id == deck_id)
            .map(|s| s.index)
    }

    pub fn set_index(&mut self, index: usize) {
        if let Some(session) = self.session.as_mut() {
            session.index = index;
        }
    }

    pub fn handle_key(&self, doc: &Document, event: &KeyEvent) -> Option<StudyAction> {
        self.session.as_ref()?;
        let typing = doc
            .active_element()
            .and_then(|id| doc.node(id))
            .is_some_and(|n| n.is_text_input());
        if typing || event.ctrl {
            return None;
        }
        match event.key {
            Key::ArrowLeft => Some(StudyAction::Previous),
            Key::ArrowRight => Some(StudyAction::Next),
            Key::Space => Some(StudyAction::Flip),
            Key::Escape => Some(StudyAction::Exit),
            _ => None,
        }
    }
}
