//! # Application Context
//!
//! [`App`] owns the document and every controller that acts on it. All UI
//! wiring goes through it: activations (clicks, or Enter/Space on a focused
//! control), keys, the search debounce tick, and persistence after each
//! change.
//!
//! ## Key dispatch
//!
//! 1. A pending alert or confirm swallows every key.
//! 2. An open modal's focus trap.
//! 3. The study-mode listener (not consulted while a modal is open).
//! 4. The focused element's default action: text entry, button activation,
//!    form submission, sequential Tab navigation.
//! 5. Global shortcuts.

use crate::deck::{step, Deck, DeckId, DeckStore, Debouncer, Direction, SearchState};
use crate::dom::markup::{escape_html, parse_into};
use crate::dom::{Document, DomError, Key, KeyEvent, KeyOutcome, Node, NodeId};
use crate::modal::{ModalController, ModalOptions};
use crate::storage::StateStore;
use crate::study::{StudyAction, StudyModeController};
use crate::ui::paint::{self, CardView, LayoutIds, DECK_DELETE_CLASS, FLIPPED_CLASS};
use crate::ui::theme::Theme;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const CANCEL_CLASS: &str = "cancel";

const DECK_FORM: &str = r#"
<label>Deck name<br/><input name="name" required /></label>
<div class="form-actions"><button type="submit">Create</button> <button type="button" class="cancel">Cancel</button></div>
"#;

const HELP: &str = r#"
<ul class="help">
<li>Tab / Shift+Tab: move focus</li>
<li>Enter / Space: activate the focused control</li>
<li>j / k: next / previous deck</li>
<li>h / l: previous / next card</li>
<li>f: flip card</li>
<li>n: new deck, a: new card, e: edit card</li>
<li>d: delete card, x: delete deck</li>
<li>/: search, s: study, ?: help, q: quit</li>
<li>In study mode: Left / Right, Space to flip, Esc to exit</li>
</ul>
<button type="button" class="cancel">Done</button>
"#;

fn card_form(front: &str, back: &str, submit: &str) -> String {
    format!(
        r#"
<label>Front<br/><input name="front" required value="{}" /></label>
<label>Back<br/><input name="back" value="{}" /></label>
<div class="form-actions"><button type="submit">{submit}</button> <button type="button" class="cancel">Cancel</button></div>
"#,
        escape_html(front),
        escape_html(back),
    )
}

/// What the open dialog does when its form is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    CreateDeck,
    NewCard { deck_id: DeckId },
    EditCard { deck_id: DeckId, index: usize },
    Help,
}

/// Destructive action waiting on a confirm prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    DeleteDeck(DeckId),
    DeleteCard { deck_id: DeckId, index: usize },
}

/// Blocking native-style prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Alert(String),
    Confirm {
        message: String,
        action: PendingAction,
    },
}

pub struct App {
    pub doc: Document,
    pub layout: LayoutIds,
    pub store: DeckStore,
    pub modal: ModalController,
    pub study: StudyModeController,
    pub search: SearchState,
    pub debounce: Debouncer,
    pub current_deck: Option<DeckId>,
    pub form: Option<FormKind>,
    pub prompt: Option<Prompt>,
    pub theme: &'static Theme,
    pub should_quit: bool,
    persistence: Option<StateStore>,
}

impl App {
    /// Build the document for `store` and select its first deck.
    pub fn new(store: DeckStore) -> Result<Self, DomError> {
        let mut doc = Document::new();
        let layout = paint::build_layout(&mut doc)?;
        let mut app = Self {
            doc,
            layout,
            store,
            modal: ModalController::new(),
            study: StudyModeController::new(),
            search: SearchState::default(),
            debounce: Debouncer::default(),
            current_deck: None,
            form: None,
            prompt: None,
            theme: Theme::default_theme(),
            should_quit: false,
            persistence: None,
        };
        let first = app.store.decks().first().map(|d| d.id);
        app.select_deck(first)?;
        app.focus_current_deck();
        Ok(app)
    }

    /// Save the deck state here after every change.
    pub fn with_persistence(mut self, persistence: StateStore) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_theme(mut self, theme: &'static Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Debouncer::new(delay);
        self
    }

    pub fn current_deck(&self) -> Option<&Deck> {
        self.current_deck.and_then(|id| self.store.get_deck(id))
    }

    /// Index of the card on screen: the study session's while studying,
    /// otherwise the deck's resting index.
    pub fn cursor(&self) -> Option<usize> {
        let deck = self.current_deck()?;
        Some(self.study.index_for(deck.id).unwrap_or(deck.current_index))
    }

    fn set_cursor(&mut self, index: usize) {
        let Some(id) = self.current_deck else {
            return;
        };
        if self.study.index_for(id).is_some() {
            self.study.set_index(index);
        } else if let Some(deck) = self.store.get_deck_mut(id) {
            deck.current_index = index;
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.doc.has_class(self.layout.card, FLIPPED_CLASS)
    }

    /// A text control has focus and consumes printable keys.
    pub fn is_typing(&self) -> bool {
        self.doc
            .active_element()
            .and_then(|id| self.doc.node(id))
            .is_some_and(Node::is_text_input)
    }

    fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.save_state(&self.store.snapshot());
        }
    }

    fn focus_current_deck(&mut self) {
        let item = self
            .current_deck
            .and_then(|id| {
                self.doc
                    .find_by_class(paint::DECK_ITEM_CLASS)
                    .into_iter()
                    .find(|li| paint::deck_id_of(&self.doc, *li) == Some(id))
            })
            .unwrap_or(self.layout.new_deck_button);
        if let Err(err) = self.doc.focus(item) {
            debug!(error = %err, "could not set initial focus");
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render_deck_list(&mut self) -> Result<(), DomError> {
        paint::paint_deck_list(
            &mut self.doc,
            &self.layout,
            self.store.decks(),
            self.current_deck,
        )
    }

    fn render_card(&mut self) -> Result<(), DomError> {
        let index = self.cursor().unwrap_or(0);
        let deck = self.current_deck.and_then(|id| self.store.get_deck(id));
        let view = CardView {
            deck,
            index,
            studying: self.study.is_studying(),
            search: &self.search,
        };
        paint::paint_card(&mut self.doc, &self.layout, view)
    }

    // ------------------------------------------------------------------
    // Decks and cards
    // ------------------------------------------------------------------

    /// Make `id` the current deck. Switching decks drops the search and any
    /// study session.
    pub fn select_deck(&mut self, id: Option<DeckId>) -> Result<(), DomError> {
        let id = id.filter(|id| self.store.get_deck(*id).is_some());
        if id != self.current_deck {
            self.debounce.cancel();
            self.search.clear();
            self.doc.set_value(self.layout.search_input, "")?;
            self.study.exit(&mut self.doc);
            debug!(deck = ?id, "deck selected");
        }
        self.current_deck = id;
        self.render_deck_list()?;
        self.render_card()
    }

    fn select_adjacent_deck(&mut self, forward: bool) -> Result<(), DomError> {
        let decks = self.store.decks();
        let Some(last) = decks.len().checked_sub(1) else {
            return Ok(());
        };
        let position = self
            .current_deck
            .and_then(|id| decks.iter().position(|d| d.id == id));
        let next = match (position, forward) {
            (None, _) => 0,
            (Some(p), true) => (p + 1).min(last),
            (Some(p), false) => p.saturating_sub(1),
        };
        let id = decks.get(next).map(|d| d.id);
        self.select_deck(id)?;
        self.focus_current_deck();
        Ok(())
    }

    /// Move to the previous or next card, following search matches when a
    /// search is active. Nothing happens at either end, or when the active
    /// search matched no cards.
    pub fn step_card(&mut self, direction: Direction) -> Result<(), DomError> {
        let len = self.current_deck().map_or(0, |d| d.cards.len());
        if len == 0 || (self.search.is_active() && self.search.match_count() == 0) {
            return Ok(());
        }
        let current = self.cursor().unwrap_or(0);
        let next = step(current, len, direction, self.search.matches());
        if next == current {
            return Ok(());
        }
        self.set_cursor(next);
        self.render_card()?;
        if !self.study.is_studying() {
            self.persist();
        }
        Ok(())
    }

    /// Toggle the card face. Returns whether the back is now showing.
    pub fn flip_card(&mut self) -> Result<bool, DomError> {
        self.doc.toggle_class(self.layout.card, FLIPPED_CLASS)
    }

    fn alert(&mut self, message: &str) {
        debug!(text = message, "alert shown");
        self.prompt = Some(Prompt::Alert(message.to_string()));
    }

    /// Ask before deleting the card on screen.
    pub fn request_delete_card(&mut self) {
        let Some(deck_id) = self.current_deck else {
            self.alert("Select a deck first");
            return;
        };
        let index = self.cursor().unwrap_or(0);
        if self.current_deck().and_then(|d| d.card(index)).is_none() {
            self.alert("No card to delete");
            return;
        }
        self.prompt = Some(Prompt::Confirm {
            message: "Delete this card?".to_string(),
            action: PendingAction::DeleteCard { deck_id, index },
        });
    }

    pub fn request_delete_deck(&mut self, id: DeckId) {
        if self.store.get_deck(id).is_none() {
            return;
        }
        self.prompt = Some(Prompt::Confirm {
            message: "Delete this deck?".to_string(),
            action: PendingAction::DeleteDeck(id),
        });
    }

    /// Resolve the pending prompt. An accepted confirm runs its action.
    pub fn answer_prompt(&mut self, accept: bool) -> Result<(), DomError> {
        match self.prompt.take() {
            Some(Prompt::Confirm { action, .. }) if accept => self.perform(action),
            _ => Ok(()),
        }
    }

    fn perform(&mut self, action: PendingAction) -> Result<(), DomError> {
        match action {
            PendingAction::DeleteCard { deck_id, index } => {
                if self.store.delete_card(deck_id, index).is_none() {
                    return Ok(());
                }
                let len = self.store.get_deck(deck_id).map_or(0, |d| d.cards.len());
                if self.study.index_for(deck_id).is_some() {
                    self.study.set_index(index.min(len.saturating_sub(1)));
                }
                self.search.refresh(self.store.get_deck(deck_id));
                self.render_card()?;
            }
            PendingAction::DeleteDeck(id) => {
                if !self.store.delete_deck(id) {
                    return Ok(());
                }
                info!(deck = id, "deck deleted");
                if self.current_deck == Some(id) {
                    self.select_deck(None)?;
                } else {
                    self.render_deck_list()?;
                }
            }
        }
        self.persist();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dialogs
    // ------------------------------------------------------------------

    fn open_form(&mut self, title: &str, markup: &str, kind: FormKind) -> Result<(), DomError> {
        let form = self.doc.create_element("form");
        if let Err(err) = parse_into(&mut self.doc, form, markup) {
            let _ = self.doc.remove(form);
            return Err(err);
        }
        match self.modal.open(&mut self.doc, ModalOptions::new(form).with_title(title)) {
            Ok(true) => {
                self.form = Some(kind);
                Ok(())
            }
            Ok(false) => {
                let _ = self.doc.remove(form);
                Ok(())
            }
            Err(err) => {
                let _ = self.doc.remove(form);
                Err(err)
            }
        }
    }

    pub fn open_new_deck_form(&mut self) -> Result<(), DomError> {
        self.open_form("Create Deck", DECK_FORM, FormKind::CreateDeck)
    }

    pub fn open_new_card_form(&mut self) -> Result<(), DomError> {
        let Some(deck_id) = self.current_deck else {
            self.alert("Select a deck first");
            return Ok(());
        };
        let markup = card_form("", "", "Add Card");
        self.open_form("New Card", &markup, FormKind::NewCard { deck_id })
    }

    /// Open the edit form prefilled with the card on screen.
    pub fn open_edit_card_form(&mut self) -> Result<(), DomError> {
        let Some(deck_id) = self.current_deck else {
            self.alert("Select a deck first");
            return Ok(());
        };
        let index = self.cursor().unwrap_or(0);
        let Some(markup) = self
            .current_deck()
            .and_then(|d| d.card(index))
            .map(|c| card_form(&c.front, &c.back, "Save"))
        else {
            self.alert("No card to edit");
            return Ok(());
        };
        self.open_form("Edit Card", &markup, FormKind::EditCard { deck_id, index })
    }

    pub fn open_help(&mut self) -> Result<(), DomError> {
        let options = ModalOptions::new(HELP).with_title("Keyboard Shortcuts");
        if self.modal.open(&mut self.doc, options)? {
            self.form = Some(FormKind::Help);
        }
        Ok(())
    }

    pub fn close_modal(&mut self) -> bool {
        self.form = None;
        self.modal.close(&mut self.doc)
    }

    fn field_value(&self, form: NodeId, name: &str) -> String {
        self.doc
            .form_field(form, name)
            .map(|field| self.doc.value(field).trim().to_string())
            .unwrap_or_default()
    }

    /// Submit `form`. Empty required fields block submission without any
    /// message.
    pub fn submit_form(&mut self, form: NodeId) -> Result<(), DomError> {
        let Some(kind) = self.form else {
            return Ok(());
        };
        let incomplete = self.doc.descendants(form).into_iter().any(|field| {
            self.doc.node(field).is_some_and(|n| n.has_attribute("required"))
                && self.doc.value(field).trim().is_empty()
        });
        if incomplete {
            debug!("form submission blocked by an empty required field");
            return Ok(());
        }

        match kind {
            FormKind::CreateDeck => {
                let name = self.field_value(form, "name");
                let id = self.store.create_deck(&name).map(|d| d.id);
                self.close_modal();
                let Some(id) = id else {
                    warn!("deck ids exhausted");
                    self.alert("No more decks can be created");
                    return Ok(());
                };
                info!(deck = id, "deck created");
                self.select_deck(Some(id))?;
            }
            FormKind::NewCard { deck_id } => {
                let front = self.field_value(form, "front");
                let back = self.field_value(form, "back");
                self.close_modal();
                if self.store.add_card(deck_id, &front, &back).is_none() {
                    return Ok(());
                }
                self.search.refresh(self.store.get_deck(deck_id));
                self.render_card()?;
            }
            FormKind::EditCard { deck_id, index } => {
                let front = self.field_value(form, "front");
                let back = self.field_value(form, "back");
                self.close_modal();
                if !self.store.edit_card(deck_id, index, &front, &back) {
                    return Ok(());
                }
                self.search.refresh(self.store.get_deck(deck_id));
                self.render_card()?;
            }
            FormKind::Help => {
                self.close_modal();
                return Ok(());
            }
        }
        self.persist();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Study mode and search
    // ------------------------------------------------------------------

    /// Start studying the current deck from its resting card. A search
    /// still waiting on the debounce runs first, so the matches studied
    /// are the ones typed in the search field.
    pub fn enter_study(&mut self) -> Result<(), DomError> {
        if self.current_deck.is_none() {
            self.alert("Select a deck first");
            return Ok(());
        }
        self.flush_search()?;
        let Some((deck_id, index)) = self.current_deck().map(|d| (d.id, d.current_index)) else {
            return Ok(());
        };
        self.study.enter(&mut self.doc, deck_id, index);
        self.render_card()
    }

    /// Leave study mode. The deck keeps the index it had before studying.
    pub fn exit_study(&mut self) -> Result<(), DomError> {
        if self.study.exit(&mut self.doc).is_none() {
            return Ok(());
        }
        self.flush_search()?;
        self.render_card()
    }

    fn flush_search(&mut self) -> Result<(), DomError> {
        if self.debounce.is_pending() {
            self.run_search()?;
        }
        Ok(())
    }

    fn perform_study(&mut self, action: StudyAction) -> Result<(), DomError> {
        match action {
            StudyAction::Previous => self.step_card(Direction::Previous),
            StudyAction::Next => self.step_card(Direction::Next),
            StudyAction::Flip => self.flip_card().map(|_| ()),
            StudyAction::Exit => self.exit_study(),
        }
    }

    /// Search the current deck for the query in the search field and jump
    /// to the first match.
    pub fn run_search(&mut self) -> Result<(), DomError> {
        self.debounce.cancel();
        let query = self.doc.value(self.layout.search_input).to_string();
        let deck = self.current_deck.and_then(|id| self.store.get_deck(id));
        let Some(first) = self.search.run(deck, &query) else {
            return self.render_card();
        };
        let moved = self.cursor() != Some(first);
        self.set_cursor(first);
        self.render_card()?;
        if moved && !self.study.is_studying() {
            self.persist();
        }
        Ok(())
    }

    /// Run a debounced search whose quiet period has elapsed. Returns
    /// whether a search ran.
    pub fn tick(&mut self, now: Instant) -> Result<bool, DomError> {
        if !self.debounce.poll(now) {
            return Ok(false);
        }
        self.run_search()?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// A pointer activation on `target`. Ignored while a prompt is up.
    pub fn click(&mut self, target: NodeId) -> Result<(), DomError> {
        if self.prompt.is_some() {
            return Ok(());
        }
        self.activate(target)
    }

    /// A mouse click on `target`. Focus moves to it when it can take focus,
    /// then it is activated like [`App::click`].
    pub fn tap(&mut self, target: NodeId) -> Result<(), DomError> {
        if self.prompt.is_some() {
            return Ok(());
        }
        let _ = self.doc.focus(target);
        self.activate(target)
    }

    fn is_submit_button(&self, node: NodeId) -> bool {
        self.doc
            .node(node)
            .is_some_and(|n| n.is_tag("button") && n.attribute("type").unwrap_or("submit") == "submit")
    }

    fn activate(&mut self, target: NodeId) -> Result<(), DomError> {
        if self.modal.is_open() {
            if self.modal.handle_click(&mut self.doc, target) {
                self.form = None;
            } else if self.doc.closest_with_class(target, CANCEL_CLASS).is_some() {
                self.close_modal();
            } else if self.is_submit_button(target) {
                if let Some(form) = self.doc.closest_with_tag(target, "form") {
                    self.submit_form(form)?;
                }
            }
            return Ok(());
        }

        if let Some(id) = paint::deck_id_of(&self.doc, target) {
            if self.doc.closest_with_class(target, DECK_DELETE_CLASS).is_some() {
                self.request_delete_deck(id);
                return Ok(());
            }
            return self.select_deck(Some(id));
        }

        let Some(button) = self.doc.closest_with_tag(target, "button") else {
            return Ok(());
        };
        let action = self.doc.attribute(button, "data-action").map(str::to_owned);
        match action.as_deref() {
            Some("edit-card") => return self.open_edit_card_form(),
            Some("delete-card") => {
                self.request_delete_card();
                return Ok(());
            }
            Some(_) => return Ok(()),
            None => {}
        }
        let id = self.doc.attribute(button, "id").map(str::to_owned);
        match id.as_deref() {
            Some("new-deck-btn") => self.open_new_deck_form(),
            Some("new-card-btn") => self.open_new_card_form(),
            Some("prev-card-btn") => self.step_card(Direction::Previous),
            Some("next-card-btn") => self.step_card(Direction::Next),
            Some("flip-card-btn") => self.flip_card().map(|_| ()),
            Some("study-btn") => {
                if self.study.is_studying() {
                    self.exit_study()
                } else {
                    self.enter_study()
                }
            }
            _ => Ok(()),
        }
    }

    /// Dispatch a key. `now` feeds the search debounce.
    pub fn handle_key(&mut self, event: KeyEvent, now: Instant) -> Result<KeyOutcome, DomError> {
        if event.ctrl && event.key == Key::Char('c') {
            self.should_quit = true;
            return Ok(KeyOutcome::Handled);
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(event)?;
            return Ok(KeyOutcome::Handled);
        }

        if self.modal.is_open() {
            let outcome = self.modal.handle_key(&mut self.doc, &event);
            if !self.modal.is_open() {
                self.form = None;
            }
            if outcome.is_handled() {
                return Ok(outcome);
            }
        } else if let Some(action) = self.study.handle_key(&self.doc, &event) {
            self.perform_study(action)?;
            return Ok(KeyOutcome::Handled);
        }

        if self.default_action(event, now)?.is_handled() {
            return Ok(KeyOutcome::Handled);
        }
        self.shortcut(event)
    }

    fn handle_prompt_key(&mut self, event: KeyEvent) -> Result<(), DomError> {
        let is_alert = matches!(self.prompt, Some(Prompt::Alert(_)));
        match event.key {
            Key::Enter | Key::Escape | Key::Space if is_alert => {
                self.prompt = None;
                Ok(())
            }
            Key::Enter | Key::Char('y') | Key::Char('Y') if !is_alert => self.answer_prompt(true),
            Key::Escape | Key::Char('n') | Key::Char('N') if !is_alert => self.answer_prompt(false),
            _ => Ok(()),
        }
    }

    fn default_action(&mut self, event: KeyEvent, now: Instant) -> Result<KeyOutcome, DomError> {
        if event.key == Key::Tab {
            self.doc.focus_step(!event.shift);
            return Ok(KeyOutcome::Handled);
        }
        let Some(focused) = self.doc.active_element() else {
            return Ok(KeyOutcome::Ignored);
        };
        if self.is_typing() {
            return self.edit_text(focused, event, now);
        }
        match event.key {
            Key::Enter | Key::Space if !event.ctrl => {
                self.activate(focused)?;
                Ok(KeyOutcome::Handled)
            }
            _ => Ok(KeyOutcome::Ignored),
        }
    }

    fn edit_text(
        &mut self,
        input: NodeId,
        event: KeyEvent,
        now: Instant,
    ) -> Result<KeyOutcome, DomError> {
        if event.ctrl {
            return Ok(KeyOutcome::Ignored);
        }
        let mut value = self.doc.value(input).to_string();
        match event.key {
            Key::Char(c) => value.push(c),
            Key::Space => value.push(' '),
            Key::Backspace => {
                value.pop();
            }
            Key::Enter => {
                if let Some(form) = self.doc.closest_with_tag(input, "form") {
                    self.submit_form(form)?;
                } else if input == self.layout.search_input {
                    self.run_search()?;
                }
                return Ok(KeyOutcome::Handled);
            }
            Key::Escape if input == self.layout.search_input => {
                self.doc.blur();
                return Ok(KeyOutcome::Handled);
            }
            _ => return Ok(KeyOutcome::Ignored),
        }
        self.doc.set_value(input, &value)?;
        if input == self.layout.search_input {
            self.debounce.schedule(now);
        }
        Ok(KeyOutcome::Handled)
    }

    fn shortcut(&mut self, event: KeyEvent) -> Result<KeyOutcome, DomError> {
        if self.modal.is_open() || self.is_typing() || event.ctrl {
            return Ok(KeyOutcome::Ignored);
        }
        match event.key {
            Key::Char('q') => self.should_quit = true,
            Key::Char('n') => self.open_new_deck_form()?,
            Key::Char('a') => self.open_new_card_form()?,
            Key::Char('e') => self.open_edit_card_form()?,
            Key::Char('d') => self.request_delete_card(),
            Key::Char('x') => {
                if let Some(id) = self.current_deck {
                    self.request_delete_deck(id);
                }
            }
            Key::Char('f') => {
                self.flip_card()?;
            }
            Key::Char('s') => self.enter_study()?,
            Key::Char('h') | Key::ArrowLeft => self.step_card(Direction::Previous)?,
            Key::Char('l') | Key::ArrowRight => self.step_card(Direction::Next)?,
            Key::Char('k') | Key::ArrowUp => self.select_adjacent_deck(false)?,
            Key::Char('j') | Key::ArrowDown => self.select_adjacent_deck(true)?,
            Key::Char('/') => {
                if let Err(err) = self.doc.focus(self.layout.search_input) {
                    debug!(error = %err, "could not focus search field");
                }
            }
            Key::Char('?') => self.open_help()?,
            _ => return Ok(KeyOutcome::Ignored),
        }
        Ok(KeyOutcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Card;
    use crate::dom::ListenerScope;

    fn key(k: Key) -> KeyEvent {
        KeyEvent::new(k)
    }

    fn typed(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            let k = if c == ' ' { Key::Space } else { Key::Char(c) };
            app.handle_key(key(k), now).unwrap();
        }
    }

    fn app_with_cards(fronts: &[&str]) -> App {
        let mut store = DeckStore::empty();
        let id = store.create_deck("Words").unwrap().id;
        for front in fronts {
            store.add_card(id, front, &format!("{front}-back"));
        }
        App::new(store).unwrap()
    }

    #[test]
    fn test_new_selects_first_deck() {
        let app = App::new(DeckStore::default()).unwrap();
        assert_eq!(app.current_deck().map(|d| d.name.as_str()), Some("Sample Deck"));
        assert_eq!(app.doc.text_content(app.layout.card_front), "Hello");
        assert!(app.doc.active_element().is_some());
    }

    #[test]
    fn test_create_deck_through_form() {
        let mut app = App::new(DeckStore::empty()).unwrap();
        let now = Instant::now();
        app.handle_key(key(Key::Char('n')), now).unwrap();
        assert!(app.modal.is_open());
        assert_eq!(app.form, Some(FormKind::CreateDeck));

        typed(&mut app, "Spanish", now);
        app.handle_key(key(Key::Enter), now).unwrap();

        assert!(!app.modal.is_open());
        assert_eq!(app.form, None);
        assert_eq!(app.current_deck().map(|d| d.name.as_str()), Some("Spanish"));
        assert_eq!(app.doc.find_by_class(paint::DECK_ITEM_CLASS).len(), 1);
    }

    #[test]
    fn test_empty_required_field_blocks_submit() {
        let mut app = App::new(DeckStore::empty()).unwrap();
        app.open_new_deck_form().unwrap();
        app.handle_key(key(Key::Enter), Instant::now()).unwrap();
        assert!(app.modal.is_open());
        assert!(app.store.decks().is_empty());
    }

    #[test]
    fn test_new_card_without_deck_alerts() {
        let mut app = App::new(DeckStore::empty()).unwrap();
        app.open_new_card_form().unwrap();
        assert_eq!(app.prompt, Some(Prompt::Alert("Select a deck first".to_string())));
        assert!(!app.modal.is_open());

        app.handle_key(key(Key::Enter), Instant::now()).unwrap();
        assert_eq!(app.prompt, None);
    }

    #[test]
    fn test_edit_form_is_prefilled_and_saves() {
        let mut app = app_with_cards(&["<b>&"]);
        app.open_edit_card_form().unwrap();
        let dialog = app.modal.dialog().unwrap();
        let form = app
            .doc
            .descendants(dialog)
            .into_iter()
            .find(|n| app.doc.node(*n).is_some_and(|n| n.is_tag("form")))
            .unwrap();
        let front = app.doc.form_field(form, "front").unwrap();
        assert_eq!(app.doc.value(front), "<b>&");
        assert_eq!(app.doc.active_element(), Some(front));

        app.doc.set_value(front, "  edited ").unwrap();
        app.submit_form(form).unwrap();
        assert_eq!(app.current_deck().unwrap().cards[0].front, "edited");
        assert_eq!(app.doc.text_content(app.layout.card_front), "edited");
    }

    #[test]
    fn test_cancel_closes_and_restores_focus() {
        let mut app = App::new(DeckStore::default()).unwrap();
        let opener = app.layout.new_deck_button;
        app.doc.focus(opener).unwrap();
        app.handle_key(key(Key::Enter), Instant::now()).unwrap();
        assert!(app.modal.is_open());

        let cancel = app.doc.first_by_class(CANCEL_CLASS).unwrap();
        app.click(cancel).unwrap();
        assert!(!app.modal.is_open());
        assert_eq!(app.doc.active_element(), Some(opener));
    }

    #[test]
    fn test_delete_card_confirm() {
        let mut app = app_with_cards(&["a", "b"]);
        app.step_card(Direction::Next).unwrap();
        app.request_delete_card();
        assert!(matches!(app.prompt, Some(Prompt::Confirm { .. })));

        app.handle_key(key(Key::Char('n')), Instant::now()).unwrap();
        assert_eq!(app.current_deck().unwrap().cards.len(), 2);

        app.request_delete_card();
        app.handle_key(key(Key::Char('y')), Instant::now()).unwrap();
        let deck = app.current_deck().unwrap();
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.current_index, 0);
        assert_eq!(app.doc.text_content(app.layout.card_front), "a");
    }

    #[test]
    fn test_delete_current_deck_clears_selection() {
        let mut app = app_with_cards(&["a"]);
        let id = app.current_deck.unwrap();
        app.request_delete_deck(id);
        app.answer_prompt(true).unwrap();
        assert_eq!(app.current_deck, None);
        assert_eq!(app.doc.text_content(app.layout.card_front), "Front");
        assert!(app.doc.find_by_class(paint::DECK_ITEM_CLASS).is_empty());
    }

    #[test]
    fn test_flip_and_repaint() {
        let mut app = app_with_cards(&["a", "b"]);
        assert!(app.flip_card().unwrap());
        assert!(app.is_flipped());
        app.step_card(Direction::Next).unwrap();
        assert!(!app.is_flipped());
    }

    #[test]
    fn test_study_cursor_leaves_resting_index() {
        let mut app = app_with_cards(&["a", "b", "c"]);
        let now = Instant::now();
        app.handle_key(key(Key::Char('s')), now).unwrap();
        assert!(app.study.is_studying());
        assert!(app.doc.has_class(app.layout.card, paint::STUDYING_CLASS));

        app.handle_key(key(Key::ArrowRight), now).unwrap();
        app.handle_key(key(Key::ArrowRight), now).unwrap();
        assert_eq!(app.cursor(), Some(2));
        assert_eq!(app.current_deck().unwrap().current_index, 0);

        app.handle_key(key(Key::Space), now).unwrap();
        assert!(app.is_flipped());

        app.handle_key(key(Key::Escape), now).unwrap();
        assert!(!app.study.is_studying());
        assert!(!app.is_flipped());
        assert_eq!(app.cursor(), Some(0));
    }

    #[test]
    fn test_modal_blocks_study_listener() {
        let mut app = app_with_cards(&["a", "b"]);
        let now = Instant::now();
        app.enter_study().unwrap();
        app.open_help().unwrap();

        app.handle_key(key(Key::ArrowRight), now).unwrap();
        assert_eq!(app.cursor(), Some(0));

        app.handle_key(key(Key::Escape), now).unwrap();
        assert!(!app.modal.is_open());
        assert!(app.study.is_studying());
        assert!(app
            .doc
            .listeners()
            .any(|(_, scope)| *scope == ListenerScope::StudyMode));
    }

    #[test]
    fn test_search_is_debounced() {
        let mut app = app_with_cards(&["apple", "banana", "cherry", "grape"]);
        let now = Instant::now();
        app.handle_key(key(Key::Char('/')), now).unwrap();
        assert!(app.is_typing());
        typed(&mut app, "ap", now);

        assert!(!app.tick(now + Duration::from_millis(100)).unwrap());
        assert!(app.tick(now + Duration::from_millis(300)).unwrap());
        assert_eq!(app.search.matches(), &[0, 3]);
        assert_eq!(app.doc.text_content(app.layout.search_status), "2 matches");
    }

    #[test]
    fn test_typing_in_search_does_not_trigger_shortcuts() {
        let mut app = app_with_cards(&["a"]);
        let now = Instant::now();
        app.doc.focus(app.layout.search_input).unwrap();
        typed(&mut app, "qn", now);
        assert!(!app.should_quit);
        assert!(!app.modal.is_open());
        assert_eq!(app.doc.value(app.layout.search_input), "qn");
    }

    #[test]
    fn test_switching_decks_cancels_search() {
        let mut store = DeckStore::empty();
        let first = store.create_deck("One").unwrap().id;
        store.add_card(first, "x", "y");
        let second = store.create_deck("Two").unwrap().id;
        let mut app = App::new(store).unwrap();
        let now = Instant::now();

        app.doc.focus(app.layout.search_input).unwrap();
        typed(&mut app, "x", now);
        assert!(app.debounce.is_pending());

        app.select_deck(Some(second)).unwrap();
        assert!(!app.debounce.is_pending());
        assert_eq!(app.doc.value(app.layout.search_input), "");
        assert!(!app.tick(now + Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn test_entering_study_runs_pending_search() {
        let mut app = app_with_cards(&["apple", "banana", "grape"]);
        let now = Instant::now();
        app.doc.focus(app.layout.search_input).unwrap();
        typed(&mut app, "grape", now);
        assert!(app.debounce.is_pending());

        app.enter_study().unwrap();
        assert!(!app.debounce.is_pending());
        assert_eq!(app.search.matches(), &[2]);
        assert_eq!(app.doc.value(app.layout.search_input), "grape");
        assert_eq!(app.cursor(), Some(2));
        assert_eq!(app.doc.text_content(app.layout.search_status), "1 match");
    }

    #[test]
    fn test_leaving_study_runs_pending_search() {
        let mut app = app_with_cards(&["apple", "banana", "grape"]);
        let now = Instant::now();
        app.enter_study().unwrap();
        app.doc.focus(app.layout.search_input).unwrap();
        typed(&mut app, "ban", now);

        app.exit_study().unwrap();
        assert!(!app.debounce.is_pending());
        assert_eq!(app.search.matches(), &[1]);
        assert_eq!(app.cursor(), Some(1));
    }

    #[test]
    fn test_search_without_matches_holds_the_card() {
        let mut app = app_with_cards(&["a", "b", "c"]);
        let now = Instant::now();
        app.doc.focus(app.layout.search_input).unwrap();
        typed(&mut app, "zzz", now);
        app.handle_key(key(Key::Enter), now).unwrap();
        assert!(app.search.is_active());
        assert_eq!(app.search.match_count(), 0);

        app.doc.blur();
        app.step_card(Direction::Next).unwrap();
        assert_eq!(app.cursor(), Some(0));

        app.doc.focus(app.layout.search_input).unwrap();
        for _ in 0..3 {
            app.handle_key(key(Key::Backspace), now).unwrap();
        }
        app.handle_key(key(Key::Enter), now).unwrap();
        app.step_card(Direction::Next).unwrap();
        assert_eq!(app.cursor(), Some(1));
    }

    #[test]
    fn test_tap_on_overlay_closes_dialog() {
        let mut app = App::new(DeckStore::default()).unwrap();
        app.open_help().unwrap();
        let dialog = app.modal.dialog().unwrap();
        app.tap(dialog).unwrap();
        assert!(app.modal.is_open());

        let overlay = app.modal.overlay().unwrap();
        app.tap(overlay).unwrap();
        assert!(!app.modal.is_open());
    }

    #[test]
    fn test_tap_focuses_then_activates() {
        let mut app = app_with_cards(&["a", "b"]);
        let next = app.doc.find_by_id("next-card-btn").unwrap();
        app.tap(next).unwrap();
        assert_eq!(app.doc.active_element(), Some(next));
        assert_eq!(app.cursor(), Some(1));

        app.tap(app.layout.search_input).unwrap();
        assert!(app.is_typing());

        app.prompt = Some(Prompt::Alert("busy".to_string()));
        app.tap(next).unwrap();
        assert_eq!(app.doc.active_element(), Some(app.layout.search_input));
    }

    #[test]
    fn test_deck_delete_button_asks_first() {
        let mut app = App::new(DeckStore::default()).unwrap();
        let delete = app.doc.first_by_class(DECK_DELETE_CLASS).unwrap();
        app.click(delete).unwrap();
        assert!(matches!(
            app.prompt,
            Some(Prompt::Confirm {
                action: PendingAction::DeleteDeck(1),
                ..
            })
        ));
        app.handle_key(key(Key::Escape), Instant::now()).unwrap();
        assert_eq!(app.store.decks().len(), 1);
    }

    #[test]
    fn test_new_card_is_added() {
        let mut app = app_with_cards(&[]);
        let now = Instant::now();
        app.open_new_card_form().unwrap();
        typed(&mut app, "hola", now);
        app.handle_key(key(Key::Tab), now).unwrap();
        typed(&mut app, "hello", now);
        app.handle_key(key(Key::Enter), now).unwrap();

        let deck = app.current_deck().unwrap();
        assert_eq!(
            deck.cards,
            vec![Card {
                id: 1,
                front: "hola".to_string(),
                back: "hello".to_string()
            }]
        );
    }
}
