//! # Document Painting
//!
//! Builds the application skeleton once and repaints the deck list and card
//! area after every state change. The terminal renderer
//! ([`render`](super::render)) only reads what is painted here.
//!
//! ```text
//! div.app-layout
//! ├── h1#deck-title
//! ├── nav
//! │   ├── ul#deck-list
//! │   │   └── li.deck-item[data-deck-id][tabindex=0]
//! │   │       ├── span.deck-name
//! │   │       └── button.deck-delete[aria-label]
//! │   └── button#new-deck-btn
//! └── main
//!     ├── input#search-input
//!     ├── div#search-status
//!     ├── div.card  (.is-flipped, .studying)
//!     │   └── div.card-inner > div.card-front, div.card-back
//!     ├── div#card-counter
//!     └── div.card-controls > button × 7
//! ```

use crate::deck::{Deck, DeckId, SearchState};
use crate::dom::{Document, DomError, NodeId};
use crate::modal::APP_ROOT_CLASS;

pub const DECK_ITEM_CLASS: &str = "deck-item";
pub const DECK_DELETE_CLASS: &str = "deck-delete";
pub const DECK_ID_ATTR: &str = "data-deck-id";
pub const FLIPPED_CLASS: &str = "is-flipped";
pub const STUDYING_CLASS: &str = "studying";

/// Handles to the parts of the skeleton that get repainted or activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutIds {
    pub app_root: NodeId,
    pub deck_title: NodeId,
    pub deck_list: NodeId,
    pub new_deck_button: NodeId,
    pub search_input: NodeId,
    pub search_status: NodeId,
    pub card: NodeId,
    pub card_front: NodeId,
    pub card_back: NodeId,
    pub card_counter: NodeId,
    pub controls: NodeId,
}

/// Everything the card area shows.
#[derive(Debug, Clone, Copy)]
pub struct CardView<'a> {
    pub deck: Option<&'a Deck>,
    pub index: usize,
    pub studying: bool,
    pub search: &'a SearchState,
}

fn element(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<NodeId, DomError> {
    let node = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attribute(node, name, value)?;
    }
    if !text.is_empty() {
        doc.set_text(node, text)?;
    }
    doc.append_child(parent, node)?;
    Ok(node)
}

/// Control buttons under the card: (id or action, label).
pub const CONTROLS: [(&str, &str); 7] = [
    ("prev-card-btn", "Prev"),
    ("flip-card-btn", "Flip"),
    ("next-card-btn", "Next"),
    ("new-card-btn", "New Card"),
    ("edit-card", "Edit"),
    ("delete-card", "Delete"),
    ("study-btn", "Study"),
];

/// Build the static skeleton under `body`.
pub fn build_layout(doc: &mut Document) -> Result<LayoutIds, DomError> {
    let body = doc.body();
    let app_root = element(doc, body, "div", &[("class", APP_ROOT_CLASS)], "")?;
    let deck_title = element(doc, app_root, "h1", &[("id", "deck-title")], "Select a deck")?;

    let nav = element(doc, app_root, "nav", &[], "")?;
    let deck_list = element(doc, nav, "ul", &[("id", "deck-list")], "")?;
    let new_deck_button = element(
        doc,
        nav,
        "button",
        &[("id", "new-deck-btn"), ("type", "button")],
        "New Deck",
    )?;

    let main = element(doc, app_root, "main", &[], "")?;
    let search_input = element(
        doc,
        main,
        "input",
        &[
            ("id", "search-input"),
            ("type", "search"),
            ("placeholder", "Search cards"),
        ],
        "",
    )?;
    let search_status = element(doc, main, "div", &[("id", "search-status")], "")?;
    let card = element(doc, main, "div", &[("class", "card")], "")?;
    let inner = element(doc, card, "div", &[("class", "card-inner")], "")?;
    let card_front = element(doc, inner, "div", &[("class", "card-front")], "Front")?;
    let card_back = element(doc, inner, "div", &[("class", "card-back")], "Back")?;
    let card_counter = element(doc, main, "div", &[("id", "card-counter")], "")?;

    let controls = element(doc, main, "div", &[("class", "card-controls")], "")?;
    for (key, label) in CONTROLS {
        let attr = if key.ends_with("-btn") { "id" } else { "data-action" };
        element(
            doc,
            controls,
            "button",
            &[(attr, key), ("type", "button")],
            label,
        )?;
    }

    Ok(LayoutIds {
        app_root,
        deck_title,
        deck_list,
        new_deck_button,
        search_input,
        search_status,
        card,
        card_front,
        card_back,
        card_counter,
        controls,
    })
}

/// Deck id stored on a deck item (or any node inside one).
pub fn deck_id_of(doc: &Document, node: NodeId) -> Option<DeckId> {
    let item = doc.closest_with_class(node, DECK_ITEM_CLASS)?;
    doc.attribute(item, DECK_ID_ATTR)?.parse().ok()
}

/// Rebuild the deck list. If a deck item had focus and that deck is still
/// listed, its new item gets focus back.
pub fn paint_deck_list(
    doc: &mut Document,
    ids: &LayoutIds,
    decks: &[Deck],
    current: Option<DeckId>,
) -> Result<(), DomError> {
    let refocus = doc.active_element().and_then(|a| deck_id_of(doc, a));

    doc.clear_children(ids.deck_list)?;
    for deck in decks {
        let id = deck.id.to_string();
        let li = element(
            doc,
            ids.deck_list,
            "li",
            &[
                ("class", DECK_ITEM_CLASS),
                ("tabindex", "0"),
                (DECK_ID_ATTR, id.as_str()),
            ],
            "",
        )?;
        if Some(deck.id) == current {
            doc.add_class(li, "active")?;
        }
        element(doc, li, "span", &[("class", "deck-name")], &deck.name)?;
        let label = format!("Delete {}", deck.name);
        element(
            doc,
            li,
            "button",
            &[("class", DECK_DELETE_CLASS), ("aria-label", label.as_str())],
            "✕",
        )?;
        if refocus == Some(deck.id) {
            doc.focus(li)?;
        }
    }
    Ok(())
}

/// Repaint the title and card area. Any repaint shows the front face.
pub fn paint_card(doc: &mut Document, ids: &LayoutIds, view: CardView<'_>) -> Result<(), DomError> {
    doc.remove_class(ids.card, FLIPPED_CLASS)?;
    if view.studying {
        doc.add_class(ids.card, STUDYING_CLASS)?;
    } else {
        doc.remove_class(ids.card, STUDYING_CLASS)?;
    }

    let Some(deck) = view.deck else {
        doc.set_text(ids.deck_title, "Select a deck")?;
        doc.set_text(ids.card_front, "Front")?;
        doc.set_text(ids.card_back, "Back")?;
        doc.set_text(ids.card_counter, "")?;
        doc.set_text(ids.search_status, "")?;
        return Ok(());
    };

    let title = if view.studying {
        format!("Studying: {}", deck.name)
    } else {
        deck.name.clone()
    };
    doc.set_text(ids.deck_title, &title)?;

    match deck.card(view.index) {
        Some(card) => {
            doc.set_text(ids.card_front, &card.front)?;
            doc.set_text(ids.card_back, &card.back)?;
            let counter = format!("{} / {}", view.index + 1, deck.cards.len());
            doc.set_text(ids.card_counter, &counter)?;
        }
        None => {
            doc.set_text(ids.card_front, "No cards")?;
            doc.set_text(ids.card_back, "")?;
            doc.set_text(ids.card_counter, "")?;
        }
    }

    let status = if view.search.is_active() {
        match view.search.match_count() {
            1 => "1 match".to_string(),
            n => format!("{n} matches"),
        }
    } else {
        String::new()
    };
    doc.set_text(ids.search_status, &status)?;
    Ok(())
}
