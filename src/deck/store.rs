//! # Deck Store
//!
//! In-memory decks and cards. The serialized form ([`SavedState`]) keeps the
//! field names of the persisted payload (`currentIndex`, `nextDeckId`,
//! `nextCardId`) so existing saves keep loading.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub type DeckId = u64;
pub type CardId = u64;

/// A front/back pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub front: String,
    #[serde(default)]
    pub back: String,
}

/// A named, ordered collection of cards with a resting position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub current_index: usize,
}

impl Deck {
    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn clamp_index(&mut self) {
        if self.current_index >= self.cards.len() {
            self.current_index = self.cards.len().saturating_sub(1);
        }
    }
}

/// Everything needed to rebuild a [`DeckStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub decks: Vec<Deck>,
    pub next_deck_id: DeckId,
    pub next_card_id: CardId,
}

/// Partial update for [`DeckStore::update_deck`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckPatch {
    pub name: Option<String>,
    pub current_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckStore {
    decks: Vec<Deck>,
    next_deck_id: DeckId,
    next_card_id: CardId,
}

impl Default for DeckStore {
    /// A store with one sample deck, used when nothing was saved.
    fn default() -> Self {
        Self {
            decks: vec![Deck {
                id: 1,
                name: "Sample Deck".to_string(),
                cards: vec![Card {
                    id: 1,
                    front: "Hello".to_string(),
                    back: "World".to_string(),
                }],
                current_index: 0,
            }],
            next_deck_id: 2,
            next_card_id: 2,
        }
    }
}

impl DeckStore {
    pub fn empty() -> Self {
        Self {
            decks: Vec::new(),
            next_deck_id: 1,
            next_card_id: 1,
        }
    }

    /// Rebuild from saved state. Id counters are bumped past any id already
    /// in use and out-of-range indices are clamped. `None` when an id in use
    /// leaves no room for the next one.
    pub fn from_saved(state: SavedState) -> Option<Self> {
        let mut decks = state.decks;
        for deck in &mut decks {
            deck.clamp_index();
        }
        let max_deck = decks.iter().map(|d| d.id).max().unwrap_or(0);
        let max_card = decks
            .iter()
            .flat_map(|d| d.cards.iter().map(|c| c.id))
            .max()
            .unwrap_or(0);
        Some(Self {
            decks,
            next_deck_id: state.next_deck_id.max(max_deck.checked_add(1)?),
            next_card_id: state.next_card_id.max(max_card.checked_add(1)?),
        })
    }

    pub fn snapshot(&self) -> SavedState {
        SavedState {
            decks: self.decks.clone(),
            next_deck_id: self.next_deck_id,
            next_card_id: self.next_card_id,
        }
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    /// Create a deck; a blank name becomes "Untitled". `None` once deck ids
    /// are exhausted.
    pub fn create_deck(&mut self, name: &str) -> Option<&Deck> {
        let id = allocate(&mut self.next_deck_id)?;
        let name = name.trim();
        let deck = Deck {
            id,
            name: if name.is_empty() {
                "Untitled".to_string()
            } else {
                name.to_string()
            },
            cards: Vec::new(),
            current_index: 0,
        };
        debug!(deck_id = deck.id, "deck created");
        self.decks.push(deck);
        self.decks.last()
    }

    pub fn get_deck(&self, id: DeckId) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn get_deck_mut(&mut self, id: DeckId) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|d| d.id == id)
    }

    pub fn update_deck(&mut self, id: DeckId, patch: DeckPatch) -> Option<&Deck> {
        let deck = self.get_deck_mut(id)?;
        if let Some(name) = patch.name {
            deck.name = name;
        }
        if let Some(index) = patch.current_index {
            deck.current_index = index;
            deck.clamp_index();
        }
        Some(&*deck)
    }

    pub fn delete_deck(&mut self, id: DeckId) -> bool {
        match self.decks.iter().position(|d| d.id == id) {
            Some(pos) => {
                self.decks.remove(pos);
                debug!(deck_id = id, "deck deleted");
                true
            }
            None => false,
        }
    }

    /// Append a card, returning its id. `None` for an unknown deck or once
    /// card ids are exhausted.
    pub fn add_card(&mut self, deck_id: DeckId, front: &str, back: &str) -> Option<CardId> {
        self.get_deck(deck_id)?;
        let id = allocate(&mut self.next_card_id)?;
        let deck = self.get_deck_mut(deck_id)?;
        deck.cards.push(Card {
            id,
            front: front.to_string(),
            back: back.to_string(),
        });
        Some(id)
    }

    pub fn edit_card(&mut self, deck_id: DeckId, index: usize, front: &str, back: &str) -> bool {
        let Some(card) = self
            .get_deck_mut(deck_id)
            .and_then(|d| d.cards.get_mut(index))
        else {
            return false;
        };
        card.front = front.to_string();
        card.back = back.to_string();
        true
    }

    /// Remove the card at `index`; the deck's resting index is clamped to
    /// the remaining cards (0 when none are left).
    pub fn delete_card(&mut self, deck_id: DeckId, index: usize) -> Option<Card> {
        let deck = self.get_deck_mut(deck_id)?;
        if index >= deck.cards.len() {
            return None;
        }
        let card = deck.cards.remove(index);
        deck.clamp_index();
        Some(card)
    }
}

/// Hand out the counter's value and advance it. The counter never wraps, so
/// `u64::MAX` itself is never handed out.
fn allocate(counter: &mut u64) -> Option<u64> {
    let id = *counter;
    *counter = id.checked_add(1)?;
    Some(id)
}

/// Next cursor position in a deck of `len` cards. With search `matches`,
/// only matched indices are visited; at either end the cursor stays put.
pub fn step(current: usize, len: usize, direction: Direction, matches: &[usize]) -> usize {
    if len == 0 {
        return 0;
    }
    let current = current.min(len - 1);
    if !matches.is_empty() {
        let target = match direction {
            Direction::Next => matches.iter().copied().find(|m| *m > current),
            Direction::Previous => matches.iter().rev().copied().find(|m| *m < current),
        };
        return target.filter(|m| *m < len).unwrap_or(current);
    }
    match direction {
        Direction::Next => (current + 1).min(len - 1),
        Direction::Previous => current.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_cards(n: usize) -> (DeckStore, DeckId) {
        let mut store = DeckStore::empty();
        let id = store.create_deck("Spanish").unwrap().id;
        for i in 0..n {
            store.add_card(id, &format!("front {i}"), &format!("back {i}"));
        }
        (store, id)
    }

    #[test]
    fn test_default_has_sample_deck() {
        let store = DeckStore::default();
        assert_eq!(store.decks().len(), 1);
        let deck = store.get_deck(1).unwrap();
        assert_eq!(deck.name, "Sample Deck");
        assert_eq!(deck.cards[0].front, "Hello");
        assert_eq!(store.snapshot().next_deck_id, 2);
    }

    #[test]
    fn test_create_deck_names() {
        let mut store = DeckStore::empty();
        assert_eq!(store.create_deck("  Spanish ").unwrap().name, "Spanish");
        assert_eq!(store.create_deck("   ").unwrap().name, "Untitled");
        let ids: Vec<DeckId> = store.decks().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_update_and_delete_deck() {
        let (mut store, id) = store_with_cards(3);
        let patch = DeckPatch {
            name: Some("Español".to_string()),
            current_index: Some(10),
        };
        let deck = store.update_deck(id, patch).unwrap();
        assert_eq!(deck.name, "Español");
        assert_eq!(deck.current_index, 2);

        assert!(store.update_deck(99, DeckPatch::default()).is_none());
        assert!(store.delete_deck(id));
        assert!(!store.delete_deck(id));
        assert!(store.get_deck(id).is_none());
    }

    #[test]
    fn test_card_ids_are_global() {
        let mut store = DeckStore::empty();
        let a = store.create_deck("A").unwrap().id;
        let b = store.create_deck("B").unwrap().id;
        assert_eq!(store.add_card(a, "1", ""), Some(1));
        assert_eq!(store.add_card(b, "2", ""), Some(2));
        assert_eq!(store.add_card(99, "x", ""), None);
    }

    #[test]
    fn test_edit_card() {
        let (mut store, id) = store_with_cards(1);
        assert!(store.edit_card(id, 0, "hola", "hello"));
        assert!(!store.edit_card(id, 5, "x", "y"));
        assert_eq!(store.get_deck(id).unwrap().cards[0].back, "hello");
    }

    #[test]
    fn test_delete_last_card_clamps_to_zero() {
        let (mut store, id) = store_with_cards(1);
        let removed = store.delete_card(id, 0).unwrap();
        assert_eq!(removed.front, "front 0");
        let deck = store.get_deck(id).unwrap();
        assert!(deck.is_empty());
        assert_eq!(deck.current_index, 0);
    }

    #[test]
    fn test_delete_card_at_end_moves_index_back() {
        let (mut store, id) = store_with_cards(3);
        store.get_deck_mut(id).unwrap().current_index = 2;
        store.delete_card(id, 2);
        assert_eq!(store.get_deck(id).unwrap().current_index, 1);
        assert!(store.delete_card(id, 9).is_none());
    }

    #[test]
    fn test_from_saved_repairs_counters() {
        let state = SavedState {
            decks: vec![Deck {
                id: 5,
                name: "A".to_string(),
                cards: vec![Card {
                    id: 9,
                    front: "f".to_string(),
                    back: "b".to_string(),
                }],
                current_index: 4,
            }],
            next_deck_id: 1,
            next_card_id: 1,
        };
        let mut store = DeckStore::from_saved(state).unwrap();
        assert_eq!(store.get_deck(5).unwrap().current_index, 0);
        assert_eq!(store.create_deck("B").unwrap().id, 6);
        assert_eq!(store.add_card(5, "x", ""), Some(10));
    }

    fn saved_with_ids(deck_id: DeckId, card_id: CardId) -> SavedState {
        SavedState {
            decks: vec![Deck {
                id: deck_id,
                name: "A".to_string(),
                cards: vec![Card {
                    id: card_id,
                    front: "f".to_string(),
                    back: String::new(),
                }],
                current_index: 0,
            }],
            next_deck_id: 1,
            next_card_id: 1,
        }
    }

    #[test]
    fn test_from_saved_rejects_max_ids() {
        assert!(DeckStore::from_saved(saved_with_ids(u64::MAX, 1)).is_none());
        assert!(DeckStore::from_saved(saved_with_ids(1, u64::MAX)).is_none());
        assert!(DeckStore::from_saved(saved_with_ids(u64::MAX - 1, 1)).is_some());
    }

    #[test]
    fn test_exhausted_ids_stop_creation() {
        let mut state = saved_with_ids(1, 1);
        state.next_deck_id = u64::MAX - 1;
        state.next_card_id = u64::MAX - 1;
        let mut store = DeckStore::from_saved(state).unwrap();

        assert_eq!(store.create_deck("Last").unwrap().id, u64::MAX - 1);
        assert!(store.create_deck("Overflow").is_none());
        assert_eq!(store.decks().len(), 2);

        assert_eq!(store.add_card(1, "x", ""), Some(u64::MAX - 1));
        assert_eq!(store.add_card(1, "y", ""), None);
        assert_eq!(store.get_deck(1).unwrap().cards.len(), 2);
    }

    #[test]
    fn test_step_clamps_without_matches() {
        assert_eq!(step(0, 3, Direction::Previous, &[]), 0);
        assert_eq!(step(0, 3, Direction::Next, &[]), 1);
        assert_eq!(step(2, 3, Direction::Next, &[]), 2);
        assert_eq!(step(0, 0, Direction::Next, &[]), 0);
    }

    #[test]
    fn test_step_visits_only_matches() {
        let matches = [1, 3];
        assert_eq!(step(1, 5, Direction::Next, &matches), 3);
        assert_eq!(step(3, 5, Direction::Next, &matches), 3);
        assert_eq!(step(3, 5, Direction::Previous, &matches), 1);
        assert_eq!(step(1, 5, Direction::Previous, &matches), 1);
        assert_eq!(step(2, 5, Direction::Next, &matches), 3);
    }

    #[test]
    fn test_saved_state_wire_names() {
        let store = DeckStore::default();
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["nextDeckId"], 2);
        assert_eq!(json["nextCardId"], 2);
        assert_eq!(json["decks"][0]["currentIndex"], 0);
    }
}
