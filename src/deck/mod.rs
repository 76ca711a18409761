//! # Decks
//!
//! - [`DeckStore`] - create, update, and delete decks and their cards
//! - [`step`] - clamped prev/next navigation that can follow search matches
//! - [`search`] - card search and the typing debounce

pub mod search;
mod store;

pub use search::{Debouncer, SearchState};
pub use store::{step, Card, CardId, Deck, DeckId, DeckPatch, DeckStore, Direction, SavedState};
