//! # State Persistence
//!
//! Saves and restores decks between runs.
//!
//! ## Storage Location
//!
//! State lives in a single JSON file in the XDG data directory, named after
//! its storage key:
//! - Linux: `~/.local/share/flashdeck/flashcards_app_state.json`
//! - macOS: `~/Library/Application Support/flashdeck/flashcards_app_state.json`
//! - Windows: `%APPDATA%\flashdeck\flashcards_app_state.json`
//!
//! The path can be overridden from the config file or the command line.
//!
//! ## Data Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "state": {
//!     "decks": [
//!       { "id": 1, "name": "Spanish", "cards": [{ "id": 1, "front": "hola", "back": "hello" }], "currentIndex": 0 }
//!     ],
//!     "nextDeckId": 2,
//!     "nextCardId": 2
//!   },
//!   "savedAt": "2025-02-05T10:30:00Z"
//! }
//! ```
//!
//! A file with any other `version`, or one that does not parse, loads as
//! "nothing saved" and the app starts fresh. Writes report failure as
//! `false` instead of an error.

mod state;

pub use state::{StateStore, STORAGE_KEY, VERSION};
