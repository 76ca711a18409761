//! # UI Module
//!
//! The terminal front-end for flashdeck.
//!
//! ## Components
//!
//! - [`App`] - application context: document, decks, dialogs, study mode
//! - [`paint`] - keeps the document's deck list and card area in sync
//! - [`mod@render`] - draws the document with ratatui and maps clicks back to nodes
//! - [`config`] and [`theme`] - user settings and color themes
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 Header (deck title)              │
//! ├─────────────────┬───────────────────────────────┤
//! │                 │  Search field    2 matches    │
//! │   Deck list     ├───────────────────────────────┤
//! │                 │                               │
//! │                 │        Card (front/back)      │
//! │                 │                               │
//! │                 │            2 / 5              │
//! │  [ New Deck ]   │ [Prev] [Flip] [Next] ...      │
//! ├─────────────────┴───────────────────────────────┤
//! │                    Footer                        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! An open dialog is drawn centered on top with the rest dimmed.

pub mod app;
pub mod config;
pub mod paint;
pub mod render;
pub mod theme;

pub use app::App;
pub use render::{render, HitMap};
