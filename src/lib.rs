//! flashdeck - a keyboard-driven flashcard TUI
//!
//! This library provides the document model the UI is built on, accessible
//! modal dialogs with focus trapping, study mode, deck storage with search,
//! and the persisted deck state.

pub mod deck;
pub mod dom;
pub mod focus;
pub mod modal;
pub mod storage;
pub mod study;
pub mod ui;
