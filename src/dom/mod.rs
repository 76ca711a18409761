//! # Document Model
//!
//! A small element tree with focus, visibility, and listener bookkeeping.
//! The focus trap, dialogs, and study mode all operate on this tree; the
//! terminal renderer only reads it.
//!
//! - [`Document`] - node arena, focus, scroll lock, listener registry
//! - [`Node`] / [`NodeId`] - elements and text
//! - [`Content`] - markup or a pre-built node handed to a dialog
//! - [`markup`] - markup parsing and escaping
//! - [`KeyEvent`] - keyboard input delivered to listeners

mod document;
mod event;
pub mod markup;
mod node;

pub use document::{Document, DomError, ListenerId, ListenerScope};
pub use event::{Key, KeyEvent, KeyOutcome};
pub use node::{Content, Node, NodeId, NodeKind};
