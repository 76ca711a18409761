//! # Focus Management
//!
//! - [`scan`] lists the visible interactive elements inside a container
//! - [`FocusTrap`] keeps Tab / Shift+Tab cycling within a container and
//!   turns Escape into a close request

mod scanner;
mod trap;

pub use scanner::scan;
pub use trap::{FocusTrap, TrapAction};
