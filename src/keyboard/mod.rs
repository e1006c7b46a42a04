//! Keyboard shortcuts
//!
//! - [`KeyCombo`] / [`KeyEvent`]: what a shortcut looks like and what arrives
//! - [`ShortcutRegistry`]: runtime bindings plus overlay open/closed flags
//! - [`KeyboardDispatcher`]: runs every binding matching a key-down event
//! - [`KeyEventBus`]: the single process-wide event source listeners attach to
//!
//! Key sources feed the bus: [`run_line_source`] reads combos from text,
//! and with the `terminal` feature `terminal::run_terminal_source` reads
//! raw terminal keys.

mod binding;
mod commands;
mod dispatcher;
mod lines;
mod registry;

#[cfg(feature = "terminal")]
pub mod terminal;

pub use binding::*;
pub use commands::*;
pub use dispatcher::*;
pub use lines::*;
pub use registry::*;
