pub mod held_keys;
pub mod input;
pub mod keybindings;
pub mod ratatui_impl;

pub use held_keys::HeldKeys;
pub use input::{AppEvent, InputSource, KeyEvent, KeyKind, Modifiers};
pub use ratatui_impl::RatatuiBackend;
