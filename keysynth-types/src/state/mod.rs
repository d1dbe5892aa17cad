pub mod channel;

pub use channel::*;

use serde::{Deserialize, Serialize};

/// Keyboard layout configuration for key translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyboardLayout {
    #[default]
    Qwerty,
    Colemak,
}
