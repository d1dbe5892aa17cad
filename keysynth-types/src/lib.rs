//! # keysynth-types
//!
//! Shared type definitions for the keysynth workspace: channel state, instrument
//! ids, knob events, key codes and mode tags. No behavior lives here beyond
//! clamping and parsing; the dispatcher and modes are in keysynth-core.

pub mod input;
pub mod mode_tag;
pub mod state;

pub use input::KeyCode;
pub use mode_tag::{ModeTag, ParseModeTagError};
pub use state::*;

/// Number of addressable channels on the synth.
pub const MAX_CHANNELS: usize = 16;

/// Channel 9 always starts on [`FIXED_CHANNEL_INSTRUMENT`], whatever the caller asks for.
pub const FIXED_CHANNEL: usize = 9;
pub const FIXED_CHANNEL_INSTRUMENT: InstrumentId = InstrumentId::new(120, 0);

/// Symbolic key index produced by the keyboard driver.
pub type KeyIndex = u8;

/// Note keys occupy `0..NOTE_KEYS`.
pub const NOTE_KEYS: KeyIndex = 36;

// Function-key indices. Every mode understands these.
pub const FN_FREEPLAY: KeyIndex = 40;
pub const FN_TEST: KeyIndex = 41;
pub const FN_SOUND_SELECT: KeyIndex = 42;
pub const FN_CHANNEL_DOWN: KeyIndex = 43;
pub const FN_CHANNEL_UP: KeyIndex = 44;
pub const FN_CONFIRM: KeyIndex = 45;

/// Whether `index` addresses a note key rather than a function key.
pub fn is_note_key(index: KeyIndex) -> bool {
    index < NOTE_KEYS
}

/// Instrument id as understood by the synth: a (program, bank) pair.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct InstrumentId {
    pub program: u8,
    pub bank: u8,
}

impl InstrumentId {
    pub const fn new(program: u8, bank: u8) -> Self {
        Self { program, bank }
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}:{:03}", self.program, self.bank)
    }
}

/// A single knob movement: which knob, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnobEvent {
    pub knob: u8,
    pub delta: i32,
}

impl KnobEvent {
    pub fn new(knob: u8, delta: i32) -> Self {
        Self { knob, delta }
    }
}

impl From<(u8, i32)> for KnobEvent {
    fn from((knob, delta): (u8, i32)) -> Self {
        Self { knob, delta }
    }
}
