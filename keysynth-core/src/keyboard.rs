//! Keyboard driver: raw key codes to symbolic key indices, plus knob deltas.
//!
//! The dispatcher only sees the [`KeyboardDriver`] trait. [`Keyboard`] is the
//! concrete driver: a [`Keymap`] for key lookups and a pending list of knob
//! movements filled from knob keys and MIDI controllers.

use std::collections::HashMap;
use std::fmt;

use keysynth_types::{KeyCode, KeyIndex, KeyboardLayout, KnobEvent};

use crate::dispatch::KnobQueue;
use crate::midi::{relative_delta, MidiEvent, MidiEventKind};

/// A key code with no index in the keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedKey(pub KeyCode);

impl fmt::Display for UnmappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unmapped key {:?}", self.0)
    }
}

impl std::error::Error for UnmappedKey {}

/// What the dispatcher needs from a keyboard driver.
pub trait KeyboardDriver {
    fn get_key_index(&self, key: KeyCode) -> Result<KeyIndex, UnmappedKey>;

    /// Move every knob movement observed since the last call onto `queue`, in order.
    fn append_to_queue(&mut self, queue: &mut KnobQueue);
}

/// Key code → key index, and key code → knob movement.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    keys: HashMap<KeyCode, KeyIndex>,
    knobs: HashMap<KeyCode, KnobEvent>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: KeyCode, index: KeyIndex) -> Self {
        self.insert(key, index);
        self
    }

    pub fn bind_knob(mut self, key: KeyCode, knob: u8, delta: i32) -> Self {
        self.insert_knob(key, knob, delta);
        self
    }

    /// Later bindings for the same key replace earlier ones.
    pub fn insert(&mut self, key: KeyCode, index: KeyIndex) {
        self.knobs.remove(&key);
        if let Some(old) = self.keys.insert(key, index) {
            log::debug!(target: "keyboard", "{:?} rebound from {} to {}", key, old, index);
        }
    }

    pub fn insert_knob(&mut self, key: KeyCode, knob: u8, delta: i32) {
        self.keys.remove(&key);
        self.knobs.insert(key, KnobEvent::new(knob, delta));
    }

    pub fn index_of(&self, key: KeyCode) -> Option<KeyIndex> {
        self.keys.get(&key).copied()
    }

    pub fn knob_of(&self, key: KeyCode) -> Option<KnobEvent> {
        self.knobs.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len() + self.knobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.knobs.is_empty()
    }
}

/// Translate a key character from the configured layout to QWERTY physical position.
pub fn translate_key(c: char, layout: KeyboardLayout) -> char {
    match layout {
        KeyboardLayout::Qwerty => c,
        KeyboardLayout::Colemak => colemak_to_qwerty(c),
    }
}

fn colemak_to_qwerty(c: char) -> char {
    match c {
        // top row
        'f' => 'e', 'p' => 'r', 'g' => 't', 'j' => 'y',
        'l' => 'u', 'u' => 'i', 'y' => 'o', ';' => 'p',
        // home row
        'r' => 's', 's' => 'd', 't' => 'f', 'd' => 'g',
        'n' => 'j', 'e' => 'k', 'i' => 'l', 'o' => ';',
        // bottom row
        'k' => 'n',
        // unchanged keys pass through
        other => other,
    }
}

/// Keymap-backed keyboard driver.
pub struct Keyboard {
    keymap: Keymap,
    layout: KeyboardLayout,
    /// Controller numbers treated as knobs; knob id = position.
    knob_controllers: Vec<u8>,
    pending: Vec<KnobEvent>,
}

impl Keyboard {
    pub fn new(keymap: Keymap, layout: KeyboardLayout) -> Self {
        Self {
            keymap,
            layout,
            knob_controllers: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn with_knob_controllers(mut self, controllers: &[u8]) -> Self {
        self.knob_controllers = controllers.to_vec();
        self
    }

    fn physical(&self, key: KeyCode) -> KeyCode {
        match key {
            KeyCode::Char(c) => KeyCode::Char(translate_key(c, self.layout)),
            other => other,
        }
    }

    /// Look at a key press before it reaches the dispatcher. Knob keys queue a
    /// knob movement; returns true when that happened.
    pub fn observe_key(&mut self, key: KeyCode) -> bool {
        match self.keymap.knob_of(self.physical(key)) {
            Some(event) => {
                self.pending.push(event);
                true
            }
            None => false,
        }
    }

    /// Turn a MIDI controller message into a knob movement if its controller is
    /// one of the configured knobs.
    pub fn observe_midi(&mut self, event: &MidiEvent) {
        if let MidiEventKind::ControlChange {
            controller, value, ..
        } = event.kind
        {
            let Some(knob) = self.knob_controllers.iter().position(|&c| c == controller) else {
                return;
            };
            if let Some(delta) = relative_delta(value) {
                self.pending.push(KnobEvent::new(knob as u8, delta));
            }
        }
    }

    pub fn pending_knobs(&self) -> usize {
        self.pending.len()
    }
}

impl KeyboardDriver for Keyboard {
    fn get_key_index(&self, key: KeyCode) -> Result<KeyIndex, UnmappedKey> {
        self.keymap
            .index_of(self.physical(key))
            .ok_or(UnmappedKey(key))
    }

    fn append_to_queue(&mut self, queue: &mut KnobQueue) {
        queue.extend(self.pending.drain(..));
    }
}
