use std::time::{Duration, Instant};

use keysynth_types::KeyCode;

/// Top-level terminal event: a key or a resize
#[derive(Debug, Clone, Copy)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Press, auto-repeat or release.
///
/// Releases and repeats are only reported when the terminal speaks the kitty
/// keyboard protocol; otherwise every event is a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Press,
    Repeat,
    Release,
}

/// Modifier key state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyKind,
    pub timestamp: Instant,
}

impl KeyEvent {
    #[cfg(test)]
    pub fn new(code: KeyCode, kind: KeyKind) -> Self {
        Self {
            code,
            modifiers: Modifiers::default(),
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Ctrl+C or Escape.
    pub fn is_quit(&self) -> bool {
        if self.kind == KeyKind::Release {
            return false;
        }
        match self.code {
            KeyCode::Escape => true,
            KeyCode::Char('c') | KeyCode::Char('C') => self.modifiers.ctrl,
            _ => false,
        }
    }
}

/// Trait for reading input events
pub trait InputSource {
    /// Poll for an input event with a timeout
    /// Returns None if no event is available within the timeout
    fn poll_event(&mut self, timeout: Duration) -> Option<AppEvent>;
}
