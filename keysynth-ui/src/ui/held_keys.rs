use std::collections::HashMap;
use std::time::{Duration, Instant};

use keysynth_types::KeyCode;

/// Which keys are down, so the dispatcher sees one key-down and one key-up
/// per physical press.
///
/// - `press(key, now)`: true for a new press, false for auto-repeat of a held key
/// - `release(key)`: true if the key was held
/// - `expired(now)`: keys with no press or repeat for longer than the release
///   timeout; only used when the terminal cannot report releases
/// - `release_all()`: every held key, for shutdown
pub struct HeldKeys {
    held: HashMap<KeyCode, Instant>,
    release_timeout: Duration,
    terminal_releases: bool,
}

impl HeldKeys {
    pub fn new(release_timeout: Duration) -> Self {
        Self {
            held: HashMap::new(),
            release_timeout,
            terminal_releases: false,
        }
    }

    /// The terminal reports real releases; stop synthesizing them.
    pub fn set_terminal_releases(&mut self, enabled: bool) {
        self.terminal_releases = enabled;
    }

    pub fn press(&mut self, key: KeyCode, now: Instant) -> bool {
        // held already: refresh the timestamp (sustain)
        self.held.insert(key, now).is_none()
    }

    pub fn release(&mut self, key: KeyCode) -> bool {
        self.held.remove(&key).is_some()
    }

    pub fn expired(&mut self, now: Instant) -> Vec<KeyCode> {
        if self.terminal_releases {
            return Vec::new();
        }
        let mut released = Vec::new();
        self.held.retain(|&key, last| {
            if now.duration_since(*last) > self.release_timeout {
                released.push(key);
                false
            } else {
                true
            }
        });
        released
    }

    pub fn release_all(&mut self) -> Vec<KeyCode> {
        self.held.drain().map(|(key, _)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
