use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::mode::PlaySettings;
use keysynth_types::{KeyboardLayout, ModeTag};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// One knob step never bends further than the full pitch range.
const PITCH_STEP_MAX: i32 = 16384;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    midi: MidiConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    mode: Option<String>,
    volume: Option<u8>,
    velocity: Option<u8>,
    base_note: Option<u8>,
    test_note: Option<u8>,
    pitch_step: Option<i32>,
    keyboard_layout: Option<String>,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    output_port: Option<String>,
    input_port: Option<String>,
    auto_connect: Option<bool>,
    knob_controllers: Option<Vec<u8>>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    frame_ms: Option<u64>,
    release_timeout_ms: Option<u64>,
}

pub struct Config {
    defaults: DefaultsConfig,
    midi: MidiConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults merged with `~/.config/keysynth/config.toml` if present.
    pub fn load() -> Self {
        Self::load_with(user_config_path().as_deref())
    }

    /// Embedded defaults merged with the file at `user_path`, if any.
    /// A missing or malformed user file is logged and ignored.
    pub fn load_with(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_midi(&mut base.midi, user.midi);
                            merge_runtime(&mut base.runtime, user.runtime);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            midi: base.midi,
            runtime: base.runtime,
        }
    }

    /// Mode bound to each channel at startup. An unknown name is logged and
    /// replaced by freeplay.
    pub fn default_mode(&self) -> ModeTag {
        match self.defaults.mode.as_deref() {
            None => ModeTag::default(),
            Some(name) => name.parse().unwrap_or_else(|e| {
                log::warn!(target: "config", "{}, using freeplay", e);
                ModeTag::default()
            }),
        }
    }

    pub fn default_volume(&self) -> u8 {
        self.defaults.volume.unwrap_or(64).min(127)
    }

    pub fn play_settings(&self) -> PlaySettings {
        let fallback = PlaySettings::default();
        PlaySettings {
            velocity: self
                .defaults
                .velocity
                .unwrap_or(fallback.velocity)
                .clamp(1, 127),
            base_note: self.defaults.base_note.unwrap_or(fallback.base_note).min(127),
            test_note: self.defaults.test_note.unwrap_or(fallback.test_note).min(127),
            pitch_step: self
                .defaults
                .pitch_step
                .unwrap_or(fallback.pitch_step)
                .clamp(-PITCH_STEP_MAX, PITCH_STEP_MAX),
        }
    }

    pub fn keyboard_layout(&self) -> KeyboardLayout {
        self.defaults
            .keyboard_layout
            .as_deref()
            .and_then(parse_keyboard_layout)
            .unwrap_or_default()
    }

    /// Substring used to pick the synth's MIDI port.
    pub fn midi_output_port(&self) -> &str {
        self.midi.output_port.as_deref().unwrap_or("")
    }

    /// Substring used to pick the controller's MIDI port; empty means first port.
    pub fn midi_input_port(&self) -> &str {
        self.midi.input_port.as_deref().unwrap_or("")
    }

    pub fn midi_auto_connect(&self) -> bool {
        self.midi.auto_connect.unwrap_or(true)
    }

    /// Controller numbers treated as knobs; knob id = position in this list.
    pub fn knob_controllers(&self) -> &[u8] {
        self.midi.knob_controllers.as_deref().unwrap_or(&[])
    }

    /// Minimum time between redraws (clamped to 1..1000 ms).
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.runtime.frame_ms.unwrap_or(33).clamp(1, 1000))
    }

    /// How long a key may go without a press/repeat before it counts as released.
    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(
            self.runtime
                .release_timeout_ms
                .unwrap_or(150)
                .clamp(20, 2000),
        )
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keysynth").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.volume.is_some() {
        base.volume = user.volume;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
    if user.base_note.is_some() {
        base.base_note = user.base_note;
    }
    if user.test_note.is_some() {
        base.test_note = user.test_note;
    }
    if user.pitch_step.is_some() {
        base.pitch_step = user.pitch_step;
    }
    if user.keyboard_layout.is_some() {
        base.keyboard_layout = user.keyboard_layout;
    }
}

fn merge_midi(base: &mut MidiConfig, user: MidiConfig) {
    if user.output_port.is_some() {
        base.output_port = user.output_port;
    }
    if user.input_port.is_some() {
        base.input_port = user.input_port;
    }
    if user.auto_connect.is_some() {
        base.auto_connect = user.auto_connect;
    }
    if user.knob_controllers.is_some() {
        base.knob_controllers = user.knob_controllers;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.frame_ms.is_some() {
        base.frame_ms = user.frame_ms;
    }
    if user.release_timeout_ms.is_some() {
        base.release_timeout_ms = user.release_timeout_ms;
    }
}

fn parse_keyboard_layout(s: &str) -> Option<KeyboardLayout> {
    match s.to_lowercase().as_str() {
        "qwerty" => Some(KeyboardLayout::Qwerty),
        "colemak" => Some(KeyboardLayout::Colemak),
        _ => None,
    }
}
