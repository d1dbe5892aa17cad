use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use keysynth_core::keyboard::Keymap;
use keysynth_types::{
    KeyCode, KeyIndex, FN_CHANNEL_DOWN, FN_CHANNEL_UP, FN_CONFIRM, FN_FREEPLAY, FN_SOUND_SELECT,
    FN_TEST, NOTE_KEYS,
};

/// Raw TOML structure for the keybindings file
#[derive(Deserialize, Default)]
struct KeybindingConfig {
    #[allow(dead_code)]
    #[serde(default)]
    version: u32,
    /// key -> note key index
    #[serde(default)]
    notes: HashMap<String, KeyIndex>,
    /// function name -> key
    #[serde(default)]
    functions: HashMap<String, String>,
    #[serde(default)]
    knobs: Vec<RawKnob>,
}

#[derive(Deserialize)]
struct RawKnob {
    key: String,
    knob: u8,
    delta: i32,
}

/// Embedded default keybindings TOML
const DEFAULT_KEYBINDINGS: &str = include_str!("../../keybindings.toml");

/// Load the keymap: embedded default, optionally merged with user override.
pub fn load_keymap() -> Keymap {
    load_keymap_with(user_keybindings_path().as_deref())
}

pub fn load_keymap_with(user_path: Option<&Path>) -> Keymap {
    let mut config: KeybindingConfig =
        toml::from_str(DEFAULT_KEYBINDINGS).expect("Failed to parse embedded keybindings.toml");

    if let Some(path) = user_path.filter(|p| p.exists()) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<KeybindingConfig>(&contents) {
                Ok(user_config) => merge_config(&mut config, user_config),
                Err(e) => log::warn!(target: "ui::keybindings", "ignoring {}: {}", path.display(), e),
            },
            Err(e) => log::warn!(target: "ui::keybindings", "cannot read {}: {}", path.display(), e),
        }
    }

    build_keymap(&config)
}

fn user_keybindings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keysynth").join("keybindings.toml"))
}

/// User entries replace default entries with the same key (or function name).
/// User knob entries come after the defaults, so they win on the same key.
fn merge_config(base: &mut KeybindingConfig, user: KeybindingConfig) {
    base.notes.extend(user.notes);
    base.functions.extend(user.functions);
    base.knobs.extend(user.knobs);
}

fn function_index(name: &str) -> Option<KeyIndex> {
    match name {
        "freeplay" => Some(FN_FREEPLAY),
        "test" => Some(FN_TEST),
        "sound_select" => Some(FN_SOUND_SELECT),
        "channel_down" => Some(FN_CHANNEL_DOWN),
        "channel_up" => Some(FN_CHANNEL_UP),
        "confirm" => Some(FN_CONFIRM),
        _ => None,
    }
}

fn parse_key_logged(s: &str) -> Option<KeyCode> {
    let key = KeyCode::parse(s);
    if key.is_none() {
        log::warn!(target: "ui::keybindings", "ignoring unknown key '{}' in keybindings", s);
    }
    key
}

fn build_keymap(config: &KeybindingConfig) -> Keymap {
    let mut keymap = Keymap::new();

    // sorted so overlapping entries resolve the same way every run
    let mut notes: Vec<_> = config.notes.iter().collect();
    notes.sort();
    for (key, &index) in notes {
        if index >= NOTE_KEYS {
            log::warn!(target: "ui::keybindings", "ignoring note key '{}': index {} out of range", key, index);
            continue;
        }
        if let Some(code) = parse_key_logged(key) {
            keymap.insert(code, index);
        }
    }

    for raw in &config.knobs {
        if let Some(code) = parse_key_logged(&raw.key) {
            keymap.insert_knob(code, raw.knob, raw.delta);
        }
    }

    let mut functions: Vec<_> = config.functions.iter().collect();
    functions.sort();
    for (name, key) in functions {
        let Some(index) = function_index(name) else {
            log::warn!(target: "ui::keybindings", "ignoring unknown function '{}'", name);
            continue;
        };
        if let Some(code) = parse_key_logged(key) {
            keymap.insert(code, index);
        }
    }

    keymap
}
