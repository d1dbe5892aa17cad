//! # keysynth-core
//!
//! Channel and mode core for the keysynth front-end. Owns the sixteen synth
//! channels, the per-channel input modes, and the knob queue, and turns raw
//! key/knob input into synth calls one tick at a time.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keysynth_core::config::Config;
//! use keysynth_core::dispatch::{EventHandler, InputEvent};
//! use keysynth_core::keyboard::{Keyboard, Keymap};
//! use keysynth_core::synth::NullSynth;
//!
//! let config = Config::load();
//! let mut handler = EventHandler::new(NullSynth, config.play_settings(), config.default_mode());
//! let mut keyboard = Keyboard::new(Keymap::new(), config.keyboard_layout());
//!
//! // once per tick, with whatever the polling layer produced
//! let report = handler.handle_events(events, &mut keyboard);
//! ```
//!
//! ## Module Overview
//!
//! - [`dispatch`]: `EventHandler`: channel registry, selector, knob queue, per-tick processing
//! - [`mode`]: `Mode` (Freeplay, Test, SoundSelect) and the `ModeContext` handed to each call
//! - [`keyboard`]: `KeyboardDriver` trait and the keymap-backed `Keyboard`
//! - [`synth`]: `Synth` trait, MIDI-out backend, null backend
//! - [`midi`]: MIDI input (controller knobs)
//! - [`config`]: TOML configuration (embedded defaults + user override)

pub mod config;
pub mod dispatch;
pub mod keyboard;
pub mod midi;
pub mod mode;
pub mod synth;

pub use keysynth_types as types;
