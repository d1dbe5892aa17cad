//! App runtime coordinator.
//!
//! - `input`: terminal polling, knob keys, held-key tracking
//! - `render`: frame throttle and the channel table

mod input;
mod render;

use std::time::{Duration, Instant};

use keysynth_core::config::Config;
use keysynth_core::dispatch::{EventHandler, InputEvent, TickReport};
use keysynth_core::keyboard::{Keyboard, Keymap};
use keysynth_core::midi::MidiInputManager;
use keysynth_core::synth::{MidiOutSynth, NullSynth, Synth};
use keysynth_types::ChannelSettings;

use crate::ui::{HeldKeys, RatatuiBackend};

/// Top-level runtime that owns all application state and drives the event loop.
pub struct AppRuntime {
    pub(crate) handler: EventHandler<Box<dyn Synth>>,
    pub(crate) keyboard: Keyboard,
    pub(crate) held: HeldKeys,
    pub(crate) midi_input: Option<MidiInputManager>,
    pub(crate) synth_label: String,

    // Per-frame state
    pub(crate) last_report: TickReport,
    pub(crate) render_needed: bool,
    pub(crate) last_render_time: Instant,
    pub(crate) frame_interval: Duration,
}

impl AppRuntime {
    pub fn new(config: &Config, keymap: Keymap, use_midi: bool) -> Self {
        let (synth, synth_label) = open_synth(config, use_midi);
        let channel_defaults = ChannelSettings::default().with_volume(config.default_volume());
        let handler = EventHandler::with_channel_defaults(
            synth,
            config.play_settings(),
            config.default_mode(),
            channel_defaults,
        );

        let keyboard = Keyboard::new(keymap, config.keyboard_layout())
            .with_knob_controllers(config.knob_controllers());

        let midi_input = if use_midi && config.midi_auto_connect() {
            let mut midi_input = MidiInputManager::new();
            if let Err(e) = midi_input.connect_matching(config.midi_input_port()) {
                log::info!(target: "midi", "no MIDI controller: {}", e);
            }
            Some(midi_input)
        } else {
            None
        };

        Self {
            handler,
            keyboard,
            held: HeldKeys::new(config.release_timeout()),
            midi_input,
            synth_label,
            last_report: TickReport::default(),
            render_needed: true,
            last_render_time: Instant::now(),
            frame_interval: config.frame_interval(),
        }
    }

    /// Main event loop.
    pub fn run(&mut self, backend: &mut RatatuiBackend) -> std::io::Result<()> {
        self.held
            .set_terminal_releases(backend.keyboard_enhancement_enabled());

        loop {
            let mut events = Vec::new();
            if self.process_events(backend, &mut events) {
                break;
            }
            let now = Instant::now();
            events.extend(self.held.expired(now).into_iter().map(InputEvent::KeyUp));

            self.drain_midi_events();
            self.tick(events);
            self.maybe_render(backend)?;
        }

        self.shutdown();
        Ok(())
    }

    fn drain_midi_events(&mut self) {
        let Some(midi_input) = &self.midi_input else {
            return;
        };
        for event in midi_input.poll_events() {
            self.keyboard.observe_midi(&event);
        }
    }

    fn tick(&mut self, events: Vec<InputEvent>) {
        let report = self.handler.handle_events(events, &mut self.keyboard);
        if report.keys_down + report.keys_up > 0 || report.knob_applied.is_some() {
            self.render_needed = true;
        }
        self.last_report = report;
    }

    /// Stop anything still sounding before the synth goes away.
    fn shutdown(&mut self) {
        let events: Vec<InputEvent> = self
            .held
            .release_all()
            .into_iter()
            .map(InputEvent::KeyUp)
            .collect();
        self.tick(events);
        if let Some(midi_input) = self.midi_input.as_mut() {
            midi_input.disconnect();
        }
        log::info!("keysynth stopped");
    }
}

fn open_synth(config: &Config, use_midi: bool) -> (Box<dyn Synth>, String) {
    let silent: Box<dyn Synth> = Box::new(NullSynth);
    if !use_midi {
        return (silent, "no synth".to_string());
    }
    match MidiOutSynth::connect(config.midi_output_port()) {
        Ok(synth) => {
            let label = synth.port_name().to_string();
            let synth: Box<dyn Synth> = Box::new(synth);
            (synth, label)
        }
        Err(e) => {
            log::warn!(target: "synth", "MIDI output unavailable, running silent: {}", e);
            (silent, "no synth".to_string())
        }
    }
}

/// Public entry point.
pub fn run(backend: &mut RatatuiBackend, use_midi: bool) -> std::io::Result<()> {
    let config = Config::load();
    let keymap = crate::ui::keybindings::load_keymap();
    let mut runtime = AppRuntime::new(&config, keymap, use_midi);
    runtime.run(backend)
}
