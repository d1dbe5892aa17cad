//! Input modes.
//!
//! A mode decides what a key index or knob movement means for the channel it
//! is bound to. The dispatcher only ever calls `key_down`, `key_up`,
//! `use_knob` and `release_all`; it never looks at which variant is active.
//!
//! Modes do not hold a reference to the dispatcher. Each call gets a
//! [`ModeContext`] that exposes the bound channel, the synth, and a list of
//! [`ModeRequest`]s the dispatcher applies once the call returns.

mod freeplay;
mod sound_select;
mod test_mode;

pub use freeplay::Freeplay;
pub use sound_select::SoundSelect;
pub use test_mode::TestMode;

use keysynth_types::{
    Channel, InstrumentId, KeyIndex, ModeTag, FN_CHANNEL_DOWN, FN_CHANNEL_UP, FN_FREEPLAY,
    FN_SOUND_SELECT, FN_TEST,
};

use crate::synth::{Synth, SynthError};

/// Performance settings shared by every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaySettings {
    pub velocity: u8,
    /// Note played by note key 0 (before octave shift).
    pub base_note: u8,
    /// Reference note for test mode.
    pub test_note: u8,
    /// Pitch bend units per knob step.
    pub pitch_step: i32,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            velocity: 100,
            base_note: 48,
            test_note: 60,
            pitch_step: 256,
        }
    }
}

/// Something a mode wants the dispatcher to do after the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    /// Replace the mode of the current channel.
    SwitchMode(ModeTag),
    /// Move the selector. Out-of-range targets are rejected by the dispatcher.
    SwitchChannel(isize),
}

/// What a mode can touch during one call.
pub struct ModeContext<'a> {
    channel: &'a mut Channel,
    synth: &'a mut dyn Synth,
    settings: &'a PlaySettings,
    selector: usize,
    requests: Vec<ModeRequest>,
}

impl<'a> ModeContext<'a> {
    pub fn new(
        channel: &'a mut Channel,
        synth: &'a mut dyn Synth,
        settings: &'a PlaySettings,
        selector: usize,
    ) -> Self {
        Self {
            channel,
            synth,
            settings,
            selector,
            requests: Vec::new(),
        }
    }

    pub fn channel(&self) -> &Channel {
        self.channel
    }

    /// Index of the channel currently receiving live input.
    pub fn selector(&self) -> usize {
        self.selector
    }

    pub fn settings(&self) -> &PlaySettings {
        self.settings
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        let ch = self.channel.index();
        report(self.synth.note_on(ch, note, velocity));
    }

    pub fn note_off(&mut self, note: u8) {
        let ch = self.channel.index();
        report(self.synth.note_off(ch, note));
    }

    pub fn set_volume(&mut self, value: i32) {
        let volume = self.channel.set_volume(value);
        let ch = self.channel.index();
        report(self.synth.set_volume(ch, volume));
    }

    pub fn set_modulation(&mut self, value: i32) {
        let modulation = self.channel.set_modulation(value);
        let ch = self.channel.index();
        report(self.synth.set_modulation(ch, modulation));
    }

    pub fn set_pitch(&mut self, value: i32) {
        let pitch = self.channel.set_pitch(value);
        let ch = self.channel.index();
        report(self.synth.set_pitch_bend(ch, pitch));
    }

    pub fn set_instrument(&mut self, instrument: InstrumentId) {
        self.channel.instrument = instrument;
        let ch = self.channel.index();
        report(self.synth.select_instrument(ch, instrument));
    }

    pub fn request_mode(&mut self, tag: ModeTag) {
        self.requests.push(ModeRequest::SwitchMode(tag));
    }

    pub fn request_channel(&mut self, index: isize) {
        self.requests.push(ModeRequest::SwitchChannel(index));
    }

    pub fn into_requests(self) -> Vec<ModeRequest> {
        self.requests
    }
}

pub(crate) fn report(result: Result<(), SynthError>) {
    if let Err(e) = result {
        log::warn!(target: "synth", "{}", e);
    }
}

/// Function keys every mode understands. Returns true if `index` was one of them.
fn handle_shared_key(index: KeyIndex, ctx: &mut ModeContext) -> bool {
    match index {
        FN_FREEPLAY => ctx.request_mode(ModeTag::Freeplay),
        FN_TEST => ctx.request_mode(ModeTag::Test),
        FN_SOUND_SELECT => ctx.request_mode(ModeTag::SoundSelect),
        FN_CHANNEL_DOWN => ctx.request_channel(ctx.selector() as isize - 1),
        FN_CHANNEL_UP => ctx.request_channel(ctx.selector() as isize + 1),
        _ => return false,
    }
    true
}

/// The interpreter bound to one channel.
#[derive(Debug)]
pub enum Mode {
    Freeplay(Freeplay),
    Test(TestMode),
    SoundSelect(SoundSelect),
}

impl Mode {
    pub fn new(tag: ModeTag) -> Self {
        match tag {
            ModeTag::Freeplay => Mode::Freeplay(Freeplay::new()),
            ModeTag::Test => Mode::Test(TestMode::new()),
            ModeTag::SoundSelect => Mode::SoundSelect(SoundSelect::new()),
        }
    }

    pub fn tag(&self) -> ModeTag {
        match self {
            Mode::Freeplay(_) => ModeTag::Freeplay,
            Mode::Test(_) => ModeTag::Test,
            Mode::SoundSelect(_) => ModeTag::SoundSelect,
        }
    }

    pub fn key_down(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if handle_shared_key(index, ctx) {
            return;
        }
        match self {
            Mode::Freeplay(m) => m.key_down(index, ctx),
            Mode::Test(m) => m.key_down(index, ctx),
            Mode::SoundSelect(m) => m.key_down(index, ctx),
        }
    }

    pub fn key_up(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        match self {
            Mode::Freeplay(m) => m.key_up(index, ctx),
            Mode::Test(m) => m.key_up(index, ctx),
            Mode::SoundSelect(m) => m.key_up(index, ctx),
        }
    }

    pub fn use_knob(&mut self, knob: u8, change: i32, ctx: &mut ModeContext) {
        match self {
            Mode::Freeplay(m) => m.use_knob(knob, change, ctx),
            Mode::Test(m) => m.use_knob(knob, change, ctx),
            Mode::SoundSelect(m) => m.use_knob(knob, change, ctx),
        }
    }

    /// Stop every note this mode started. Called before the mode is replaced
    /// or its channel stops receiving live input.
    pub fn release_all(&mut self, ctx: &mut ModeContext) {
        match self {
            Mode::Freeplay(m) => m.release_all(ctx),
            Mode::Test(m) => m.release_all(ctx),
            Mode::SoundSelect(m) => m.release_all(ctx),
        }
    }

    /// Short mode-specific status, e.g. `"oct +1"`.
    pub fn status(&self) -> String {
        match self {
            Mode::Freeplay(m) => m.status(),
            Mode::Test(m) => m.status(),
            Mode::SoundSelect(m) => m.status(),
        }
    }
}
