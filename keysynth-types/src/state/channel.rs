//! Per-channel synth state.

use serde::{Deserialize, Serialize};

use crate::{InstrumentId, FIXED_CHANNEL, FIXED_CHANNEL_INSTRUMENT};

pub const MIDI_MAX: u8 = 127;
pub const PITCH_BEND_MIN: i16 = -8192;
pub const PITCH_BEND_MAX: i16 = 8191;

/// Initial values for a new channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub instrument: InstrumentId,
    pub volume: u8,
    pub modulation: u8,
    pub pitch: i16,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            instrument: InstrumentId::default(),
            volume: 64,
            modulation: 0,
            pitch: 0,
        }
    }
}

impl ChannelSettings {
    pub fn with_instrument(mut self, instrument: InstrumentId) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }
}

/// One synth channel. `index` doubles as the channel's address on the synth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    index: u8,
    pub instrument: InstrumentId,
    volume: u8,
    modulation: u8,
    pitch: i16,
}

impl Channel {
    /// Build the channel at `index`. The fixed channel ignores the requested instrument.
    pub fn new(index: u8, settings: ChannelSettings) -> Self {
        let instrument = if index as usize == FIXED_CHANNEL {
            FIXED_CHANNEL_INSTRUMENT
        } else {
            settings.instrument
        };
        Self {
            index,
            instrument,
            volume: settings.volume.min(MIDI_MAX),
            modulation: settings.modulation.min(MIDI_MAX),
            pitch: settings.pitch.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn modulation(&self) -> u8 {
        self.modulation
    }

    pub fn pitch(&self) -> i16 {
        self.pitch
    }

    /// Clamp and store. Returns the stored value.
    pub fn set_volume(&mut self, value: i32) -> u8 {
        self.volume = value.clamp(0, MIDI_MAX as i32) as u8;
        self.volume
    }

    pub fn set_modulation(&mut self, value: i32) -> u8 {
        self.modulation = value.clamp(0, MIDI_MAX as i32) as u8;
        self.modulation
    }

    pub fn set_pitch(&mut self, value: i32) -> i16 {
        self.pitch = value.clamp(PITCH_BEND_MIN as i32, PITCH_BEND_MAX as i32) as i16;
        self.pitch
    }
}
