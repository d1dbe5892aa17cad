//! Outbound interface to the sound engine.
//!
//! The core never synthesizes audio. Every channel addresses a shared engine
//! through the [`Synth`] trait by its channel number; [`MidiOutSynth`] drives an
//! external engine (FluidSynth or any General MIDI synth) over a MIDI port and
//! [`NullSynth`] just logs.

use std::fmt;

use midir::{MidiOutput, MidiOutputConnection};

use keysynth_types::InstrumentId;

const CC_BANK_SELECT: u8 = 0;
const CC_MODULATION: u8 = 1;
const CC_VOLUME: u8 = 7;

/// Failure talking to the synth. Never fatal: callers log and carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    /// The channel number does not fit the synth's 4-bit channel field.
    InvalidChannel(u8),
    /// The underlying transport rejected the message.
    Send(String),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(ch) => write!(f, "invalid synth channel {}", ch),
            Self::Send(e) => write!(f, "send failed: {}", e),
        }
    }
}

impl std::error::Error for SynthError {}

/// Sound engine addressed by channel number.
pub trait Synth {
    fn select_instrument(&mut self, channel: u8, instrument: InstrumentId) -> Result<(), SynthError>;
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError>;
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError>;
    fn set_volume(&mut self, channel: u8, volume: u8) -> Result<(), SynthError>;
    fn set_modulation(&mut self, channel: u8, modulation: u8) -> Result<(), SynthError>;
    /// `value` is centered on 0, range -8192..=8191.
    fn set_pitch_bend(&mut self, channel: u8, value: i16) -> Result<(), SynthError>;
}

impl<S: Synth + ?Sized> Synth for Box<S> {
    fn select_instrument(&mut self, channel: u8, instrument: InstrumentId) -> Result<(), SynthError> {
        (**self).select_instrument(channel, instrument)
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError> {
        (**self).note_on(channel, note, velocity)
    }
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError> {
        (**self).note_off(channel, note)
    }
    fn set_volume(&mut self, channel: u8, volume: u8) -> Result<(), SynthError> {
        (**self).set_volume(channel, volume)
    }
    fn set_modulation(&mut self, channel: u8, modulation: u8) -> Result<(), SynthError> {
        (**self).set_modulation(channel, modulation)
    }
    fn set_pitch_bend(&mut self, channel: u8, value: i16) -> Result<(), SynthError> {
        (**self).set_pitch_bend(channel, value)
    }
}

/// Synth that drops everything. Used with `--no-midi` and when no port is found.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSynth;

impl Synth for NullSynth {
    fn select_instrument(&mut self, channel: u8, instrument: InstrumentId) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} instrument {}", channel, instrument);
        Ok(())
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} note on {} vel {}", channel, note, velocity);
        Ok(())
    }
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} note off {}", channel, note);
        Ok(())
    }
    fn set_volume(&mut self, channel: u8, volume: u8) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} volume {}", channel, volume);
        Ok(())
    }
    fn set_modulation(&mut self, channel: u8, modulation: u8) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} modulation {}", channel, modulation);
        Ok(())
    }
    fn set_pitch_bend(&mut self, channel: u8, value: i16) -> Result<(), SynthError> {
        log::debug!(target: "synth", "ch{} pitch bend {}", channel, value);
        Ok(())
    }
}

// ── MIDI encoding ─────────────────────────────────────────────────

fn status(kind: u8, channel: u8) -> Result<u8, SynthError> {
    if channel > 0x0F {
        return Err(SynthError::InvalidChannel(channel));
    }
    Ok(kind | channel)
}

pub fn encode_note_on(channel: u8, note: u8, velocity: u8) -> Result<[u8; 3], SynthError> {
    Ok([status(0x90, channel)?, note & 0x7F, velocity & 0x7F])
}

pub fn encode_note_off(channel: u8, note: u8) -> Result<[u8; 3], SynthError> {
    Ok([status(0x80, channel)?, note & 0x7F, 0])
}

pub fn encode_control_change(channel: u8, controller: u8, value: u8) -> Result<[u8; 3], SynthError> {
    Ok([status(0xB0, channel)?, controller & 0x7F, value & 0x7F])
}

/// Bank select MSB followed by a program change. Banks above 127 go out as 127.
pub fn encode_instrument(channel: u8, instrument: InstrumentId) -> Result<[u8; 5], SynthError> {
    let cc = encode_control_change(channel, CC_BANK_SELECT, instrument.bank.min(127))?;
    Ok([
        cc[0],
        cc[1],
        cc[2],
        status(0xC0, channel)?,
        instrument.program & 0x7F,
    ])
}

pub fn encode_pitch_bend(channel: u8, value: i16) -> Result<[u8; 3], SynthError> {
    let raw = (value.clamp(-8192, 8191) as i32 + 8192) as u16;
    Ok([
        status(0xE0, channel)?,
        (raw & 0x7F) as u8,
        ((raw >> 7) & 0x7F) as u8,
    ])
}

/// Synth reached through a MIDI output port.
pub struct MidiOutSynth {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOutSynth {
    /// Connect to the first output port whose name contains `port_hint`
    /// (case-insensitive). An empty hint picks the first port.
    pub fn connect(port_hint: &str) -> Result<Self, String> {
        let midi_out = MidiOutput::new("keysynth").map_err(|e| e.to_string())?;
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err("no MIDI output ports available".to_string());
        }

        let hint = port_hint.to_lowercase();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();
        let index = names
            .iter()
            .position(|name| name.to_lowercase().contains(&hint))
            .ok_or_else(|| format!("no MIDI output port matching '{}'", port_hint))?;

        let port_name = names[index].clone();
        let connection = midi_out
            .connect(&ports[index], "keysynth-output")
            .map_err(|e| e.to_string())?;
        log::info!(target: "synth", "connected to MIDI output '{}'", port_name);

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, message: &[u8]) -> Result<(), SynthError> {
        self.connection
            .send(message)
            .map_err(|e| SynthError::Send(e.to_string()))
    }
}

impl Synth for MidiOutSynth {
    fn select_instrument(&mut self, channel: u8, instrument: InstrumentId) -> Result<(), SynthError> {
        let msg = encode_instrument(channel, instrument)?;
        self.send(&msg[..3])?;
        self.send(&msg[3..])
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError> {
        self.send(&encode_note_on(channel, note, velocity)?)
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError> {
        self.send(&encode_note_off(channel, note)?)
    }

    fn set_volume(&mut self, channel: u8, volume: u8) -> Result<(), SynthError> {
        self.send(&encode_control_change(channel, CC_VOLUME, volume)?)
    }

    fn set_modulation(&mut self, channel: u8, modulation: u8) -> Result<(), SynthError> {
        self.send(&encode_control_change(channel, CC_MODULATION, modulation)?)
    }

    fn set_pitch_bend(&mut self, channel: u8, value: i16) -> Result<(), SynthError> {
        self.send(&encode_pitch_bend(channel, value)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_note_messages() {
        assert_eq!(encode_note_on(0, 60, 100).unwrap(), [0x90, 60, 100]);
        assert_eq!(encode_note_on(9, 60, 100).unwrap(), [0x99, 60, 100]);
        assert_eq!(encode_note_off(15, 61).unwrap(), [0x8F, 61, 0]);
    }

    #[test]
    fn test_encode_rejects_channel_16() {
        assert_eq!(
            encode_note_on(16, 60, 100),
            Err(SynthError::InvalidChannel(16))
        );
    }

    #[test]
    fn test_encode_instrument_sends_bank_then_program() {
        let msg = encode_instrument(2, InstrumentId::new(120, 0)).unwrap();
        assert_eq!(msg, [0xB2, 0, 0, 0xC2, 120]);

        let drums = encode_instrument(9, InstrumentId::new(0, 128)).unwrap();
        assert_eq!(drums[2], 127);
    }

    #[test]
    fn test_encode_pitch_bend_range() {
        assert_eq!(encode_pitch_bend(0, 0).unwrap(), [0xE0, 0x00, 0x40]);
        assert_eq!(encode_pitch_bend(0, 8191).unwrap(), [0xE0, 0x7F, 0x7F]);
        assert_eq!(encode_pitch_bend(0, -8192).unwrap(), [0xE0, 0x00, 0x00]);
    }

    #[test]
    fn test_boxed_synth_forwards() {
        let mut boxed: Box<testing::RecordingSynth> = Box::default();
        boxed.note_on(1, 60, 90).unwrap();
        assert_eq!(boxed.calls, vec![testing::SynthCall::NoteOn(1, 60, 90)]);
    }
}
