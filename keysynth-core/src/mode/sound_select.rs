use std::collections::HashMap;

use keysynth_types::{is_note_key, InstrumentId, KeyIndex, ModeTag, FN_CONFIRM};

use super::ModeContext;

const PROGRAM_COUNT: i32 = 128;
const BANK_MAX: i32 = 128;

/// Instrument browser for the bound channel.
///
/// Knob 0 steps the program (wrapping), knob 1 the bank. Each step is sent to
/// the synth right away so note keys preview the new sound. Confirm returns
/// to freeplay with the instrument kept.
#[derive(Debug, Default)]
pub struct SoundSelect {
    held: HashMap<KeyIndex, u8>,
}

impl SoundSelect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if index == FN_CONFIRM {
            log::info!(
                target: "mode",
                "ch{} instrument set to {}",
                ctx.channel().index(),
                ctx.channel().instrument
            );
            ctx.request_mode(ModeTag::Freeplay);
            return;
        }
        if !is_note_key(index) || self.held.contains_key(&index) {
            return;
        }
        let note = (ctx.settings().base_note as i32 + index as i32).clamp(0, 127) as u8;
        let velocity = ctx.settings().velocity;
        ctx.note_on(note, velocity);
        self.held.insert(index, note);
    }

    pub fn key_up(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if let Some(note) = self.held.remove(&index) {
            ctx.note_off(note);
        }
    }

    pub fn use_knob(&mut self, knob: u8, change: i32, ctx: &mut ModeContext) {
        let current = ctx.channel().instrument;
        let next = match knob {
            0 => InstrumentId {
                program: (current.program as i32)
                    .saturating_add(change)
                    .rem_euclid(PROGRAM_COUNT) as u8,
                ..current
            },
            1 => InstrumentId {
                bank: (current.bank as i32).saturating_add(change).clamp(0, BANK_MAX) as u8,
                ..current
            },
            _ => {
                log::debug!(target: "mode", "soundselect: knob {} unassigned", knob);
                return;
            }
        };
        if next != current {
            ctx.set_instrument(next);
        }
    }

    pub fn release_all(&mut self, ctx: &mut ModeContext) {
        let mut notes: Vec<u8> = self.held.drain().map(|(_, note)| note).collect();
        notes.sort_unstable();
        for note in notes {
            ctx.note_off(note);
        }
    }

    pub fn status(&self) -> String {
        "browse".to_string()
    }
}
