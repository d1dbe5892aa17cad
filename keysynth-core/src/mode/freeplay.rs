use std::collections::HashMap;

use keysynth_types::{is_note_key, KeyIndex};

use super::ModeContext;

const OCTAVE_MIN: i8 = -4;
const OCTAVE_MAX: i8 = 4;

/// Plain performance: note keys play notes, knobs shape the channel.
///
/// Knobs: 0 volume, 1 modulation, 2 pitch bend, 3 octave shift, 4 channel.
#[derive(Debug, Default)]
pub struct Freeplay {
    octave: i8,
    // key -> sounding note, so an octave change mid-hold still releases the right pitch
    held: HashMap<KeyIndex, u8>,
}

impl Freeplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn held_notes(&self) -> usize {
        self.held.len()
    }

    fn note_for(&self, index: KeyIndex, ctx: &ModeContext) -> u8 {
        let note = ctx.settings().base_note as i32 + 12 * self.octave as i32 + index as i32;
        note.clamp(0, 127) as u8
    }

    pub fn key_down(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if !is_note_key(index) {
            log::trace!(target: "mode", "freeplay: ignoring function key {}", index);
            return;
        }
        if self.held.contains_key(&index) {
            return;
        }
        let note = self.note_for(index, ctx);
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
        match knob {
            0 => {
                let volume = (ctx.channel().volume() as i32).saturating_add(change);
                ctx.set_volume(volume);
            }
            1 => {
                let modulation = (ctx.channel().modulation() as i32).saturating_add(change);
                ctx.set_modulation(modulation);
            }
            2 => {
                let step = change.saturating_mul(ctx.settings().pitch_step);
                let pitch = (ctx.channel().pitch() as i32).saturating_add(step);
                ctx.set_pitch(pitch);
            }
            3 => {
                self.octave = (self.octave as i32)
                    .saturating_add(change)
                    .clamp(OCTAVE_MIN as i32, OCTAVE_MAX as i32) as i8;
            }
            4 => {
                let target = (ctx.selector() as isize).saturating_add(change as isize);
                ctx.request_channel(target);
            }
            _ => log::debug!(target: "mode", "freeplay: knob {} unassigned", knob),
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
        format!("oct {:+}", self.octave)
    }
}
