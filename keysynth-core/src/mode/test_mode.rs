use keysynth_types::{is_note_key, KeyIndex};

use super::ModeContext;

/// Sound check: every note key plays the same reference note, so each
/// channel's instrument, volume and routing can be heard in isolation.
///
/// Knobs: 0 reference note (semitones), 1 test velocity, 2 volume.
#[derive(Debug, Default)]
pub struct TestMode {
    offset: i32,
    velocity: Option<u8>,
    // (key that started it, note)
    sounding: Option<(KeyIndex, u8)>,
}

impl TestMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sounding(&self) -> Option<u8> {
        self.sounding.map(|(_, note)| note)
    }

    fn note(&self, ctx: &ModeContext) -> u8 {
        (ctx.settings().test_note as i32 + self.offset).clamp(0, 127) as u8
    }

    fn velocity(&self, ctx: &ModeContext) -> u8 {
        self.velocity.unwrap_or(ctx.settings().velocity)
    }

    pub fn key_down(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if !is_note_key(index) {
            return;
        }
        if let Some((_, note)) = self.sounding.take() {
            ctx.note_off(note);
        }
        let note = self.note(ctx);
        let velocity = self.velocity(ctx);
        log::debug!(target: "mode", "test: ch{} note {} vel {}", ctx.channel().index(), note, velocity);
        ctx.note_on(note, velocity);
        self.sounding = Some((index, note));
    }

    pub fn key_up(&mut self, index: KeyIndex, ctx: &mut ModeContext) {
        if let Some((key, note)) = self.sounding {
            if key == index {
                ctx.note_off(note);
                self.sounding = None;
            }
        }
    }

    pub fn use_knob(&mut self, knob: u8, change: i32, ctx: &mut ModeContext) {
        match knob {
            0 => {
                let base = ctx.settings().test_note as i32;
                self.offset = (base + self.offset).saturating_add(change).clamp(0, 127) - base;
            }
            1 => {
                let velocity = (self.velocity(ctx) as i32).saturating_add(change);
                self.velocity = Some(velocity.clamp(1, 127) as u8);
            }
            2 => {
                let volume = (ctx.channel().volume() as i32).saturating_add(change);
                ctx.set_volume(volume);
            }
            _ => log::debug!(target: "mode", "test: knob {} unassigned", knob),
        }
    }

    pub fn release_all(&mut self, ctx: &mut ModeContext) {
        if let Some((_, note)) = self.sounding.take() {
            ctx.note_off(note);
        }
    }

    pub fn status(&self) -> String {
        match self.velocity {
            Some(v) => format!("ref {:+} vel {}", self.offset, v),
            None => format!("ref {:+}", self.offset),
        }
    }
}
