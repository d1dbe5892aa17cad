//! The dispatcher: channel registry, live selector, knob queue, and the
//! per-tick routine that routes raw input into the active mode.

mod knob_queue;

pub use knob_queue::KnobQueue;

use std::time::{Duration, Instant};

use keysynth_types::{
    Channel, ChannelSettings, KeyCode, KeyIndex, KnobEvent, ModeTag, ParseModeTagError,
    MAX_CHANNELS,
};

use crate::keyboard::KeyboardDriver;
use crate::mode::{report, Mode, ModeContext, ModeRequest, PlaySettings};
use crate::synth::Synth;

/// One raw input event from the polling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Anything else the polling layer saw (resize, focus, ...). Ignored.
    Other,
}

/// What one tick did. Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub keys_down: usize,
    pub keys_up: usize,
    pub unmapped: usize,
    pub knob_applied: Option<KnobEvent>,
    /// Knob events still waiting after this tick.
    pub knob_backlog: usize,
    pub elapsed: Duration,
}

/// A channel and the mode bound to it.
#[derive(Debug)]
struct Slot {
    channel: Channel,
    mode: Mode,
}

pub struct EventHandler<S: Synth> {
    slots: Vec<Slot>,
    synth: S,
    settings: PlaySettings,
    /// Initial values for channels created by a channel switch.
    channel_defaults: ChannelSettings,
    current: usize,
    knob_queue: KnobQueue,
}

impl<S: Synth> EventHandler<S> {
    /// Sixteen channels in `default_mode`, channel 0 selected.
    pub fn new(synth: S, settings: PlaySettings, default_mode: ModeTag) -> Self {
        Self::with_channel_defaults(synth, settings, default_mode, ChannelSettings::default())
    }

    pub fn with_channel_defaults(
        synth: S,
        settings: PlaySettings,
        default_mode: ModeTag,
        channel_defaults: ChannelSettings,
    ) -> Self {
        let mut handler = Self::empty(synth, settings);
        handler.channel_defaults = channel_defaults;
        for _ in 0..MAX_CHANNELS {
            handler.add_channel(default_mode, channel_defaults);
        }
        handler.switch_channel(0);
        handler
    }

    /// No channels. The first `switch_channel` or `add_channel` creates one.
    pub fn empty(synth: S, settings: PlaySettings) -> Self {
        Self {
            slots: Vec::with_capacity(MAX_CHANNELS),
            synth,
            settings,
            channel_defaults: ChannelSettings::default(),
            current: 0,
            knob_queue: KnobQueue::new(),
        }
    }

    // ---- registry ----

    /// Append a channel bound to a fresh `tag` mode and select it.
    ///
    /// Returns the new channel's index, or `None` when all sixteen exist.
    pub fn add_channel(&mut self, tag: ModeTag, settings: ChannelSettings) -> Option<usize> {
        let index = self.slots.len();
        if index >= MAX_CHANNELS {
            log::warn!(target: "dispatch", "add_channel({}): all {} channels in use", tag, MAX_CHANNELS);
            return None;
        }

        let channel = Channel::new(index as u8, settings);
        let ch = channel.index();
        report(self.synth.select_instrument(ch, channel.instrument));
        report(self.synth.set_volume(ch, channel.volume()));
        report(self.synth.set_modulation(ch, channel.modulation()));
        report(self.synth.set_pitch_bend(ch, channel.pitch()));
        log::debug!(target: "dispatch", "ch{}: added in {} on {}", index, tag, channel.instrument);

        self.release_current();
        self.slots.push(Slot {
            channel,
            mode: Mode::new(tag),
        });
        self.current = index;
        Some(index)
    }

    /// Replace the mode of the selected channel. The old mode's notes are released.
    pub fn switch_mode(&mut self, tag: ModeTag) {
        let current = self.current;
        if current >= self.slots.len() {
            log::debug!(target: "dispatch", "switch_mode({}): no channel selected", tag);
            return;
        }
        self.release_current();
        self.slots[current].mode = Mode::new(tag);
        log::debug!(target: "dispatch", "ch{}: mode -> {}", current, tag);
    }

    /// `switch_mode` from a name. Unknown names change nothing.
    pub fn switch_mode_named(&mut self, name: &str) -> Result<(), ParseModeTagError> {
        match name.parse::<ModeTag>() {
            Ok(tag) => {
                self.switch_mode(tag);
                Ok(())
            }
            Err(e) => {
                log::warn!(target: "dispatch", "switch_mode: {}", e);
                Err(e)
            }
        }
    }

    /// Move the selector to `index`, creating freeplay channels up to it if
    /// needed. Indices outside 0..16 are ignored. Returns whether the selector
    /// now points at `index`.
    pub fn switch_channel(&mut self, index: isize) -> bool {
        if index < 0 || index as usize >= MAX_CHANNELS {
            log::debug!(target: "dispatch", "switch_channel({}): out of range", index);
            return false;
        }
        let target = index as usize;
        if target == self.current && target < self.slots.len() {
            return true;
        }

        self.release_current();
        while self.slots.len() <= target {
            if self.add_channel(ModeTag::Freeplay, self.channel_defaults).is_none() {
                return false;
            }
        }
        self.current = target;
        log::debug!(target: "dispatch", "selected ch{}", target);
        true
    }

    fn release_current(&mut self) {
        let selector = self.current;
        if let Some(slot) = self.slots.get_mut(selector) {
            let mut ctx = ModeContext::new(&mut slot.channel, &mut self.synth, &self.settings, selector);
            slot.mode.release_all(&mut ctx);
        }
    }

    // ---- access ----

    pub fn current_mode(&self) -> Option<&Mode> {
        self.slots.get(self.current).map(|s| &s.mode)
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.slots.get(self.current).map(|s| &s.channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.slots.iter().map(|s| &s.channel)
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.slots.get(index).map(|s| &s.channel)
    }

    pub fn mode(&self, index: usize) -> Option<&Mode> {
        self.slots.get(index).map(|s| &s.mode)
    }

    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    pub fn knob_queue(&self) -> &KnobQueue {
        &self.knob_queue
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    // ---- live input ----

    /// Run `f` against the selected channel's mode, then apply whatever it requested.
    fn with_current_mode(&mut self, f: impl FnOnce(&mut Mode, &mut ModeContext)) {
        let selector = self.current;
        let Some(slot) = self.slots.get_mut(selector) else {
            log::trace!(target: "dispatch", "input dropped: no channel selected");
            return;
        };
        let mut ctx = ModeContext::new(&mut slot.channel, &mut self.synth, &self.settings, selector);
        f(&mut slot.mode, &mut ctx);
        let requests = ctx.into_requests();
        self.apply_requests(requests);
    }

    fn apply_requests(&mut self, requests: Vec<ModeRequest>) {
        for request in requests {
            match request {
                ModeRequest::SwitchMode(tag) => self.switch_mode(tag),
                ModeRequest::SwitchChannel(index) => {
                    self.switch_channel(index);
                }
            }
        }
    }

    pub fn key_down(&mut self, index: KeyIndex) {
        self.with_current_mode(|mode, ctx| mode.key_down(index, ctx));
    }

    pub fn key_up(&mut self, index: KeyIndex) {
        self.with_current_mode(|mode, ctx| mode.key_up(index, ctx));
    }

    pub fn use_knob(&mut self, knob: u8, change: i32) {
        self.with_current_mode(|mode, ctx| mode.use_knob(knob, change, ctx));
    }

    /// One tick: route this tick's key events, collect new knob movements
    /// from the driver, then apply at most one queued knob movement.
    ///
    /// Nothing here fails: unmapped keys are skipped and synth errors are
    /// logged by the mode context.
    pub fn handle_events<I, K>(&mut self, events: I, keyboard: &mut K) -> TickReport
    where
        I: IntoIterator<Item = InputEvent>,
        K: KeyboardDriver + ?Sized,
    {
        let start = Instant::now();
        let mut report = TickReport::default();

        for event in events {
            match event {
                InputEvent::KeyDown(code) => match keyboard.get_key_index(code) {
                    Ok(index) => {
                        self.key_down(index);
                        report.keys_down += 1;
                    }
                    Err(e) => {
                        log::trace!(target: "dispatch", "{}", e);
                        report.unmapped += 1;
                    }
                },
                InputEvent::KeyUp(code) => match keyboard.get_key_index(code) {
                    Ok(index) => {
                        self.key_up(index);
                        report.keys_up += 1;
                    }
                    Err(e) => {
                        log::trace!(target: "dispatch", "{}", e);
                        report.unmapped += 1;
                    }
                },
                InputEvent::Other => {}
            }
        }

        keyboard.append_to_queue(&mut self.knob_queue);

        // No channel yet: knobs wait in the queue.
        if self.current < self.slots.len() {
            if let Some(event) = self.knob_queue.pop() {
                self.use_knob(event.knob, event.delta);
                report.knob_applied = Some(event);
            }
        }

        report.knob_backlog = self.knob_queue.len();
        report.elapsed = start.elapsed();
        report
    }
}
