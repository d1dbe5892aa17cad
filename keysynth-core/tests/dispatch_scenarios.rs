use keysynth_core::dispatch::{EventHandler, InputEvent, KnobQueue};
use keysynth_core::keyboard::{Keyboard, KeyboardDriver, Keymap, UnmappedKey};
use keysynth_core::mode::{Mode, PlaySettings};
use keysynth_core::synth::{Synth, SynthError};
use keysynth_core::types::{
    ChannelSettings, InstrumentId, KeyCode, KeyIndex, KeyboardLayout, KnobEvent, ModeTag,
    FN_TEST, MAX_CHANNELS,
};

/// Synth that only remembers the last volume and note per channel.
#[derive(Debug, Default)]
struct ProbeSynth {
    volumes: [u8; 16],
    instruments: [InstrumentId; 16],
    notes_on: Vec<(u8, u8, u8)>,
    notes_off: Vec<(u8, u8)>,
}

impl Synth for ProbeSynth {
    fn select_instrument(&mut self, channel: u8, instrument: InstrumentId) -> Result<(), SynthError> {
        self.instruments[channel as usize] = instrument;
        Ok(())
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError> {
        self.notes_on.push((channel, note, velocity));
        Ok(())
    }
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError> {
        self.notes_off.push((channel, note));
        Ok(())
    }
    fn set_volume(&mut self, channel: u8, volume: u8) -> Result<(), SynthError> {
        self.volumes[channel as usize] = volume;
        Ok(())
    }
    fn set_modulation(&mut self, _channel: u8, _modulation: u8) -> Result<(), SynthError> {
        Ok(())
    }
    fn set_pitch_bend(&mut self, _channel: u8, _value: i16) -> Result<(), SynthError> {
        Ok(())
    }
}

/// Synth whose every call fails, to check that failures stay inside the tick.
struct BrokenSynth;

impl Synth for BrokenSynth {
    fn select_instrument(&mut self, _: u8, _: InstrumentId) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
    fn note_on(&mut self, _: u8, _: u8, _: u8) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
    fn note_off(&mut self, _: u8, _: u8) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
    fn set_volume(&mut self, _: u8, _: u8) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
    fn set_modulation(&mut self, _: u8, _: u8) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
    fn set_pitch_bend(&mut self, _: u8, _: i16) -> Result<(), SynthError> {
        Err(SynthError::Send("port closed".into()))
    }
}

/// Driver fed by hand: knobs are pushed by the test, keys map through a keymap.
struct ScriptedKeyboard {
    keymap: Keymap,
    knobs: Vec<KnobEvent>,
}

impl ScriptedKeyboard {
    fn new() -> Self {
        Self {
            keymap: Keymap::new()
                .bind(KeyCode::Char('z'), 0)
                .bind(KeyCode::Char('x'), 2)
                .bind(KeyCode::F(2), FN_TEST),
            knobs: Vec::new(),
        }
    }
}

impl KeyboardDriver for ScriptedKeyboard {
    fn get_key_index(&self, key: KeyCode) -> Result<KeyIndex, UnmappedKey> {
        self.keymap.index_of(key).ok_or(UnmappedKey(key))
    }

    fn append_to_queue(&mut self, queue: &mut KnobQueue) {
        queue.extend(self.knobs.drain(..));
    }
}

const NO_INPUT: [InputEvent; 0] = [];

fn fresh() -> EventHandler<ProbeSynth> {
    EventHandler::new(ProbeSynth::default(), PlaySettings::default(), ModeTag::Freeplay)
}

// ---------------------------------------------------------------------------
// Channel registry
// ---------------------------------------------------------------------------

#[test]
fn add_channel_builds_each_index_with_fixed_channel_exception() {
    let requested = InstrumentId::new(33, 1);
    for i in 0..MAX_CHANNELS {
        let mut handler = EventHandler::empty(ProbeSynth::default(), PlaySettings::default());
        for _ in 0..=i {
            handler.add_channel(
                ModeTag::Freeplay,
                ChannelSettings::default().with_instrument(requested),
            );
        }
        let channel = handler.channel(i).expect("channel exists");
        assert_eq!(channel.index() as usize, i);
        assert!(handler.mode(i).is_some());
        let expected = if i == 9 {
            InstrumentId::new(120, 0)
        } else {
            requested
        };
        assert_eq!(channel.instrument, expected);
        assert_eq!(handler.synth().instruments[i], expected);
        assert_eq!(handler.current_index(), i);
    }
}

#[test]
fn default_instrument_is_zero_zero() {
    let handler = fresh();
    for (i, channel) in handler.channels().enumerate() {
        if i == 9 {
            assert_eq!(channel.instrument, InstrumentId::new(120, 0));
        } else {
            assert_eq!(channel.instrument, InstrumentId::new(0, 0));
        }
    }
}

#[test]
fn out_of_range_channel_switch_is_a_no_op() {
    let mut handler = fresh();
    handler.switch_channel(5);
    for bad in [-1, 16, 200, isize::MIN] {
        assert!(!handler.switch_channel(bad));
        assert_eq!(handler.current_index(), 5);
        assert_eq!(handler.channel_count(), MAX_CHANNELS);
    }
}

#[test]
fn switch_to_existing_channel_moves_selector_only() {
    let mut handler = EventHandler::empty(ProbeSynth::default(), PlaySettings::default());
    for _ in 0..4 {
        handler.add_channel(ModeTag::Test, ChannelSettings::default());
    }
    assert!(handler.switch_channel(1));
    assert_eq!(handler.current_index(), 1);
    assert_eq!(handler.channel_count(), 4);
    assert!((0..4).all(|i| handler.mode(i).map(Mode::tag) == Some(ModeTag::Test)));
}

#[test]
fn switch_beyond_count_reaches_requested_index() {
    let mut handler = EventHandler::empty(ProbeSynth::default(), PlaySettings::default());
    handler.add_channel(ModeTag::Test, ChannelSettings::default());
    assert!(handler.switch_channel(10));
    assert_eq!(handler.channel_count(), 11);
    assert_eq!(handler.current_index(), 10);
    assert_eq!(handler.mode(0).map(Mode::tag), Some(ModeTag::Test));
    assert_eq!(handler.mode(10).map(Mode::tag), Some(ModeTag::Freeplay));
    assert_eq!(handler.channel(9).unwrap().instrument, InstrumentId::new(120, 0));
}

// ---------------------------------------------------------------------------
// Knob queue drain
// ---------------------------------------------------------------------------

#[test]
fn n_knob_events_drain_over_n_ticks() {
    let mut handler = fresh();
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = (0..5).map(|_| KnobEvent::new(0, 1)).collect();

    for tick in 1..=5 {
        let report = handler.handle_events(NO_INPUT, &mut keyboard);
        assert_eq!(report.knob_applied, Some(KnobEvent::new(0, 1)));
        assert_eq!(report.knob_backlog, 5 - tick);
        assert_eq!(handler.current_channel().unwrap().volume(), 64 + tick as u8);
    }
    assert!(handler.knob_queue().is_empty());

    let report = handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(report.knob_applied, None);
    assert_eq!(handler.current_channel().unwrap().volume(), 69);
}

#[test]
fn knob_events_apply_in_arrival_order() {
    let mut handler = fresh();
    handler.switch_mode(ModeTag::Test);
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![
        KnobEvent::new(1, 1),
        KnobEvent::new(1, -1),
        KnobEvent::new(2, 5),
    ];

    let mut applied = Vec::new();
    for _ in 0..3 {
        applied.push(handler.handle_events(NO_INPUT, &mut keyboard).knob_applied.unwrap());
    }
    assert_eq!(
        applied,
        vec![
            KnobEvent::new(1, 1),
            KnobEvent::new(1, -1),
            KnobEvent::new(2, 5),
        ]
    );
    assert_eq!(handler.current_mode().unwrap().status(), "ref +0 vel 100");
    assert_eq!(handler.current_channel().unwrap().volume(), 69);
}

#[test]
fn knob_movements_are_not_coalesced() {
    let mut handler = fresh();
    let mut keyboard = ScriptedKeyboard::new();
    // 70 steps up then 70 down: sequential application clamps at 127 on the way
    keyboard.knobs = vec![KnobEvent::new(0, 70), KnobEvent::new(0, -70)];
    handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(handler.current_channel().unwrap().volume(), 127);
    handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(handler.current_channel().unwrap().volume(), 57);
}

#[test]
fn extreme_freeplay_knob_deltas_clamp() {
    let mut handler = fresh();
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![
        KnobEvent::new(0, i32::MAX),
        KnobEvent::new(2, i32::MAX),
        KnobEvent::new(1, i32::MIN),
        KnobEvent::new(3, i32::MIN),
    ];
    for _ in 0..4 {
        assert!(handler.handle_events(NO_INPUT, &mut keyboard).knob_applied.is_some());
    }
    let channel = handler.current_channel().unwrap();
    assert_eq!(channel.volume(), 127);
    assert_eq!(channel.pitch(), 8191);
    assert_eq!(channel.modulation(), 0);
}

#[test]
fn huge_pitch_step_saturates() {
    let settings = PlaySettings {
        pitch_step: i32::MAX,
        ..PlaySettings::default()
    };
    let mut handler = EventHandler::new(ProbeSynth::default(), settings, ModeTag::Freeplay);
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![KnobEvent::new(2, -3)];
    handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(handler.current_channel().unwrap().pitch(), -8192);
}

#[test]
fn extreme_knob_deltas_in_test_and_sound_select() {
    let mut handler = fresh();
    handler.switch_mode(ModeTag::Test);
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![
        KnobEvent::new(0, i32::MAX),
        KnobEvent::new(1, i32::MIN),
        KnobEvent::new(2, i32::MIN),
    ];
    for _ in 0..3 {
        handler.handle_events(NO_INPUT, &mut keyboard);
    }
    assert_eq!(handler.current_mode().unwrap().status(), "ref +67 vel 1");
    assert_eq!(handler.current_channel().unwrap().volume(), 0);

    handler.switch_mode(ModeTag::SoundSelect);
    keyboard.knobs = vec![KnobEvent::new(0, i32::MAX), KnobEvent::new(1, i32::MIN)];
    for _ in 0..2 {
        handler.handle_events(NO_INPUT, &mut keyboard);
    }
    assert_eq!(
        handler.current_channel().unwrap().instrument,
        InstrumentId::new(127, 0)
    );
}

#[test]
fn knobs_wait_until_a_channel_exists() {
    let mut handler = EventHandler::empty(ProbeSynth::default(), PlaySettings::default());
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![KnobEvent::new(0, 5)];

    let report = handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(report.knob_applied, None);
    assert_eq!(report.knob_backlog, 1);

    handler.add_channel(ModeTag::Freeplay, ChannelSettings::default());
    let report = handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(report.knob_applied, Some(KnobEvent::new(0, 5)));
    assert_eq!(report.knob_backlog, 0);
    assert_eq!(handler.current_channel().unwrap().volume(), 69);
}

// ---------------------------------------------------------------------------
// Key routing
// ---------------------------------------------------------------------------

#[test]
fn unmapped_key_is_skipped_and_tick_continues() {
    let mut handler = fresh();
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![KnobEvent::new(0, 2)];

    let report = handler.handle_events(
        [
            InputEvent::KeyDown(KeyCode::Char('q')),
            InputEvent::KeyDown(KeyCode::Char('z')),
            InputEvent::KeyUp(KeyCode::Char('q')),
        ],
        &mut keyboard,
    );
    assert_eq!(report.unmapped, 2);
    assert_eq!(report.keys_down, 1);
    assert_eq!(handler.synth().notes_on, vec![(0, 48, 100)]);
    assert_eq!(report.knob_applied, Some(KnobEvent::new(0, 2)));
    assert_eq!(handler.current_mode().unwrap().tag(), ModeTag::Freeplay);
    assert_eq!(handler.current_mode().unwrap().status(), "oct +0");
}

#[test]
fn synth_failures_never_abort_a_tick() {
    let mut handler = EventHandler::new(BrokenSynth, PlaySettings::default(), ModeTag::Freeplay);
    let mut keyboard = ScriptedKeyboard::new();
    keyboard.knobs = vec![KnobEvent::new(0, 10)];
    let report = handler.handle_events(
        [
            InputEvent::KeyDown(KeyCode::Char('z')),
            InputEvent::KeyUp(KeyCode::Char('z')),
        ],
        &mut keyboard,
    );
    assert_eq!(report.keys_down, 1);
    assert_eq!(report.keys_up, 1);
    // channel state still tracks the request even though the synth refused it
    assert_eq!(handler.current_channel().unwrap().volume(), 74);
}

#[test]
fn function_key_switches_mode_within_the_tick() {
    let mut handler = fresh();
    let mut keyboard = ScriptedKeyboard::new();
    handler.handle_events(
        [
            InputEvent::KeyDown(KeyCode::F(2)),
            InputEvent::KeyDown(KeyCode::Char('x')),
        ],
        &mut keyboard,
    );
    assert_eq!(handler.current_mode().unwrap().tag(), ModeTag::Test);
    // test mode plays the reference note regardless of key
    assert_eq!(handler.synth().notes_on, vec![(0, 60, 100)]);
}

// ---------------------------------------------------------------------------
// Mode switching
// ---------------------------------------------------------------------------

#[test]
fn switch_mode_affects_current_channel_only() {
    let mut handler = fresh();
    handler.switch_channel(3);
    handler.switch_mode(ModeTag::SoundSelect);
    for i in 0..MAX_CHANNELS {
        let expected = if i == 3 {
            ModeTag::SoundSelect
        } else {
            ModeTag::Freeplay
        };
        assert_eq!(handler.mode(i).map(Mode::tag), Some(expected));
    }

    handler.use_knob(0, 5);
    assert_eq!(handler.current_channel().unwrap().instrument, InstrumentId::new(5, 0));
    handler.switch_channel(4);
    handler.use_knob(0, 5);
    assert_eq!(handler.current_channel().unwrap().volume(), 69);
    assert_eq!(handler.current_channel().unwrap().instrument, InstrumentId::new(0, 0));
}

#[test]
fn fresh_handler_test_mode_scenario() {
    let mut handler = fresh();
    assert_eq!(handler.channel_count(), 16);
    assert_eq!(handler.current_index(), 0);

    handler.switch_mode(ModeTag::Test);
    handler.use_knob(0, 2);
    handler.key_down(7);
    assert_eq!(handler.synth().notes_on, vec![(0, 62, 100)]);
    assert_eq!(handler.current_mode().unwrap().status(), "ref +2");
    // knob 0 moved the reference note, not the volume
    assert_eq!(handler.current_channel().unwrap().volume(), 64);

    for i in 1..16 {
        assert_eq!(handler.mode(i).map(Mode::tag), Some(ModeTag::Freeplay));
    }
}

#[test]
fn replaced_mode_releases_its_notes() {
    let mut handler = fresh();
    handler.key_down(0);
    handler.key_down(2);
    handler.switch_mode(ModeTag::Test);
    assert_eq!(handler.synth().notes_off, vec![(0, 48), (0, 50)]);
}

// ---------------------------------------------------------------------------
// Real keyboard driver
// ---------------------------------------------------------------------------

#[test]
fn keymap_keyboard_feeds_knob_keys_through_the_queue() {
    let mut handler = fresh();
    let keymap = Keymap::new()
        .bind(KeyCode::Char('z'), 0)
        .bind_knob(KeyCode::Char(']'), 0, 1);
    let mut keyboard = Keyboard::new(keymap, KeyboardLayout::Qwerty);

    assert!(keyboard.observe_key(KeyCode::Char(']')));
    assert!(keyboard.observe_key(KeyCode::Char(']')));
    let report = handler.handle_events([InputEvent::KeyDown(KeyCode::Char(']'))], &mut keyboard);
    // the knob key itself has no index
    assert_eq!(report.unmapped, 1);
    assert_eq!(report.knob_backlog, 1);
    handler.handle_events(NO_INPUT, &mut keyboard);
    assert_eq!(handler.current_channel().unwrap().volume(), 66);
}
