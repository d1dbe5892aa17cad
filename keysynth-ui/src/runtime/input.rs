//! Input processing: terminal polling, knob keys, key-down/key-up tracking.

use std::time::Duration;

use keysynth_core::dispatch::InputEvent;

use super::AppRuntime;
use crate::ui::{AppEvent, InputSource, KeyEvent, KeyKind};

/// Upper bound on terminal events handled per tick.
const MAX_EVENTS_PER_TICK: u8 = 16;

impl AppRuntime {
    /// Poll terminal input into `events`. Returns true if the app should quit.
    pub(crate) fn process_events(
        &mut self,
        source: &mut impl InputSource,
        events: &mut Vec<InputEvent>,
    ) -> bool {
        let mut events_processed = 0u8;

        loop {
            let timeout = if events_processed == 0 {
                Duration::from_millis(2)
            } else {
                Duration::ZERO
            };
            let app_event = match source.poll_event(timeout) {
                Some(e) => e,
                None => break,
            };
            events_processed += 1;

            match app_event {
                AppEvent::Resize(_, _) => self.render_needed = true,
                AppEvent::Key(key) => {
                    if key.is_quit() {
                        return true;
                    }
                    if let Some(event) = self.translate_key(key) {
                        events.push(event);
                    }
                }
            }

            if events_processed >= MAX_EVENTS_PER_TICK {
                break;
            }
        }
        false
    }

    /// Knob keys go straight to the keyboard's knob list; everything else
    /// becomes at most one key-down per press and one key-up per release.
    fn translate_key(&mut self, key: KeyEvent) -> Option<InputEvent> {
        match key.kind {
            KeyKind::Press | KeyKind::Repeat => {
                if self.keyboard.observe_key(key.code) {
                    self.render_needed = true;
                    return None;
                }
                self.held
                    .press(key.code, key.timestamp)
                    .then_some(InputEvent::KeyDown(key.code))
            }
            KeyKind::Release => self
                .held
                .release(key.code)
                .then_some(InputEvent::KeyUp(key.code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use keysynth_core::config::Config;
    use keysynth_core::keyboard::Keymap;
    use keysynth_types::KeyCode;

    struct ScriptedInput(VecDeque<AppEvent>);

    impl InputSource for ScriptedInput {
        fn poll_event(&mut self, _timeout: Duration) -> Option<AppEvent> {
            self.0.pop_front()
        }
    }

    fn runtime() -> AppRuntime {
        let keymap = Keymap::new()
            .bind(KeyCode::Char('z'), 0)
            .bind_knob(KeyCode::Up, 0, 1);
        AppRuntime::new(&Config::load_with(None), keymap, false)
    }

    fn key(code: KeyCode, kind: KeyKind) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, kind))
    }

    #[test]
    fn repeats_collapse_into_one_key_down() {
        let mut rt = runtime();
        let mut input = ScriptedInput(VecDeque::from(vec![
            key(KeyCode::Char('z'), KeyKind::Press),
            key(KeyCode::Char('z'), KeyKind::Repeat),
            key(KeyCode::Char('z'), KeyKind::Press),
            key(KeyCode::Char('z'), KeyKind::Release),
            key(KeyCode::Char('z'), KeyKind::Release),
        ]));
        let mut events = Vec::new();
        assert!(!rt.process_events(&mut input, &mut events));
        assert_eq!(
            events,
            vec![
                InputEvent::KeyDown(KeyCode::Char('z')),
                InputEvent::KeyUp(KeyCode::Char('z')),
            ]
        );
    }

    #[test]
    fn knob_keys_never_reach_the_dispatcher() {
        let mut rt = runtime();
        let mut input = ScriptedInput(VecDeque::from(vec![
            key(KeyCode::Up, KeyKind::Press),
            key(KeyCode::Up, KeyKind::Repeat),
            key(KeyCode::Up, KeyKind::Release),
        ]));
        let mut events = Vec::new();
        rt.process_events(&mut input, &mut events);
        assert!(events.is_empty());
        assert_eq!(rt.keyboard.pending_knobs(), 2);
    }

    #[test]
    fn escape_quits() {
        let mut rt = runtime();
        let mut input = ScriptedInput(VecDeque::from(vec![
            key(KeyCode::Char('z'), KeyKind::Press),
            key(KeyCode::Escape, KeyKind::Press),
        ]));
        let mut events = Vec::new();
        assert!(rt.process_events(&mut input, &mut events));
    }

    #[test]
    fn at_most_sixteen_events_per_tick() {
        let mut rt = runtime();
        let script: VecDeque<AppEvent> = (0..20).map(|_| AppEvent::Resize(80, 24)).collect();
        let mut input = ScriptedInput(script);
        let mut events = Vec::new();
        rt.process_events(&mut input, &mut events);
        assert_eq!(input.0.len(), 4);
    }

    #[test]
    fn tick_plays_through_handler() {
        let mut rt = runtime();
        rt.tick(vec![InputEvent::KeyDown(KeyCode::Char('z'))]);
        assert_eq!(rt.last_report.keys_down, 1);
        assert!(rt.render_needed);
    }
}
