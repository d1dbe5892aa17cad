//! MIDI input from hardware controllers.
//!
//! The `midir` callback runs on its own thread and only forwards parsed
//! events over an mpsc channel; the runtime drains them once per tick.

use midir::{MidiInput, MidiInputConnection};
use std::sync::mpsc::{self, Receiver};

/// MIDI event with the driver timestamp (microseconds, driver-specific epoch).
#[derive(Debug, Clone, Copy)]
pub struct MidiEvent {
    pub timestamp_us: u64,
    pub kind: MidiEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    PitchBend {
        channel: u8,
        /// -8192 (full down) to +8191 (full up), 0 = center
        value: i16,
    },
}

impl MidiEvent {
    pub fn new(timestamp_us: u64, kind: MidiEventKind) -> Self {
        Self { timestamp_us, kind }
    }
}

/// Decode a relative (two's complement) encoder value into a knob delta.
///
/// 1..=63 turn clockwise by that many steps, 65..=127 counter-clockwise by
/// `128 - value`. 0 and 64 carry no movement.
pub fn relative_delta(value: u8) -> Option<i32> {
    match value & 0x7F {
        0 | 64 => None,
        v @ 1..=63 => Some(v as i32),
        v => Some(v as i32 - 128),
    }
}

#[derive(Debug, Clone)]
struct MidiPortInfo {
    index: usize,
    name: String,
}

/// MIDI input manager
pub struct MidiInputManager {
    midi_in: Option<MidiInput>,
    connection: Option<MidiInputConnection<()>>,
    event_receiver: Option<Receiver<MidiEvent>>,
    connected_port_name: Option<String>,
    available_ports: Vec<MidiPortInfo>,
}

impl MidiInputManager {
    pub fn new() -> Self {
        let midi_in = MidiInput::new("keysynth").ok();
        Self {
            midi_in,
            connection: None,
            event_receiver: None,
            connected_port_name: None,
            available_ports: Vec::new(),
        }
    }

    /// Refresh the list of available MIDI input ports
    pub fn refresh_ports(&mut self) {
        self.available_ports.clear();

        if let Some(ref midi_in) = self.midi_in {
            let ports = midi_in.ports();
            for (index, port) in ports.iter().enumerate() {
                if let Ok(name) = midi_in.port_name(port) {
                    self.available_ports.push(MidiPortInfo { index, name });
                }
            }
        }
    }

    pub fn connected_port_name(&self) -> Option<&str> {
        self.connected_port_name.as_deref()
    }

    /// Connect to the first port whose name contains `hint` (case-insensitive).
    /// An empty hint picks the first port.
    pub fn connect_matching(&mut self, hint: &str) -> Result<(), String> {
        self.refresh_ports();
        let hint = hint.to_lowercase();
        let index = self
            .available_ports
            .iter()
            .find(|p| p.name.to_lowercase().contains(&hint))
            .map(|p| p.index)
            .ok_or_else(|| format!("no MIDI input port matching '{}'", hint))?;
        self.connect(index)
    }

    /// Connect to a MIDI input port by index
    pub fn connect(&mut self, port_index: usize) -> Result<(), String> {
        self.disconnect();

        // connect() consumes the MidiInput, so use a fresh one
        let midi_in = MidiInput::new("keysynth").map_err(|e| e.to_string())?;
        let ports = midi_in.ports();

        if port_index >= ports.len() {
            return Err(format!("Invalid port index: {}", port_index));
        }

        let port = &ports[port_index];
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let (tx, rx) = mpsc::channel();
        self.event_receiver = Some(rx);

        let connection = midi_in
            .connect(
                port,
                "keysynth-input",
                move |timestamp, message, _| {
                    if let Some(kind) = parse_midi_message(message) {
                        let _ = tx.send(MidiEvent::new(timestamp, kind));
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "connected to MIDI input '{}'", port_name);
        self.connection = Some(connection);
        self.connected_port_name = Some(port_name);

        self.midi_in = MidiInput::new("keysynth").ok();

        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
        self.event_receiver = None;
        self.connected_port_name = None;
    }

    /// Poll for pending MIDI events (non-blocking)
    pub fn poll_events(&self) -> Vec<MidiEvent> {
        let mut events = Vec::new();
        if let Some(ref rx) = self.event_receiver {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }
}

impl Default for MidiInputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Parse a raw MIDI message. Messages other than note, controller and pitch
/// bend are dropped.
fn parse_midi_message(data: &[u8]) -> Option<MidiEventKind> {
    let (&status, rest) = data.split_first()?;
    let channel = status & 0x0F;

    match (status & 0xF0, rest) {
        (0x80, [note, _, ..]) => Some(MidiEventKind::NoteOff {
            channel,
            note: *note,
        }),
        // velocity 0 = note off
        (0x90, [note, 0, ..]) => Some(MidiEventKind::NoteOff {
            channel,
            note: *note,
        }),
        (0x90, [note, velocity, ..]) => Some(MidiEventKind::NoteOn {
            channel,
            note: *note,
            velocity: *velocity,
        }),
        (0xB0, [controller, value, ..]) => Some(MidiEventKind::ControlChange {
            channel,
            controller: *controller,
            value: *value,
        }),
        (0xE0, [lsb, msb, ..]) => {
            let value = (((*msb as i16) << 7) | *lsb as i16) - 8192;
            Some(MidiEventKind::PitchBend { channel, value })
        }
        _ => None,
    }
}
