//! Wire-level MIDI note messages.
//!
//! Only the note on/off subset is modeled. Everything else on the wire
//! (controllers, program changes, sysex, clock) is dropped at parse time.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A note event on a specific channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MidiMessage {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
}

impl MidiMessage {
    pub fn channel(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { channel, .. } | MidiMessage::NoteOff { channel, .. } => *channel,
        }
    }

    pub fn pitch(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { pitch, .. } | MidiMessage::NoteOff { pitch, .. } => *pitch,
        }
    }
}

/// Parse raw MIDI bytes into a note message.
///
/// A Note On with velocity 0 is a Note Off, per the MIDI convention.
/// Non-note messages return `None`.
pub fn parse_midi_bytes(data: &[u8]) -> Option<MidiMessage> {
    if data.is_empty() {
        return None;
    }

    let status = data[0];
    let channel = status & 0x0F;

    match status & 0xF0 {
        0x90 if data.len() >= 3 => {
            let velocity = data[2];
            if velocity == 0 {
                Some(MidiMessage::NoteOff {
                    channel,
                    pitch: data[1],
                })
            } else {
                Some(MidiMessage::NoteOn {
                    channel,
                    pitch: data[1],
                    velocity,
                })
            }
        }
        0x80 if data.len() >= 3 => Some(MidiMessage::NoteOff {
            channel,
            pitch: data[1],
        }),
        _ => {
            debug!("ignoring non-note MIDI message: {:02X}", status);
            None
        }
    }
}

/// Encode a note message to raw MIDI bytes.
pub fn encode_midi_message(msg: &MidiMessage) -> Vec<u8> {
    match msg {
        MidiMessage::NoteOn {
            channel,
            pitch,
            velocity,
        } => vec![0x90 | (channel & 0x0F), *pitch, *velocity],
        MidiMessage::NoteOff { channel, pitch } => {
            vec![0x80 | (channel & 0x0F), *pitch, 0]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_note_on() {
        let msg = parse_midi_bytes(&[0x90, 60, 100]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 0,
                pitch: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn parse_note_on_velocity_zero_is_note_off() {
        let msg = parse_midi_bytes(&[0x90, 60, 0]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 0,
                pitch: 60
            }
        );
    }

    #[test]
    fn parse_explicit_note_off() {
        // Release velocity (64) is discarded.
        let msg = parse_midi_bytes(&[0x83, 48, 64]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 3,
                pitch: 48
            }
        );
    }

    #[test]
    fn channel_comes_from_the_status_nibble() {
        let msg = parse_midi_bytes(&[0x95, 72, 1]).unwrap();
        assert_eq!(msg.channel(), 5);
        assert_eq!(msg.pitch(), 72);
    }

    #[test]
    fn non_note_messages_are_dropped() {
        assert!(parse_midi_bytes(&[0xB0, 1, 64]).is_none()); // control change
        assert!(parse_midi_bytes(&[0xC0, 42]).is_none()); // program change
        assert!(parse_midi_bytes(&[0xF8]).is_none()); // timing clock
        assert!(parse_midi_bytes(&[]).is_none());
    }

    #[test]
    fn truncated_note_messages_are_dropped() {
        assert!(parse_midi_bytes(&[0x90, 60]).is_none());
        assert!(parse_midi_bytes(&[0x80]).is_none());
    }

    #[test]
    fn encode_note_on() {
        let msg = MidiMessage::NoteOn {
            channel: 3,
            pitch: 60,
            velocity: 64,
        };
        assert_eq!(encode_midi_message(&msg), vec![0x93, 60, 64]);
    }

    #[test]
    fn encode_note_off() {
        let msg = MidiMessage::NoteOff {
            channel: 3,
            pitch: 60,
        };
        assert_eq!(encode_midi_message(&msg), vec![0x83, 60, 0]);
    }

    #[test]
    fn roundtrip_note_on() {
        let original = MidiMessage::NoteOn {
            channel: 5,
            pitch: 72,
            velocity: 127,
        };
        let parsed = parse_midi_bytes(&encode_midi_message(&original)).unwrap();
        assert_eq!(parsed, original);
    }
}
