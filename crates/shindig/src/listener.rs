//! Live chord listening.
//!
//! A `NoteTracker` owns the set of held notes and reclassifies it on every
//! note event; `run_listener` wires a MIDI input into one and reports the
//! matches on stdout. Events are processed to completion one at a time, so
//! the note set never needs locking.

use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use chord_sense::{classify, ChordMatch, NoteSet};
use midi_gate::{ActiveMidiInput, MidiMessage, TimestampedMidiMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How often the loop wakes to check for cancellation while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tracks which notes are held and classifies on every change.
///
/// Note-on inserts, note-off removes; the channel is ignored, so a split
/// keyboard still reads as one set of hands.
#[derive(Debug, Default)]
pub struct NoteTracker {
    active: NoteSet,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &NoteSet {
        &self.active
    }

    /// Apply one note event to the set.
    ///
    /// Returns a classification when at least two notes are held and a
    /// declared pattern fits. Suppressing unmatched results is this
    /// reporting layer's policy, not the classifier's.
    pub fn handle(&mut self, message: &MidiMessage) -> Option<ChordMatch> {
        match *message {
            MidiMessage::NoteOn { pitch, .. } => self.active.insert(pitch),
            MidiMessage::NoteOff { pitch, .. } => self.active.remove(pitch),
        }

        if self.active.len() < 2 {
            return None;
        }

        let result = classify(&self.active);
        result.is_matched().then_some(result)
    }
}

/// Format a match the way it is reported on the console:
/// `C Major [C4, E4, G4]`.
pub fn format_chord(chord: &ChordMatch) -> String {
    let quality = chord.quality.map(|q| q.label()).unwrap_or("Unmatched");
    format!(
        "{} {} [{}]",
        chord.root_name,
        quality,
        chord.note_names.join(", ")
    )
}

/// Block on a MIDI input, tracking held notes and printing detected chords
/// until cancelled.
///
/// The midir callback forwards parsed note events into a channel; this
/// loop drains it one event at a time, so mutation, classification and
/// reporting are strictly serialized. The input port is released on every
/// exit path.
pub fn run_listener(port_pattern: &str, cancel: &CancellationToken) -> Result<()> {
    let (tx, rx) = mpsc::channel::<TimestampedMidiMessage>();
    let input = ActiveMidiInput::open(
        port_pattern,
        Box::new(move |event| {
            // The loop side hanging up just means we are shutting down.
            let _ = tx.send(event);
        }),
    )?;

    info!("Listening for chords on: {}", input.port_name);

    let mut tracker = NoteTracker::new();
    while !cancel.is_cancelled() {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                debug!(
                    "MIDI event at {}us: {:?}",
                    event.timestamp_us, event.message
                );
                if let Some(chord) = tracker.handle(&event.message) {
                    println!("Chord Detected: {}", format_chord(&chord));
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                anyhow::bail!("MIDI input stream closed unexpectedly");
            }
        }
    }

    info!("Listener cancelled");
    drop(input);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_sense::ChordQuality;
    use pretty_assertions::assert_eq;

    fn note_on(pitch: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            channel: 0,
            pitch,
            velocity: 80,
        }
    }

    fn note_off(pitch: u8) -> MidiMessage {
        MidiMessage::NoteOff { channel: 0, pitch }
    }

    #[test]
    fn fewer_than_two_notes_reports_nothing() {
        let mut tracker = NoteTracker::new();
        assert!(tracker.handle(&note_on(60)).is_none());
        assert_eq!(tracker.active().len(), 1);
    }

    #[test]
    fn completing_a_triad_reports_it() {
        let mut tracker = NoteTracker::new();
        tracker.handle(&note_on(60));
        // C + E alone form no declared pattern.
        assert!(tracker.handle(&note_on(64)).is_none());

        let chord = tracker.handle(&note_on(67)).expect("triad should match");
        assert_eq!(chord.root_name, "C");
        assert_eq!(chord.quality, Some(ChordQuality::Major));
    }

    #[test]
    fn releasing_a_note_reclassifies() {
        let mut tracker = NoteTracker::new();
        for pitch in [60, 64, 67] {
            tracker.handle(&note_on(pitch));
        }

        // Dropping the third leaves a bare fifth: nothing to report.
        assert!(tracker.handle(&note_off(64)).is_none());
        assert_eq!(tracker.active().len(), 2);
    }

    #[test]
    fn note_off_for_an_absent_pitch_is_harmless() {
        let mut tracker = NoteTracker::new();
        for pitch in [60, 64, 67] {
            tracker.handle(&note_on(pitch));
        }

        // The set is unchanged, so the same chord is reported again.
        let chord = tracker.handle(&note_off(99)).expect("set still a triad");
        assert_eq!(chord.quality, Some(ChordQuality::Major));
        assert_eq!(tracker.active().len(), 3);
    }

    #[test]
    fn channels_are_merged() {
        let mut tracker = NoteTracker::new();
        tracker.handle(&MidiMessage::NoteOn {
            channel: 2,
            pitch: 62,
            velocity: 80,
        });
        tracker.handle(&MidiMessage::NoteOn {
            channel: 7,
            pitch: 65,
            velocity: 80,
        });
        let chord = tracker
            .handle(&note_on(69))
            .expect("notes from different channels form one set");
        assert_eq!(chord.root_name, "D");
        assert_eq!(chord.quality, Some(ChordQuality::Minor));
    }

    #[test]
    fn chord_line_spelling() {
        let mut tracker = NoteTracker::new();
        tracker.handle(&note_on(60));
        tracker.handle(&note_on(64));
        let chord = tracker.handle(&note_on(67)).unwrap();

        assert_eq!(format_chord(&chord), "C Major [C4, E4, G4]");
    }
}
