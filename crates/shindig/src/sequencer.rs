//! Looping arpeggio playback.
//!
//! Replays a note sequence one pitch at a time on a fixed channel: note on,
//! wait a beat, note off, wait a beat, next pitch. Wraps at the end of the
//! sequence and keeps going until cancelled.

use std::time::{Duration, Instant};

use midi_gate::{EventSink, MidiError, MidiMessage};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{beat_delay, ConfigError};

/// Sleep granularity inside a beat wait, so cancellation is observed
/// promptly even at slow tempos.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Sequence-driven playback state: the notes, the derived beat delay, and
/// the current position. Mutated only by its own loop.
pub struct Sequencer {
    notes: Vec<u8>,
    delay: Duration,
    channel: u8,
    velocity: u8,
    position: usize,
}

impl Sequencer {
    /// Fails fast on an empty sequence or a non-positive tempo, before any
    /// event is sent.
    pub fn new(notes: Vec<u8>, bpm: f64, channel: u8, velocity: u8) -> Result<Self, ConfigError> {
        if notes.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        let delay = beat_delay(bpm)?;
        Ok(Self {
            notes,
            delay,
            channel,
            velocity,
            position: 0,
        })
    }

    /// Current index into the note sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Emit one note-on/note-off pair for the current pitch, gating each by
    /// a full beat delay, then advance (wrapping to 0 at the end).
    ///
    /// Returns `Ok(false)` when cancellation was observed. If cancellation
    /// lands between the on and the off, the note is still released before
    /// returning so nothing dangles.
    pub fn step(
        &mut self,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<bool, MidiError> {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        let pitch = self.notes[self.position];

        sink.send(&MidiMessage::NoteOn {
            channel: self.channel,
            pitch,
            velocity: self.velocity,
        })?;

        let interrupted = !self.wait(cancel);

        // Release whether or not the wait ran its course.
        sink.send(&MidiMessage::NoteOff {
            channel: self.channel,
            pitch,
        })?;

        if interrupted {
            return Ok(false);
        }

        let completed = self.wait(cancel);
        self.position = (self.position + 1) % self.notes.len();
        Ok(completed)
    }

    /// Run the arpeggio loop until cancelled or a send fails.
    ///
    /// A failed send is fatal to the session; there is no retry.
    pub fn run(
        &mut self,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), MidiError> {
        info!(
            "Starting arpeggio loop: {} notes, {:.1?} per beat, channel {}",
            self.notes.len(),
            self.delay,
            self.channel
        );

        while self.step(sink, cancel)? {}

        info!("Arpeggio loop stopped at position {}", self.position);
        Ok(())
    }

    /// Wait out one beat against a wall-clock deadline, checking for
    /// cancellation every slice. True when the full beat elapsed.
    fn wait(&self, cancel: &CancellationToken) -> bool {
        let deadline = Instant::now() + self.delay;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(WAIT_SLICE));
        }
    }
}
