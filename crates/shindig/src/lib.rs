//! Live chord listening and looping arpeggio playback over MIDI.
//!
//! Two independent loops, each single-threaded and blocking: the listener
//! tracks held notes from a MIDI input and reports detected chords; the
//! sequencer replays a stored note sequence as a repeating arpeggio on a
//! MIDI output. Both stop cooperatively through a cancellation token.

pub mod config;
pub mod listener;
pub mod sequencer;

pub use config::{beat_delay, ConfigError};
pub use listener::{format_chord, run_listener, NoteTracker};
pub use sequencer::Sequencer;
