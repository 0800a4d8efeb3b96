//! Note-sequence extraction from Standard MIDI Files.
//!
//! Playback is sequence-driven: only the pitches of sounding notes are
//! kept, in the order they appear in the file. Timing, tempo and other
//! meta events are discarded.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use midly::{MidiMessage as MidlyMessage, Smf, TrackEventKind};
use tracing::debug;

/// Extract the pitch of every sounding note in a MIDI file.
///
/// Tracks are walked in file order, events in track order. Only Note On
/// events with nonzero velocity count (a zero-velocity Note On is a Note
/// Off and is skipped).
pub fn notes_from_file(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let smf = Smf::parse(&bytes)
        .with_context(|| format!("Failed to parse MIDI file {}", path.display()))?;

    let mut notes = Vec::new();
    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Midi {
                message: MidlyMessage::NoteOn { key, vel },
                ..
            } = event.kind
            {
                if vel.as_int() > 0 {
                    notes.push(key.as_int());
                }
            }
        }
    }

    debug!("{}: extracted {} notes", path.display(), notes.len());
    Ok(notes)
}

/// True when a path looks like a Standard MIDI File.
fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

/// Concatenate the notes of every MIDI file in a folder.
///
/// Files are visited in directory listing order, which is platform-defined;
/// the concatenation order is not stable across platforms. An empty folder
/// yields an empty sequence (rejecting that is the player's decision).
pub fn notes_from_folder(path: &Path) -> Result<Vec<u8>> {
    let entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read folder {}", path.display()))?;

    let mut notes = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", path.display()))?;
        let file_path = entry.path();
        if file_path.is_file() && is_midi_file(&file_path) {
            notes.extend(notes_from_file(&file_path)?);
        }
    }

    Ok(notes)
}
