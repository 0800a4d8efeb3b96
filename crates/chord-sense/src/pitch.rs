//! Pitch-class naming and octave math.

/// Note names by pitch class, sharp spelling (0=C .. 11=B).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name of a pitch class.
pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

/// MIDI octave number: middle C (60) is C4, note 0 is C-1.
pub fn octave(pitch: u8) -> i8 {
    (pitch / 12) as i8 - 1
}

/// Full note name with octave, e.g. "C4" or "F#2".
pub fn full_note_name(pitch: u8) -> String {
    format!("{}{}", note_name(pitch % 12), octave(pitch))
}
