//! Best-fit chord classification for a set of held notes.

use serde::{Deserialize, Serialize};

use crate::note_set::NoteSet;
use crate::patterns::{ChordQuality, PATTERNS};
use crate::pitch::{full_note_name, note_name};

/// Result of classifying the currently held notes.
///
/// Recomputed from scratch on every change to the note set; never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordMatch {
    /// Lowest sounding pitch, taken as the root.
    pub root_pitch: u8,
    /// Pitch-class name of the root: "C", "F#", ...
    pub root_name: String,
    /// Matched quality, or `None` when no declared pattern fits.
    pub quality: Option<ChordQuality>,
    /// Fraction of the sounding pitch classes the matched pattern explains
    /// (1.0 when the pattern accounts for every held pitch class, 0.0 when
    /// unmatched).
    pub confidence: f64,
    /// Full names of the sounding notes, ascending: ["C4", "E4", "G4"].
    pub note_names: Vec<String>,
}

impl ChordMatch {
    pub fn is_matched(&self) -> bool {
        self.quality.is_some()
    }
}

/// Classify the held notes into a root and chord quality.
///
/// The lowest sounding pitch is taken as the root. This is a bass-note
/// heuristic: an inverted voicing is named from its bass, not its harmonic
/// root. Patterns are tried in declaration order and the first
/// whose offsets are all present wins; extra color tones never disqualify
/// an earlier pattern.
///
/// Precondition: `notes.len() >= 2`. Callers gate on cardinality before
/// invoking; below that the result is meaningless.
pub fn classify(notes: &NoteSet) -> ChordMatch {
    debug_assert!(notes.len() >= 2, "classification needs at least two notes");

    let root = notes.lowest().unwrap_or(0);

    let mut intervals = 0u16;
    for pitch in notes.iter() {
        intervals |= 1 << ((pitch - root) % 12);
    }

    let matched = PATTERNS.iter().find(|p| p.matches(intervals));

    let distinct = intervals.count_ones() as usize;
    let (quality, confidence) = match matched {
        Some(pattern) => (
            Some(pattern.quality),
            pattern.size as f64 / distinct as f64,
        ),
        None => (None, 0.0),
    };

    ChordMatch {
        root_pitch: root,
        root_name: note_name(root % 12).to_string(),
        quality,
        confidence,
        note_names: notes.iter().map(full_note_name).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(pitches: &[u8]) -> NoteSet {
        let mut notes = NoteSet::new();
        for &p in pitches {
            notes.insert(p);
        }
        notes
    }

    #[test]
    fn c_major_triad() {
        let result = classify(&set(&[60, 64, 67]));
        assert_eq!(result.root_name, "C");
        assert_eq!(result.quality, Some(ChordQuality::Major));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.note_names, vec!["C4", "E4", "G4"]);
    }

    #[test]
    fn d_minor_triad() {
        let result = classify(&set(&[62, 65, 69]));
        assert_eq!(result.root_name, "D");
        assert_eq!(result.quality, Some(ChordQuality::Minor));
    }

    #[test]
    fn transposed_patterns_follow_the_root() {
        // F# diminished: F# A C
        let result = classify(&set(&[66, 69, 72]));
        assert_eq!(result.root_name, "F#");
        assert_eq!(result.quality, Some(ChordQuality::Diminished));
    }

    #[test]
    fn first_declared_pattern_wins() {
        // C E G B carries the major-seventh intervals {0,4,7,11}, but the
        // plain major triad is declared first and its offsets are a subset.
        let result = classify(&set(&[60, 64, 67, 71]));
        assert_eq!(result.quality, Some(ChordQuality::Major));
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn minor_shadows_minor_seventh() {
        let result = classify(&set(&[60, 63, 67, 70]));
        assert_eq!(result.quality, Some(ChordQuality::Minor));
    }

    #[test]
    fn suspended_second() {
        let result = classify(&set(&[60, 62, 67]));
        assert_eq!(result.root_name, "C");
        assert_eq!(result.quality, Some(ChordQuality::Sus2));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn chromatic_cluster_is_unmatched() {
        let result = classify(&set(&[60, 61]));
        assert_eq!(result.root_name, "C");
        assert_eq!(result.quality, None);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_matched());
    }

    #[test]
    fn bare_fifth_is_unmatched() {
        let result = classify(&set(&[60, 67]));
        assert_eq!(result.quality, None);
    }

    #[test]
    fn inversions_are_named_from_the_bass() {
        // First-inversion C major (E G C): intervals from E are {0,3,8},
        // which fit no declared pattern. The bass-note heuristic does not
        // recover the harmonic root.
        let result = classify(&set(&[64, 67, 72]));
        assert_eq!(result.root_name, "E");
        assert_eq!(result.quality, None);
    }

    #[test]
    fn octave_doublings_collapse_to_one_interval() {
        let result = classify(&set(&[48, 60, 64, 67, 72]));
        assert_eq!(result.root_name, "C");
        assert_eq!(result.quality, Some(ChordQuality::Major));
        assert_eq!(result.confidence, 1.0);
    }
}
