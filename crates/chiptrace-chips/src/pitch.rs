//! Frequency to note mapping.

use serde::{Deserialize, Serialize};

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Tuning reference and output note range.
///
/// `note = round(12 * log2(freq / reference_hz) + reference_note)`, clamped to
/// `min_note..=max_note`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchReference {
    /// Frequency of the reference note.
    pub reference_hz: f64,
    /// Note number of the reference (69 = A4 in MIDI numbering).
    pub reference_note: u8,
    /// Lowest note the output can hold.
    pub min_note: u8,
    /// Highest note the output can hold.
    pub max_note: u8,
}

impl Default for PitchReference {
    fn default() -> Self {
        Self {
            reference_hz: 440.0,
            reference_note: 69,
            min_note: 0,
            max_note: 127,
        }
    }
}

impl PitchReference {
    /// Nearest note for `freq_hz`. Out-of-range results are clamped, never dropped.
    ///
    /// An inverted range is treated as its swapped bounds.
    pub fn note_for(&self, freq_hz: f64) -> u8 {
        let lo = self.min_note.min(self.max_note);
        let hi = self.min_note.max(self.max_note);
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return lo;
        }
        let exact = self.exact_note(freq_hz);
        exact.round().clamp(lo as f64, hi as f64) as u8
    }

    /// Fractional note number for `freq_hz`.
    pub fn exact_note(&self, freq_hz: f64) -> f64 {
        12.0 * (freq_hz / self.reference_hz).log2() + self.reference_note as f64
    }
}

/// Signed distance from `from_hz` to `to_hz` in cents, saturated to `i16`.
pub fn cents_between(from_hz: f64, to_hz: f64) -> i16 {
    if from_hz <= 0.0 || to_hz <= 0.0 {
        return 0;
    }
    let cents = (1200.0 * (to_hz / from_hz).log2()).round();
    cents.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Tracker-style note name, e.g. `C-4` for note 60 (MIDI octave numbering).
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}
