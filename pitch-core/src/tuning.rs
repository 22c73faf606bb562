//! # Musical Tuning Module
//!
//! Equal-temperament arithmetic between frequencies and note names.
//! All conversions are anchored on a configurable tuning reference, the
//! frequency assigned to A4, which is kept within two whole tones of
//! concert pitch.
//!
//! ## Features
//! - Note-spec to frequency conversion (letter + accidental + octave + cents)
//! - Frequency to nearest note with signed cent deviation
//! - Dual enharmonic spelling for the five accidental semitone classes
//! - Tuning-reference band clamping

use crate::grammar::{self, NoteSpec};
use once_cell::sync::Lazy;
use std::fmt;

/// Concert pitch for A4 in Hz, the default tuning reference.
pub const CONCERT_A4: f32 = 440.0;

/// Lower bound of the tuning-reference band, two whole tones below A4=440Hz.
pub const TUNING_MIN: f32 = 349.22823;

/// Upper bound of the tuning-reference band, two whole tones above A4=440Hz.
pub const TUNING_MAX: f32 = 554.36526;

/// Frequency ratio of one equal-tempered semitone, 2^(1/12).
static SEMITONE_RATIO: Lazy<f32> = Lazy::new(|| 2.0_f32.powf(1.0 / 12.0));

/// The twelve semitone classes starting at C, with both spellings for the
/// accidental classes.
const NOTE_NAMES: [(&str, Option<&str>); 12] = [
    ("C", None),
    ("C#", Some("Db")),
    ("D", None),
    ("D#", Some("Eb")),
    ("E", None),
    ("F", None),
    ("F#", Some("Gb")),
    ("G", None),
    ("G#", Some("Ab")),
    ("A", None),
    ("A#", Some("Bb")),
    ("B", None),
];

/// Clamps a tuning reference into the allowed band. Out-of-band values are
/// pulled to the nearest bound, never rejected.
pub fn clamp_tuning_reference(freq: f32) -> f32 {
    freq.clamp(TUNING_MIN, TUNING_MAX)
}

/// Total semitone offset of a note spec relative to A4, including the
/// fractional cents contribution.
pub fn semitone_offset(spec: &NoteSpec) -> f32 {
    let letter = spec.letter.semitone_offset();
    let accidental = spec.accidental.map_or(0, |a| a.semitone_offset());
    let octave = (spec.octave as i32 - 4) * 12;
    (letter + accidental + octave) as f32 + spec.cents / 100.0
}

/// Converts a parsed note spec to its frequency under the given tuning
/// reference: `tuning * 2^(semitones / 12)`.
pub fn note_to_frequency(spec: &NoteSpec, tuning_reference: f32) -> f32 {
    tuning_reference * 2.0_f32.powf(semitone_offset(spec) / 12.0)
}

/// An immutable (frequency, tuning reference) pair from which the canonical
/// note representation is derived on demand.
///
/// The derived values are only meaningful for positive frequencies; the
/// `Display` implementation renders non-positive frequencies as the
/// sentinel string `off` instead of evaluating a logarithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch {
    frequency: f32,
    tuning_reference: f32,
}

impl Pitch {
    pub fn new(frequency: f32, tuning_reference: f32) -> Self {
        Pitch {
            frequency,
            tuning_reference,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn tuning_reference(&self) -> f32 {
        self.tuning_reference
    }

    /// Signed distance from the tuning reference in semitones, fractional.
    fn value(&self) -> f32 {
        (self.frequency / self.tuning_reference).ln() / SEMITONE_RATIO.ln()
    }

    /// Nearest semitone index relative to A4. Exact half-semitone deviations
    /// round away from zero.
    pub fn steps(&self) -> i32 {
        self.value().round() as i32
    }

    /// Rounded deviation from the nearest semitone in cents.
    pub fn cents(&self) -> i32 {
        let value = self.value();
        ((value - value.round()) * 100.0).round() as i32
    }

    /// Octave number of the nearest note; the octave starts at C, and A4 has
    /// octave 4.
    pub fn octave(&self) -> i32 {
        ((self.steps() - 2) as f32 / 12.0).ceil() as i32 + 4
    }

    /// Name of the nearest note with octave, e.g. `A4` or `C#5/Db5`.
    pub fn note_name(&self) -> String {
        let steps = self.steps();
        let octave = self.octave();
        // Offset within the octave runs -9 (C) to +2 (B).
        let class = (steps - (octave - 4) * 12 + 9) as usize;
        match NOTE_NAMES[class] {
            (name, None) => format!("{name}{octave}"),
            (sharp, Some(flat)) => format!("{sharp}{octave}/{flat}{octave}"),
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frequency <= 0.0 {
            return write!(f, "off");
        }
        let cents = self.cents();
        if cents == 0 {
            write!(f, "{}", self.note_name())
        } else {
            write!(f, "{} {:+}", self.note_name(), cents)
        }
    }
}

/// Renders a frequency as its nearest note name plus signed cent deviation,
/// or `off` for non-positive frequencies.
pub fn frequency_to_tone(frequency: f32, tuning_reference: f32) -> String {
    Pitch::new(frequency, tuning_reference).to_string()
}

/// Parses either a note token or a Hertz literal and anchors the result on
/// the given tuning reference. On failure the error of the alternative
/// that progressed furthest is reported.
pub fn parse_frequency_or_tone(
    text: &str,
    tuning_reference: f32,
) -> Result<Pitch, grammar::ParseError> {
    let note_err = match grammar::parse_note(text) {
        Ok(spec) => {
            return Ok(Pitch::new(
                note_to_frequency(&spec, tuning_reference),
                tuning_reference,
            ));
        }
        Err(e) => e,
    };
    match grammar::parse_hertz(text) {
        Ok(frequency) => Ok(Pitch::new(frequency, tuning_reference)),
        Err(hertz_err) => {
            if hertz_err.column > note_err.column {
                Err(hertz_err)
            } else {
                Err(note_err)
            }
        }
    }
}
