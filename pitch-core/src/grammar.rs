//! # Pitch Input Grammar
//!
//! This module parses the small textual grammar the converter accepts:
//! note names with accidentals, octaves and cent offsets, Hertz literals,
//! percent amplitudes, and tuning-reference literals.
//!
//! ## Grammar (case-sensitive, no whitespace between tokens)
//! - Note: `C|D|E|F|G|A|B`, optional `#`/`b`, octave digit `0-8`,
//!   optional glued `+`/`-` cents number (e.g. `C#3`, `Bb2-12,5`)
//! - Frequency: number followed by `Hz` (e.g. `441.5Hz`, `441,5Hz`)
//! - Amplitude: number followed by `%` (e.g. `50%`)
//! - Tuning reference: `b` followed by a frequency literal (e.g. `b432Hz`)
//!
//! Parsing yields typed values only; the equal-temperament arithmetic lives
//! in the `tuning` module.

use thiserror::Error;

/// A parse failure, carrying the full input and the 1-based column at which
/// the parser gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse \"{input}\" @ col {column}")]
pub struct ParseError {
    pub input: String,
    pub column: usize,
}

/// The seven natural note letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLetter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteLetter {
    /// Semitone offset of the natural letter relative to A in the same octave.
    pub fn semitone_offset(self) -> i32 {
        match self {
            NoteLetter::C => -9,
            NoteLetter::D => -7,
            NoteLetter::E => -5,
            NoteLetter::F => -4,
            NoteLetter::G => -2,
            NoteLetter::A => 0,
            NoteLetter::B => 2,
        }
    }
}

/// An accidental directly following a note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn semitone_offset(self) -> i32 {
        match self {
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A fully parsed note token, before any tuning arithmetic is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSpec {
    pub letter: NoteLetter,
    pub accidental: Option<Accidental>,
    /// Octave digit 0-8; octave 4 contains the reference A.
    pub octave: u8,
    /// Signed deviation in cents, 0.0 when the literal carries none.
    pub cents: f32,
}

/// One recognized input literal, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    Tone(NoteSpec),
    Hertz(f32),
    /// Fraction of full scale (the percent number divided by 100). Range
    /// checking happens on assignment, not here.
    Amplitude(f32),
    TuningReference(f32),
}

/// Byte cursor over the input text. Tokens never skip interior whitespace;
/// leading and trailing whitespace around the whole literal is tolerated.
struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        let pos = text.len() - text.trim_start().len();
        Cursor {
            text,
            bytes: text.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Error pointing at the current position (1-based column).
    fn error(&self) -> ParseError {
        ParseError {
            input: self.text.to_string(),
            column: self.pos + 1,
        }
    }

    /// A decimal number: digits, optionally followed by `.` or `,` and more
    /// digits. The comma separator is normalized to a point. The separator is
    /// only consumed when a digit follows it.
    fn number(&mut self) -> Result<f32, ParseError> {
        let start = self.pos;
        if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
            return Err(self.error());
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
        }
        if matches!(self.peek(), Some(b'.') | Some(b','))
            && self.peek_at(1).is_some_and(|b| b.is_ascii_digit())
        {
            self.bump();
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        }
        let literal = self.text[start..self.pos].replace(',', ".");
        literal.parse::<f32>().map_err(|_| ParseError {
            input: self.text.to_string(),
            column: start + 1,
        })
    }

    /// Consumes the exact string `expected`, erroring at its start otherwise.
    fn expect(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.text[self.pos.min(self.text.len())..].starts_with(expected) {
            self.pos += expected.len();
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Requires that nothing but whitespace remains.
    fn finish(&mut self) -> Result<(), ParseError> {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.bump();
        }
        if self.pos < self.bytes.len() {
            Err(self.error())
        } else {
            Ok(())
        }
    }
}

fn note(c: &mut Cursor) -> Result<NoteSpec, ParseError> {
    let letter = match c.peek() {
        Some(b'C') => NoteLetter::C,
        Some(b'D') => NoteLetter::D,
        Some(b'E') => NoteLetter::E,
        Some(b'F') => NoteLetter::F,
        Some(b'G') => NoteLetter::G,
        Some(b'A') => NoteLetter::A,
        Some(b'B') => NoteLetter::B,
        _ => return Err(c.error()),
    };
    c.bump();

    let accidental = match c.peek() {
        Some(b'#') => {
            c.bump();
            Some(Accidental::Sharp)
        }
        Some(b'b') => {
            c.bump();
            Some(Accidental::Flat)
        }
        _ => None,
    };

    let octave = match c.peek() {
        Some(digit @ b'0'..=b'8') => {
            c.bump();
            digit - b'0'
        }
        _ => return Err(c.error()),
    };

    let cents = match c.peek() {
        Some(sign @ (b'+' | b'-')) => {
            c.bump();
            let magnitude = c.number()?;
            if sign == b'-' { -magnitude } else { magnitude }
        }
        _ => 0.0,
    };

    Ok(NoteSpec {
        letter,
        accidental,
        octave,
        cents,
    })
}

fn hertz(c: &mut Cursor) -> Result<f32, ParseError> {
    let value = c.number()?;
    c.expect("Hz")?;
    Ok(value)
}

/// Parses a note token such as `A4`, `C#3` or `Bb2+12,5`.
pub fn parse_note(text: &str) -> Result<NoteSpec, ParseError> {
    let mut c = Cursor::new(text);
    let spec = note(&mut c)?;
    c.finish()?;
    Ok(spec)
}

/// Parses a frequency literal such as `440Hz` or `441,5Hz`.
pub fn parse_hertz(text: &str) -> Result<f32, ParseError> {
    let mut c = Cursor::new(text);
    let value = hertz(&mut c)?;
    c.finish()?;
    Ok(value)
}

/// Parses an amplitude literal such as `50%` into a fraction of full scale.
pub fn parse_amplitude_percent(text: &str) -> Result<f32, ParseError> {
    let mut c = Cursor::new(text);
    let value = c.number()?;
    c.expect("%")?;
    c.finish()?;
    Ok(value / 100.0)
}

/// Parses a tuning-reference literal such as `b432Hz`. The leading lowercase
/// `b` followed by a frequency literal (never an octave digit alone)
/// distinguishes this from a flat-note token, which always starts with an
/// uppercase letter.
pub fn parse_tuning_literal(text: &str) -> Result<f32, ParseError> {
    let mut c = Cursor::new(text);
    if c.peek() != Some(b'b') {
        return Err(c.error());
    }
    c.bump();
    let value = hertz(&mut c)?;
    c.finish()?;
    Ok(value)
}

fn furthest(a: ParseError, b: ParseError) -> ParseError {
    if b.column > a.column { b } else { a }
}

/// Tries every literal kind against the input and returns the first match,
/// in the order tone, tuning reference, frequency, amplitude. When nothing
/// matches, the error of the alternative that progressed furthest is
/// returned so the column points at the most plausible failure.
pub fn parse_input(text: &str) -> Result<ParsedInput, ParseError> {
    let err = match parse_note(text) {
        Ok(spec) => return Ok(ParsedInput::Tone(spec)),
        Err(e) => e,
    };
    let err = match parse_tuning_literal(text) {
        Ok(freq) => return Ok(ParsedInput::TuningReference(freq)),
        Err(e) => furthest(err, e),
    };
    let err = match parse_hertz(text) {
        Ok(freq) => return Ok(ParsedInput::Hertz(freq)),
        Err(e) => furthest(err, e),
    };
    let err = match parse_amplitude_percent(text) {
        Ok(amp) => return Ok(ParsedInput::Amplitude(amp)),
        Err(e) => furthest(err, e),
    };
    Err(err)
}
