//! # Tone/Frequency Converter
//!
//! Owns the mutable conversion state: tuning reference, last frequency and
//! output amplitude, plus an accumulating diagnostics log with
//! read-and-clear semantics. All state changes funnel through a single
//! pure transition function, [`configure`], so every validation rule is a
//! testable predicate and every failure has one documented fallback.

use crate::grammar::{self, ParseError, ParsedInput};
use crate::tuning::{self, Pitch, CONCERT_A4, TUNING_MAX, TUNING_MIN};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A dynamically typed input value, as delivered by a prompt or UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f32),
    Text(String),
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// The converter field an input was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Frequency,
    Tone,
    TuningReference,
    Amplitude,
    /// The combined auto-detecting input of [`Converter::set`].
    Input,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Frequency => "frequency",
            Field::Tone => "tone",
            Field::TuningReference => "tuning reference",
            Field::Amplitude => "amplitude",
            Field::Input => "input",
        };
        write!(f, "{name}")
    }
}

/// Recoverable converter errors. Every variant knows the fallback state it
/// leaves behind, see [`ConverterError::recover`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConverterError {
    /// The text matched no recognized literal.
    #[error("{source}")]
    Parse {
        field: Field,
        source: ParseError,
    },
    /// A numeric frequency must be strictly positive.
    #[error("input as int or float must be >0")]
    NonPositiveFrequency { requested: f32 },
    /// The tuning reference left its allowed band and was clamped.
    #[error("tuning reference {requested}Hz outside [{TUNING_MIN}Hz, {TUNING_MAX}Hz], clamped to {clamped}Hz")]
    TuningOutOfBand { requested: f32, clamped: f32 },
    /// The amplitude left [0, 1] and was clamped.
    #[error("amplitude {requested} outside [0, 1], clamped to {clamped}")]
    AmplitudeOutOfRange { requested: f32, clamped: f32 },
    /// The field does not accept this kind of value.
    #[error("invalid input type for {field}")]
    InvalidType { field: Field },
}

/// The converter's value state between transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConverterState {
    /// Frequency assigned to A4, within the allowed band.
    pub tuning_reference: f32,
    /// Last accepted frequency in Hz; 0 means "off".
    pub frequency: f32,
    /// Normalized output gain in [0, 1].
    pub amplitude: f32,
}

impl Default for ConverterState {
    fn default() -> Self {
        ConverterState {
            tuning_reference: CONCERT_A4,
            frequency: CONCERT_A4,
            amplitude: 0.5,
        }
    }
}

/// One requested state change.
#[derive(Debug, Clone, PartialEq)]
pub enum PitchInputEvent {
    SetFrequency(Value),
    SetTone(Value),
    SetTuningReference(Value),
    SetAmplitude(Value),
    /// Auto-detect the literal kind and update the matching field.
    Set(Value),
}

// Validation predicates, pure and individually testable.

pub fn frequency_is_positive(frequency: f32) -> bool {
    frequency > 0.0
}

pub fn tuning_in_band(frequency: f32) -> bool {
    (TUNING_MIN..=TUNING_MAX).contains(&frequency)
}

pub fn amplitude_in_range(amplitude: f32) -> bool {
    (0.0..=1.0).contains(&amplitude)
}

fn parse_err(field: Field, source: ParseError) -> ConverterError {
    ConverterError::Parse { field, source }
}

fn checked_tuning(state: ConverterState, frequency: f32) -> Result<ConverterState, ConverterError> {
    if tuning_in_band(frequency) {
        Ok(ConverterState {
            tuning_reference: frequency,
            ..state
        })
    } else {
        Err(ConverterError::TuningOutOfBand {
            requested: frequency,
            clamped: tuning::clamp_tuning_reference(frequency),
        })
    }
}

fn checked_amplitude(
    state: ConverterState,
    amplitude: f32,
) -> Result<ConverterState, ConverterError> {
    if amplitude_in_range(amplitude) {
        Ok(ConverterState { amplitude, ..state })
    } else {
        Err(ConverterError::AmplitudeOutOfRange {
            requested: amplitude,
            clamped: amplitude.clamp(0.0, 1.0),
        })
    }
}

/// Applies one input event to a state, yielding the next state or the
/// error describing why the transition failed. The function is pure; it
/// never touches the diagnostics log.
pub fn configure(
    state: ConverterState,
    event: PitchInputEvent,
) -> Result<ConverterState, ConverterError> {
    match event {
        PitchInputEvent::SetFrequency(Value::Number(frequency)) => {
            if frequency_is_positive(frequency) {
                Ok(ConverterState { frequency, ..state })
            } else {
                Err(ConverterError::NonPositiveFrequency {
                    requested: frequency,
                })
            }
        }
        PitchInputEvent::SetFrequency(Value::Text(text)) => grammar::parse_hertz(&text)
            .map(|frequency| ConverterState { frequency, ..state })
            .map_err(|e| parse_err(Field::Frequency, e)),

        PitchInputEvent::SetTone(Value::Text(text)) => grammar::parse_note(&text)
            .map(|spec| ConverterState {
                frequency: tuning::note_to_frequency(&spec, state.tuning_reference),
                ..state
            })
            .map_err(|e| parse_err(Field::Tone, e)),
        PitchInputEvent::SetTone(Value::Number(_)) => {
            Err(ConverterError::InvalidType { field: Field::Tone })
        }

        PitchInputEvent::SetTuningReference(Value::Number(frequency)) => {
            checked_tuning(state, frequency)
        }
        PitchInputEvent::SetTuningReference(Value::Text(text)) => {
            match grammar::parse_tuning_literal(&text) {
                Ok(frequency) => checked_tuning(state, frequency),
                Err(e) => Err(parse_err(Field::TuningReference, e)),
            }
        }

        PitchInputEvent::SetAmplitude(Value::Number(amplitude)) => {
            checked_amplitude(state, amplitude)
        }
        PitchInputEvent::SetAmplitude(Value::Text(text)) => {
            match grammar::parse_amplitude_percent(&text) {
                Ok(amplitude) => checked_amplitude(state, amplitude),
                Err(e) => Err(parse_err(Field::Amplitude, e)),
            }
        }

        PitchInputEvent::Set(Value::Text(text)) => match grammar::parse_input(&text) {
            Ok(ParsedInput::Tone(spec)) => Ok(ConverterState {
                frequency: tuning::note_to_frequency(&spec, state.tuning_reference),
                ..state
            }),
            Ok(ParsedInput::Hertz(frequency)) => Ok(ConverterState { frequency, ..state }),
            Ok(ParsedInput::TuningReference(frequency)) => checked_tuning(state, frequency),
            Ok(ParsedInput::Amplitude(amplitude)) => checked_amplitude(state, amplitude),
            Err(e) => Err(parse_err(Field::Input, e)),
        },
        PitchInputEvent::Set(Value::Number(_)) => Err(ConverterError::InvalidType {
            field: Field::Input,
        }),
    }
}

impl ConverterError {
    /// The documented fallback state after a failed transition: parse
    /// failures reset the targeted field to its default (frequency 0,
    /// tuning reference 440 Hz, amplitude 0.5), range violations apply the
    /// clamped value, and type mismatches leave the state untouched.
    pub fn recover(&self, state: ConverterState) -> ConverterState {
        match self {
            ConverterError::Parse { field, .. } => match field {
                Field::Frequency | Field::Tone | Field::Input => ConverterState {
                    frequency: 0.0,
                    ..state
                },
                Field::TuningReference => ConverterState {
                    tuning_reference: CONCERT_A4,
                    ..state
                },
                Field::Amplitude => ConverterState {
                    amplitude: 0.5,
                    ..state
                },
            },
            ConverterError::NonPositiveFrequency { .. } => ConverterState {
                frequency: 0.0,
                ..state
            },
            ConverterError::TuningOutOfBand { clamped, .. } => ConverterState {
                tuning_reference: *clamped,
                ..state
            },
            ConverterError::AmplitudeOutOfRange { clamped, .. } => ConverterState {
                amplitude: *clamped,
                ..state
            },
            ConverterError::InvalidType { .. } => state,
        }
    }
}

/// Stateful front door over [`configure`]: applies events, installs the
/// fallback state on failure and collects the rendered error messages in a
/// drainable diagnostics log.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    state: ConverterState,
    errors: Vec<String>,
}

impl Converter {
    pub fn new() -> Self {
        Converter::default()
    }

    /// A converter anchored on the given tuning reference; out-of-band
    /// values are clamped and logged like any other range violation.
    pub fn with_tuning_reference(frequency: f32) -> Self {
        let mut converter = Converter::new();
        converter.set_tuning_reference(frequency);
        converter
    }

    pub fn apply(&mut self, event: PitchInputEvent) {
        match configure(self.state, event) {
            Ok(next) => self.state = next,
            Err(error) => {
                self.state = error.recover(self.state);
                self.errors.push(error.to_string());
            }
        }
    }

    /// Auto-detects the literal kind and updates the corresponding field.
    pub fn set(&mut self, input: impl Into<Value>) {
        self.apply(PitchInputEvent::Set(input.into()));
    }

    pub fn set_frequency(&mut self, input: impl Into<Value>) {
        self.apply(PitchInputEvent::SetFrequency(input.into()));
    }

    pub fn set_tone(&mut self, input: impl Into<Value>) {
        self.apply(PitchInputEvent::SetTone(input.into()));
    }

    pub fn set_tuning_reference(&mut self, input: impl Into<Value>) {
        self.apply(PitchInputEvent::SetTuningReference(input.into()));
    }

    pub fn set_amplitude(&mut self, input: impl Into<Value>) {
        self.apply(PitchInputEvent::SetAmplitude(input.into()));
    }

    pub fn state(&self) -> ConverterState {
        self.state
    }

    pub fn frequency(&self) -> f32 {
        self.state.frequency
    }

    pub fn tuning_reference(&self) -> f32 {
        self.state.tuning_reference
    }

    pub fn amplitude(&self) -> f32 {
        self.state.amplitude
    }

    /// The current frequency as a pitch value under the current tuning.
    pub fn pitch(&self) -> Pitch {
        Pitch::new(self.state.frequency, self.state.tuning_reference)
    }

    /// The current frequency rendered as a note name, or `off`.
    pub fn tone(&self) -> String {
        self.pitch().to_string()
    }

    /// Drains the diagnostics log: returns all accumulated error messages
    /// and leaves the log empty.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_concert_pitch() {
        let converter = Converter::new();
        assert_eq!(converter.frequency(), 440.0);
        assert_eq!(converter.tuning_reference(), 440.0);
        assert_eq!(converter.amplitude(), 0.5);
        assert_eq!(converter.tone(), "A4");
    }

    #[test]
    fn set_dispatches_by_literal_kind() {
        let mut converter = Converter::new();

        converter.set("C#3");
        assert!((converter.frequency() - 138.591).abs() < 0.01);

        converter.set("441,5Hz");
        assert_eq!(converter.frequency(), 441.5);

        converter.set("75%");
        assert_eq!(converter.amplitude(), 0.75);

        converter.set("b432Hz");
        assert_eq!(converter.tuning_reference(), 432.0);

        assert!(converter.take_errors().is_empty());
    }

    #[test]
    fn tone_follows_the_tuning_reference() {
        let mut converter = Converter::new();
        converter.set("b432Hz");
        converter.set_tone("A4");
        assert_eq!(converter.frequency(), 432.0);
        assert_eq!(converter.tone(), "A4");
    }

    #[test]
    fn non_positive_numeric_frequency_resets_to_off() {
        let mut converter = Converter::new();
        converter.set_frequency(-5.0);
        assert_eq!(converter.frequency(), 0.0);
        assert_eq!(converter.tone(), "off");
        let errors = converter.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must be >0"));
    }

    #[test]
    fn numeric_tuning_is_clamped_and_logged() {
        let mut converter = Converter::new();

        converter.set_tuning_reference(300.0);
        assert!((converter.tuning_reference() - TUNING_MIN).abs() < 1e-3);
        assert_eq!(converter.take_errors().len(), 1);

        converter.set_tuning_reference(600.0);
        assert!((converter.tuning_reference() - TUNING_MAX).abs() < 1e-3);

        converter.set_tuning_reference(440.0);
        assert_eq!(converter.tuning_reference(), 440.0);
        let errors = converter.take_errors();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn amplitude_is_clamped_on_assignment() {
        let mut converter = Converter::new();
        converter.set_amplitude("150%");
        assert_eq!(converter.amplitude(), 1.0);
        assert_eq!(converter.take_errors().len(), 1);

        converter.set_amplitude(-0.25);
        assert_eq!(converter.amplitude(), 0.0);
    }

    #[test]
    fn parse_failure_resets_frequency_and_reports_column() {
        let mut converter = Converter::new();
        converter.set("notatone");
        assert_eq!(converter.frequency(), 0.0);
        let errors = converter.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("notatone"));
        assert!(errors[0].contains("col"));
    }

    #[test]
    fn failed_tuning_literal_falls_back_to_concert_pitch() {
        let mut converter = Converter::with_tuning_reference(432.0);
        assert!(converter.take_errors().is_empty());
        converter.set_tuning_reference("b43xHz");
        assert_eq!(converter.tuning_reference(), CONCERT_A4);
        assert_eq!(converter.take_errors().len(), 1);
    }

    #[test]
    fn type_mismatch_leaves_state_untouched() {
        let mut converter = Converter::new();
        converter.set_tone(123.0);
        assert_eq!(converter.frequency(), 440.0);
        let errors = converter.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("invalid input type"));
    }

    #[test]
    fn diagnostics_log_reads_and_clears() {
        let mut converter = Converter::new();
        converter.set("gibberish");
        converter.set("also wrong");
        let errors = converter.take_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("gibberish"));
        assert!(errors[1].contains("also wrong"));
        assert!(converter.take_errors().is_empty());
    }

    #[test]
    fn predicates_hold_at_their_boundaries() {
        assert!(!frequency_is_positive(0.0));
        assert!(frequency_is_positive(f32::MIN_POSITIVE));
        assert!(tuning_in_band(TUNING_MIN));
        assert!(tuning_in_band(TUNING_MAX));
        assert!(!tuning_in_band(300.0));
        assert!(amplitude_in_range(0.0));
        assert!(amplitude_in_range(1.0));
        assert!(!amplitude_in_range(1.001));
    }
}
