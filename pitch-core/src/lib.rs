// pitch-core/src/lib.rs

//! The core logic for the tone/frequency converter and tuner.
//! This crate parses the pitch input grammar, converts between frequency
//! and equal-tempered note names, estimates the dominant frequency of raw
//! sample blocks and stabilizes detected spectrum peaks over time. It is
//! completely headless and contains no audio-device or GUI code.

pub mod converter;
pub mod estimator;
pub mod fft;
pub mod grammar;
pub mod peaks;
pub mod stream;
pub mod tracker;
pub mod tuning;

/// Represents the result of a single block analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The best-estimate dominant frequency in Hz.
    pub detected_frequency: Option<f32>,
    /// The nearest note name with cent deviation, when a frequency was found.
    pub tone: Option<String>,
}

/// Runs the full analysis pipeline on one sample block: dominant-frequency
/// estimation (spectral first, periodicity as fallback), then conversion
/// to a note name under the given tuning reference.
///
/// # Arguments
/// * `samples` - Raw sample block
/// * `sample_rate` - Sample rate in Hz
/// * `tuning_reference` - Frequency assigned to A4
/// * `amplitude_threshold` - Minimum RMS amplitude for a reliable estimate
pub fn analyze_block(
    samples: &[f32],
    sample_rate: f32,
    tuning_reference: f32,
    amplitude_threshold: f32,
) -> AnalysisResult {
    let detected_frequency =
        estimator::estimate_dominant_spectral(samples, sample_rate, amplitude_threshold)
            .or_else(|| estimator::estimate_dominant_periodicity(samples, sample_rate, 1));

    let tone = detected_frequency.map(|freq| tuning::frequency_to_tone(freq, tuning_reference));

    AnalysisResult {
        detected_frequency,
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzes_a_concert_pitch_block() {
        // 44 full cycles of A4 in one block at 44.1 kHz.
        let samples: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let result = analyze_block(&samples, 44100.0, 440.0, 0.01);
        let freq = result.detected_frequency.unwrap();
        assert!((freq - 440.0).abs() < 1.0, "estimate {freq}");
        assert!(result.tone.unwrap().starts_with("A4"));
    }

    #[test]
    fn silent_block_suppresses_display() {
        let result = analyze_block(&vec![0.0; 2048], 44100.0, 440.0, 0.01);
        assert!(result.detected_frequency.is_none());
        assert!(result.tone.is_none());
    }
}
