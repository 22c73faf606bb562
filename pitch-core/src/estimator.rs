//! # Dominant-Frequency Estimator
//!
//! Estimates the dominant frequency of one real-valued sample block. Two
//! independent methods are provided:
//!
//! - **Spectral**: the magnitude-maximum FFT bin gives a coarse estimate
//!   which is refined using the phase of that bin. The phase of a single
//!   DFT bin carries sub-bin frequency information that magnitude alone
//!   cannot resolve, so the refinement meaningfully improves accuracy
//!   without a larger transform.
//! - **Periodicity**: the most topographically prominent autocorrelation
//!   peak gives the fundamental period. Ranking by prominence instead of
//!   taking the first peak skips spurious sub-harmonics near lag zero.
//!
//! Both methods are pure functions of one block and one sample rate; an
//! unreliable result (near-silent block, no autocorrelation peaks) is
//! reported as `None` rather than a misleading frequency.

use crate::fft;
use crate::peaks;
use std::f32::consts::{FRAC_PI_2, PI};

/// Estimates the dominant frequency of a block from its spectrum.
///
/// The coarse estimate is the nominal frequency of the strongest bin of
/// the one-sided transform; the phase of that bin then contributes a
/// sub-bin adjustment of `((pi/2 + angle) / pi) / N * sample_rate`. The
/// adjustment is deliberately left unclamped; the amplitude gate below is
/// what protects callers from low-SNR nonsense.
///
/// # Arguments
/// * `samples` - Input sample block
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude_threshold` - Minimum RMS amplitude; quieter blocks are
///   reported as unreliable
///
/// # Returns
/// * `Some(frequency)` - Best-estimate dominant frequency in Hz
/// * `None` - Block too quiet or too short for a meaningful estimate
pub fn estimate_dominant_spectral(
    samples: &[f32],
    sample_rate: f32,
    amplitude_threshold: f32,
) -> Option<f32> {
    if samples.len() < 2 || sample_rate <= 0.0 {
        return None;
    }

    // Noise gate: a near-silent block has an arbitrary peak bin.
    let rms = (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    if rms < amplitude_threshold {
        return None;
    }

    let spectrum = fft::real_fft(samples);
    let (peak_bin, peak) = spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| {
            a.1.norm_sqr()
                .partial_cmp(&b.1.norm_sqr())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

    let n = samples.len() as f32;
    let coarse = fft::bin_frequency(peak_bin, samples.len(), sample_rate);
    let adjustment = ((FRAC_PI_2 + peak.arg()) / PI) / n * sample_rate;

    Some(coarse + adjustment)
}

/// Linear-interpolation upsampling to `factor` times the original rate.
fn upsample_linear(samples: &[f32], factor: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity((samples.len() - 1) * factor + 1);
    for window in samples.windows(2) {
        let (a, b) = (window[0], window[1]);
        for k in 0..factor {
            out.push(a + (b - a) * k as f32 / factor as f32);
        }
    }
    if let Some(&last) = samples.last() {
        out.push(last);
    }
    out
}

/// Autocorrelation of the block with itself over all non-negative lags.
/// Lag 0 holds the signal energy; periodic content shows up as local
/// maxima at multiples of the fundamental period.
pub fn autocorrelate(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    (0..n)
        .map(|lag| {
            samples[..n - lag]
                .iter()
                .zip(&samples[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Estimates the dominant frequency of a block from its periodicity.
///
/// The non-negative-lag half of the autocorrelation is searched for local
/// maxima; the peak with the greatest topographic prominence is taken as
/// the fundamental period and converted as `sample_rate / lag`.
///
/// # Arguments
/// * `samples` - Input sample block
/// * `sample_rate` - Sample rate in Hz
/// * `upsample` - Resampling factor applied before autocorrelation; raises
///   the virtual rate for finer lag resolution at quadratic compute cost.
///   Values below 2 leave the block untouched.
///
/// # Returns
/// * `Some(frequency)` - Fundamental-period frequency estimate in Hz
/// * `None` - No autocorrelation peak found (silence, DC, too short)
pub fn estimate_dominant_periodicity(
    samples: &[f32],
    sample_rate: f32,
    upsample: usize,
) -> Option<f32> {
    if samples.len() < 3 || sample_rate <= 0.0 {
        return None;
    }

    let factor = upsample.max(1);
    let upsampled;
    let (signal, rate) = if factor > 1 {
        upsampled = upsample_linear(samples, factor);
        (upsampled.as_slice(), sample_rate * factor as f32)
    } else {
        (samples, sample_rate)
    };

    let correlation = autocorrelate(signal);
    let lag = peaks::most_prominent_peak(&correlation)?;

    Some(rate / lag as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn spectral_recovers_exact_bin_sine() {
        // 100 cycles fit the block exactly, so the phase adjustment is ~0.
        let signal = sine(100.0, 1000.0, 1000);
        let estimate = estimate_dominant_spectral(&signal, 1000.0, 0.01).unwrap();
        assert!((estimate - 100.0).abs() < 0.5, "estimate {estimate}");
    }

    #[test]
    fn spectral_phase_refinement_resolves_sub_bin_offset() {
        // 90.010019 Hz against 0.25 Hz bins: the coarse estimate snaps to
        // 90.0 exactly, so only the phase adjustment can close the gap.
        let signal = sine(90.010019, 1000.0, 4000);
        let estimate = estimate_dominant_spectral(&signal, 1000.0, 0.01).unwrap();
        assert!((estimate - 90.010019).abs() < 0.005, "estimate {estimate}");
    }

    #[test]
    fn spectral_rejects_silence() {
        assert_eq!(estimate_dominant_spectral(&vec![0.0; 1024], 1000.0, 0.01), None);
        let quiet = sine(100.0, 1000.0, 1024)
            .into_iter()
            .map(|s| s * 1e-4)
            .collect::<Vec<_>>();
        assert_eq!(estimate_dominant_spectral(&quiet, 1000.0, 0.01), None);
    }

    #[test]
    fn periodicity_recovers_integer_period_sine() {
        let signal = sine(100.0, 1000.0, 1000);
        let estimate = estimate_dominant_periodicity(&signal, 1000.0, 1).unwrap();
        assert!((estimate - 100.0).abs() < 0.5, "estimate {estimate}");
    }

    #[test]
    fn periodicity_handles_silence_and_dc_without_peaks() {
        assert_eq!(estimate_dominant_periodicity(&vec![0.0; 512], 1000.0, 1), None);
        assert_eq!(estimate_dominant_periodicity(&vec![0.7; 512], 1000.0, 1), None);
        assert_eq!(estimate_dominant_periodicity(&[], 1000.0, 1), None);
    }

    #[test]
    fn upsampling_improves_fractional_period_estimate() {
        // 97 Hz at 1 kHz has a period of ~10.31 samples; integer lags alone
        // snap to 10 (100 Hz), while 4x upsampling resolves ~97.6 Hz.
        let signal = sine(97.0, 1000.0, 1000);
        let plain = estimate_dominant_periodicity(&signal, 1000.0, 1).unwrap();
        let refined = estimate_dominant_periodicity(&signal, 1000.0, 4).unwrap();
        assert!((refined - 97.0).abs() < (plain - 97.0).abs());
        assert!((refined - 97.0).abs() < 1.0, "refined {refined}");
    }
}
