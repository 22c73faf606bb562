//! # Peak Detection Module
//!
//! Local-maxima detection and topographic prominence ranking over
//! magnitude spectra and autocorrelation sequences. The prominence of a
//! peak is its height above the lowest point separating it from any higher
//! neighboring sample, which ranks a true fundamental above spurious
//! sub-harmonics close to lag zero.

use crate::fft;

/// A peak detected in one analysis frame, in spectrum-bin or lag units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPeak {
    /// Bin or lag index within the analyzed sequence.
    pub index: usize,
    /// Instantaneous frequency at the peak in Hz.
    pub frequency: f32,
    /// Instantaneous magnitude at the peak.
    pub magnitude: f32,
}

/// Returns the indices of all strict interior local maxima.
pub fn local_maxima(values: &[f32]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1])
        .collect()
}

/// Computes the topographic prominence of each listed peak.
///
/// For a peak of height `h`, each side is walked outward until a sample
/// higher than `h` is found (or the sequence ends); the prominence is `h`
/// minus the higher of the two interval minima.
///
/// # Arguments
/// * `values` - The sequence the peaks were detected in
/// * `peaks` - Peak indices, as returned by [`local_maxima`]
///
/// # Returns
/// * `Vec<f32>` - Prominence per peak, in the same order
pub fn peak_prominences(values: &[f32], peaks: &[usize]) -> Vec<f32> {
    peaks
        .iter()
        .map(|&peak| {
            let height = values[peak];

            let mut left_min = height;
            let mut i = peak;
            while i > 0 {
                i -= 1;
                if values[i] > height {
                    break;
                }
                left_min = left_min.min(values[i]);
            }

            let mut right_min = height;
            let mut i = peak;
            while i + 1 < values.len() {
                i += 1;
                if values[i] > height {
                    break;
                }
                right_min = right_min.min(values[i]);
            }

            height - left_min.max(right_min)
        })
        .collect()
}

/// Finds the local maximum with the greatest topographic prominence.
pub fn most_prominent_peak(values: &[f32]) -> Option<usize> {
    let peaks = local_maxima(values);
    let prominences = peak_prominences(values, &peaks);
    peaks
        .into_iter()
        .zip(prominences)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(peak, _)| peak)
}

/// Detects peaks in a one-sided magnitude spectrum and annotates each with
/// its bin frequency and magnitude, ready for the peak tracker.
///
/// # Arguments
/// * `magnitudes` - One-sided magnitude spectrum (N/2 + 1 bins)
/// * `sample_rate` - Sample rate of the originating block in Hz
/// * `threshold` - Minimum magnitude for a maximum to count as a peak
pub fn detect_spectrum_peaks(
    magnitudes: &[f32],
    sample_rate: f32,
    threshold: f32,
) -> Vec<DetectedPeak> {
    if magnitudes.len() < 2 {
        return Vec::new();
    }
    let block_len = (magnitudes.len() - 1) * 2;
    local_maxima(magnitudes)
        .into_iter()
        .filter(|&i| magnitudes[i] > threshold)
        .map(|i| DetectedPeak {
            index: i,
            frequency: fft::bin_frequency(i, block_len, sample_rate),
            magnitude: magnitudes[i],
        })
        .collect()
}

/// Detects peaks in a non-negative-lag autocorrelation sequence, ranked
/// by prominence, each annotated with its period frequency
/// `sample_rate / lag`. This is the periodicity-side twin of
/// [`detect_spectrum_peaks`]; both feed the same tracker.
///
/// # Arguments
/// * `correlation` - Autocorrelation values for lags 0 and up
/// * `sample_rate` - Sample rate of the originating block in Hz
/// * `min_prominence` - Minimum topographic prominence for a peak to count
pub fn detect_correlation_peaks(
    correlation: &[f32],
    sample_rate: f32,
    min_prominence: f32,
) -> Vec<DetectedPeak> {
    let maxima = local_maxima(correlation);
    let prominences = peak_prominences(correlation, &maxima);
    maxima
        .into_iter()
        .zip(prominences)
        .filter(|&(_, prominence)| prominence >= min_prominence)
        .map(|(lag, _)| DetectedPeak {
            index: lag,
            frequency: sample_rate / lag as f32,
            magnitude: correlation[lag],
        })
        .collect()
}
