//! # Fast Fourier Transform (FFT) Module
//!
//! One-sided discrete Fourier transforms of real-valued sample blocks.
//! Two paths are exposed:
//!
//! - [`real_fft`] returns the raw complex half-spectrum. The dominant-
//!   frequency estimator needs the unmodified phase of the block, so this
//!   path applies no windowing or DC removal.
//! - [`magnitude_spectrum`] returns a normalized magnitude spectrum with DC
//!   removal and a Hann window applied, suited for peak detection and
//!   display where spectral leakage matters more than phase.

use rustfft::{num_complex::Complex, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the buffer to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Performs a forward FFT on a real signal and returns the one-sided
/// complex spectrum (bins 0 through N/2 inclusive).
///
/// The signal is transformed as-is: no windowing, no DC removal. Any block
/// length is accepted; an empty block yields an empty spectrum.
///
/// # Arguments
/// * `signal` - Input sample block
///
/// # Returns
/// * `Vec<Complex<f32>>` - Complex half-spectrum with N/2 + 1 bins
pub fn real_fft(signal: &[f32]) -> Vec<Complex<f32>> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();

    fft.process(&mut buffer);
    buffer.truncate(n / 2 + 1);
    buffer
}

/// Computes a normalized one-sided magnitude spectrum for peak detection
/// and display.
///
/// The signal is copied, DC-removed and Hann-windowed before the transform;
/// magnitudes are divided by the block length so peak heights are
/// comparable across block sizes.
///
/// # Arguments
/// * `signal` - Input sample block
///
/// # Returns
/// * `Vec<f32>` - Magnitude per bin, N/2 + 1 bins
pub fn magnitude_spectrum(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mut processed = signal.to_vec();
    remove_dc_offset(&mut processed);
    apply_hann_window(&mut processed);

    let n = processed.len() as f32;
    real_fft(&processed)
        .iter()
        .map(|c| c.norm() / n) // .norm() is sqrt(re^2 + im^2)
        .collect()
}

/// Nominal center frequency of a spectrum bin.
pub fn bin_frequency(bin: usize, block_len: usize, sample_rate: f32) -> f32 {
    bin as f32 * sample_rate / block_len as f32
}
