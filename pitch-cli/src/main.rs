//! Interactive front end for the tone/frequency converter.
//!
//! Without arguments this runs the converter prompt loop: every line is
//! fed through the combined literal parser and the resulting state is
//! printed back. `measure [Hz]` instead synthesizes a pure sine and runs
//! the offline analysis pipeline over it: both dominant-frequency
//! estimators plus frame-by-frame peak tracking.

use anyhow::{bail, Context, Result};
use pitch_core::converter::Converter;
use pitch_core::tracker::{PeakTracker, TrackerConfig};
use pitch_core::{estimator, fft, peaks, tuning};
use std::io::{self, Write};

// Simulated measurement parameters
const MEASURE_SAMPLE_RATE: f32 = 1000.0; // samples per second
const MEASURE_SECONDS: f32 = 4.0; // signal length
const MEASURE_DEFAULT_FREQUENCY: f32 = 90.010019; // Hz
const AMPLITUDE_THRESHOLD: f32 = 0.01; // minimum RMS for a reliable estimate
const PEAK_THRESHOLD: f32 = 0.02; // minimum spectrum magnitude for a peak

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => repl(),
        Some("measure") => {
            let frequency = match args.get(1) {
                Some(text) => text
                    .parse::<f32>()
                    .with_context(|| format!("invalid frequency: {text}"))?,
                None => MEASURE_DEFAULT_FREQUENCY,
            };
            measure(frequency)
        }
        Some(other) => bail!("unknown command: {other} (expected no arguments or `measure [Hz]`)"),
    }
}

/// The converter prompt loop. Reads one literal per line and echoes the
/// full converter state, plus any diagnostics drained from the log.
fn repl() -> Result<()> {
    println!("tone/frequency converter");
    println!("enter a note (A4, C#3, Bb2+12,5), a frequency (440Hz), an amplitude (50%),");
    println!("or a tuning reference (b432Hz); 'quit' exits");

    let mut converter = Converter::new();
    let mut input = String::new();
    loop {
        print!(">> ");
        io::stdout().flush()?;
        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break; // EOF behaves like quit
        }
        let line = input.trim();
        if line == "quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        converter.set(line);
        println!("frequency: {:5.3} Hz", converter.frequency());
        println!("tone: {}", converter.tone());
        println!("base: {:5.3} Hz", converter.tuning_reference());
        println!("amp: {:3.0}%", converter.amplitude() * 100.0);
        let errors = converter.take_errors();
        if !errors.is_empty() {
            println!("errors: {}", errors.join("; "));
        }
    }
    println!("terminated.");
    Ok(())
}

/// Synthesizes a sine at the requested frequency and runs the analysis
/// pipeline over it, printing what a live display would show.
fn measure(frequency: f32) -> Result<()> {
    let nyquist = MEASURE_SAMPLE_RATE / 2.0;
    if frequency <= 0.0 || frequency >= nyquist {
        bail!("frequency must lie in (0, {nyquist}) Hz");
    }

    let len = (MEASURE_SAMPLE_RATE * MEASURE_SECONDS) as usize;
    let signal: Vec<f32> = (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / MEASURE_SAMPLE_RATE).sin())
        .collect();
    println!(
        "simulated signal: {frequency} Hz, {MEASURE_SECONDS} s at {MEASURE_SAMPLE_RATE} Hz"
    );

    match estimator::estimate_dominant_spectral(&signal, MEASURE_SAMPLE_RATE, AMPLITUDE_THRESHOLD) {
        Some(freq) => println!(
            "spectral:    {freq:9.5} Hz  ({})",
            tuning::frequency_to_tone(freq, tuning::CONCERT_A4)
        ),
        None => println!("spectral:    unreliable"),
    }

    // One second of signal is plenty at this lag resolution, and keeps the
    // upsampled autocorrelation cheap.
    let block = &signal[..MEASURE_SAMPLE_RATE as usize];
    match estimator::estimate_dominant_periodicity(block, MEASURE_SAMPLE_RATE, 4) {
        Some(freq) => println!(
            "periodicity: {freq:9.5} Hz  ({})",
            tuning::frequency_to_tone(freq, tuning::CONCERT_A4)
        ),
        None => println!("periodicity: no fundamental found"),
    }

    // Frame-by-frame peak tracking over the same signal, the way a live
    // analysis tick would see it.
    let mut tracker = PeakTracker::new(TrackerConfig::default());
    let window = 1000;
    let hop = 250;
    let mut start = 0;
    let mut ticks = 0;
    while start + window <= signal.len() {
        let magnitudes = fft::magnitude_spectrum(&signal[start..start + window]);
        let detections =
            peaks::detect_spectrum_peaks(&magnitudes, MEASURE_SAMPLE_RATE, PEAK_THRESHOLD);
        tracker.update(&detections);
        start += hop;
        ticks += 1;
    }
    println!("tracked peaks after {ticks} ticks:");
    for peak in tracker.active_peaks() {
        println!(
            "  {:7.2} Hz  mag {:5.3}  ({})",
            peak.smoothed_frequency,
            peak.smoothed_magnitude,
            tuning::frequency_to_tone(peak.smoothed_frequency, tuning::CONCERT_A4)
        );
    }

    Ok(())
}
