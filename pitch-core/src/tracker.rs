//! # Peak Tracking Module
//!
//! Stabilizes noisy frame-by-frame peak detections into a smooth displayed
//! value. Raw peak detection on real spectra flickers between adjacent
//! frames; the tracker requires sustained presence before a peak is
//! trusted and sustained absence before it is dropped, with two distinct
//! thresholds so a peak near a single threshold cannot chatter on and off.
//! Trusted peaks are exponentially smoothed for display.

use crate::peaks::DetectedPeak;
use serde::{Deserialize, Serialize};

/// Thresholds and smoothing for the tracker. The same configuration drives
/// both the spectral-peak and the autocorrelation-peak front ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum index distance between a tracked peak and a detection for
    /// the two to be considered the same peak.
    pub match_tolerance: usize,
    /// Weight at which a tracked peak switches on; also the weight ceiling.
    pub activate_threshold: i32,
    /// Weight below which a tracked peak switches off. Must stay below the
    /// activate threshold to leave a hysteresis band.
    pub sleep_threshold: i32,
    /// Exponential smoothing factor applied to displayed values per tick.
    pub smoothing: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            match_tolerance: 2,
            activate_threshold: 5,
            sleep_threshold: 3,
            smoothing: 0.08,
        }
    }
}

/// One peak under observation across analysis ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPeak {
    /// Most recent matched bin or lag index.
    pub position: usize,
    /// Presence counter; rises when re-detected, falls when missed.
    pub weight: i32,
    /// Whether the peak is currently trusted for display.
    pub active: bool,
    /// Exponentially smoothed frequency in Hz.
    pub smoothed_frequency: f32,
    /// Exponentially smoothed magnitude.
    pub smoothed_magnitude: f32,
}

/// Tracks detected peaks across analysis ticks.
#[derive(Debug, Clone)]
pub struct PeakTracker {
    config: TrackerConfig,
    peaks: Vec<TrackedPeak>,
}

impl PeakTracker {
    pub fn new(config: TrackerConfig) -> Self {
        PeakTracker {
            config,
            peaks: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// All tracked peaks in insertion order.
    pub fn peaks(&self) -> &[TrackedPeak] {
        &self.peaks
    }

    /// The display-eligible peaks, in tracking order.
    pub fn active_peaks(&self) -> impl Iterator<Item = &TrackedPeak> {
        self.peaks.iter().filter(|p| p.active)
    }

    /// Advances the tracker by one analysis tick.
    ///
    /// Each tracked peak claims at most one detection within the match
    /// tolerance, in tracking order (first match wins). Matched peaks gain
    /// weight up to the activate ceiling, missed peaks lose weight, and the
    /// two thresholds gate the `active` flag with a hysteresis band in
    /// between. Leftover detections start new tracked entries at weight 2;
    /// entries at weight zero or below are dropped. Active peaks smooth
    /// their displayed frequency and magnitude toward this tick's matched
    /// detection; an active peak without a match this tick holds its
    /// previous smoothed values.
    pub fn update(&mut self, detections: &[DetectedPeak]) {
        let mut pending: Vec<DetectedPeak> = detections.to_vec();
        let mut matched: Vec<Option<DetectedPeak>> = vec![None; self.peaks.len()];

        for (slot, tracked) in matched.iter_mut().zip(self.peaks.iter_mut()) {
            let hit = pending
                .iter()
                .position(|d| tracked.position.abs_diff(d.index) <= self.config.match_tolerance);
            match hit {
                Some(i) => {
                    let detection = pending.remove(i);
                    tracked.position = detection.index;
                    if tracked.weight < self.config.activate_threshold {
                        tracked.weight += 1;
                    }
                    *slot = Some(detection);
                }
                None => tracked.weight -= 1,
            }
        }

        for tracked in &mut self.peaks {
            if tracked.weight >= self.config.activate_threshold {
                tracked.active = true;
            }
            if tracked.weight < self.config.sleep_threshold {
                tracked.active = false;
            }
        }

        // Smoothing only applies to peaks that were both trusted and seen
        // this tick; new entries below and unmatched actives hold steady.
        for (tracked, m) in self.peaks.iter_mut().zip(&matched) {
            if tracked.active {
                if let Some(detection) = m {
                    tracked.smoothed_frequency +=
                        (detection.frequency - tracked.smoothed_frequency) * self.config.smoothing;
                    tracked.smoothed_magnitude +=
                        (detection.magnitude - tracked.smoothed_magnitude) * self.config.smoothing;
                }
            }
        }

        for detection in pending {
            self.peaks.push(TrackedPeak {
                position: detection.index,
                weight: 2,
                active: false,
                smoothed_frequency: detection.frequency,
                smoothed_magnitude: detection.magnitude,
            });
        }

        self.peaks.retain(|p| p.weight > 0);
    }
}

impl Default for PeakTracker {
    fn default() -> Self {
        PeakTracker::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(index: usize) -> DetectedPeak {
        DetectedPeak {
            index,
            frequency: index as f32 * 10.0,
            magnitude: 1.0,
        }
    }

    #[test]
    fn sustained_detection_activates_peak() {
        let mut tracker = PeakTracker::default();
        tracker.update(&[detection(40)]);
        assert_eq!(tracker.peaks().len(), 1);
        assert_eq!(tracker.peaks()[0].weight, 2);
        assert!(!tracker.peaks()[0].active);

        // Three more matches lift the weight from 2 to the ceiling of 5.
        for _ in 0..3 {
            tracker.update(&[detection(40)]);
        }
        assert_eq!(tracker.peaks()[0].weight, 5);
        assert!(tracker.peaks()[0].active);
        assert_eq!(tracker.active_peaks().count(), 1);
    }

    #[test]
    fn match_tolerance_follows_drifting_position() {
        let mut tracker = PeakTracker::default();
        tracker.update(&[detection(40)]);
        tracker.update(&[detection(42)]);
        assert_eq!(tracker.peaks().len(), 1);
        assert_eq!(tracker.peaks()[0].position, 42);

        // Outside the tolerance the detection founds a second entry.
        tracker.update(&[detection(45)]);
        assert_eq!(tracker.peaks().len(), 2);
    }

    #[test]
    fn absent_peak_degrades_and_disappears() {
        let mut tracker = PeakTracker::default();
        for _ in 0..4 {
            tracker.update(&[detection(40)]);
        }
        assert!(tracker.peaks()[0].active);

        // Five empty ticks drain the weight from 5 to 0.
        for _ in 0..4 {
            tracker.update(&[]);
            assert_eq!(tracker.peaks().len(), 1);
        }
        assert!(!tracker.peaks()[0].active);
        tracker.update(&[]);
        assert!(tracker.peaks().is_empty());
    }

    #[test]
    fn hysteresis_band_holds_state_through_single_tick_noise() {
        let mut tracker = PeakTracker::default();
        for _ in 0..4 {
            tracker.update(&[detection(40)]);
        }
        assert!(tracker.peaks()[0].active);

        // Alternating miss/hit keeps the weight at 4-5, inside or above the
        // band; the peak must stay active throughout.
        for _ in 0..6 {
            tracker.update(&[]);
            assert!(tracker.peaks()[0].active, "flickered off in the band");
            tracker.update(&[detection(40)]);
            assert!(tracker.peaks()[0].active);
        }

        // Two consecutive misses reach weight 3: still active (not below
        // the sleep threshold), one more drops it to 2 and switches it off.
        tracker.update(&[]);
        tracker.update(&[]);
        assert_eq!(tracker.peaks()[0].weight, 3);
        assert!(tracker.peaks()[0].active);
        tracker.update(&[]);
        assert!(!tracker.peaks()[0].active);
    }

    #[test]
    fn detection_satisfies_at_most_one_tracked_peak() {
        let mut tracker = PeakTracker::default();
        tracker.update(&[detection(10), detection(12)]);
        assert_eq!(tracker.peaks().len(), 2);

        // One detection between the two: the earlier-tracked peak claims it,
        // the other degrades.
        tracker.update(&[detection(11)]);
        assert_eq!(tracker.peaks()[0].position, 11);
        assert_eq!(tracker.peaks()[0].weight, 3);
        assert_eq!(tracker.peaks()[1].position, 12);
        assert_eq!(tracker.peaks()[1].weight, 1);
    }

    #[test]
    fn active_peak_smooths_toward_instantaneous_values() {
        let config = TrackerConfig {
            smoothing: 0.5,
            ..TrackerConfig::default()
        };
        let mut tracker = PeakTracker::new(config);
        let seed = DetectedPeak {
            index: 40,
            frequency: 400.0,
            magnitude: 1.0,
        };
        for _ in 0..4 {
            tracker.update(&[seed]);
        }
        assert!(tracker.peaks()[0].active);
        assert_eq!(tracker.peaks()[0].smoothed_frequency, 400.0);

        let moved = DetectedPeak {
            index: 41,
            frequency: 410.0,
            magnitude: 2.0,
        };
        tracker.update(&[moved]);
        let peak = tracker.peaks()[0];
        assert!((peak.smoothed_frequency - 405.0).abs() < 1e-3);
        assert!((peak.smoothed_magnitude - 1.5).abs() < 1e-3);

        // An unmatched tick must hold the smoothed values steady.
        tracker.update(&[]);
        let held = tracker.peaks()[0];
        assert_eq!(held.smoothed_frequency, peak.smoothed_frequency);
        assert_eq!(held.smoothed_magnitude, peak.smoothed_magnitude);
    }
}
