//! Tempo estimation from the intervals between peaks in the time domain.

use super::lowpass_filter::LowpassFilter;
use super::peak_iterator::{PeakIterator, RefractoryPeaks};
use super::{detrended_magnitudes, mean_sample_rate_hz, stats};
use super::{AnalyzerKind, Periodicity, PeriodicityAnalyzer};
use crate::config::BpmRange;
use crate::motion_preprocessing::sample_history::MotionSample;
use alloc::vec::Vec;

/// Peaks must exceed this multiple of the standard deviation of the smoothed
/// window.
const PEAK_THRESHOLD_STD_DEVS: f32 = 0.75;

/// Minimum number of accepted peaks, i.e., at least two intervals.
const MIN_PEAKS: usize = 3;

/// Upper bound for the robust coefficient of variation of the peak intervals.
const MAX_INTERVAL_SPREAD: f32 = 0.15;

/// The smoothing cutoff as multiple of the highest plausible beat frequency.
const CUTOFF_TO_MAX_BEAT_FREQUENCY: f32 = 2.0;

/// Analyzer that takes the median interval between the peaks of the smoothed
/// magnitude as period.
///
/// The window is detrended and smoothed by a zero-phase lowpass filter first.
/// Peaks above a noise floor that are separated by at least the shortest
/// plausible period are the beats. The result is only confident if the
/// intervals between the beats are regular.
#[derive(Debug, Clone)]
pub struct PeakIntervalAnalyzer {
    bpm_range: BpmRange,
}

impl PeakIntervalAnalyzer {
    /// Creates a new analyzer that only reports tempos inside the range.
    pub const fn new(bpm_range: BpmRange) -> Self {
        Self { bpm_range }
    }

    fn smoothed_magnitudes(&self, samples: &[MotionSample]) -> Option<Vec<f32>> {
        let sample_rate_hz = mean_sample_rate_hz(samples)?;
        let mut values = detrended_magnitudes(samples)?;

        let cutoff_hz = CUTOFF_TO_MAX_BEAT_FREQUENCY * self.bpm_range.max_hz();
        LowpassFilter::new(sample_rate_hz, cutoff_hz).process_zero_phase(&mut values);
        Some(values)
    }
}

impl PeriodicityAnalyzer for PeakIntervalAnalyzer {
    fn analyze(&self, samples: &[MotionSample]) -> Option<Periodicity> {
        if samples.len() < MIN_PEAKS {
            return None;
        }

        let values = self.smoothed_magnitudes(samples)?;
        let std_dev = stats::std_dev(&values)?;
        if std_dev < super::FLAT_SIGNAL_STD_DEV {
            log::trace!("Smoothed window is flat: no motion");
            return None;
        }

        let peaks = RefractoryPeaks::new(
            PeakIterator::new(samples, &values, PEAK_THRESHOLD_STD_DEVS * std_dev),
            self.bpm_range.min_period_s(),
        )
        .collect::<Vec<_>>();
        if peaks.len() < MIN_PEAKS {
            log::debug!("Only {} peaks in window: no tempo", peaks.len());
            return None;
        }

        let mut intervals_s = peaks
            .windows(2)
            .map(|pair| {
                pair[1]
                    .timestamp
                    .saturating_sub(pair[0].timestamp)
                    .as_secs_f32()
            })
            .collect::<Vec<_>>();

        let spread = stats::robust_coefficient_of_variation(&intervals_s)?;
        if spread > MAX_INTERVAL_SPREAD {
            log::debug!("Peak intervals are irregular (spread {spread:.3}): no tempo");
            return None;
        }

        let period_s = stats::median(&mut intervals_s)?;
        let periodicity = Periodicity::new(period_s, 1.0 - spread / MAX_INTERVAL_SPREAD);
        if !self.bpm_range.contains(periodicity.bpm()) {
            log::debug!(
                "Tempo {:.1} BPM is outside of the plausible range",
                periodicity.bpm()
            );
            return None;
        }

        log::trace!(
            "{} peaks, period {period_s:.3}s, spread {spread:.3}",
            peaks.len()
        );
        Some(periodicity)
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::PeakInterval
    }
}
