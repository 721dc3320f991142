//! The motion analysis layer finds the dominant period in a window of motion
//! samples.
//!
//! All code here requires that all data was properly processed and validated
//! by the [preprocessing layer]. Here lives the actual tempo estimation
//! algorithm.
//!
//! [preprocessing layer]: crate::motion_preprocessing

use crate::config::BpmRange;
use crate::motion_preprocessing::sample_history::MotionSample;
use alloc::vec::Vec;
use core::time::Duration;

pub mod lowpass_filter;
pub mod peak_interval;
pub mod peak_iterator;
#[cfg(feature = "spectrum")]
pub mod spectrum;
pub mod stats;

/// Windows whose (detrended) standard deviation is below this value are
/// considered flat, i.e., there is no motion at all.
pub(crate) const FLAT_SIGNAL_STD_DEV: f32 = 1e-4;

/// The dominant period found in a window of samples.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Periodicity {
    period_s: f32,
    confidence: f32,
}

impl Periodicity {
    /// Creates a new periodicity. `period_s` must be finite and positive.
    pub(crate) fn new(period_s: f32, confidence: f32) -> Self {
        debug_assert!(period_s.is_finite() && period_s > 0.0);
        Self {
            period_s,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Returns the period in seconds.
    #[must_use]
    pub const fn period_s(&self) -> f32 {
        self.period_s
    }

    /// Returns the period.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs_f32(self.period_s)
    }

    /// Returns the tempo in beats per minute.
    #[must_use]
    pub fn bpm(&self) -> f32 {
        60.0 / self.period_s
    }

    /// Returns how confident the analyzer is, in range `0.0..=1.0`. What this
    /// means in detail depends on the analyzer, but higher is better.
    #[must_use]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Common abstraction over a periodicity analysis strategy.
///
/// Implementations must not keep mutable state between invocations: the
/// result only depends on the provided window.
pub trait PeriodicityAnalyzer {
    /// Analyzes the window of samples (ordered from oldest to newest) and
    /// returns the dominant period, if there is a confident one within the
    /// plausible tempo range.
    fn analyze(&self, samples: &[MotionSample]) -> Option<Periodicity>;

    /// Convenient getter to get the [`AnalyzerKind`] of an analyzer.
    /// This is a 1:1 mapping.
    fn kind(&self) -> AnalyzerKind;
}

/// Enum that conveniently makes all [`PeriodicityAnalyzer`]s provided by this
/// crate accessible.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnalyzerKind {
    /// Median of the intervals between peaks in the time domain.
    /// Corresponds to [`peak_interval::PeakIntervalAnalyzer`].
    #[default]
    PeakInterval,
    /// Dominant frequency in the spectrum.
    /// Corresponds to [`spectrum::SpectrumAnalyzer`].
    #[cfg(feature = "spectrum")]
    Spectrum,
}

impl AnalyzerKind {
    /// Creates the concrete analyzer.
    ///
    /// `window_len` is the expected number of samples per window; analyzers
    /// may prepare themselves for that size.
    #[cfg_attr(not(feature = "spectrum"), allow(unused_variables))]
    pub(crate) fn analyzer(self, bpm_range: BpmRange, window_len: usize) -> Analyzer {
        match self {
            Self::PeakInterval => {
                Analyzer::PeakInterval(peak_interval::PeakIntervalAnalyzer::new(bpm_range))
            }
            #[cfg(feature = "spectrum")]
            Self::Spectrum => {
                Analyzer::Spectrum(spectrum::SpectrumAnalyzer::new(bpm_range, window_len))
            }
        }
    }
}

/// Static dispatch over all analyzers of this crate.
#[derive(Debug)]
pub(crate) enum Analyzer {
    PeakInterval(peak_interval::PeakIntervalAnalyzer),
    #[cfg(feature = "spectrum")]
    Spectrum(spectrum::SpectrumAnalyzer),
}

impl PeriodicityAnalyzer for Analyzer {
    #[inline]
    fn analyze(&self, samples: &[MotionSample]) -> Option<Periodicity> {
        match self {
            Self::PeakInterval(analyzer) => analyzer.analyze(samples),
            #[cfg(feature = "spectrum")]
            Self::Spectrum(analyzer) => analyzer.analyze(samples),
        }
    }

    fn kind(&self) -> AnalyzerKind {
        match self {
            Self::PeakInterval(analyzer) => analyzer.kind(),
            #[cfg(feature = "spectrum")]
            Self::Spectrum(analyzer) => analyzer.kind(),
        }
    }
}

/// Returns the effective sample rate of the window, derived from the mean
/// interval between its samples.
///
/// Returns `None` if there are less than two samples or if no time passed.
pub(crate) fn mean_sample_rate_hz(samples: &[MotionSample]) -> Option<f32> {
    let (first, last) = (samples.first()?, samples.last()?);
    let span_s = last.timestamp.saturating_sub(first.timestamp).as_secs_f32();
    if samples.len() < 2 || span_s <= 0.0 {
        return None;
    }
    let rate = (samples.len() - 1) as f32 / span_s;
    rate.is_finite().then_some(rate)
}

/// Returns the magnitudes of the window with the mean removed.
///
/// Returns `None` if the window is empty or flat (no motion).
pub(crate) fn detrended_magnitudes(samples: &[MotionSample]) -> Option<Vec<f32>> {
    let mut values = samples
        .iter()
        .map(|sample| sample.magnitude)
        .collect::<Vec<_>>();
    let mean = stats::mean(&values)?;
    values.iter_mut().for_each(|value| *value -= mean);

    if stats::std_dev(&values)? < FLAT_SIGNAL_STD_DEV {
        log::trace!("Window is flat: no motion");
        return None;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    fn samples(magnitudes: &[f32], interval: Duration) -> std::vec::Vec<MotionSample> {
        magnitudes
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| MotionSample::new(magnitude, interval * i as u32))
            .collect()
    }

    #[test]
    fn sample_rate_from_timestamps() {
        let interval = Duration::from_millis(10);
        check!(mean_sample_rate_hz(&[]) == None);
        check!(mean_sample_rate_hz(&samples(&[1.0], interval)) == None);

        let rate = mean_sample_rate_hz(&samples(&[0.0; 101], interval)).unwrap();
        check!(approx_eq!(f32, rate, 100.0, epsilon = 1e-3));

        // All samples at the same time: no rate.
        let same_time = samples(&[0.0; 10], Duration::ZERO);
        check!(mean_sample_rate_hz(&same_time) == None);
    }

    #[test]
    fn detrending_removes_the_mean() {
        let interval = Duration::from_millis(10);
        let values = detrended_magnitudes(&samples(&[1.0, 2.0, 3.0], interval)).unwrap();
        check!(values == vec![-1.0, 0.0, 1.0]);

        check!(detrended_magnitudes(&[]) == None);
        check!(detrended_magnitudes(&samples(&[9.81; 64], interval)) == None);
    }

    #[test]
    fn kind_creates_matching_analyzer() {
        let analyzer = AnalyzerKind::PeakInterval.analyzer(BpmRange::default(), 64);
        check!(analyzer.kind() == AnalyzerKind::PeakInterval);
        #[cfg(feature = "spectrum")]
        {
            let analyzer = AnalyzerKind::Spectrum.analyzer(BpmRange::default(), 64);
            check!(analyzer.kind() == AnalyzerKind::Spectrum);
        }
    }

    #[test]
    fn periodicity_accessors() {
        let periodicity = Periodicity::new(0.5, 1.3);
        check!(periodicity.bpm() == 120.0);
        check!(periodicity.period() == Duration::from_millis(500));
        check!(periodicity.confidence() == 1.0);
    }
}
