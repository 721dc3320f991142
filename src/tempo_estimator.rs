/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Module for [`TempoEstimator`].

use crate::config::EstimatorConfig;
use crate::motion_analysis::{Analyzer, Periodicity, PeriodicityAnalyzer};
use crate::motion_preprocessing::sample_history::{MotionSample, SampleHistory};
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use core::time::Duration;

/// The result of [`TempoEstimator::record_at`]: a tempo in beats per minute
/// or [`Estimate::NONE`].
///
/// This is a thin wrapper around the raw `f32`, so callers that only check
/// `raw() >= 0.0` keep working.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct Estimate(f32);

impl Estimate {
    /// No estimate: not enough data yet, no analysis in this call, or no
    /// confident periodicity.
    pub const NONE: Self = Self(-1.0);

    /// Returns the raw value: a BPM value or `-1.0`.
    #[must_use]
    pub const fn raw(self) -> f32 {
        self.0
    }

    /// Returns the tempo in BPM, if available.
    #[must_use]
    pub fn bpm(self) -> Option<f32> {
        self.is_available().then_some(self.0)
    }

    /// Returns true if this is a tempo and not [`Self::NONE`].
    #[must_use]
    pub fn is_available(self) -> bool {
        self.0 >= 0.0
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<Option<Periodicity>> for Estimate {
    fn from(periodicity: Option<Periodicity>) -> Self {
        periodicity.map_or(Self::NONE, |periodicity| Self(periodicity.bpm()))
    }
}

impl From<Estimate> for Option<f32> {
    fn from(estimate: Estimate) -> Self {
        estimate.bpm()
    }
}

impl Display for Estimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.bpm() {
            Some(bpm) => write!(f, "{bpm:.1} BPM"),
            None => write!(f, "-"),
        }
    }
}

/// Estimates the tempo of a periodic motion from a stream of 3-axis
/// accelerometer samples.
///
/// Every accepted sample is reduced to a magnitude and stored in a sliding
/// window of [`EstimatorConfig::capacity`] samples. Once the window is full,
/// the window is analyzed every [`EstimatorConfig::analysis_cadence`]
/// accepted samples. All other calls are cheap and return [`Estimate::NONE`].
///
/// One instance serves exactly one sensor stream. It never fails: all
/// degenerate cases (not enough data, flat or irregular signal, invalid
/// samples) result in [`Estimate::NONE`].
///
/// ## Example
/// ```rust
/// use core::time::Duration;
/// use motion_tempo::{EstimatorConfig, TempoEstimator};
///
/// let config = EstimatorConfig::new(256, 16).unwrap();
/// let mut estimator = TempoEstimator::new(config);
///
/// for i in 0..1000_u32 {
///     let t = Duration::from_millis(10) * i;
///     // 2 Hz motion along the x axis
///     let x = 2.0 + (2.0 * core::f32::consts::PI * 2.0 * t.as_secs_f32()).sin();
///     let estimate = estimator.record_at(x, 0.0, 0.0, t);
///     if let Some(bpm) = estimate.bpm() {
///         assert!((114.0..=126.0).contains(&bpm));
///     }
/// }
/// ```
#[derive(Debug)]
pub struct TempoEstimator {
    config: EstimatorConfig,
    history: SampleHistory,
    analyzer: Analyzer,
    /// Accepted samples since the last analysis pass.
    samples_since_last_estimate: usize,
    /// Reused for the window snapshot of each analysis pass.
    window: Vec<MotionSample>,
    /// Origin of the timestamps of [`Self::record`].
    #[cfg(feature = "std")]
    epoch: std::time::Instant,
}

impl TempoEstimator {
    /// Creates a new estimator. This allocates the sample history once.
    pub fn new(config: EstimatorConfig) -> Self {
        let analyzer = config
            .analyzer()
            .analyzer(config.bpm_range(), config.capacity());
        Self {
            history: SampleHistory::new(config.capacity()),
            window: Vec::with_capacity(config.capacity()),
            analyzer,
            samples_since_last_estimate: 0,
            config,
            #[cfg(feature = "std")]
            epoch: std::time::Instant::now(),
        }
    }

    /// Records a sample with the current time of a monotonic clock.
    ///
    /// Timestamps are relative to the creation of the estimator. See
    /// [`Self::record_at`].
    #[cfg(feature = "std")]
    pub fn record(&mut self, x: f32, y: f32, z: f32) -> Estimate {
        let timestamp = self.epoch.elapsed();
        self.record_at(x, y, z, timestamp)
    }

    /// Records a sample of the accelerometer and returns the latest estimate,
    /// if an analysis pass ran in this call.
    ///
    /// `timestamp` is relative to an arbitrary but fixed origin and must be
    /// non-decreasing over all calls. Samples with a non-finite component are
    /// ignored: they neither enter the history nor count towards the
    /// analysis cadence.
    pub fn record_at(&mut self, x: f32, y: f32, z: f32, timestamp: Duration) -> Estimate {
        let Some(magnitude) = self.config.reduction().reduce(x, y, z) else {
            log::trace!("Ignoring invalid sample ({x}, {y}, {z})");
            return Estimate::NONE;
        };

        self.history.push(magnitude, timestamp);
        self.samples_since_last_estimate = self.samples_since_last_estimate.saturating_add(1);

        if !self.history.is_full()
            || self.samples_since_last_estimate < self.config.analysis_cadence()
        {
            return Estimate::NONE;
        }

        self.samples_since_last_estimate = 0;
        self.history.snapshot_into(&mut self.window);
        let periodicity = self.analyzer.analyze(&self.window);
        log::trace!("Analysis pass at {timestamp:?}: {periodicity:?}");
        periodicity.into()
    }

    /// Analyzes the current window without affecting the analysis cadence.
    ///
    /// Unlike [`Self::record_at`], this also runs if the history is not full
    /// yet. Calling this twice without recording samples in between yields
    /// the same result.
    pub fn analyze(&self) -> Option<Periodicity> {
        self.analyzer.analyze(&self.history.snapshot())
    }

    /// Empties the history and restarts the analysis cadence. The
    /// configuration is kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.samples_since_last_estimate = 0;
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Returns the history of accepted samples.
    pub const fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Returns the number of accepted samples since the last analysis pass.
    pub const fn samples_since_last_estimate(&self) -> usize {
        self.samples_since_last_estimate
    }
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
