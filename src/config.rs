//! Construction-time configuration of a [`TempoEstimator`].
//!
//! [`TempoEstimator`]: crate::TempoEstimator

use crate::motion_analysis::AnalyzerKind;
use crate::motion_preprocessing::Reduction;
use thiserror::Error;

/// Possible errors when creating an [`EstimatorConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidConfigError {
    /// The sample history can't hold enough samples to find any peak.
    #[error(
        "capacity {0} is too small: at least {min} samples are required",
        min = EstimatorConfig::MIN_CAPACITY
    )]
    CapacityTooSmall(usize),
    /// An analysis cadence of zero is meaningless.
    #[error("the analysis cadence must be at least one sample")]
    ZeroCadence,
    /// The BPM range is not finite, not positive, or not ascending.
    #[error("invalid BPM range {0}..={1}: bounds must be finite, positive, and ascending")]
    InvalidBpmRange(f32, f32),
    /// The gravity to remove is not finite or negative.
    #[error("gravity {0} is not a finite, non-negative value")]
    InvalidGravity(f32),
}

/// The range of tempos in beats per minute (BPM) that are considered
/// plausible for human motion. Estimates outside this range are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmRange {
    min: f32,
    max: f32,
}

impl BpmRange {
    /// Creates a new validated range.
    pub fn new(min: f32, max: f32) -> Result<Self, InvalidConfigError> {
        let valid = min.is_finite() && max.is_finite() && min > 0.0 && min < max;
        if valid {
            Ok(Self { min, max })
        } else {
            Err(InvalidConfigError::InvalidBpmRange(min, max))
        }
    }

    /// Returns the lower bound (BPM).
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Returns the upper bound (BPM).
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Returns true if the BPM value is inside the (inclusive) range.
    #[must_use]
    pub fn contains(&self, bpm: f32) -> bool {
        (self.min..=self.max).contains(&bpm)
    }

    /// Returns the frequency in Hz of the lower bound.
    #[must_use]
    pub fn min_hz(&self) -> f32 {
        self.min / 60.0
    }

    /// Returns the frequency in Hz of the upper bound.
    #[must_use]
    pub fn max_hz(&self) -> f32 {
        self.max / 60.0
    }

    /// Returns the shortest plausible period in seconds. Two beats closer to
    /// each other than that are one beat.
    #[must_use]
    pub fn min_period_s(&self) -> f32 {
        60.0 / self.max
    }
}

impl Default for BpmRange {
    /// 20 to 300 BPM.
    fn default() -> Self {
        Self {
            min: 20.0,
            max: 300.0,
        }
    }
}

/// Validated configuration of a [`TempoEstimator`].
///
/// The defaults (1024 samples of history, re-analysis every 32 samples)
/// cover about ten seconds of motion at a sensor rate of 100 Hz.
///
/// ```rust
/// use motion_tempo::{EstimatorConfig, Reduction};
///
/// let config = EstimatorConfig::new(512, 16)
///     .unwrap()
///     .with_bpm_range(40.0, 200.0)
///     .unwrap()
///     .with_reduction(Reduction::remove_standard_gravity())
///     .unwrap();
/// assert_eq!(config.capacity(), 512);
/// ```
///
/// [`TempoEstimator`]: crate::TempoEstimator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    capacity: usize,
    analysis_cadence: usize,
    reduction: Reduction,
    bpm_range: BpmRange,
    analyzer: AnalyzerKind,
}

impl EstimatorConfig {
    /// The smallest history that can hold a peak, i.e., a sample with a
    /// neighbour on each side.
    pub const MIN_CAPACITY: usize = 3;

    /// Default number of samples in the history.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Default number of accepted samples between two analysis passes.
    pub const DEFAULT_ANALYSIS_CADENCE: usize = 32;

    /// Creates a new configuration with the default reduction
    /// ([`Reduction::Linear`]), BPM range, and analyzer.
    ///
    /// # Arguments
    /// - `capacity`: Number of samples retained in the sliding window. Together
    ///   with the sensor rate, this defines the time span that is analyzed.
    /// - `analysis_cadence`: Number of accepted samples between analysis
    ///   passes. Trades freshness of the estimate for CPU time. It doesn't
    ///   need to divide `capacity`.
    pub fn new(capacity: usize, analysis_cadence: usize) -> Result<Self, InvalidConfigError> {
        if capacity < Self::MIN_CAPACITY {
            return Err(InvalidConfigError::CapacityTooSmall(capacity));
        }
        if analysis_cadence == 0 {
            return Err(InvalidConfigError::ZeroCadence);
        }

        Ok(Self {
            capacity,
            analysis_cadence,
            reduction: Reduction::default(),
            bpm_range: BpmRange::default(),
            analyzer: AnalyzerKind::default(),
        })
    }

    /// Sets the convention to reduce raw samples to a magnitude.
    pub fn with_reduction(mut self, reduction: Reduction) -> Result<Self, InvalidConfigError> {
        if let Reduction::RemoveGravity { gravity } = reduction {
            if !gravity.is_finite() || gravity < 0.0 {
                return Err(InvalidConfigError::InvalidGravity(gravity));
            }
        }
        self.reduction = reduction;
        Ok(self)
    }

    /// Sets the range of plausible tempos.
    pub fn with_bpm_range(mut self, min: f32, max: f32) -> Result<Self, InvalidConfigError> {
        self.bpm_range = BpmRange::new(min, max)?;
        Ok(self)
    }

    /// Sets the analysis strategy.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: AnalyzerKind) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Returns the capacity of the sample history.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of accepted samples between analysis passes.
    #[must_use]
    pub const fn analysis_cadence(&self) -> usize {
        self.analysis_cadence
    }

    /// Returns the reduction convention.
    #[must_use]
    pub const fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Returns the range of plausible tempos.
    #[must_use]
    pub const fn bpm_range(&self) -> BpmRange {
        self.bpm_range
    }

    /// Returns the analysis strategy.
    #[must_use]
    pub const fn analyzer(&self) -> AnalyzerKind {
        self.analyzer
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            analysis_cadence: Self::DEFAULT_ANALYSIS_CADENCE,
            reduction: Reduction::default(),
            bpm_range: BpmRange::default(),
            analyzer: AnalyzerKind::default(),
        }
    }
}
