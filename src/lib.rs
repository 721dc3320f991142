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

//! motion-tempo estimates the tempo of a periodic motion (beats per minute)
//! from a live stream of 3-axis accelerometer samples. It is meant for
//! applications such as a metronome aid that follows the movement of a
//! musician.
//!
//! The core is `no_std`-compatible and only needs `alloc`.
//!
//! ## TL;DR
//!
//! Feed every sample of your (linear, i.e., gravity-removed) accelerometer
//! into a [`TempoEstimator`]. After every sample, you get an [`Estimate`]:
//! either a BPM value or [`Estimate::NONE`] if there is not enough data or no
//! confident periodicity yet.
//!
//! ```rust
//! use core::time::Duration;
//! use motion_tempo::{EstimatorConfig, TempoEstimator};
//!
//! let mut estimator = TempoEstimator::new(EstimatorConfig::default());
//! // Call this from your sensor callback for every sample.
//! let estimate = estimator.record_at(0.1, -0.3, 0.2, Duration::from_millis(10));
//! if let Some(bpm) = estimate.bpm() {
//!     println!("{bpm} BPM");
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate is split into layers:
//! - [`motion_preprocessing`]: reduces raw 3-axis samples to a magnitude and
//!   keeps a fixed-size, timestamped history of them,
//! - [`motion_analysis`]: finds the dominant period in that history,
//! - [`TempoEstimator`]: glues both together and decides when an analysis
//!   pass runs.
//!
//! ## Cargo features
//! - `std`: enables [`TempoEstimator::record`], which reads a monotonic clock.
//! - `spectrum` (default): enables the FFT-based
//!   [`motion_analysis::spectrum::SpectrumAnalyzer`].
//! - `replay`: builds the `replay-trace` binary to run recorded traces through
//!   the estimator.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

#[cfg_attr(test, macro_use)]
#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate assert2;

#[cfg(test)]
#[macro_use]
extern crate float_cmp;

mod config;
mod tempo_estimator;

pub mod motion_analysis;
pub mod motion_preprocessing;

#[cfg(test)]
mod test_utils;

pub use config::{BpmRange, EstimatorConfig, InvalidConfigError};
pub use motion_analysis::{AnalyzerKind, Periodicity, PeriodicityAnalyzer};
pub use motion_preprocessing::sample_history::{MotionSample, SampleHistory};
pub use motion_preprocessing::Reduction;
pub use tempo_estimator::{Estimate, TempoEstimator};
