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

//! Iterators over the peaks of a smoothed window.

use crate::motion_preprocessing::sample_history::MotionSample;
use core::time::Duration;

/// A local maximum of the smoothed signal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PeakInfo {
    /// Index into the window.
    pub index: usize,
    /// The smoothed value at the peak.
    pub value: f32,
    /// The time of the peak. Refined between the neighbouring samples, so it
    /// isn't bound to the sampling grid.
    pub timestamp: Duration,
}

/// Iterates all local maxima of the smoothed signal that are strictly above
/// a threshold.
///
/// A local maximum is a value that is strictly greater than its predecessor
/// and not smaller than its successor. This way, a plateau yields exactly one
/// peak at its rising edge. The first and the last value of the window are
/// never peaks as they lack a neighbour.
#[derive(Debug, Clone)]
pub struct PeakIterator<'a> {
    index: usize,
    values: &'a [f32],
    samples: &'a [MotionSample],
    threshold: f32,
}

impl<'a> PeakIterator<'a> {
    /// Creates a new iterator. `values` are the smoothed magnitudes of
    /// `samples`; both must have the same length.
    pub fn new(samples: &'a [MotionSample], values: &'a [f32], threshold: f32) -> Self {
        assert_eq!(samples.len(), values.len());
        Self {
            index: 1,
            values,
            samples,
            threshold,
        }
    }
}

impl PeakIterator<'_> {
    /// Fits a parabola through the peak and its neighbours and returns the
    /// time of its vertex. `i` must have a neighbour on each side.
    fn interpolated_timestamp(&self, i: usize) -> Duration {
        let (prev, value, next) = (self.values[i - 1], self.values[i], self.values[i + 1]);
        let timestamp = self.samples[i].timestamp;

        // < 0 for every peak as `prev < value >= next`
        let curvature = prev - 2.0 * value + next;
        if curvature >= 0.0 || curvature.is_nan() {
            return timestamp;
        }
        let offset = (0.5 * (prev - next) / curvature).clamp(-0.5, 0.5);

        if offset >= 0.0 {
            let step = self.samples[i + 1].timestamp.saturating_sub(timestamp);
            timestamp + step.mul_f32(offset)
        } else {
            let step = timestamp.saturating_sub(self.samples[i - 1].timestamp);
            timestamp.saturating_sub(step.mul_f32(-offset))
        }
    }
}

impl Iterator for PeakIterator<'_> {
    type Item = PeakInfo;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.index + 1 < self.values.len() {
            let i = self.index;
            self.index += 1;

            let (prev, value, next) = (self.values[i - 1], self.values[i], self.values[i + 1]);
            if value > self.threshold && prev < value && value >= next {
                return Some(PeakInfo {
                    index: i,
                    value,
                    timestamp: self.interpolated_timestamp(i),
                });
            }
        }
        None
    }
}

/// Filters peaks so that no two peaks are closer to each other than a
/// refractory interval.
///
/// If a peak follows the last accepted peak within the refractory interval,
/// the higher one of both survives. The refractory interval is then measured
/// from the survivor.
#[derive(Debug, Clone)]
pub struct RefractoryPeaks<I> {
    peaks: I,
    refractory_s: f32,
    pending: Option<PeakInfo>,
}

impl<I: Iterator<Item = PeakInfo>> RefractoryPeaks<I> {
    /// Creates a new iterator. `refractory_s` is the minimum interval in
    /// seconds between two peaks.
    pub fn new(peaks: I, refractory_s: f32) -> Self {
        Self {
            peaks,
            refractory_s,
            pending: None,
        }
    }
}

impl<I: Iterator<Item = PeakInfo>> Iterator for RefractoryPeaks<I> {
    type Item = PeakInfo;

    fn next(&mut self) -> Option<Self::Item> {
        for candidate in self.peaks.by_ref() {
            let Some(pending) = self.pending else {
                self.pending = Some(candidate);
                continue;
            };

            let interval_s = candidate
                .timestamp
                .saturating_sub(pending.timestamp)
                .as_secs_f32();
            if interval_s < self.refractory_s {
                if candidate.value > pending.value {
                    self.pending = Some(candidate);
                }
            } else {
                self.pending = Some(candidate);
                return Some(pending);
            }
        }
        self.pending.take()
    }
}
