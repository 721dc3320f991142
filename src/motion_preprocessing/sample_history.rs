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

//! Helpers for sample history bookkeeping.
//!
//! We need to get new motion samples as we go but keep knowledge of old ones.
//! The window of the most recent samples is what the analysis runs on.
//!
//! See [`SampleHistory`] and [`MotionSample`].

use alloc::vec::Vec;
use core::time::Duration;
use ringbuffer::{AllocRingBuffer, RingBuffer};

/// A reduced motion sample with time context.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MotionSample {
    /// The scalar magnitude of the acceleration, see
    /// [`Reduction`](crate::Reduction).
    pub magnitude: f32,
    /// Monotonic timestamp relative to an arbitrary but fixed origin.
    pub timestamp: Duration,
}

impl MotionSample {
    /// Creates a new sample.
    pub const fn new(magnitude: f32, timestamp: Duration) -> Self {
        Self {
            magnitude,
            timestamp,
        }
    }
}

/// Sliding window over the most recent [`MotionSample`]s.
///
/// The window is a ringbuffer with a fixed capacity that is allocated once.
/// Once the capacity is reached, every new sample evicts the oldest one. From
/// then on, the length stays at the capacity forever.
#[derive(Debug)]
pub struct SampleHistory {
    buffer: AllocRingBuffer<MotionSample>,
    total_pushed_samples: usize,
}

impl SampleHistory {
    /// Creates a new, empty history. The capacity must not be zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a sample history needs a capacity");
        Self {
            buffer: AllocRingBuffer::new(capacity),
            total_pushed_samples: 0,
        }
    }

    /// Appends a new sample. If the history is full, the oldest sample is
    /// evicted first.
    ///
    /// Timestamps are expected to be monotonically non-decreasing.
    #[inline]
    pub fn push(&mut self, magnitude: f32, timestamp: Duration) {
        if let Some(newest) = self.newest() {
            if timestamp < newest.timestamp {
                log::warn!(
                    "Sample timestamp {timestamp:?} is older than the newest sample ({:?})",
                    newest.timestamp
                );
            }
        }

        self.buffer.push(MotionSample::new(magnitude, timestamp));
        self.total_pushed_samples += 1;
    }

    /// Returns true once `capacity` samples have been pushed.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    /// Returns the number of samples currently in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if there are no samples in the window.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the fixed capacity of the window.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns the total number of samples pushed since creation or the last
    /// [`Self::clear`], including already evicted ones.
    #[inline]
    pub const fn total_pushed(&self) -> usize {
        self.total_pushed_samples
    }

    /// Returns the amount of evicted samples, i.e., samples that are not in
    /// the underlying ringbuffer anymore.
    #[inline]
    pub fn lost_samples(&self) -> usize {
        self.total_pushed_samples.saturating_sub(self.buffer.capacity())
    }

    /// Returns the oldest sample in the window.
    #[inline]
    pub fn oldest(&self) -> Option<MotionSample> {
        (!self.buffer.is_empty()).then(|| self.buffer[0])
    }

    /// Returns the newest sample in the window.
    #[inline]
    pub fn newest(&self) -> Option<MotionSample> {
        (!self.buffer.is_empty()).then(|| self.buffer[self.buffer.len() - 1])
    }

    /// Returns the duration covered by the window, i.e., the time between
    /// the oldest and the newest sample.
    #[inline]
    pub fn time_span(&self) -> Duration {
        match (self.oldest(), self.newest()) {
            (Some(oldest), Some(newest)) => newest.timestamp.saturating_sub(oldest.timestamp),
            _ => Duration::ZERO,
        }
    }

    /// Iterates the samples from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MotionSample> + '_ {
        self.buffer.iter()
    }

    /// Returns a copy of the window, ordered from oldest to newest.
    pub fn snapshot(&self) -> Vec<MotionSample> {
        let mut snapshot = Vec::with_capacity(self.len());
        self.snapshot_into(&mut snapshot);
        snapshot
    }

    /// Like [`Self::snapshot`] but reuses the allocation of the given vector.
    pub fn snapshot_into(&self, snapshot: &mut Vec<MotionSample>) {
        snapshot.clear();
        snapshot.extend(self.buffer.iter().copied());
    }

    /// Removes all samples. The capacity stays the same.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.total_pushed_samples = 0;
    }
}
