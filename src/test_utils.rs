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

//! Synthetic accelerometer traces for the tests.

use crate::motion_preprocessing::sample_history::MotionSample;
use crate::{Estimate, TempoEstimator};
use core::f32::consts::PI;
use core::time::Duration;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::vec::Vec;

/// Installs a logger so that the output of failing tests is easier to
/// understand. Can be called multiple times.
pub fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .with_utc_timestamps()
        .init();
}

/// One raw sample of a 3-axis accelerometer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisSample {
    pub timestamp: Duration,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Feeds all samples into the estimator and returns one estimate per sample.
pub fn feed(estimator: &mut TempoEstimator, samples: &[AxisSample]) -> Vec<Estimate> {
    samples
        .iter()
        .map(|s| estimator.record_at(s.x, s.y, s.z, s.timestamp))
        .collect()
}

/// Raw 3-axis traces, as a sensor would deliver them.
pub mod axes {
    use super::*;

    /// Motion along the x axis whose magnitude is `2 + sin(2πft)`. The offset
    /// keeps x positive, so the magnitude has the frequency of the sine and
    /// not twice of it.
    pub fn sine(freq_hz: f32, interval: Duration, count: usize) -> Vec<AxisSample> {
        (0..count)
            .map(|i| {
                let timestamp = interval * i as u32;
                AxisSample {
                    timestamp,
                    x: offset_sine(freq_hz, timestamp),
                    y: 0.0,
                    z: 0.0,
                }
            })
            .collect()
    }

    /// Like [`sine`] but the sensor delivers samples up to `max_jitter` too
    /// early or too late.
    pub fn jittered_sine(
        seed: u64,
        freq_hz: f32,
        interval: Duration,
        max_jitter: Duration,
        count: usize,
    ) -> Vec<AxisSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        let max_jitter_us = max_jitter.as_micros() as i64;
        (0..count)
            .map(|i| {
                // start late enough so that no timestamp becomes negative
                let nominal = max_jitter + interval * i as u32;
                let jitter_us = rng.random_range(-max_jitter_us..=max_jitter_us);
                let timestamp = if jitter_us < 0 {
                    nominal - Duration::from_micros(jitter_us.unsigned_abs())
                } else {
                    nominal + Duration::from_micros(jitter_us as u64)
                };
                AxisSample {
                    timestamp,
                    x: offset_sine(freq_hz, timestamp),
                    y: 0.0,
                    z: 0.0,
                }
            })
            .collect()
    }

    /// Like [`sine`] but with uniform noise of up to `±noise` on the x axis,
    /// i.e., on top of the motion.
    pub fn noisy_sine(
        seed: u64,
        freq_hz: f32,
        interval: Duration,
        noise: f32,
        count: usize,
    ) -> Vec<AxisSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = sine(freq_hz, interval, count);
        for sample in samples.iter_mut() {
            sample.x += rng.random_range(-noise..=noise);
        }
        samples
    }

    /// A device lying still on a table.
    pub fn resting(interval: Duration, count: usize) -> Vec<AxisSample> {
        (0..count)
            .map(|i| AxisSample {
                timestamp: interval * i as u32,
                x: 0.0,
                y: 0.0,
                z: crate::motion_preprocessing::STANDARD_GRAVITY,
            })
            .collect()
    }

    /// Uniform white noise on all axes.
    pub fn white_noise(seed: u64, interval: Duration, count: usize) -> Vec<AxisSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| AxisSample {
                timestamp: interval * i as u32,
                x: rng.random_range(-1.0..1.0),
                y: rng.random_range(-1.0..1.0),
                z: rng.random_range(-1.0..1.0),
            })
            .collect()
    }

    fn offset_sine(freq_hz: f32, timestamp: Duration) -> f32 {
        2.0 + libm::sinf(2.0 * PI * freq_hz * timestamp.as_secs_f32())
    }
}

/// Already reduced magnitudes, for testing the analyzers directly.
pub mod traces {
    use super::*;

    /// Magnitude `2 + sin(2πft)`.
    pub fn sine_magnitude(freq_hz: f32, interval: Duration, count: usize) -> Vec<MotionSample> {
        to_magnitudes(&axes::sine(freq_hz, interval, count))
    }

    /// Constant magnitude.
    pub fn constant(magnitude: f32, interval: Duration, count: usize) -> Vec<MotionSample> {
        (0..count)
            .map(|i| MotionSample::new(magnitude, interval * i as u32))
            .collect()
    }

    /// Magnitudes of uniform white noise on all axes.
    pub fn white_noise(seed: u64, interval: Duration, count: usize) -> Vec<MotionSample> {
        to_magnitudes(&axes::white_noise(seed, interval, count))
    }

    fn to_magnitudes(samples: &[AxisSample]) -> Vec<MotionSample> {
        samples
            .iter()
            .map(|s| {
                let magnitude = libm::sqrtf(s.x * s.x + s.y * s.y + s.z * s.z);
                MotionSample::new(magnitude, s.timestamp)
            })
            .collect()
    }
}

#[test]
fn traces_have_the_expected_shape() {
    let interval = Duration::from_millis(10);
    let sine = axes::sine(2.0, interval, 100);
    check!(sine.len() == 100);
    check!(sine[99].timestamp == Duration::from_millis(990));
    check!(sine.iter().all(|s| (1.0..=3.0).contains(&s.x)));

    let jittered = axes::jittered_sine(7, 2.0, interval, Duration::from_millis(2), 1000);
    let max_deviation = jittered
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let nominal = Duration::from_millis(2) + interval * i as u32;
            if s.timestamp > nominal {
                s.timestamp - nominal
            } else {
                nominal - s.timestamp
            }
        })
        .max()
        .unwrap();
    check!(max_deviation <= Duration::from_millis(2));
    check!(max_deviation > Duration::ZERO);

    let noisy = axes::noisy_sine(3, 2.0, interval, 0.5, 100);
    check!(noisy.iter().zip(sine.iter()).all(|(n, s)| (n.x - s.x).abs() <= 0.5 + 1e-6));
    check!(noisy != sine);

    // same seed, same trace
    check!(axes::white_noise(1, interval, 10) == axes::white_noise(1, interval, 10));
}
