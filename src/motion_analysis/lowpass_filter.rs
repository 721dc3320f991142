//! Utilities for smoothing a window of samples with a lowpass filter.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Type, Q_BUTTERWORTH_F32};

/// How many cutoff periods the filter is fed with the edge value of a pass
/// before the actual data. The filter is settled afterwards.
const SETTLE_CUTOFF_PERIODS: f32 = 3.0;

/// Upper bound for the settle length, for absurd ratios of sample rate and
/// cutoff.
const MAX_SETTLE_LEN: usize = 1 << 14;

/// Highest cutoff relative to the sample rate. Stays below Nyquist (0.5).
pub const MAX_CUTOFF_TO_SAMPLE_RATE: f32 = 0.4;

/// Zero-phase lowpass filter for whole windows of samples.
///
/// Each window runs forward and then backward through a second-order
/// Butterworth [`biquad`] filter. The second pass cancels the group delay of
/// the first one, so peaks stay where they are on the timescale. This is
/// possible because the analysis always sees the entire window, unlike a
/// streaming filter.
///
/// If the cutoff frequency is too high for the given sample rate, it is
/// lowered to [`MAX_CUTOFF_TO_SAMPLE_RATE`] of the sample rate. Only invalid
/// parameters result in a passthrough.
#[derive(Debug)]
pub struct LowpassFilter {
    /// Recommended impl of biquad filter
    filter: Option<DirectForm2Transposed<f32>>,
    /// Number of samples to settle the filter on an edge value.
    settle_len: usize,
}

impl LowpassFilter {
    /// Creates a new lowpass filter.
    pub fn new(sample_rate_hz: f32, cutoff_fr_hz: f32) -> Self {
        let max_cutoff_fr_hz = MAX_CUTOFF_TO_SAMPLE_RATE * sample_rate_hz;
        if cutoff_fr_hz > max_cutoff_fr_hz {
            log::trace!(
                "Lowering cutoff from {cutoff_fr_hz} Hz to {max_cutoff_fr_hz} Hz at {sample_rate_hz} Hz"
            );
        }
        let cutoff_fr_hz = cutoff_fr_hz.min(max_cutoff_fr_hz);
        let filter = Self::create_biquad_filter(sample_rate_hz, cutoff_fr_hz);
        if filter.is_none() {
            log::debug!(
                "Lowpass filter with cutoff {cutoff_fr_hz} Hz is not applicable at {sample_rate_hz} Hz: using a passthrough"
            );
        }

        let settle_len = if filter.is_some() {
            (libm::ceilf(SETTLE_CUTOFF_PERIODS * sample_rate_hz / cutoff_fr_hz) as usize)
                .min(MAX_SETTLE_LEN)
        } else {
            0
        };

        Self { filter, settle_len }
    }

    /// Creates a new no-op filter.
    pub const fn new_passthrough() -> Self {
        Self {
            filter: None,
            settle_len: 0,
        }
    }

    /// Returns true if the filter doesn't alter the signal.
    pub const fn is_passthrough(&self) -> bool {
        self.filter.is_none()
    }

    /// Filters the whole window in place without shifting it in time.
    pub fn process_zero_phase(&mut self, samples: &mut [f32]) {
        if self.filter.is_none() || samples.is_empty() {
            return;
        }

        self.process_pass(samples);
        samples.reverse();
        self.process_pass(samples);
        samples.reverse();
    }

    /// Runs the window once through the filter, starting from a state that is
    /// settled on the first value. This prevents the step response of the
    /// filter from appearing as a spurious peak at the window edge.
    fn process_pass(&mut self, samples: &mut [f32]) {
        let Some(filter) = self.filter.as_mut() else {
            return;
        };
        filter.reset_state();

        let first = samples[0];
        for _ in 0..self.settle_len {
            let _ = filter.run(first);
        }

        for sample in samples.iter_mut() {
            *sample = filter.run(*sample);
        }
    }

    /// Creates a properly configured [`biquad`] filter acting as lowpass filter.
    fn create_biquad_filter(
        sample_rate_hz: f32,
        cutoff_fr_hz: f32,
    ) -> Option<DirectForm2Transposed<f32>> {
        let valid = sample_rate_hz.is_finite()
            && sample_rate_hz > 0.0
            && cutoff_fr_hz.is_finite()
            && cutoff_fr_hz > 0.0;
        if !valid {
            return None;
        }

        // Cutoff relative to Nyquist: 1.0 is the Nyquist frequency. biquad
        // expects this and derives `omega = PI * normalized_f0` from it.
        let normalized_f0 = 2.0 * cutoff_fr_hz / sample_rate_hz;

        Coefficients::<f32>::from_normalized_params(Type::LowPass, normalized_f0, Q_BUTTERWORTH_F32)
            .ok()
            .map(DirectForm2Transposed::<f32>::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion_analysis::stats;
    use core::f32::consts::PI;
    use std::vec::Vec;

    fn sine(freq_hz: f32, sample_rate_hz: f32, count: usize) -> Vec<f32> {
        (0..count)
            .map(|i| libm::sinf(2.0 * PI * freq_hz * i as f32 / sample_rate_hz))
            .collect()
    }

    #[test]
    fn only_invalid_parameters_result_in_passthrough() {
        check!(LowpassFilter::new(100.0, 0.0).is_passthrough());
        check!(LowpassFilter::new(100.0, -1.0).is_passthrough());
        check!(LowpassFilter::new(f32::INFINITY, 10.0).is_passthrough());
        check!(LowpassFilter::new(f32::NAN, 10.0).is_passthrough());
        check!(LowpassFilter::new(0.0, 10.0).is_passthrough());
        check!(!LowpassFilter::new(100.0, 10.0).is_passthrough());
        // above Nyquist: lowered, not disabled
        check!(!LowpassFilter::new(100.0, 50.0).is_passthrough());
        check!(!LowpassFilter::new(15.0, 10.0).is_passthrough());

        let mut filter = LowpassFilter::new_passthrough();
        let mut samples = [1.0, -2.0, 3.0];
        filter.process_zero_phase(&mut samples);
        check!(samples == [1.0, -2.0, 3.0]);
    }

    #[test]
    fn cutoff_is_at_the_requested_frequency() {
        // Forward and backward pass: -3 dB per pass, i.e., half the amplitude
        // at the cutoff.
        let mut filter = LowpassFilter::new(100.0, 10.0);
        let mut samples = sine(10.0, 100.0, 1000);
        filter.process_zero_phase(&mut samples);
        let gain = stats::std_dev(&samples[200..800]).unwrap() / core::f32::consts::FRAC_1_SQRT_2;
        check!(approx_eq!(f32, gain, 0.5, epsilon = 0.05));
    }

    #[test]
    fn cutoff_above_nyquist_still_smooths() {
        // 15 Hz sensor, cutoff lowered from 10 Hz to 6 Hz
        let mut filter = LowpassFilter::new(15.0, 10.0);
        let mut samples = (0..300)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect::<Vec<f32>>();
        filter.process_zero_phase(&mut samples);
        let after = stats::std_dev(&samples[50..250]).unwrap();
        check!(after < 0.05);

        // while the beat frequency passes
        let original = sine(2.0, 15.0, 300);
        let mut filtered = original.clone();
        filter.process_zero_phase(&mut filtered);
        for (a, b) in original.iter().zip(filtered.iter()).skip(50).take(200) {
            check!(approx_eq!(f32, *a, *b, epsilon = 0.1));
        }
    }

    #[test]
    fn passes_low_frequencies_without_delay() {
        let mut filter = LowpassFilter::new(100.0, 10.0);
        let original = sine(2.0, 100.0, 400);
        let mut filtered = original.clone();
        filter.process_zero_phase(&mut filtered);

        // Away from the edges, the signal is practically untouched, including
        // its phase.
        for (a, b) in original.iter().zip(filtered.iter()).skip(50).take(300) {
            check!(approx_eq!(f32, *a, *b, epsilon = 0.05));
        }
    }

    #[test]
    fn suppresses_high_frequencies() {
        let mut filter = LowpassFilter::new(100.0, 5.0);
        let mut samples = sine(40.0, 100.0, 400);
        let before = stats::std_dev(&samples).unwrap();
        filter.process_zero_phase(&mut samples);
        let after = stats::std_dev(&samples[50..350]).unwrap();
        check!(after < before * 0.05);
    }

    #[test]
    fn constant_signal_stays_constant() {
        let mut filter = LowpassFilter::new(100.0, 10.0);
        let mut samples = [0.7; 200];
        filter.process_zero_phase(&mut samples);
        for sample in samples {
            check!(approx_eq!(f32, sample, 0.7, epsilon = 1e-4));
        }
    }
}
