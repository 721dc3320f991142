//! Tempo estimation from the dominant frequency of the window's spectrum.

use super::{detrended_magnitudes, mean_sample_rate_hz, stats};
use super::{AnalyzerKind, Periodicity, PeriodicityAnalyzer};
use crate::config::BpmRange;
use crate::motion_preprocessing::sample_history::MotionSample;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f32::consts::PI;
use core::fmt::{Debug, Formatter};
use realfft::{RealFftPlanner, RealToComplex};

/// The strongest bin must be at least this many times stronger than the mean
/// of all bins inside the BPM range.
const MIN_PEAK_TO_MEAN_RATIO: f32 = 4.0;

/// Below this, the window is too short for a spectrum.
const MIN_SAMPLES: usize = 4;

/// Analyzer that takes the strongest frequency of the spectrum inside the
/// plausible tempo range.
///
/// The window is detrended and Hann-windowed before the real FFT. If the two
/// strongest bins are neighbours, the frequency is their magnitude-weighted
/// average, which is a bit finer than the bin resolution.
///
/// The spectrum is taken of the magnitude, not of every axis on its own, so
/// there is no axis to pick and the result does not depend on how the device
/// is held.
pub struct SpectrumAnalyzer {
    bpm_range: BpmRange,
    /// FFT planned for the expected window length.
    fft: Arc<dyn RealToComplex<f32>>,
}

impl SpectrumAnalyzer {
    /// Creates a new analyzer. `window_len` is the expected number of samples
    /// per window. Windows of another length are fine but need a new FFT
    /// plan every time.
    pub fn new(bpm_range: BpmRange, window_len: usize) -> Self {
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(window_len);
        Self { bpm_range, fft }
    }

    /// Range of bin indices whose frequency is a plausible tempo.
    fn bin_range(&self, bin_width_hz: f32, bin_count: usize) -> Option<(usize, usize)> {
        let first = (libm::ceilf(self.bpm_range.min_hz() / bin_width_hz) as usize).max(1);
        let last = (libm::floorf(self.bpm_range.max_hz() / bin_width_hz) as usize)
            .min(bin_count.checked_sub(1)?);
        (first <= last).then_some((first, last))
    }
}

impl Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("bpm_range", &self.bpm_range)
            .field("fft_len", &self.fft.len())
            .finish()
    }
}

impl PeriodicityAnalyzer for SpectrumAnalyzer {
    fn analyze(&self, samples: &[MotionSample]) -> Option<Periodicity> {
        if samples.len() < MIN_SAMPLES {
            return None;
        }

        let sample_rate_hz = mean_sample_rate_hz(samples)?;
        let mut input = detrended_magnitudes(samples)?;
        apply_hann_window(&mut input);

        let fft = if self.fft.len() == input.len() {
            Arc::clone(&self.fft)
        } else {
            RealFftPlanner::<f32>::new().plan_fft_forward(input.len())
        };
        let mut spectrum = fft.make_output_vec();
        if let Err(e) = fft.process(&mut input, &mut spectrum) {
            log::warn!("FFT failed: {e}");
            return None;
        }
        let magnitudes = spectrum.iter().map(|c| c.norm()).collect::<Vec<_>>();

        let bin_width_hz = sample_rate_hz / samples.len() as f32;
        let Some((first, last)) = self.bin_range(bin_width_hz, magnitudes.len()) else {
            log::debug!("Frequency resolution of {bin_width_hz} Hz is too coarse for the BPM range");
            return None;
        };
        let band = &magnitudes[first..=last];

        let band_mean = stats::mean(band)?;
        let (best, best_magnitude) = strongest_bin(band, None)?;
        if band_mean <= 0.0 || best_magnitude < MIN_PEAK_TO_MEAN_RATIO * band_mean {
            log::debug!("No dominant frequency in spectrum");
            return None;
        }
        let ratio = best_magnitude / band_mean;

        let bin = match strongest_bin(band, Some(best)) {
            Some((second, second_magnitude)) if second.abs_diff(best) == 1 => {
                (best as f32 * best_magnitude + second as f32 * second_magnitude)
                    / (best_magnitude + second_magnitude)
            }
            _ => best as f32,
        };
        let frequency_hz = (first as f32 + bin) * bin_width_hz;

        let periodicity = Periodicity::new(1.0 / frequency_hz, 1.0 - MIN_PEAK_TO_MEAN_RATIO / ratio);
        if !self.bpm_range.contains(periodicity.bpm()) {
            log::debug!(
                "Tempo {:.1} BPM is outside of the plausible range",
                periodicity.bpm()
            );
            return None;
        }
        log::trace!("Dominant frequency {frequency_hz:.3} Hz (ratio {ratio:.1})");
        Some(periodicity)
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Spectrum
    }
}

/// Returns the index and the magnitude of the strongest bin, optionally
/// ignoring one bin.
fn strongest_bin(magnitudes: &[f32], skip: Option<usize>) -> Option<(usize, f32)> {
    magnitudes
        .iter()
        .copied()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

fn apply_hann_window(samples: &mut [f32]) {
    let n = samples.len();
    if n < 2 {
        return;
    }
    for (i, sample) in samples.iter_mut().enumerate() {
        let window = 0.5 * (1.0 - libm::cosf(2.0 * PI * i as f32 / (n - 1) as f32));
        *sample *= window;
    }
}
