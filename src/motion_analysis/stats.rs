//! Basic statistics over windows of samples.
//!
//! All functions return `None` for inputs where the statistic is not defined,
//! so that callers never have to deal with NaN.

use alloc::vec::Vec;

/// Arithmetic mean.
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    // f64 accumulator: windows have a few thousand elements.
    let sum = values.iter().map(|&v| v as f64).sum::<f64>();
    Some((sum / values.len() as f64) as f32)
}

/// Population standard deviation.
pub fn std_dev(values: &[f32]) -> Option<f32> {
    let mean = mean(values)? as f64;
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(libm::sqrt(variance) as f32)
}

/// Median. For an even number of values, the mean of the two middle values.
///
/// The slice is sorted in place.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f32::total_cmp);

    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Some(median)
}

/// Scale factor so that the MAD is a consistent estimator of the standard
/// deviation of normally distributed data.
const MAD_TO_STD_DEV: f32 = 1.4826;

/// Robust coefficient of variation: the median absolute deviation (scaled to
/// a standard deviation) relative to the median.
///
/// Unlike the classic coefficient of variation, a single outlier (e.g. one
/// missed beat that doubles an interval) barely changes it.
pub fn robust_coefficient_of_variation(values: &[f32]) -> Option<f32> {
    let mut sorted = Vec::from(values);
    let median = median(&mut sorted)?;
    if median <= 0.0 {
        return None;
    }

    let mut deviations = values
        .iter()
        .map(|&v| libm::fabsf(v - median))
        .collect::<Vec<_>>();
    let mad = self::median(&mut deviations)?;

    Some(MAD_TO_STD_DEV * mad / median)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_dev() {
        check!(mean(&[]) == None);
        check!(std_dev(&[]) == None);
        check!(mean(&[1.0, 2.0, 3.0, 4.0]) == Some(2.5));
        check!(std_dev(&[5.0, 5.0, 5.0]) == Some(0.0));

        let std_dev = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        check!(approx_eq!(f32, std_dev, 2.0, epsilon = 1e-6));
    }

    #[test]
    fn median_of_odd_and_even_count() {
        check!(median(&mut []) == None);
        check!(median(&mut [3.0, 1.0, 2.0]) == Some(2.0));
        check!(median(&mut [4.0, 1.0, 3.0, 2.0]) == Some(2.5));
        check!(median(&mut [0.5]) == Some(0.5));
    }

    #[test]
    fn robust_cv_ignores_single_outlier() {
        let regular = [0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        check!(robust_coefficient_of_variation(&regular) == Some(0.0));

        // One missed beat doubles one interval.
        let missed_beat = [0.5, 0.5, 1.0, 0.5, 0.5, 0.5];
        check!(robust_coefficient_of_variation(&missed_beat) == Some(0.0));

        let irregular = [0.2, 0.4, 0.3, 0.6, 0.25, 0.5];
        let cv = robust_coefficient_of_variation(&irregular).unwrap();
        check!(cv > 0.3);
    }

    #[test]
    fn robust_cv_is_undefined_for_non_positive_median() {
        check!(robust_coefficient_of_variation(&[]) == None);
        check!(robust_coefficient_of_variation(&[0.0, 0.0, 1.0]) == None);
        check!(robust_coefficient_of_variation(&[-1.0, -1.0]) == None);
    }
}
