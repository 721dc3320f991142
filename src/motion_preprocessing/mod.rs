//! Necessary types, helpers, and functions to pre-process accelerometer input
//! to prepare it for the **analysis layer**.
//!
//! This module only operates on raw data and data streams, without interacting
//! with the outer world (I/O).

pub mod sample_history;

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Convention of how a raw 3-axis sample is reduced to a single scalar
/// magnitude.
///
/// The convention depends on the sensor feeding the estimator: platforms
/// typically offer a "linear acceleration" sensor with gravity already
/// removed, and a raw accelerometer that includes gravity.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Reduction {
    /// The input is linear acceleration (gravity already removed):
    /// `m = sqrt(x² + y² + z²)`.
    #[default]
    Linear,
    /// The input is raw acceleration including gravity:
    /// `m = sqrt(x² + y² + z²) - gravity`.
    RemoveGravity {
        /// Gravity in the unit of the input, typically [`STANDARD_GRAVITY`].
        gravity: f32,
    },
}

impl Reduction {
    /// Reduction for raw accelerometer data in m/s² on earth.
    pub const fn remove_standard_gravity() -> Self {
        Self::RemoveGravity {
            gravity: STANDARD_GRAVITY,
        }
    }

    /// Reduces a 3-axis sample to its magnitude.
    ///
    /// Returns `None` if any component is not finite or if the magnitude
    /// itself is not representable as finite [`f32`] (overflow).
    #[inline]
    pub fn reduce(self, x: f32, y: f32, z: f32) -> Option<f32> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return None;
        }

        // f64 prevents overflow of the squares for large but finite inputs.
        let (x, y, z) = (x as f64, y as f64, z as f64);
        let norm = libm::sqrt(x * x + y * y + z * z);

        let magnitude = match self {
            Self::Linear => norm,
            Self::RemoveGravity { gravity } => norm - gravity as f64,
        } as f32;

        magnitude.is_finite().then_some(magnitude)
    }
}
