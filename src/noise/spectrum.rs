// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Radial variance profiles for the stochastic parts of an image.

use nalgebra::Vector2;
use ndarray::Array2;

use super::NoiseError;

/// A noise variance as a function of spatial-frequency radius \[cycles/Å\].
///
/// A [`Constant`](RadialSpectrum::Constant) profile yields white noise
/// whose real-space per-pixel variance equals `variance`; other profiles
/// yield correlated noise with the same Fourier bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RadialSpectrum {
    /// Flat profile.
    Constant { variance: f64 },
    /// `amplitude * exp(-radius / decay)`, concentrating power at low
    /// frequency the way vitreous solvent does.
    Exponential { amplitude: f64, decay: f64 },
}

impl RadialSpectrum {
    /// Check the profile parameters.
    pub fn validate(&self) -> Result<(), NoiseError> {
        match *self {
            RadialSpectrum::Constant { variance } => {
                if !(variance.is_finite() && variance >= 0.0) {
                    return Err(NoiseError::BadVariance(variance));
                }
            }
            RadialSpectrum::Exponential { amplitude, decay } => {
                if !(amplitude.is_finite() && amplitude >= 0.0) {
                    return Err(NoiseError::BadAmplitude(amplitude));
                }
                if !(decay.is_finite() && decay > 0.0) {
                    return Err(NoiseError::BadDecay(decay));
                }
            }
        }
        Ok(())
    }

    /// The variance at a frequency radius.
    pub fn variance_at(&self, radius: f64) -> f64 {
        match *self {
            RadialSpectrum::Constant { variance } => variance,
            RadialSpectrum::Exponential { amplitude, decay } => {
                amplitude * (-radius / decay).exp()
            }
        }
    }

    /// Evaluate over an image frequency grid.
    pub fn evaluate(&self, freqs: &Array2<Vector2<f64>>) -> Array2<f64> {
        freqs.mapv(|f| self.variance_at(f.norm()))
    }
}
