// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Readout noise of the detector.

use ndarray::Array2;

use super::{shaped_noise, spectrum::RadialSpectrum, NoiseError};
use crate::c64;

/// A Gaussian model of detector readout. A [`RadialSpectrum::Constant`]
/// profile gives plain white noise of that per-pixel variance; a shaped
/// profile mimics detectors with a non-flat transfer function.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorNoise {
    spectrum: RadialSpectrum,
}

impl DetectorNoise {
    /// Validate and construct.
    pub fn new(spectrum: RadialSpectrum) -> Result<DetectorNoise, NoiseError> {
        spectrum.validate()?;
        Ok(DetectorNoise { spectrum })
    }

    /// White readout noise of the given per-pixel variance.
    pub fn white(variance: f64) -> Result<DetectorNoise, NoiseError> {
        DetectorNoise::new(RadialSpectrum::Constant { variance })
    }

    pub fn spectrum(&self) -> &RadialSpectrum {
        &self.spectrum
    }

    /// Draw the readout contribution to a Fourier-space image.
    pub fn sample(&self, seed: u64, shape: (usize, usize), pixel_size: f64) -> Array2<c64> {
        shaped_noise(&self.spectrum, seed, shape, pixel_size)
    }
}
