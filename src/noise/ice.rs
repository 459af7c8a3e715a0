// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering from the vitreous solvent surrounding the specimen.

use ndarray::Array2;

use super::{shaped_noise, spectrum::RadialSpectrum, NoiseError};
use crate::c64;

/// A Gaussian model of solvent scattering: a random Fourier field whose
/// variance follows a radial profile, with no mean contribution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolventNoise {
    spectrum: RadialSpectrum,
}

impl SolventNoise {
    /// Validate and construct.
    pub fn new(spectrum: RadialSpectrum) -> Result<SolventNoise, NoiseError> {
        spectrum.validate()?;
        Ok(SolventNoise { spectrum })
    }

    pub fn spectrum(&self) -> &RadialSpectrum {
        &self.spectrum
    }

    /// Draw the solvent contribution to a Fourier-space image. The zero
    /// frequency is forced to zero: solvent adds texture, not mean
    /// intensity.
    pub fn sample(&self, seed: u64, shape: (usize, usize), pixel_size: f64) -> Array2<c64> {
        let mut field = shaped_noise(&self.spectrum, seed, shape, pixel_size);
        field[[0, 0]] = c64::new(0.0, 0.0);
        field
    }
}
