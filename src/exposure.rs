// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Electron exposure of the specimen.

use ndarray::Array2;
use thiserror::Error;

use crate::c64;

/// The integrated electron dose. Image contrast scales linearly with the
/// expected electron count per pixel, `dose * pixel_size^2`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exposure {
    /// Integrated dose \[electrons/Å^2\]
    dose_per_area: f64,
}

impl Exposure {
    /// Validate and construct.
    pub fn new(dose_per_area: f64) -> Result<Exposure, ExposureError> {
        if !(dose_per_area.is_finite() && dose_per_area >= 0.0) {
            return Err(ExposureError::BadDose(dose_per_area));
        }
        Ok(Exposure { dose_per_area })
    }

    /// Integrated dose \[electrons/Å^2\]
    pub fn dose_per_area(&self) -> f64 {
        self.dose_per_area
    }

    /// Expected electron count per pixel.
    pub fn electrons_per_pixel(&self, pixel_size: f64) -> f64 {
        self.dose_per_area * pixel_size * pixel_size
    }

    /// Scale a Fourier-space image by the per-pixel electron count.
    pub fn apply(&self, image: &mut Array2<c64>, pixel_size: f64) {
        let scale = self.electrons_per_pixel(pixel_size);
        image.mapv_inplace(|v| v * scale);
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when describing exposure.
pub enum ExposureError {
    #[error("dose must be non-negative and finite; got {0} electrons/Å^2")]
    BadDose(f64),
}
