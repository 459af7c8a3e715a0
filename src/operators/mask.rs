// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Real-space masks, applied to a rendered image by pointwise
//! multiplication over its coordinate grid.

use ndarray::Array2;

use super::OperatorError;
use nalgebra::Vector2;

/// A soft-edged disk. Weights are 1 inside, 0 outside the radius, with a
/// cosine ramp of width `rolloff` times the largest coordinate norm of
/// the grid the mask is evaluated on.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircularMask {
    /// Distance from the image centre at which the weight reaches 0 \[Å\]
    radius: f64,
    /// Ramp width as a fraction of the largest coordinate norm
    rolloff: f64,
}

impl CircularMask {
    /// Validate and construct with a given ramp fraction. A zero
    /// `rolloff` gives a hard-edged disk.
    pub fn new(radius: f64, rolloff: f64) -> Result<CircularMask, OperatorError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(OperatorError::BadRadius(radius));
        }
        if !(rolloff.is_finite() && rolloff >= 0.0) {
            return Err(OperatorError::BadRolloff(rolloff));
        }
        Ok(CircularMask { radius, rolloff })
    }

    /// Construct with the conventional ramp fraction of 0.05.
    pub fn with_radius(radius: f64) -> Result<CircularMask, OperatorError> {
        CircularMask::new(radius, 0.05)
    }

    /// The weight at a coordinate norm, for a ramp of absolute width
    /// `width` Å. The ramp spans `radius - width` to `radius`.
    fn weight_at(&self, norm: f64, width: f64) -> f64 {
        if norm > self.radius {
            0.0
        } else if norm <= self.radius - width {
            1.0
        } else {
            let phase = (norm - self.radius - width) / width * std::f64::consts::PI;
            0.5 * (1.0 + phase.cos())
        }
    }
}

/// An arbitrary weight grid, matching the unpadded image shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomMask {
    pub weights: Array2<f64>,
}

/// A real-space mask in one of the supported forms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mask {
    Circular(CircularMask),
    Custom(CustomMask),
}

impl Mask {
    /// The weight grid for an image coordinate grid.
    pub fn weights_for(
        &self,
        coords: &Array2<Vector2<f64>>,
    ) -> Result<Array2<f64>, OperatorError> {
        match self {
            Mask::Circular(circular) => {
                let width =
                    circular.rolloff * coords.iter().map(|c| c.norm()).fold(0.0, f64::max);
                Ok(coords.mapv(|c| circular.weight_at(c.norm(), width)))
            }
            Mask::Custom(custom) => {
                if custom.weights.dim() != coords.dim() {
                    return Err(OperatorError::BadArrayShape {
                        argument: "coords".into(),
                        function: "Mask::weights_for".into(),
                        expected: format!("{:?}", custom.weights.dim()),
                        received: format!("{:?}", coords.dim()),
                    });
                }
                Ok(custom.weights.clone())
            }
        }
    }

    /// Multiply an image by the mask in place.
    pub fn apply(
        &self,
        image: &mut Array2<f64>,
        coords: &Array2<Vector2<f64>>,
    ) -> Result<(), OperatorError> {
        let weights = self.weights_for(coords)?;
        image.zip_mut_with(&weights, |v, &w| *v *= w);
        Ok(())
    }
}

impl From<CircularMask> for Mask {
    fn from(m: CircularMask) -> Mask {
        Mask::Circular(m)
    }
}

impl From<CustomMask> for Mask {
    fn from(m: CustomMask) -> Mask {
        Mask::Custom(m)
    }
}
