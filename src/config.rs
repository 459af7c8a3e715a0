// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The sampling geometry shared by every stage of image formation.

use ndarray::{s, Array2};
use thiserror::Error;

use crate::c64;

/// Round `n` up by `pad_scale`, preserving parity so that a centred
/// embedding keeps the origin at index `m / 2`.
pub(crate) fn padded_dim(n: usize, pad_scale: f64) -> usize {
    let mut m = (n as f64 * pad_scale).round() as usize;
    if m < n {
        m = n;
    }
    if (m - n) % 2 == 1 {
        m += 1;
    }
    m
}

/// The dimensions of a simulated image.
///
/// Internally, images are formed on a grid enlarged by `pad_scale` to push
/// periodic wrap-around artefacts away from the region of interest, then
/// cropped back to `shape` at the end of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageConfig {
    /// Output image dimensions `(ny, nx)` \[pixels\]
    shape: (usize, usize),
    /// Pixel edge length \[Å\]
    pixel_size: f64,
    /// Internal oversize factor, >= 1
    pad_scale: f64,
}

impl ImageConfig {
    /// Validate and construct. `pad_scale` of 1 means no padding.
    pub fn new(
        shape: (usize, usize),
        pixel_size: f64,
        pad_scale: f64,
    ) -> Result<ImageConfig, ConfigError> {
        let (ny, nx) = shape;
        if ny == 0 || nx == 0 {
            return Err(ConfigError::EmptyShape { ny, nx });
        }
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(ConfigError::BadPixelSize(pixel_size));
        }
        if !(pad_scale.is_finite() && pad_scale >= 1.0) {
            return Err(ConfigError::BadPadScale(pad_scale));
        }
        Ok(ImageConfig {
            shape,
            pixel_size,
            pad_scale,
        })
    }

    /// Output image dimensions `(ny, nx)` \[pixels\]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Pixel edge length \[Å\]
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Internal oversize factor.
    pub fn pad_scale(&self) -> f64 {
        self.pad_scale
    }

    /// The enlarged internal dimensions. With a `pad_scale` of 1 this is
    /// exactly `shape`.
    pub fn padded_shape(&self) -> (usize, usize) {
        let (ny, nx) = self.shape;
        (
            padded_dim(ny, self.pad_scale),
            padded_dim(nx, self.pad_scale),
        )
    }

    /// Embed a `shape`-sized image in the centre of a zeroed
    /// `padded_shape`-sized image.
    pub fn pad_to_padded_shape(&self, image: &Array2<c64>) -> Result<Array2<c64>, ConfigError> {
        let (ny, nx) = self.shape;
        if image.dim() != self.shape {
            return Err(ConfigError::BadArrayShape {
                argument: "image".into(),
                function: "ImageConfig::pad_to_padded_shape".into(),
                expected: format!("({ny}, {nx})"),
                received: format!("{:?}", image.dim()),
            });
        }
        let (py, px) = self.padded_shape();
        let (y0, x0) = ((py - ny) / 2, (px - nx) / 2);
        let mut padded = Array2::from_elem((py, px), c64::new(0.0, 0.0));
        padded
            .slice_mut(s![y0..y0 + ny, x0..x0 + nx])
            .assign(image);
        Ok(padded)
    }

    /// Cut the centred `shape`-sized window out of a `padded_shape`-sized
    /// image.
    pub fn crop_to_shape(&self, image: &Array2<f64>) -> Result<Array2<f64>, ConfigError> {
        let (ny, nx) = self.shape;
        let (py, px) = self.padded_shape();
        if image.dim() != (py, px) {
            return Err(ConfigError::BadArrayShape {
                argument: "image".into(),
                function: "ImageConfig::crop_to_shape".into(),
                expected: format!("({py}, {px})"),
                received: format!("{:?}", image.dim()),
            });
        }
        let (y0, x0) = ((py - ny) / 2, (px - nx) / 2);
        Ok(image.slice(s![y0..y0 + ny, x0..x0 + nx]).to_owned())
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when describing image geometry.
pub enum ConfigError {
    #[error("image shape must be non-zero in both dimensions; got ({ny}, {nx})")]
    EmptyShape { ny: usize, nx: usize },

    #[error("pixel size must be positive and finite; got {0}")]
    BadPixelSize(f64),

    #[error("pad scale must be finite and at least 1; got {0}")]
    BadPadScale(f64),

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    BadArrayShape {
        argument: String,
        function: String,
        expected: String,
        received: String,
    },
}
