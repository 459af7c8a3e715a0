// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Discrete Fourier transforms of images and volumes.
//!
//! Thin wrappers over [`rustfft`] that transform each axis in turn. The
//! forward transforms are unnormalised (the zero-frequency element of a
//! forward transform is the sum of the input) and the inverse transforms
//! carry the full `1 / len` normalisation, so `ifft_2d(&fft_2d(&a))`
//! reproduces `a`.

use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayViewMut, Axis, Dimension};
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};

use crate::c64;

/// Run `fft` over every lane of `data` along `axis`, in place.
fn transform_axis<D: Dimension>(
    data: &mut ArrayViewMut<'_, c64, D>,
    axis: Axis,
    fft: &Arc<dyn Fft<f64>>,
) {
    let n = fft.len();
    let mut lane_buf = vec![c64::zero(); n];
    for mut lane in data.lanes_mut(axis) {
        for (b, v) in lane_buf.iter_mut().zip(lane.iter()) {
            *b = *v;
        }
        fft.process(&mut lane_buf);
        for (v, b) in lane.iter_mut().zip(lane_buf.iter()) {
            *v = *b;
        }
    }
}

/// The forward 2-D DFT of an image.
pub fn fft_2d(image: &Array2<c64>) -> Array2<c64> {
    let (ny, nx) = image.dim();
    let mut out = image.clone();
    let mut planner = FftPlanner::<f64>::new();
    let fft_x = planner.plan_fft_forward(nx);
    let fft_y = planner.plan_fft_forward(ny);
    transform_axis(&mut out.view_mut(), Axis(1), &fft_x);
    transform_axis(&mut out.view_mut(), Axis(0), &fft_y);
    out
}

/// The inverse 2-D DFT of an image, normalised by `1 / (ny * nx)`.
pub fn ifft_2d(image: &Array2<c64>) -> Array2<c64> {
    let (ny, nx) = image.dim();
    let mut out = image.clone();
    let mut planner = FftPlanner::<f64>::new();
    let ifft_x = planner.plan_fft_inverse(nx);
    let ifft_y = planner.plan_fft_inverse(ny);
    transform_axis(&mut out.view_mut(), Axis(1), &ifft_x);
    transform_axis(&mut out.view_mut(), Axis(0), &ifft_y);
    let norm = 1.0 / (ny * nx) as f64;
    out.mapv_inplace(|v| v * norm);
    out
}

/// The forward 3-D DFT of a volume.
pub fn fft_3d(volume: &Array3<c64>) -> Array3<c64> {
    let (nz, ny, nx) = volume.dim();
    let mut out = volume.clone();
    let mut planner = FftPlanner::<f64>::new();
    let fft_x = planner.plan_fft_forward(nx);
    let fft_y = planner.plan_fft_forward(ny);
    let fft_z = planner.plan_fft_forward(nz);
    transform_axis(&mut out.view_mut(), Axis(2), &fft_x);
    transform_axis(&mut out.view_mut(), Axis(1), &fft_y);
    transform_axis(&mut out.view_mut(), Axis(0), &fft_z);
    out
}

/// Roll every axis of a volume by half its length, moving the
/// zero-frequency element from index 0 to index `n / 2`.
pub fn fftshift_3d(volume: &Array3<c64>) -> Array3<c64> {
    let (nz, ny, nx) = volume.dim();
    Array3::from_shape_fn((nz, ny, nx), |(k, i, j)| {
        volume[[
            (k + nz - nz / 2) % nz,
            (i + ny - ny / 2) % ny,
            (j + nx - nx / 2) % nx,
        ]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn impulse_transforms_to_flat_spectrum() {
        let mut image = Array2::from_elem((4, 4), c64::new(0.0, 0.0));
        image[[0, 0]] = c64::new(1.0, 0.0);
        let spectrum = fft_2d(&image);
        for v in spectrum.iter() {
            assert_abs_diff_eq!(v.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(v.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn dc_element_is_the_image_sum() {
        let image = array![
            [c64::new(1.0, 0.0), c64::new(2.0, 0.0)],
            [c64::new(3.0, 0.0), c64::new(-1.5, 0.0)],
        ];
        let spectrum = fft_2d(&image);
        assert_abs_diff_eq!(spectrum[[0, 0]].re, 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[[0, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn forward_then_inverse_round_trips() {
        let image = Array2::from_shape_fn((6, 4), |(i, j)| {
            c64::new(i as f64 * 0.7 - j as f64, (i * j) as f64 * 0.3)
        });
        let back = ifft_2d(&fft_2d(&image));
        for (got, want) in back.iter().zip(image.iter()) {
            assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-10);
            assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn volume_dc_element_is_the_volume_sum() {
        let volume = Array3::from_shape_fn((4, 4, 4), |(k, i, j)| {
            c64::new((k + i + j) as f64, 0.0)
        });
        let total: f64 = volume.iter().map(|v| v.re).sum();
        let spectrum = fft_3d(&volume);
        assert_abs_diff_eq!(spectrum[[0, 0, 0]].re, total, epsilon = 1e-9);
    }

    #[test]
    fn fftshift_moves_dc_to_the_centre() {
        let mut volume = Array3::from_elem((4, 4, 4), c64::new(0.0, 0.0));
        volume[[0, 0, 0]] = c64::new(7.0, 0.0);
        let shifted = fftshift_3d(&volume);
        assert_abs_diff_eq!(shifted[[2, 2, 2]].re, 7.0);
        assert_abs_diff_eq!(shifted[[0, 0, 0]].re, 0.0);
    }

    #[test]
    fn fftshift_handles_odd_lengths() {
        let mut volume = Array3::from_elem((3, 3, 3), c64::new(0.0, 0.0));
        volume[[0, 0, 0]] = c64::new(1.0, 0.0);
        let shifted = fftshift_3d(&volume);
        assert_abs_diff_eq!(shifted[[1, 1, 1]].re, 1.0);
    }
}
