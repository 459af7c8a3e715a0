// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sampling grids for images and volumes.
//!
//! Images are indexed `[row, column]` = `[y, x]` and volumes `[z, y, x]`.
//! Real-space coordinates are in Å and spatial frequencies in cycles/Å.
//! Frequency grids follow the standard DFT ordering (zero frequency first,
//! negative frequencies in the upper half), so they line up with unshifted
//! transform output.

use nalgebra::Vector2;
use ndarray::Array2;

/// The DFT sample frequencies for a signal of length `n` sampled every
/// `spacing` Å, in cycles/Å and standard order.
pub fn fftfreq(n: usize, spacing: f64) -> Vec<f64> {
    let step = 1.0 / (n as f64 * spacing);
    (0..n)
        .map(|k| {
            let signed = if k < n.div_ceil(2) {
                k as isize
            } else {
                k as isize - n as isize
            };
            signed as f64 * step
        })
        .collect()
}

/// Real-space sample positions for a signal of length `n` sampled every
/// `spacing` Å, centred so that position zero sits at index `n / 2`.
pub fn centered_coords(n: usize, spacing: f64) -> Vec<f64> {
    (0..n)
        .map(|k| (k as isize - (n / 2) as isize) as f64 * spacing)
        .collect()
}

/// The 2-D spatial-frequency grid of an image. Each element is
/// `(f_x, f_y)` \[cycles/Å\] and the array is indexed `[y, x]`.
pub fn frequency_grid(shape: (usize, usize), pixel_size: f64) -> Array2<Vector2<f64>> {
    let (ny, nx) = shape;
    let fy = fftfreq(ny, pixel_size);
    let fx = fftfreq(nx, pixel_size);
    Array2::from_shape_fn((ny, nx), |(i, j)| Vector2::new(fx[j], fy[i]))
}

/// The 2-D real-space coordinate grid of an image. Each element is
/// `(x, y)` \[Å\] and the array is indexed `[y, x]`, with the origin at
/// index `[ny / 2, nx / 2]`.
pub fn coordinate_grid(shape: (usize, usize), pixel_size: f64) -> Array2<Vector2<f64>> {
    let (ny, nx) = shape;
    let y = centered_coords(ny, pixel_size);
    let x = centered_coords(nx, pixel_size);
    Array2::from_shape_fn((ny, nx), |(i, j)| Vector2::new(x[j], y[i]))
}

/// Convert a Cartesian in-plane vector to `(radius, azimuth)`, with the
/// azimuth measured from the x axis \[radians\].
pub fn cartesian_to_polar(v: Vector2<f64>) -> (f64, f64) {
    (v.norm(), v.y.atan2(v.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fftfreq_even_length_matches_convention() {
        let f = fftfreq(4, 1.0);
        let expected = [0.0, 0.25, -0.5, -0.25];
        for (&got, &want) in f.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(got, want);
        }
    }

    #[test]
    fn fftfreq_odd_length_matches_convention() {
        let f = fftfreq(5, 2.0);
        let expected = [0.0, 0.1, 0.2, -0.2, -0.1];
        for (&got, &want) in f.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(got, want);
        }
    }

    #[test]
    fn coordinate_grid_is_centred() {
        let g = coordinate_grid((4, 6), 1.5);
        assert_abs_diff_eq!(g[[2, 3]].x, 0.0);
        assert_abs_diff_eq!(g[[2, 3]].y, 0.0);
        assert_abs_diff_eq!(g[[0, 0]].x, -4.5);
        assert_abs_diff_eq!(g[[0, 0]].y, -3.0);
        assert_abs_diff_eq!(g[[3, 5]].x, 3.0);
        assert_abs_diff_eq!(g[[3, 5]].y, 1.5);
    }

    #[test]
    fn frequency_grid_nyquist_and_dc() {
        let g = frequency_grid((4, 4), 2.0);
        assert_abs_diff_eq!(g[[0, 0]].norm(), 0.0);
        // Index n/2 carries the negative Nyquist frequency -1/(2 spacing).
        assert_abs_diff_eq!(g[[0, 2]].x, -0.25);
        assert_abs_diff_eq!(g[[2, 0]].y, -0.25);
        assert_abs_diff_eq!(g[[1, 3]].x, -0.125);
        assert_abs_diff_eq!(g[[1, 3]].y, 0.125);
    }

    #[test]
    fn polar_azimuth_from_x_axis() {
        let (r, theta) = cartesian_to_polar(Vector2::new(0.0, 2.0));
        assert_abs_diff_eq!(r, 2.0);
        assert_abs_diff_eq!(theta, std::f64::consts::FRAC_PI_2);
        let (r, theta) = cartesian_to_polar(Vector2::new(-1.0, 0.0));
        assert_abs_diff_eq!(r, 1.0);
        assert_abs_diff_eq!(theta, std::f64::consts::PI);
    }
}
